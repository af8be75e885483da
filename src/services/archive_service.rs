//! Project archive export and import.
//!
//! An archive is a deflate zip of the project's `config/` and `downloads/`
//! trees with project-relative paths; generated output is not bundled.
//! Import is all-or-nothing: entries are extracted to a staging directory
//! under the store root and the staging directory is renamed into place
//! only once everything unpacked cleanly.

use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::{Component, Path};

use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::config::Settings;
use crate::errors::{ArchiveError, ArchiveResult};
use crate::store::{ProjectStore, SETTINGS_FILE};

const BUNDLED_DIRS: [&str; 2] = ["config", "downloads"];

pub struct ProjectArchiver<'a> {
    store: &'a ProjectStore,
}

impl<'a> ProjectArchiver<'a> {
    pub fn new(store: &'a ProjectStore) -> Self {
        Self { store }
    }

    /// Bundle a project's configuration and CSV extracts into a zip buffer.
    pub fn export(&self, project: &str) -> ArchiveResult<Vec<u8>> {
        let project_path = self
            .store
            .project_path(project)
            .map_err(|e| ArchiveError::Export(e.to_string()))?;
        if !project_path.is_dir() {
            return Err(ArchiveError::Export(format!(
                "Project '{project}' does not exist"
            )));
        }

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for dir in BUNDLED_DIRS {
            let base = project_path.join(dir);
            if !base.is_dir() {
                continue;
            }
            let mut entries: Vec<_> = fs::read_dir(&base)?
                .collect::<Result<Vec<_>, _>>()?
                .into_iter()
                .filter(|e| e.path().is_file())
                .collect();
            entries.sort_by_key(|e| e.file_name());
            for entry in entries {
                let name = format!("{dir}/{}", entry.file_name().to_string_lossy());
                writer.start_file(&name, options)?;
                writer.write_all(&fs::read(entry.path())?)?;
                debug!("Archived {}", name);
            }
        }

        let cursor = writer.finish()?;
        let buffer = cursor.into_inner();
        info!("Exported project '{}' ({} bytes)", project, buffer.len());
        Ok(buffer)
    }

    /// Unpack an archive as a new project. The name comes from the archived
    /// settings document; a name collision leaves the existing project
    /// untouched.
    pub fn import(&self, bytes: &[u8]) -> ArchiveResult<String> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;

        let settings = Self::read_settings(&mut archive)?;
        let name = ProjectStore::sanitize_name(&settings.name)
            .map_err(|e| ArchiveError::Import(e.to_string()))?;

        if self.store.project_exists(&name) {
            return Err(ArchiveError::Conflict(name));
        }

        let staging = self.store.root().join(format!(".import-{name}"));
        if staging.exists() {
            fs::remove_dir_all(&staging)?;
        }

        match self.extract_to(&mut archive, &staging) {
            Ok(()) => {}
            Err(e) => {
                let _ = fs::remove_dir_all(&staging);
                return Err(e);
            }
        }

        let target = self
            .store
            .project_path(&name)
            .map_err(|e| ArchiveError::Import(e.to_string()))?;
        fs::rename(&staging, &target)?;
        info!("Imported project '{}'", name);
        Ok(name)
    }

    fn read_settings(archive: &mut ZipArchive<Cursor<&[u8]>>) -> ArchiveResult<Settings> {
        let entry_name = format!("config/{SETTINGS_FILE}");
        let mut entry = archive.by_name(&entry_name).map_err(|_| {
            ArchiveError::Import(format!("Archive has no {entry_name}"))
        })?;
        let mut contents = String::new();
        entry.read_to_string(&mut contents)?;
        let settings: Settings = serde_json::from_str(&contents)
            .map_err(|e| ArchiveError::Import(format!("{entry_name}: {e}")))?;
        if settings.name.trim().is_empty() {
            return Err(ArchiveError::Import(format!(
                "{entry_name} carries no project name"
            )));
        }
        Ok(settings)
    }

    fn extract_to(
        &self,
        archive: &mut ZipArchive<Cursor<&[u8]>>,
        staging: &Path,
    ) -> ArchiveResult<()> {
        ProjectStore::ensure_project_dirs(staging)
            .map_err(|e| ArchiveError::Import(e.to_string()))?;

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let raw_name = entry.name().to_string();
            let relative = entry
                .enclosed_name()
                .ok_or_else(|| ArchiveError::UnsafeEntry(raw_name.clone()))?;
            if !Self::is_bundled_path(&relative) {
                debug!("Skipping archive entry outside bundled dirs: {}", raw_name);
                continue;
            }
            let out_path = staging.join(&relative);
            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out = fs::File::create(&out_path)?;
            std::io::copy(&mut entry, &mut out)?;
        }
        Ok(())
    }

    fn is_bundled_path(path: &Path) -> bool {
        match path.components().next() {
            Some(Component::Normal(first)) => BUNDLED_DIRS
                .iter()
                .any(|d| first.to_string_lossy() == *d),
            _ => false,
        }
    }
}
