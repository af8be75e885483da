//! Date axis resolution.
//!
//! Templates carry a horizontal axis of `YYYYMM` month labels. The axis
//! comes from the project's manual `date_range` when both months are set,
//! otherwise from a [`VersionRangeSource`] that looks the configured SAC
//! version up in master data. When neither yields a range, resolution fails
//! rather than falling back to an invented year.

use tracing::debug;

use crate::config::{Settings, VersionConfig};
use crate::csv_store::{CsvStore, VERSION_MASTER_FILE};
use crate::errors::{ConfigError, ConfigResult};

const DEFAULT_START_COLUMN: &str = "StartMonth";
const DEFAULT_END_COLUMN: &str = "EndMonth";

/// Supplies the planning horizon for a SAC version.
pub trait VersionRangeSource {
    /// Returns `(start_month, end_month)` for the version, or `None` when no
    /// master data is available at all.
    fn date_range(&self, version: &VersionConfig) -> ConfigResult<Option<(String, String)>>;
}

/// Reads the version horizon from a `VersionMaster.csv` extract in the
/// project's downloads directory.
pub struct CsvVersionSource<'a> {
    csv_store: &'a CsvStore,
}

impl<'a> CsvVersionSource<'a> {
    pub fn new(csv_store: &'a CsvStore) -> Self {
        Self { csv_store }
    }
}

impl VersionRangeSource for CsvVersionSource<'_> {
    fn date_range(&self, version: &VersionConfig) -> ConfigResult<Option<(String, String)>> {
        let table = match self
            .csv_store
            .load_file(VERSION_MASTER_FILE)
            .map_err(|e| ConfigError::InvalidSettings(e.to_string()))?
        {
            Some(table) => table,
            None => return Ok(None),
        };

        let start_col = version.start_column.as_deref().unwrap_or(DEFAULT_START_COLUMN);
        let end_col = version.end_column.as_deref().unwrap_or(DEFAULT_END_COLUMN);
        let start_idx = table
            .column_index(start_col)
            .ok_or_else(|| ConfigError::VersionColumnMissing(start_col.to_string()))?;
        let end_idx = table
            .column_index(end_col)
            .ok_or_else(|| ConfigError::VersionColumnMissing(end_col.to_string()))?;
        let version_idx = table
            .column_index("Version")
            .or_else(|| table.column_index("ID"))
            .unwrap_or(0);

        for row in &table.rows {
            if table.cell(row, version_idx).trim() == version.version_id {
                let start = table.cell(row, start_idx).trim().to_string();
                let end = table.cell(row, end_idx).trim().to_string();
                debug!(
                    "Version '{}' horizon: {}..{}",
                    version.version_id, start, end
                );
                return Ok(Some((start, end)));
            }
        }
        Err(ConfigError::VersionNotFound(version.version_id.clone()))
    }
}

pub struct DateAxisResolver;

impl DateAxisResolver {
    /// Resolve the month labels for a project, manual range first.
    pub fn resolve(
        settings: &Settings,
        source: &dyn VersionRangeSource,
    ) -> ConfigResult<Vec<String>> {
        if let Some(range) = &settings.date_range {
            if range.is_manual() {
                return expand_range(&range.start_month, &range.end_month);
            }
        }
        match source.date_range(&settings.version)? {
            Some((start, end)) => expand_range(&start, &end),
            None => Err(ConfigError::NoDateRange),
        }
    }
}

/// Expand an inclusive `YYYYMM` range into ascending month labels.
pub fn expand_range(start: &str, end: &str) -> ConfigResult<Vec<String>> {
    let (mut year, mut month) = parse_month(start)?;
    let (end_year, end_month) = parse_month(end)?;
    if (year, month) > (end_year, end_month) {
        return Err(ConfigError::InvalidRange {
            start: start.to_string(),
            end: end.to_string(),
        });
    }

    let mut labels = Vec::new();
    loop {
        labels.push(format!("{year:04}{month:02}"));
        if (year, month) == (end_year, end_month) {
            break;
        }
        month += 1;
        if month > 12 {
            month = 1;
            year += 1;
        }
    }
    Ok(labels)
}

fn parse_month(token: &str) -> ConfigResult<(u32, u32)> {
    let token = token.trim();
    if token.len() != 6 || !token.chars().all(|c| c.is_ascii_digit()) {
        return Err(ConfigError::InvalidMonth(token.to_string()));
    }
    let year: u32 = token[..4]
        .parse()
        .map_err(|_| ConfigError::InvalidMonth(token.to_string()))?;
    let month: u32 = token[4..]
        .parse()
        .map_err(|_| ConfigError::InvalidMonth(token.to_string()))?;
    if !(1..=12).contains(&month) {
        return Err(ConfigError::InvalidMonth(token.to_string()));
    }
    Ok((year, month))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DateRangeConfig;
    use std::fs;

    #[test]
    fn expands_range_across_year_boundary() {
        let labels = expand_range("202511", "202602").unwrap();
        assert_eq!(labels, vec!["202511", "202512", "202601", "202602"]);
    }

    #[test]
    fn single_month_range() {
        assert_eq!(expand_range("202501", "202501").unwrap(), vec!["202501"]);
    }

    #[test]
    fn rejects_malformed_tokens_and_backward_ranges() {
        assert!(matches!(
            expand_range("2025-1", "202512").unwrap_err(),
            ConfigError::InvalidMonth(_)
        ));
        assert!(matches!(
            expand_range("202513", "202601").unwrap_err(),
            ConfigError::InvalidMonth(_)
        ));
        assert!(matches!(
            expand_range("202506", "202501").unwrap_err(),
            ConfigError::InvalidRange { .. }
        ));
    }

    struct NoSource;
    impl VersionRangeSource for NoSource {
        fn date_range(&self, _: &VersionConfig) -> ConfigResult<Option<(String, String)>> {
            Ok(None)
        }
    }

    #[test]
    fn manual_range_takes_precedence() {
        let mut settings = Settings::default();
        settings.date_range = Some(DateRangeConfig {
            start_month: "202501".to_string(),
            end_month: "202503".to_string(),
        });
        let labels = DateAxisResolver::resolve(&settings, &NoSource).unwrap();
        assert_eq!(labels.len(), 3);
    }

    #[test]
    fn missing_range_is_an_error_not_a_default() {
        let settings = Settings::default();
        assert!(matches!(
            DateAxisResolver::resolve(&settings, &NoSource).unwrap_err(),
            ConfigError::NoDateRange
        ));
    }

    #[test]
    fn csv_source_reads_version_master() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(VERSION_MASTER_FILE),
            "Version,Description,StartMonth,EndMonth\n\
             public.RF_CURRENT,Rolling FC,202507,202612\n\
             public.BUDGET,Budget,202601,202612\n",
        )
        .unwrap();
        let csv_store = CsvStore::new(dir.path());
        let source = CsvVersionSource::new(&csv_store);

        let version = VersionConfig {
            version_id: "public.RF_CURRENT".to_string(),
            start_column: None,
            end_column: None,
        };
        let range = source.date_range(&version).unwrap();
        assert_eq!(range, Some(("202507".to_string(), "202612".to_string())));

        let missing = VersionConfig {
            version_id: "public.NOPE".to_string(),
            start_column: None,
            end_column: None,
        };
        assert!(matches!(
            source.date_range(&missing).unwrap_err(),
            ConfigError::VersionNotFound(_)
        ));
    }
}
