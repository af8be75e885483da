use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use sactool::services::{
    scan_service, ProjectArchiver, TemplateComposer, ValidationEngine,
};
use sactool::store::ProjectStore;

#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    #[clap(short, long, global = true)]
    log_level: Option<String>,
    /// Root directory holding the projects
    #[clap(long, global = true, default_value = "projects")]
    projects_dir: PathBuf,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty project
    Init { project: String },
    /// List projects
    Projects,
    /// Suggest dimension definitions from the project's CSV files
    Scan {
        project: String,
        /// Add the suggestions to the dimensions document
        #[clap(long)]
        save: bool,
    },
    /// List a project's dimensions, templates and CSV files
    List { project: String },
    /// Check a project's configuration against its CSV extracts
    Validate { project: String },
    /// Preview a template without generating a workbook
    Preview { project: String, template: String },
    /// Generate workbooks (all templates when none are named)
    Generate {
        project: String,
        templates: Vec<String>,
    },
    /// Manage CSV extracts
    Csv {
        #[clap(subcommand)]
        command: CsvCommands,
    },
    /// Export a project as a zip archive
    Export {
        project: String,
        #[clap(short, long)]
        out: PathBuf,
    },
    /// Import a project archive
    Import { file: PathBuf },
    /// Delete a project
    Delete { project: String },
}

#[derive(Subcommand)]
enum CsvCommands {
    /// Copy a CSV file into the project's downloads directory
    Add { project: String, file: PathBuf },
    /// Remove a CSV file from the project
    Remove { project: String, filename: String },
}

fn main() -> ExitCode {
    let args = Cli::parse();
    setup_logging(&args.log_level);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Cli) -> Result<()> {
    let store = ProjectStore::new(args.projects_dir);

    match args.command {
        Commands::Init { project } => {
            let name = store.create_project(&project)?;
            println!("Created project '{name}'");
        }
        Commands::Projects => {
            for name in store.list_projects()? {
                println!("{name}");
            }
        }
        Commands::Scan { project, save } => {
            let suggestions = scan_service::scan_project(&store, &project)?;
            println!("{}", serde_json::to_string_pretty(&suggestions)?);
            if save {
                let added = scan_service::save_suggestions(&store, &project, suggestions)?;
                println!("Added {added} dimension(s)");
            }
        }
        Commands::List { project } => {
            let dimensions = store.read_dimensions(&project)?;
            let templates = store.read_templates(&project)?;
            let csvs = store.list_csv(&project)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "dimensions": dimensions.dimensions,
                    "templates": templates.templates,
                    "csv_files": csvs,
                }))?
            );
        }
        Commands::Validate { project } => {
            let report = ValidationEngine::validate(&store, &project)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.valid {
                return Err(anyhow!(
                    "Validation failed with {} error(s)",
                    report.errors.len()
                ));
            }
        }
        Commands::Preview { project, template } => {
            let settings = store.read_settings(&project)?;
            let dimensions = store.read_dimensions(&project)?;
            let templates = store.read_templates(&project)?;
            let definition = templates
                .templates
                .iter()
                .find(|t| t.name == template)
                .ok_or_else(|| anyhow!("Template '{}' not found", template))?;

            let registry = sactool::services::DimensionRegistry::new(&dimensions);
            let csv_store = sactool::csv_store::CsvStore::new(store.downloads_dir(&project)?);
            let source = sactool::services::CsvVersionSource::new(&csv_store);
            let axis = sactool::services::DateAxisResolver::resolve(&settings, &source)?;
            let preview =
                TemplateComposer::preview(definition, &registry, &csv_store, &settings, &axis)?;
            println!("{}", serde_json::to_string_pretty(&preview)?);
        }
        Commands::Generate { project, templates } => {
            let outcome = TemplateComposer::generate(&store, &project, &templates)?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            if !outcome.failed.is_empty() {
                return Err(anyhow!(
                    "{} template(s) failed to generate",
                    outcome.failed.len()
                ));
            }
        }
        Commands::Csv { command } => match command {
            CsvCommands::Add { project, file } => {
                let filename = file
                    .file_name()
                    .ok_or_else(|| anyhow!("Not a file: {}", file.display()))?
                    .to_string_lossy()
                    .to_string();
                let content = fs::read(&file)?;
                let saved = store.save_csv(&project, &filename, &content)?;
                println!("Saved {saved}");
            }
            CsvCommands::Remove { project, filename } => {
                store.delete_csv(&project, &filename)?;
                println!("Removed {filename}");
            }
        },
        Commands::Export { project, out } => {
            let archiver = ProjectArchiver::new(&store);
            let bytes = archiver.export(&project)?;
            fs::write(&out, &bytes)?;
            info!("Wrote {} bytes to {}", bytes.len(), out.display());
            println!("Exported '{}' to {}", project, out.display());
        }
        Commands::Import { file } => {
            let bytes = fs::read(&file)?;
            let archiver = ProjectArchiver::new(&store);
            let name = archiver.import(&bytes)?;
            println!("Imported project '{name}'");
        }
        Commands::Delete { project } => {
            store.delete_project(&project)?;
            println!("Deleted project '{project}'");
        }
    }

    Ok(())
}

fn setup_logging(log_level: &Option<String>) {
    let log_level = match log_level
        .as_ref()
        .unwrap_or(&"info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level.to_string()))
        .without_time()
        .init();
}
