use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use eyre::Result;
use praxis_service::config::{self, PraxisConfig, StorageBackend};
use praxis_service::error::ServiceError;
use praxis_service::state::AppState;
use praxis_survey::error::SurveyError;
use praxis_survey::import::{self, ImportFormat};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "praxis", version, about = "Survey runs and completion analysis")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check a survey document (JSON or YAML) without storing it.
    Validate { file: PathBuf },
    /// Validate a survey document and store it for a practice.
    Import {
        file: PathBuf,
        #[arg(long)]
        practice: String,
    },
    /// Run the completion analysis for a completed run now.
    Analyze { run_id: Uuid },
    /// Print the effective configuration with secrets redacted.
    Config,
    /// Write a starter configuration with a freshly generated subject key.
    Init {
        #[arg(long, default_value = "us-east-1")]
        region: String,
        /// S3 bucket; in-memory storage when omitted.
        #[arg(long)]
        bucket: Option<String>,
        /// Replace an existing config file.
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Command::Validate { file } => validate(&file),
        Command::Import { file, practice } => import(&file, &practice).await,
        Command::Analyze { run_id } => analyze(run_id).await,
        Command::Config => {
            let config = config::load_config()?;
            println!(
                "{}",
                serde_json::to_string_pretty(&config::config_info(&config))?
            );
            Ok(())
        }
        Command::Init {
            region,
            bucket,
            force,
        } => init(region, bucket, force),
    }
}

/// `EnvFilter` from `RUST_LOG` (default `info`); JSON lines when
/// `PRAXIS_LOG_JSON=1`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if std::env::var("PRAXIS_LOG_JSON").is_ok_and(|v| v == "1") {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn init(region: String, bucket: Option<String>, force: bool) -> Result<()> {
    let path = config::config_path()?;
    if path.exists() && !force {
        return Err(eyre::eyre!(
            "{} already exists; pass --force to replace it",
            path.display()
        ));
    }
    let storage = match bucket {
        Some(bucket) => StorageBackend::S3 { bucket },
        None => StorageBackend::Memory,
    };
    let subject_key = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
    config::save_config_to(&PraxisConfig::starter(region, storage, subject_key), &path)?;
    println!("{}", path.display());
    Ok(())
}

fn read_document(file: &Path) -> Result<(String, ImportFormat)> {
    let format = ImportFormat::from_path(file).ok_or_else(|| {
        eyre::eyre!(
            "cannot tell the format of {}; use a .json, .yaml or .yml file",
            file.display()
        )
    })?;
    let text = std::fs::read_to_string(file)
        .map_err(|e| eyre::eyre!("failed to read {}: {e}", file.display()))?;
    Ok((text, format))
}

fn validate(file: &Path) -> Result<()> {
    let (text, format) = read_document(file)?;
    match import::import_survey(&text, format, "validation", jiff::Timestamp::now()) {
        Ok(survey) => {
            println!("ok: {} ({} steps)", survey.name, survey.steps.len());
            Ok(())
        }
        Err(SurveyError::Validation(errors)) => {
            for (field, messages) in errors.iter() {
                for message in messages {
                    println!("{field}: {message}");
                }
            }
            Err(eyre::eyre!("{} has {} invalid field(s)", file.display(), errors.len()))
        }
        Err(e) => Err(e.into()),
    }
}

async fn import(file: &Path, practice: &str) -> Result<()> {
    let (text, format) = read_document(file)?;
    let config = config::load_config()?;
    let state = AppState::from_config(&config).await?;

    let result = state.service.import_survey(&text, format, practice).await;
    state.shutdown().await;

    match result {
        Ok(survey) => {
            println!("{}", survey.id);
            Ok(())
        }
        Err(e) => {
            if let Some(errors) = e.validation_errors() {
                for (field, messages) in errors.iter() {
                    for message in messages {
                        println!("{field}: {message}");
                    }
                }
            }
            Err(e.into())
        }
    }
}

async fn analyze(run_id: Uuid) -> Result<()> {
    let config = config::load_config()?;
    let state = AppState::from_config(&config).await?;

    let result = state.supervisor.run(run_id).await.map_err(ServiceError::from);
    state.shutdown().await;

    let analysis = result?;
    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}
