use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use worksheet_core::constants::{MAX_DOCUMENT_BYTES_ENV, MIGRATE_LEGACY_ENV};
use worksheet_core::{config_from_env_values, ComputedValue, Diagnostics, WorksheetService};

#[derive(Parser)]
#[command(name = "worksheet")]
#[command(about = "Clinical worksheet schema tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a schema and print the report
    Validate {
        /// Schema file (.json, .yaml or .yml)
        schema: PathBuf,
    },
    /// Migrate a legacy formulation schema and print the result
    Migrate {
        /// Schema file (.json, .yaml or .yml)
        schema: PathBuf,
    },
    /// Migrate and validate a schema, printing the prepared schema
    Prepare {
        /// Schema file (.json, .yaml or .yml)
        schema: PathBuf,
    },
    /// Evaluate the computed fields of a schema against a response document
    Evaluate {
        /// Schema file (.json, .yaml or .yml)
        schema: PathBuf,
        /// Response document (.json)
        responses: PathBuf,
        /// Include the cells and references that were left out
        #[arg(long)]
        diagnostics: bool,
    },
}

/// Entry point for the `worksheet` command.
///
/// # Environment Variables
/// - `WORKSHEET_MAX_DOCUMENT_BYTES`: largest schema or response document accepted (default 1 MiB)
/// - `WORKSHEET_MIGRATE_LEGACY`: migrate legacy formulation schemas during `prepare`
///   and `evaluate` (default: true)
/// - `RUST_LOG`: log filter (default: `worksheet=info`)
///
/// Logs are written to stderr so that stdout carries only JSON output.
fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("worksheet=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cfg = Arc::new(config_from_env_values(
        std::env::var(MAX_DOCUMENT_BYTES_ENV).ok(),
        std::env::var(MIGRATE_LEGACY_ENV).ok(),
    )?);
    tracing::debug!(
        max_document_bytes = cfg.max_document_bytes(),
        migrate_legacy = cfg.migrate_legacy(),
        "resolved configuration"
    );
    let service = WorksheetService::new(cfg);

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { schema } => {
            let raw = service.read_document(&schema)?;
            let report = service.validate(&raw);
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.valid {
                std::process::exit(1);
            }
        }
        Commands::Migrate { schema } => {
            let raw = service.read_document(&schema)?;
            let migrated = service.migrate(&raw)?;
            println!("{}", migrated.to_json_pretty()?);
        }
        Commands::Prepare { schema } => {
            let prepared = service.load_schema_file(&schema)?;
            println!("{}", prepared.to_json_pretty()?);
        }
        Commands::Evaluate {
            schema,
            responses,
            diagnostics,
        } => {
            let prepared = service.load_schema_file(&schema)?;
            let values = service.load_responses_file(&responses)?;
            let mut results = service.evaluate_all(&prepared, &values);
            if !diagnostics {
                results = results
                    .into_iter()
                    .map(|result| ComputedValue {
                        diagnostics: Diagnostics::default(),
                        ..result
                    })
                    .collect();
            }
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
    }

    Ok(())
}
