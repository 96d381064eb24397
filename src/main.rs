//! field-translate: command-line front end for the translation engine.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use field_translator::{Direction, EngineConfig, TranslationEngine, TranslationRequest};

#[derive(Parser)]
#[command(name = "field-translate", version, about = "Batch-translate record fields with caching")]
struct Cli {
    /// Configuration file (TOML, JSON or YAML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Translate FIELD=TEXT pairs and print the result as JSON.
    Translate {
        /// Direction tag, e.g. ko_to_en.
        #[arg(long, short)]
        direction: Direction,

        #[arg(required = true, value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },
    /// Remove cached translations for one direction, or all of them.
    ClearCache {
        #[arg(long, short)]
        direction: Option<Direction>,
    },
    /// Drop expired entries from the cache store.
    PurgeExpired,
    /// Report whether the provider is currently usable.
    Status {
        /// Close a tripped breaker now.
        #[arg(long)]
        reset: bool,
    },
}

fn parse_field(arg: &str) -> Result<(String, String), String> {
    arg.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected FIELD=TEXT, got {arg:?}"))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    field_translator::init_tracing(cli.json_logs);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "field-translate failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> field_translator::Result<()> {
    let config = EngineConfig::load(cli.config.as_deref())?;
    let engine = TranslationEngine::from_config(&config)?;

    match cli.command {
        Command::Translate { direction, fields } => {
            let request = TranslationRequest {
                direction,
                fields: fields.into_iter().collect(),
            };
            let requested = request.fields.len();
            let result = engine.translate(request).await;
            info!(requested, returned = result.len(), "done");
            match serde_json::to_string_pretty(&result) {
                Ok(json) => println!("{json}"),
                Err(e) => eprintln!("error: failed to encode result: {e}"),
            }
        }
        Command::ClearCache { direction } => {
            let removed = engine.clear_cache(direction);
            println!("removed {removed} cached translation(s)");
        }
        Command::PurgeExpired => {
            let removed = engine.purge_expired();
            println!("purged {removed} expired entr{}", if removed == 1 { "y" } else { "ies" });
        }
        Command::Status { reset } => {
            if reset {
                engine.reset_availability();
            }
            let state = if engine.is_provider_available() {
                "available"
            } else {
                "unavailable"
            };
            println!("{}: {state}", engine.provider_name());
        }
    }

    Ok(())
}
