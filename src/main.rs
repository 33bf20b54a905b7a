//! Robix - a local-first question answering assistant.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use robix::config::{AssistantConfig, ConfigLoader};
use robix::display;
use robix::pipeline::Orchestrator;

#[derive(Parser)]
#[command(
    name = "robix",
    about = "Answer questions from a local knowledge cache, with opt-in web lookup",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to a config file, instead of the default search paths.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a question.
    Ask {
        /// The question to answer.
        query: String,
        /// Search the web when local knowledge is not enough.
        #[arg(long)]
        web: bool,
        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
        /// Show full source text instead of truncating it.
        #[arg(long)]
        raw: bool,
    },
    /// Teach the assistant a fact.
    Learn {
        /// Where the fact came from.
        #[arg(short, long, default_value = "local")]
        source: String,
        /// The fact to remember.
        content: String,
    },
    /// Report knowledge store and generative backend status.
    Check,
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(path: Option<PathBuf>) -> Option<AssistantConfig> {
    let loader = path.map_or_else(ConfigLoader::new, ConfigLoader::with_path);
    match loader.load() {
        Ok(config) => Some(config),
        Err(e) => {
            display::print_error(&e.to_string());
            None
        }
    }
}

async fn build(config: &AssistantConfig) -> Option<Orchestrator> {
    match Orchestrator::from_config(config).await {
        Ok(orchestrator) => Some(orchestrator),
        Err(e) => {
            display::print_error(&e.to_string());
            None
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let Some(mut config) = load_config(cli.config) else {
        return ExitCode::FAILURE;
    };

    match cli.command {
        Commands::Ask {
            query,
            web,
            json,
            raw,
        } => {
            let Some(orchestrator) = build(&config).await else {
                return ExitCode::FAILURE;
            };
            let result = orchestrator.resolve(&query, web).await;
            if json {
                match serde_json::to_string_pretty(&result) {
                    Ok(out) => println!("{out}"),
                    Err(e) => {
                        display::print_error(&format!("Failed to serialize result: {e}"));
                        return ExitCode::FAILURE;
                    }
                }
            } else {
                display::print_answer(&result, raw);
            }
        }
        Commands::Learn { source, content } => {
            // Learning never needs the generative backend.
            config.generation.enabled = false;
            let Some(orchestrator) = build(&config).await else {
                return ExitCode::FAILURE;
            };
            if let Err(e) = orchestrator.learn(&source, &content).await {
                display::print_error(&e.to_string());
                return ExitCode::FAILURE;
            }
            display::print_learned(&source);
        }
        Commands::Check => {
            let Some(orchestrator) = build(&config).await else {
                return ExitCode::FAILURE;
            };
            let store = orchestrator.store();
            match store.count().await {
                Ok(count) => display::print_store_status(store.path(), count),
                Err(e) => {
                    display::print_error(&e.to_string());
                    return ExitCode::FAILURE;
                }
            }
            display::print_connection_test(
                &config.generation.base_url,
                &config.generation.model,
                orchestrator.generator().has_backend(),
            );
        }
    }

    ExitCode::SUCCESS
}
