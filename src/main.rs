//! docshift: batch conversion of legacy office documents.
//!
//! - `docshift serve` runs the HTTP API,
//! - `docshift convert` converts everything once and exits.

use clap::{Parser, Subcommand};
use docshift_config::Config;
use docshift_convert::Converter;
use docshift_convert::engine::LibreOffice;
use docshift_server::{AppState, start_server};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_LOG_FILTER: &str = "docshift=info,tower_http=info";

/// Some files were processed, but at least one failed.
const EXIT_PARTIAL: u8 = 1;
/// Nothing was processed.
const EXIT_FATAL: u8 = 2;

#[derive(Parser)]
#[command(name = "docshift")]
#[command(about = "Convert legacy office documents (.doc, .xls) through LibreOffice")]
#[command(version)]
struct Cli {
    /// TOML configuration file (environment variables take precedence)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Address to listen on [default: 0.0.0.0]
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on [default: 8000]
        #[arg(long)]
        port: Option<u16>,
    },
    /// Convert the raw data directory once, then exit
    Convert,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = ?e, "Unable to load configuration");
            return ExitCode::from(EXIT_FATAL);
        },
    };

    match cli.command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.api_host = host;
            }
            if let Some(port) = port {
                config.api_port = port;
            }
            serve(config).await
        },
        Command::Convert => match tokio::task::spawn_blocking(move || convert(config)).await {
            Ok(code) => code,
            Err(e) => {
                tracing::error!(error = %e, "Conversion task panicked");
                ExitCode::from(EXIT_FATAL)
            },
        },
    }
}

async fn serve(config: Config) -> ExitCode {
    let settings = config.resolve();
    let engine = Arc::new(LibreOffice::new(&settings.engine));
    let state = match AppState::new(settings, engine) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = ?e, "Unable to initialize server");
            return ExitCode::FAILURE;
        },
    };
    match start_server(state).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = ?e, "Server stopped");
            ExitCode::FAILURE
        },
    }
}

fn convert(config: Config) -> ExitCode {
    let settings = config.resolve();
    let engine = Arc::new(LibreOffice::new(&settings.engine));
    let converter = match Converter::new(&settings.raw_dir, &settings.prepared_dir, engine) {
        Ok(converter) => converter.skip_empty(settings.skip_empty),
        Err(e) => {
            tracing::error!(error = ?e, "Unable to initialize converter");
            return ExitCode::from(EXIT_FATAL);
        },
    };
    match converter.process() {
        Ok(summary) if summary.is_clean() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(EXIT_PARTIAL),
        Err(e) => {
            tracing::error!(error = ?e, "Conversion failed");
            ExitCode::from(EXIT_FATAL)
        },
    }
}
