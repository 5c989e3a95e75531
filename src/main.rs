use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use log::{LevelFilter, error, info};

use crate::decoder::DecodeError;
use crate::status::{DeviceStatus, Disconnected};

mod advertisement;
mod config;
mod decoder;
mod manager;
mod retry;
mod scanner;
mod status;

const EXIT_NOT_FOUND: u8 = 1;
const EXIT_ERROR: u8 = 2;

/// Reports battery and charging status of nearby AirPods as JSON.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// TOML file overriding the scan and retry settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log more to stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}

/// The stdout line and exit status of one run.
#[derive(Debug, PartialEq, Eq)]
struct Outcome {
    line: Option<String>,
    code: u8,
}

impl Outcome {
    fn error() -> Self {
        Outcome {
            line: None,
            code: EXIT_ERROR,
        }
    }
}

fn report(result: Result<Option<DeviceStatus>, DecodeError>) -> anyhow::Result<Outcome> {
    let outcome = match result {
        Ok(Some(status)) => {
            info!("Found {} ({:?})", status.model, status.charge);
            Outcome {
                line: Some(serde_json::to_string(&status)?),
                code: 0,
            }
        }
        Ok(None) => {
            info!("No AirPods found");
            Outcome {
                line: Some(serde_json::to_string(&Disconnected::default())?),
                code: EXIT_NOT_FOUND,
            }
        }
        Err(err) => {
            error!("Malformed payload: {err}");
            Outcome::error()
        }
    };
    Ok(outcome)
}

async fn run(args: Args) -> anyhow::Result<Outcome> {
    let config = match &args.config {
        Some(path) => config::AppConfig::load(path)?,
        None => config::AppConfig::default(),
    };

    let source = scanner::Scanner::new(config.scan_duration()).await?;
    let core = manager::Manager::new(
        source,
        config.criteria(),
        config.retry_attempts(),
        config.retry_delay(),
    );

    report(core.poll().await)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let outcome = run(args).await.unwrap_or_else(|err| {
        error!("{err:#}");
        Outcome::error()
    });
    if let Some(line) = &outcome.line {
        println!("{line}");
    }
    ExitCode::from(outcome.code)
}
