mod cli;
mod demo;
mod probe;
mod qr;
mod terminal;

use std::path::Path;
use std::process::ExitCode;

use screenbeam_common::{ConfigError, PeerId, Result};
use screenbeam_config::schema::LoggingConfig;
use screenbeam_config::ScreenbeamConfig;
use screenbeam_session::{parse_target, ShareLink};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use cli::Command;

const DEFAULT_LOG_DIRECTIVE: &str = "screenbeam=info";

/// `--log-level` wins, then `RUST_LOG`, then the configured level.
fn log_filter(flag: Option<&str>, logging: &LoggingConfig) -> EnvFilter {
    let chosen = match flag {
        Some(directive) => EnvFilter::try_new(directive).ok(),
        None => EnvFilter::try_from_default_env().ok(),
    };
    chosen
        .or_else(|| EnvFilter::try_new(logging.directive()).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_DIRECTIVE))
}

fn load_config(path: Option<&str>) -> (ScreenbeamConfig, Option<ConfigError>) {
    let loaded = match path {
        Some(path) => screenbeam_config::load_config_from(Path::new(path)),
        None => screenbeam_config::load_config(),
    };
    match loaded {
        Ok(config) => (config, None),
        Err(e) => (ScreenbeamConfig::default(), Some(e)),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();

    // Config first so its logging level can seed the filter.
    let (config, config_error) = load_config(args.config.as_deref());

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(args.log_level.as_deref(), &config.logging))
        .with_writer(std::io::stderr)
        .init();

    if let Some(e) = config_error {
        warn!(error = %e, "Failed to load config, using defaults");
    }
    info!(version = env!("CARGO_PKG_VERSION"), "screenbeam starting");

    match dispatch(args.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(command: Command, config: &ScreenbeamConfig) -> Result<()> {
    match command {
        Command::Link { id } => {
            let link = ShareLink::build(&config.share, &PeerId::new(id))?;
            println!("{}", terminal::format_share_link("link", &link, true));
        }
        Command::Demo { viewers, drop } => {
            let count = demo::run(config, viewers, drop).await?;
            println!("Final viewer count: {count}");
        }
        Command::Probe { id } => {
            let id = probe::run(config, id).await?;
            println!("open: {id}");
        }
        Command::View { input } => {
            let target = parse_target(&input, &config.share.query_param)?;
            println!("{target}");
        }
        Command::Config => {
            println!("{}", screenbeam_config::config_to_json(config));
        }
    }
    Ok(())
}
