mod config_commands;

use std::{path::PathBuf, sync::Arc};

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    streamify_config::StreamifyConfig,
    streamify_media::StagingStore,
    streamify_relay::{JobController, RelaySettings},
    streamify_telegram::{TelegramConfig, TelegramGateway, UpdateHandler},
    tracing::{info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use crate::config_commands::ConfigAction;

#[derive(Parser)]
#[command(
    name = "streamify",
    about = "Telegram bot that sends video files back as streamable videos",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file to load instead of searching the default locations.
    #[arg(long, global = true, env = "STREAMIFY_CONFIG")]
    config: Option<PathBuf>,

    /// Staging directory for in-flight files (overrides config value).
    #[arg(long, global = true, env = "STREAMIFY_STAGING_DIR")]
    staging_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bot (default when no subcommand is provided).
    Run,
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Load the config file, then layer env and CLI overrides on top.
fn load_config(cli: &Cli) -> anyhow::Result<StreamifyConfig> {
    let mut config = match &cli.config {
        Some(path) => streamify_config::load_config(path)?,
        None => streamify_config::discover_and_load()?,
    };
    streamify_config::apply_env_overrides(&mut config);
    if let Some(dir) = &cli.staging_dir {
        config.staging.dir = Some(dir.clone());
    }
    Ok(config)
}

fn relay_settings(config: &StreamifyConfig) -> RelaySettings {
    RelaySettings {
        caption: config.relay.caption.clone(),
        max_file_bytes: config.max_file_bytes(),
    }
}

async fn run(config: StreamifyConfig) -> anyhow::Result<()> {
    let credentials =
        streamify_config::validate(&config).context("configuration is not usable")?;
    let telegram = TelegramConfig::from_credentials(&credentials)?;

    let store = StagingStore::new(config.staging.resolved_dir());
    store
        .sweep_on_startup()
        .await
        .context("failed to prepare staging directory")?;
    info!(staging_dir = %store.root().display(), "staging directory ready");

    let gateway = Arc::new(TelegramGateway::new(&telegram)?);
    let controller = Arc::new(JobController::new(
        gateway,
        store,
        relay_settings(&config),
    ));
    let handler = Arc::new(UpdateHandler::new(controller, config.max_file_bytes()));

    let cancel = streamify_telegram::start_polling(&telegram, handler).await?;

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for ctrl-c")?;
            info!("shutdown requested");
        },
        () = cancel.cancelled() => {
            warn!("telegram polling stopped, shutting down");
        },
    }
    cancel.cancel();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "streamify starting");

    let config = load_config(&cli)?;
    match cli.command {
        None | Some(Commands::Run) => run(config).await,
        Some(Commands::Config { action }) => config_commands::handle_config(action, &config),
    }
}
