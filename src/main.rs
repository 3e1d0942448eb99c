//! vidlens CLI entry point.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vidlens::cli::{commands, Cli, Commands};
use vidlens::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.as_ref().map(PathBuf::from);
    let settings = Settings::load_from(config_path.as_ref())?;

    init_logging(&cli, &settings);

    // Ensure data directories exist
    std::fs::create_dir_all(settings.data_dir())?;
    std::fs::create_dir_all(settings.temp_dir())?;

    // Execute command
    match &cli.command {
        Commands::Serve { host, port } => {
            commands::run_serve(host.clone(), *port, settings).await?;
        }

        Commands::Process { url, visual } => {
            commands::run_process(url, *visual, settings).await?;
        }

        Commands::Ask { video_id, question } => {
            commands::run_ask(video_id, question, settings).await?;
        }

        Commands::Search {
            video_id,
            query,
            no_narrative,
        } => {
            commands::run_search(video_id, query, !*no_narrative, settings).await?;
        }

        Commands::List => {
            commands::run_list(settings).await?;
        }

        Commands::Info { video_id } => {
            commands::run_info(video_id, settings).await?;
        }

        Commands::Delete { video_id } => {
            commands::run_delete(video_id, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings, config_path)?;
        }

        Commands::Cache { action } => {
            commands::run_cache(action, settings)?;
        }
    }

    Ok(())
}

/// Install the tracing subscriber.
///
/// `RUST_LOG` wins, then `-v` flags. Without either, the server logs at
/// `general.log_level` and other commands only warn.
fn init_logging(cli: &Cli, settings: &Settings) {
    let log_level = match cli.verbose {
        0 if matches!(cli.command, Commands::Serve { .. }) => settings.general.log_level.as_str(),
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("vidlens={},tower_http={}", log_level, log_level)));

    let registry = tracing_subscriber::registry().with(filter);
    if settings.general.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init();
    }
}
