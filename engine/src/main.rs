// rxassist prescription assistant
// Main entry point for the rxassist binary

use anyhow::Context;
use clap::Parser;
use rxassist_engine::backend::HttpBackend;
use rxassist_engine::cli::{Cli, Command, ConfigAction};
use rxassist_engine::config::{Config, LOG_LEVELS};
use rxassist_engine::handlers::{
    handle_chat, handle_config_path, handle_config_show, handle_doctor, handle_download,
    handle_extract, OutputFormat,
};
use rxassist_engine::telemetry::init_telemetry_with_level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    // Load configuration (or use custom path if provided)
    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)
            .with_context(|| format!("Failed to load {}", config_path.display()))?
    } else {
        Config::load_or_create()?
    };

    // --log wins over the config file; RUST_LOG wins over both
    let log_level = match cli.log.as_deref() {
        Some(level) if LOG_LEVELS.contains(&level) => level,
        Some(level) => anyhow::bail!(
            "Invalid log level '{}'. Must be one of: {}",
            level,
            LOG_LEVELS.join(", ")
        ),
        None => config.core.log_level.as_str(),
    };
    init_telemetry_with_level(log_level);

    tracing::info!(
        "rxassist v{} ({} - {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_COMMIT_HASH"),
        env!("BUILD_TIMESTAMP")
    );

    match cli.command {
        Command::Chat => handle_chat(&config).await,

        Command::Extract { file } => {
            tracing::info!("Extracting {}", file.display());
            let backend = HttpBackend::new(&config.backend)?;
            handle_extract(&file, &backend, format).await
        }

        Command::Download {
            artifact_path,
            output,
        } => {
            let backend = HttpBackend::new(&config.backend)?;
            handle_download(&artifact_path, output.as_deref(), &backend, &config, format)
                .await
                .map(|_| ())
        }

        Command::Doctor => {
            tracing::info!("Running diagnostics...");
            handle_doctor(&config, format).await
        }

        Command::Config { action } => match action {
            ConfigAction::Show => handle_config_show(&config, format),
            ConfigAction::Path => handle_config_path(cli.config.as_deref(), format),
        },
    }
}
