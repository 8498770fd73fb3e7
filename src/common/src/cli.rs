use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Common CLI arguments shared across promwarp binaries
#[derive(Parser, Debug, Clone)]
pub struct CommonArgs {
    #[arg(long, help = "Configuration file path")]
    pub config: Option<PathBuf>,

    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, help = "Enable quiet mode (minimal output)")]
    pub quiet: bool,
}

/// Common subcommands
#[derive(Subcommand, Debug, Clone, Default)]
pub enum CommonCommands {
    /// Start the service (default behavior)
    #[default]
    Start,
    /// Show current configuration and exit
    Config {
        #[arg(long, help = "Show configuration in JSON format")]
        json: bool,
    },
    /// Validate configuration and exit
    Validate,
    /// Show version information and exit
    Version,
}

/// Utility functions for CLI operations
pub mod utils {
    use super::*;
    use crate::config::Configuration;
    use anyhow::{Context, Result};
    use tracing_subscriber::EnvFilter;

    /// Log level derived from the verbosity flags
    pub fn log_level(args: &CommonArgs) -> &'static str {
        if args.quiet {
            "warn"
        } else if args.verbose {
            "debug"
        } else {
            "info"
        }
    }

    /// Initialize logging based on CLI arguments
    ///
    /// `RUST_LOG` still wins when set, so individual modules can be tuned.
    pub fn init_logging(args: &CommonArgs) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(log_level(args)));

        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    /// Load configuration with optional override from CLI
    pub fn load_config(config_path: Option<&PathBuf>) -> Result<Configuration> {
        match config_path {
            Some(path) => {
                log::info!("Loading configuration from: {}", path.display());
                Configuration::load_from_path(path).context("Failed to load configuration")
            }
            None => Configuration::load().context("Failed to load configuration"),
        }
    }

    /// Display configuration in human-readable or JSON format
    pub fn display_config(config: &Configuration, json: bool) -> Result<()> {
        if json {
            let json = serde_json::to_string_pretty(config)
                .context("Failed to serialize configuration to JSON")?;
            println!("{json}");
        } else {
            println!("promwarp configuration:");
            println!("=======================");
            println!("Listen address: {}", config.server.listen_addr);
            println!("Warp 10 endpoint: {}", config.backend.endpoint);
            println!("Warp 10 timeout: {:?}", config.backend.timeout);
            println!(
                "Default metric selector: {} (cap {})",
                config.discovery.default_metric_selector, config.discovery.default_result_cap
            );
            println!(
                "Start lookback window: {} .. {}",
                config.discovery.lookback_min, config.discovery.lookback_max
            );
        }
        Ok(())
    }

    /// Validate configuration and report any issues
    pub fn validate_config(config: &Configuration) -> Result<()> {
        log::info!("Validating configuration...");

        if config.backend.endpoint.is_empty() {
            anyhow::bail!("Warp 10 endpoint cannot be empty");
        }

        url::Url::parse(&config.backend.endpoint).context("Warp 10 endpoint is not a valid URL")?;

        config
            .server
            .listen_addr
            .parse::<std::net::SocketAddr>()
            .context("Listen address is not a valid socket address")?;

        if config.discovery.default_metric_selector.trim().is_empty() {
            anyhow::bail!("Default metric selector cannot be empty");
        }

        // Malformed lookback values are tolerated at runtime, flag them here.
        for (name, value) in [
            ("lookback_min", &config.discovery.lookback_min),
            ("lookback_max", &config.discovery.lookback_max),
        ] {
            if humantime::parse_duration(value).is_err() {
                log::warn!("discovery.{name} = {value:?} is not a duration, the default will be used");
            }
        }

        log::info!("✅ Configuration validation passed");
        Ok(())
    }

    /// Handle common CLI commands that don't require starting services
    pub async fn handle_common_command(
        command: &CommonCommands,
        config: &Configuration,
    ) -> Result<bool> {
        match command {
            CommonCommands::Config { json } => {
                display_config(config, *json)?;
                Ok(true)
            }
            CommonCommands::Validate => {
                validate_config(config)?;
                Ok(true)
            }
            CommonCommands::Version => {
                println!("{}", version_info());
                Ok(true)
            }
            CommonCommands::Start => Ok(false),
        }
    }

    /// Standard version information
    pub fn version_info() -> String {
        format!(
            "{} {} ({})",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            env!("CARGO_PKG_RUST_VERSION")
        )
    }
}
