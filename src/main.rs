use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use common::cli::{CommonArgs, CommonCommands, utils};
use querier::{DiscoveryService, DiscoverySettings, Warp10Backend};
use router::{InMemoryStateImpl, create_router};
use std::net::SocketAddr;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "promwarp")]
#[command(about = "Prometheus series discovery API backed by Warp 10")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    command: Option<PromwarpCommands>,
}

#[derive(Subcommand)]
enum PromwarpCommands {
    #[command(flatten)]
    Common(CommonCommands),
}

impl Default for PromwarpCommands {
    fn default() -> Self {
        Self::Common(CommonCommands::Start)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    utils::init_logging(&cli.common);

    let config = utils::load_config(cli.common.config.as_ref())?;

    // Handle common commands that don't require starting the service
    let command = cli.command.unwrap_or_default();
    let PromwarpCommands::Common(ref common_cmd) = command;
    if utils::handle_common_command(common_cmd, &config).await? {
        return Ok(());
    }

    log::info!("Loaded configuration:");
    log::info!("  Warp 10 endpoint: {}", config.backend.endpoint);
    log::info!(
        "  Lookback window: {} .. {}",
        config.discovery.lookback_min,
        config.discovery.lookback_max
    );

    let backend = Warp10Backend::new(&config.backend.endpoint, config.backend.timeout)
        .context("Failed to initialize Warp 10 client")?;
    let discovery = DiscoveryService::new(
        Arc::new(backend),
        DiscoverySettings::from(&config.discovery),
    );

    let addr: SocketAddr = config
        .server
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address {}", config.server.listen_addr))?;

    let app = create_router(InMemoryStateImpl::new(discovery));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind HTTP listener on {addr}"))?;
    log::info!("Starting Prometheus discovery API on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for ctrl+c signal: {e}");
            }
            log::info!("Shutting down Prometheus discovery API");
        })
        .await
        .context("HTTP server error")?;

    log::info!("Prometheus discovery API stopped");
    Ok(())
}
