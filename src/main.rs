//! Simulated nova compute service.
//!
//! Serves the in-memory compute API over HTTP so clients can be exercised
//! without a real cloud.
//!
//! ```text
//! nova-client --config nova.toml --bind 127.0.0.1:8774 --string-ids
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use nova_client::config::{load_config, ClientConfig, IdMode};
use nova_client::lifecycle::{wait_for_signal, Shutdown};
use nova_client::observability::init_logging;
use nova_client::testservices::{server::serve, Nova};

#[derive(Parser)]
#[command(name = "nova-client")]
#[command(about = "Run the simulated nova compute service", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overriding `service.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,

    /// Issue UUID identifiers instead of numeric ones.
    #[arg(long)]
    string_ids: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClientConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.service.bind_address = bind;
    }
    if cli.string_ids {
        config.service.id_mode = IdMode::String;
    }

    init_logging(&config.observability.log_level);
    tracing::info!("nova-client v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.service.bind_address,
        id_mode = ?config.service.id_mode,
        pool = %config.service.floating_ip_pool,
        pool_size = config.service.floating_ip_pool_size,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.service.bind_address).await?;
    let nova = Arc::new(Nova::new(&config.service));

    let shutdown = Shutdown::new();
    let server = tokio::spawn(serve(listener, nova, shutdown.subscribe()));

    wait_for_signal(&shutdown).await;
    server.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
