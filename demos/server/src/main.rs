//! The Prowl coordinator server binary.
//!
//! Runs the full stack with default settings: WebSocket listener,
//! 10 Hz session tick, 5-minute maintenance sweep. Configure verbosity
//! with `RUST_LOG` (e.g. `RUST_LOG=prowl=debug`) and the bind address
//! with `PROWL_ADDR`.

use prowl::ProwlServer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::var("PROWL_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let server = ProwlServer::builder().bind(&addr).build().await?;
    tracing::info!(addr = %server.local_addr()?, "prowl listening");

    server.run().await?;
    Ok(())
}
