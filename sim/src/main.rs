// Dashboard server simulator.
// Run with: cargo run -p sim -- [port]   (default 30003)

use std::error::Error;

use sim::DashboardSimulator;
use tracing::info;
use ur_control::drivers::DASHBOARD_PORT;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let port = match std::env::args().nth(1) {
        Some(arg) => arg.parse::<u16>()?,
        None => DASHBOARD_PORT,
    };

    let server = DashboardSimulator::bind(&format!("0.0.0.0:{}", port)).await?;
    info!("dashboard simulator listening on {}", server.local_addr()?);
    server.run().await;
    Ok(())
}
