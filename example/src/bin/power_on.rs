// Powers the arm on and releases its brakes through the dashboard server.
// Run with: cargo run -p example --bin power_on -- <robot ip | config.json>
// Against the simulator: cargo run -p sim, then
//                        cargo run -p example --bin power_on -- 127.0.0.1

use example::{config_from_args, init_logging};
use tracing::{info, warn};
use ur_control::drivers::DashboardClient;
use ur_control::RobotError;

#[tokio::main]
async fn main() -> Result<(), RobotError> {
    init_logging();
    let config = config_from_args()?;

    let report = DashboardClient::power_on_and_release_brakes(config.dashboard).await?;
    if report.brakes_released() {
        info!("SUCCESS: robot powered on and brakes released");
    } else {
        warn!("Check robot state. Brakes may not have released: {}", report.brake_response.trim());
    }
    Ok(())
}
