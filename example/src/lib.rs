// Shared setup for the example binaries.

use tracing_subscriber::EnvFilter;
use ur_control::drivers::RobotConfig;
use ur_control::RobotError;

/// Address used when no argument is given.
pub const DEFAULT_ROBOT_IP: &str = "192.168.1.10";

/// Installs the process-wide log subscriber. Call once, first thing in `main`.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();
}

/// Reads the robot configuration from the first command line argument.
///
/// A `.json` argument is loaded as a configuration file, anything else is taken
/// as the controller address.
pub fn config_from_args() -> Result<RobotConfig, RobotError> {
    match std::env::args().nth(1) {
        Some(arg) if arg.ends_with(".json") => RobotConfig::from_json_file(&arg),
        Some(addr) => {
            let config = RobotConfig::for_host(&addr);
            config.validate()?;
            Ok(config)
        }
        None => Ok(RobotConfig::for_host(DEFAULT_ROBOT_IP)),
    }
}
