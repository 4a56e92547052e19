use serde::{Deserialize, Serialize};
use std::net::ToSocketAddrs;
use std::path::Path;
use std::time::Duration;

use crate::RobotError;

/// Port the dashboard server listens on.
pub const DASHBOARD_PORT: u16 = 30003;

/// Settings for the dashboard (administrative) connection.
///
/// ```rust
/// use ur_control::drivers::DashboardConfig;
///
/// let config = DashboardConfig::new("192.168.1.10".to_string());
/// assert!(config.validate().is_ok());
/// assert_eq!(config.connection_url(), "192.168.1.10:30003");
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    pub addr: String,
    pub port: u16,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
    /// Wait between `power on` and `brake release` while the power stage settles.
    pub settle_delay_ms: u64,
    /// Upper bound for a single response frame.
    pub buffer_size: usize,
}

impl DashboardConfig {
    pub fn new(addr: String) -> Self {
        Self {
            addr,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), RobotError> {
        if self.addr.is_empty() {
            return Err(RobotError::Config("Address cannot be empty.".to_string()));
        }
        if self.port == 0 {
            return Err(RobotError::Config("Port number must be greater than 0.".to_string()));
        }
        if self.connect_timeout_ms == 0 || self.read_timeout_ms == 0 {
            return Err(RobotError::Config("Timeouts must be greater than 0.".to_string()));
        }
        if self.buffer_size == 0 {
            return Err(RobotError::Config("Buffer size must be greater than 0.".to_string()));
        }
        Ok(())
    }

    /// Generates a connection URL from the address and port.
    pub fn connection_url(&self) -> String {
        format!("{}:{}", self.addr, self.port)
    }

    /// Resolves the address to a socket address string.
    pub fn resolve(&self) -> Result<String, RobotError> {
        resolve_address(&self.addr, self.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1".to_string(),
            port: DASHBOARD_PORT,
            connect_timeout_ms: 2000,
            read_timeout_ms: 2000,
            settle_delay_ms: 2000,
            buffer_size: 1024,
        }
    }
}

/// Settings for the motion/IO session.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct MotionConfig {
    pub addr: String,
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    /// Speed used by callers that do not pick one (m/s or rad/s).
    pub default_speed: f64,
    /// Acceleration used by callers that do not pick one (m/s^2 or rad/s^2).
    pub default_acceleration: f64,
}

impl MotionConfig {
    pub fn new(addr: String) -> Self {
        Self {
            addr,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), RobotError> {
        if self.addr.is_empty() {
            return Err(RobotError::Config("Address cannot be empty.".to_string()));
        }
        if self.max_attempts == 0 {
            return Err(RobotError::Config("Maximum attempts must be greater than 0.".to_string()));
        }
        if !(self.default_speed > 0.0 && self.default_acceleration > 0.0) {
            return Err(RobotError::Config(
                "Default speed and acceleration must be positive.".to_string(),
            ));
        }
        Ok(())
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1".to_string(),
            max_attempts: 10,
            retry_delay_ms: 500,
            default_speed: 0.5,
            default_acceleration: 0.5,
        }
    }
}

/// Both session configurations, as stored in a JSON settings file.
///
/// Missing fields fall back to their defaults, so `{"dashboard": {"addr": "10.0.0.5"}}`
/// is a valid file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct RobotConfig {
    pub dashboard: DashboardConfig,
    pub motion: MotionConfig,
}

impl RobotConfig {
    /// Defaults for both sessions, pointed at the same controller.
    pub fn for_host(addr: &str) -> Self {
        Self {
            dashboard: DashboardConfig::new(addr.to_string()),
            motion: MotionConfig::new(addr.to_string()),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, RobotError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| RobotError::Config(format!("Could not parse configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RobotError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| RobotError::Config(format!("Could not read {}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), RobotError> {
        self.dashboard.validate()?;
        self.motion.validate()
    }
}

/// Resolves a DNS name or IP address to a `SocketAddr`.
fn resolve_address(addr: &str, port: u16) -> Result<String, RobotError> {
    let address_with_port = format!("{}:{}", addr, port);
    match address_with_port.to_socket_addrs() {
        Ok(mut iter) => match iter.next() {
            Some(socket_addr) => Ok(socket_addr.to_string()),
            None => Err(RobotError::Config("Could not resolve address".to_string())),
        },
        Err(_) => Err(RobotError::Config("Invalid address format".to_string())),
    }
}
