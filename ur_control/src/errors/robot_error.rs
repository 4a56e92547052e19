use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported by the dashboard and motion sessions and by the pose helpers.
///
/// Every variant carries the command or endpoint it concerns so a log line is
/// enough to tell what failed and where.
#[derive(Serialize, Deserialize, Error, Debug, Clone, PartialEq)]
pub enum RobotError {
    /// No session could be established within the allotted attempts or timeout.
    #[error("could not connect to {endpoint}: {reason}")]
    Connection { endpoint: String, reason: String },

    /// A single read or write exceeded its bound.
    #[error("timed out during {operation} on {endpoint}")]
    Timeout { endpoint: String, operation: String },

    /// The backend rejected a motion, IO or configuration call. The session stays usable.
    #[error("backend rejected {command}: {reason}")]
    BackendCommand { command: String, reason: String },

    /// An expected confirmation was missing from a dashboard response.
    #[error("{command} was not confirmed (expected {expected:?}, got {response:?})")]
    ProtocolMismatch {
        command: String,
        expected: String,
        response: String,
    },

    #[error("cannot {operation}: session is not connected")]
    NotConnected { operation: String },

    #[error("{endpoint} closed the connection")]
    Disconnected { endpoint: String },

    #[error("I/O error during {operation} on {endpoint}: {reason}")]
    Io {
        endpoint: String,
        operation: String,
        reason: String,
    },

    #[error("expected {expected} components, got {actual}")]
    InvalidShape { expected: usize, actual: usize },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl RobotError {
    pub(crate) fn not_connected(operation: impl Into<String>) -> Self {
        Self::NotConnected {
            operation: operation.into(),
        }
    }

    /// True for errors after which the session can still be used.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RobotError::BackendCommand { .. } | RobotError::ProtocolMismatch { .. }
        )
    }
}

/// Failure returned by a backend capability call.
///
/// Backends only know the reason; the session attaches the command name when
/// it turns this into a [`RobotError::BackendCommand`].
#[derive(Serialize, Deserialize, Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct BackendError(pub String);

impl BackendError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }

    /// The controller refuses a second RTDE client that wants the same input registers.
    /// Clearing it needs an operator (remove the conflicting URCap, reboot the controller).
    pub fn is_register_conflict(&self) -> bool {
        self.0.contains("RTDE input registers are already in use")
    }
}

impl From<String> for BackendError {
    fn from(reason: String) -> Self {
        Self(reason)
    }
}

impl From<&str> for BackendError {
    fn from(reason: &str) -> Self {
        Self(reason.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_command() {
        let err = RobotError::BackendCommand {
            command: "moveL".to_string(),
            reason: "protective stop".to_string(),
        };
        assert_eq!(err.to_string(), "backend rejected moveL: protective stop");
        assert!(err.is_recoverable());
    }

    #[test]
    fn connection_errors_are_terminal() {
        let err = RobotError::Connection {
            endpoint: "192.168.1.10:29999".to_string(),
            reason: "refused".to_string(),
        };
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("192.168.1.10:29999"));
    }

    #[test]
    fn detects_register_conflict() {
        let err = BackendError::new("RTDE input registers are already in use");
        assert!(err.is_register_conflict());
        assert!(!BackendError::from("timeout").is_register_conflict());
    }
}
