use serde::{Deserialize, Serialize};

/// Text the controller puts in its `brake release` reply once the brakes start releasing.
pub const BRAKE_RELEASE_CONFIRMATION: &str = "Brake releasing";

/// Commands understood by the dashboard server.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardCommand {
    PowerOn,
    PowerOff,
    BrakeRelease,
    RobotMode,
}

impl DashboardCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            DashboardCommand::PowerOn => "power on",
            DashboardCommand::PowerOff => "power off",
            DashboardCommand::BrakeRelease => "brake release",
            DashboardCommand::RobotMode => "robotmode",
        }
    }

    /// The command as sent on the wire, newline terminated.
    pub fn line(&self) -> String {
        format!("{}\n", self.as_str())
    }

    /// Parses a received command line, ignoring surrounding whitespace.
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            "power on" => Some(DashboardCommand::PowerOn),
            "power off" => Some(DashboardCommand::PowerOff),
            "brake release" => Some(DashboardCommand::BrakeRelease),
            "robotmode" => Some(DashboardCommand::RobotMode),
            _ => None,
        }
    }
}

impl std::fmt::Display for DashboardCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress of a dashboard power-on sequence.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub enum DashboardState {
    #[default]
    Disconnected,
    /// Connected and the greeting has been read.
    Connected,
    PoweredOn,
    BrakesReleased,
    Failed(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrakeStatus {
    Released,
    /// The command was delivered but the reply lacked the confirmation text.
    NotConfirmed,
}

impl BrakeStatus {
    pub fn from_response(response: &str) -> Self {
        if response.contains(BRAKE_RELEASE_CONFIRMATION) {
            BrakeStatus::Released
        } else {
            BrakeStatus::NotConfirmed
        }
    }
}

/// What the controller said during a power-on sequence.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PowerOnReport {
    pub greeting: String,
    pub power_on_response: String,
    pub brake_response: String,
    pub brake_status: BrakeStatus,
    pub final_state: DashboardState,
}

impl PowerOnReport {
    pub fn brakes_released(&self) -> bool {
        self.brake_status == BrakeStatus::Released
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_lines_are_newline_terminated() {
        assert_eq!(DashboardCommand::PowerOn.line(), "power on\n");
        assert_eq!(DashboardCommand::BrakeRelease.line(), "brake release\n");
    }

    #[test]
    fn parse_round_trips_known_commands() {
        for cmd in [
            DashboardCommand::PowerOn,
            DashboardCommand::PowerOff,
            DashboardCommand::BrakeRelease,
            DashboardCommand::RobotMode,
        ] {
            assert_eq!(DashboardCommand::parse(&cmd.line()), Some(cmd));
        }
        assert_eq!(DashboardCommand::parse("play"), None);
    }

    #[test]
    fn brake_status_uses_substring_match() {
        assert_eq!(BrakeStatus::from_response("Brake releasing\n"), BrakeStatus::Released);
        assert_eq!(
            BrakeStatus::from_response("Robot is not powered on"),
            BrakeStatus::NotConfirmed
        );
    }
}
