// Library exports for the UR controller simulator

pub mod robot_config;
pub mod robot;
pub mod dashboard_server;

pub use robot_config::{RobotConfig, RobotModel};
pub use robot::{RobotState, SimulatedRobot};
pub use dashboard_server::{DashboardSimulator, RobotMode};
