/// Limits of the simulated arm.
///
/// Values follow the published e-Series data sheets. The simulator only uses
/// them to reject commands a real controller would refuse.
use serde::{Deserialize, Serialize};
use ur_control::{JointPositions, Pose};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RobotModel {
    UR3e,
    #[default]
    UR5e,
    UR10e,
    UR16e,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotConfig {
    pub model: RobotModel,

    /// Maximum payload in kg
    pub max_payload: f64,

    /// Maximum reach from the base axis in m
    pub max_reach: f64,

    /// Number of standard digital outputs
    pub digital_outputs: u8,

    pub home_pose: Pose,
    pub home_joints: JointPositions,
}

impl RobotConfig {
    pub fn for_model(model: RobotModel) -> Self {
        let (max_payload, max_reach) = match model {
            RobotModel::UR3e => (3.0, 0.5),
            RobotModel::UR5e => (5.0, 0.85),
            RobotModel::UR10e => (12.5, 1.3),
            RobotModel::UR16e => (16.0, 0.9),
        };
        let half_pi = std::f64::consts::FRAC_PI_2;
        Self {
            model,
            max_payload,
            max_reach,
            digital_outputs: 8,
            // tool pointing down, half reach in front of the base
            home_pose: Pose::new(0.0, -max_reach / 2.0, 0.2, std::f64::consts::PI, 0.0, 0.0),
            home_joints: JointPositions([0.0, -half_pi, -half_pi, -half_pi, half_pi, 0.0]),
        }
    }

    /// True when the translation of `pose` lies within the reach sphere.
    pub fn within_reach(&self, pose: &Pose) -> bool {
        pose.translation().norm() <= self.max_reach
    }
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self::for_model(RobotModel::default())
    }
}
