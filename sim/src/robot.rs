// Simulated RTDE backend.
//
// Moves complete instantly: a linear move sets the TCP pose, a joint move sets
// the joint positions. There is no kinematics linking the two.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};
use ur_control::drivers::{RtdeConnector, RtdeControl, RtdeIo, RtdeReceive};
use ur_control::{BackendError, JointPositions, PathWaypoint, Pose, Vec3};

use crate::robot_config::RobotConfig;

// Simulated robot state
#[derive(Debug, Clone)]
pub struct RobotState {
    pub tcp_pose: Pose,
    pub joints: JointPositions,
    pub tool_frame: Pose,
    pub payload: (f64, Vec3),
    pub digital_outputs: Vec<bool>,
    pub digital_inputs: u64,
    pub script_running: bool,
    /// Connect attempts still to be refused, to exercise client retries.
    pub refuse_connections: u32,
    /// Another client holds the RTDE input registers.
    pub registers_in_use: bool,
}

impl RobotState {
    fn new(config: &RobotConfig) -> Self {
        Self {
            tcp_pose: config.home_pose,
            joints: config.home_joints,
            tool_frame: Pose::default(),
            payload: (0.0, Vec3::zeros()),
            digital_outputs: vec![false; config.digital_outputs as usize],
            digital_inputs: 0,
            script_running: false,
            refuse_connections: 0,
            registers_in_use: false,
        }
    }
}

/// An in-process robot that implements the backend interfaces.
///
/// Clones share the same state, so a test or demo can keep one handle to
/// inspect the robot while a session drives another.
#[derive(Debug, Clone)]
pub struct SimulatedRobot {
    config: RobotConfig,
    state: Arc<Mutex<RobotState>>,
}

impl SimulatedRobot {
    pub fn new(config: RobotConfig) -> Self {
        let state = RobotState::new(&config);
        Self {
            config,
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn config(&self) -> &RobotConfig {
        &self.config
    }

    pub async fn snapshot(&self) -> RobotState {
        self.state.lock().await.clone()
    }

    pub async fn refuse_next_connections(&self, attempts: u32) {
        self.state.lock().await.refuse_connections = attempts;
    }

    pub async fn set_registers_in_use(&self, in_use: bool) {
        self.state.lock().await.registers_in_use = in_use;
    }

    pub async fn set_digital_inputs(&self, bits: u64) {
        self.state.lock().await.digital_inputs = bits;
    }

    fn interface(&self) -> SimInterface {
        SimInterface {
            config: self.config.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

impl Default for SimulatedRobot {
    fn default() -> Self {
        Self::new(RobotConfig::default())
    }
}

#[async_trait]
impl RtdeConnector for SimulatedRobot {
    async fn control(&self, addr: &str) -> Result<Box<dyn RtdeControl>, BackendError> {
        let mut state = self.state.lock().await;
        if state.refuse_connections > 0 {
            state.refuse_connections -= 1;
            return Err(BackendError::new(format!("{}: connection refused", addr)));
        }
        if state.registers_in_use {
            return Err(BackendError::new("RTDE input registers are already in use"));
        }
        state.script_running = true;
        info!(addr, "control interface up, script running");
        Ok(Box::new(self.interface()))
    }

    async fn receive(&self, addr: &str) -> Result<Box<dyn RtdeReceive>, BackendError> {
        debug!(addr, "receive interface up");
        Ok(Box::new(self.interface()))
    }

    async fn io(&self, addr: &str) -> Result<Box<dyn RtdeIo>, BackendError> {
        debug!(addr, "io interface up");
        Ok(Box::new(self.interface()))
    }
}

struct SimInterface {
    config: RobotConfig,
    state: Arc<Mutex<RobotState>>,
}

fn check_motion(state: &RobotState, speed: f64, acceleration: f64) -> Result<(), BackendError> {
    if !state.script_running {
        return Err(BackendError::new("control script is not running"));
    }
    if !(speed > 0.0 && acceleration > 0.0) {
        return Err(BackendError::new(format!(
            "speed and acceleration must be positive (got {}, {})",
            speed, acceleration
        )));
    }
    Ok(())
}

impl SimInterface {
    fn check_reach(&self, pose: &Pose) -> Result<(), BackendError> {
        if !self.config.within_reach(pose) {
            return Err(BackendError::new(format!("target {:?} is out of reach", pose)));
        }
        Ok(())
    }
}

#[async_trait]
impl RtdeControl for SimInterface {
    async fn move_l(&mut self, pose: &Pose, speed: f64, acceleration: f64) -> Result<(), BackendError> {
        let mut state = self.state.lock().await;
        check_motion(&state, speed, acceleration)?;
        self.check_reach(pose)?;
        state.tcp_pose = *pose;
        debug!(?pose, "moveL done");
        Ok(())
    }

    async fn move_l_path(&mut self, path: &[PathWaypoint]) -> Result<(), BackendError> {
        let Some(last) = path.last() else {
            return Err(BackendError::new("path is empty"));
        };
        let mut state = self.state.lock().await;
        for waypoint in path {
            check_motion(&state, waypoint.speed, waypoint.acceleration)?;
            self.check_reach(&waypoint.pose)?;
        }
        state.tcp_pose = last.pose;
        Ok(())
    }

    async fn move_j(&mut self, joints: &JointPositions, speed: f64, acceleration: f64) -> Result<(), BackendError> {
        let mut state = self.state.lock().await;
        check_motion(&state, speed, acceleration)?;
        if joints.0.iter().any(|q| q.abs() > 2.0 * std::f64::consts::TAU) {
            return Err(BackendError::new("joint target outside +-720 degrees"));
        }
        state.joints = *joints;
        Ok(())
    }

    async fn set_tcp(&mut self, tool_frame: &Pose) -> Result<(), BackendError> {
        self.state.lock().await.tool_frame = *tool_frame;
        Ok(())
    }

    async fn set_payload(&mut self, mass: f64, center_of_gravity: &Vec3) -> Result<(), BackendError> {
        if !(0.0..=self.config.max_payload).contains(&mass) {
            return Err(BackendError::new(format!(
                "payload {} kg outside 0..{} kg",
                mass, self.config.max_payload
            )));
        }
        self.state.lock().await.payload = (mass, *center_of_gravity);
        Ok(())
    }

    async fn stop_script(&mut self) -> Result<(), BackendError> {
        self.state.lock().await.script_running = false;
        info!("control script stopped");
        Ok(())
    }
}

#[async_trait]
impl RtdeReceive for SimInterface {
    async fn actual_tcp_pose(&mut self) -> Result<Pose, BackendError> {
        Ok(self.state.lock().await.tcp_pose)
    }

    async fn actual_q(&mut self) -> Result<JointPositions, BackendError> {
        Ok(self.state.lock().await.joints)
    }

    async fn actual_digital_input_bits(&mut self) -> Result<u64, BackendError> {
        Ok(self.state.lock().await.digital_inputs)
    }
}

#[async_trait]
impl RtdeIo for SimInterface {
    async fn set_standard_digital_out(&mut self, pin: u8, value: bool) -> Result<(), BackendError> {
        let mut state = self.state.lock().await;
        match state.digital_outputs.get_mut(pin as usize) {
            Some(output) => {
                *output = value;
                Ok(())
            }
            None => Err(BackendError::new(format!("no standard digital output {}", pin))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use ur_control::drivers::{MotionConfig, MotionSession};
    use ur_control::RobotError;

    fn session(robot: &SimulatedRobot) -> MotionSession<SimulatedRobot> {
        let config = MotionConfig {
            retry_delay_ms: 10,
            ..MotionConfig::new("sim".to_string())
        };
        MotionSession::new(config, robot.clone())
    }

    #[tokio::test(start_paused = true)]
    async fn session_drives_the_simulated_robot() {
        let robot = SimulatedRobot::default();
        let mut session = session(&robot);
        session.connect().await.unwrap();

        let start = session.actual_tcp_pose().await.unwrap();
        session
            .move_linear_relative(&Pose::new(0.0, 0.0, 0.01, 0.0, 0.0, 0.0), 0.1, 0.1)
            .await
            .unwrap();
        let moved = robot.snapshot().await.tcp_pose;
        assert!((moved.z - start.z - 0.01).abs() < 1e-12);

        session.pulse_digital_output(0, Duration::from_millis(200)).await.unwrap();
        assert!(!robot.snapshot().await.digital_outputs[0]);

        session.disconnect().await.unwrap();
        assert!(!robot.snapshot().await.script_running);
    }

    #[tokio::test(start_paused = true)]
    async fn refused_connections_are_retried() {
        let robot = SimulatedRobot::default();
        robot.refuse_next_connections(2).await;
        let mut session = session(&robot);
        session.connect().await.unwrap();
        assert!(session.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn register_conflict_never_connects() {
        let robot = SimulatedRobot::default();
        robot.set_registers_in_use(true).await;
        let mut session = session(&robot);
        let err = session.connect().await.unwrap_err();
        assert!(matches!(err, RobotError::Connection { ref reason, .. } if reason.contains("registers")));
    }

    #[tokio::test(start_paused = true)]
    async fn out_of_reach_move_is_rejected_and_session_survives() {
        let robot = SimulatedRobot::default();
        let mut session = session(&robot);
        session.connect().await.unwrap();

        let far = Pose::new(5.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        assert!(session.move_linear(&far, 0.1, 0.1).await.is_err());
        assert!(session.set_digital_output(99, true).await.is_err());
        assert!(session.set_payload(50.0, &Vec3::zeros()).await.is_err());

        session.set_digital_output(2, true).await.unwrap();
        assert!(robot.snapshot().await.digital_outputs[2]);
    }

    #[tokio::test(start_paused = true)]
    async fn inputs_are_reported_as_bits() {
        let robot = SimulatedRobot::default();
        robot.set_digital_inputs(0b101).await;
        let mut session = session(&robot);
        session.connect().await.unwrap();
        assert_eq!(session.digital_input_bits().await.unwrap(), 0b101);
    }
}
