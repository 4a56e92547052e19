use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use super::{Backend, MotionConfig, RtdeConnector};
use crate::{
    add_relative, add_relative_joints, BackendError, JointPositions, PathWaypoint, Pose, RobotError, Vec3,
};

/// Session with the controller's motion and IO backend.
///
/// The session owns the three backend interfaces (control, receive, IO) as one
/// unit: they exist together after a successful [`connect`](Self::connect) and
/// are released together by [`disconnect`](Self::disconnect). Every operation
/// returns a `Result`. A failed backend call is logged and returned, and the
/// session stays usable; the caller decides whether to go on.
///
/// Moves return once the backend has accepted the command, not when the arm
/// arrives. Poll [`actual_tcp_pose`](Self::actual_tcp_pose) if arrival matters.
///
/// ```rust,ignore
/// let mut session = MotionSession::new(MotionConfig::new("192.168.1.10".into()), connector);
/// session.connect().await?;
/// session.move_linear_relative(&Pose::new(0.0, 0.0, 0.05, 0.0, 0.0, 0.0), 0.05, 0.05).await?;
/// session.pulse_digital_output(0, Duration::from_secs(1)).await?;
/// session.disconnect().await?;
/// ```
pub struct MotionSession<C: RtdeConnector> {
    config: MotionConfig,
    connector: C,
    backend: Option<Backend>,
}

impl<C: RtdeConnector> MotionSession<C> {
    pub fn new(config: MotionConfig, connector: C) -> Self {
        Self {
            config,
            connector,
            backend: None,
        }
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn is_connected(&self) -> bool {
        self.backend.is_some()
    }

    /// Opens the backend, retrying up to `max_attempts` times with `retry_delay`
    /// between attempts. Each failed attempt is logged. Does nothing when the
    /// session is already connected.
    pub async fn connect(&mut self) -> Result<(), RobotError> {
        if self.is_connected() {
            debug!(addr = %self.config.addr, "Already connected");
            return Ok(());
        }
        self.config.validate()?;

        let max_attempts = self.config.max_attempts;
        let mut last_error = None;
        for attempt in 1..=max_attempts {
            match Backend::open(&self.connector, &self.config.addr).await {
                Ok(backend) => {
                    self.backend = Some(backend);
                    info!(addr = %self.config.addr, attempt, "Connected to robot");
                    return Ok(());
                }
                Err(e) => {
                    error!(addr = %self.config.addr, attempt, "Attempt {} failed: {}", attempt, e);
                    log_register_conflict(&e);
                    last_error = Some(e);
                    if attempt < max_attempts {
                        sleep(self.config.retry_delay()).await;
                    }
                }
            }
        }

        error!(addr = %self.config.addr, "Max retries reached. Unable to connect to the robot");
        Err(RobotError::Connection {
            endpoint: self.config.addr.clone(),
            reason: match last_error {
                Some(e) => format!("{} attempts failed, last error: {}", max_attempts, e),
                None => format!("{} attempts failed", max_attempts),
            },
        })
    }

    /// Stops the control script and releases all backend interfaces.
    ///
    /// The interfaces are released even when `stopScript` fails.
    pub async fn disconnect(&mut self) -> Result<(), RobotError> {
        let Some(mut backend) = self.backend.take() else {
            warn!(addr = %self.config.addr, "Disconnect requested but the session is not connected");
            return Err(RobotError::not_connected("stop script"));
        };

        let result = backend.control.stop_script().await;
        if let Err(e) = backend.control.disconnect().await {
            warn!(addr = %self.config.addr, "control disconnect: {}", e);
        }
        if let Err(e) = backend.receive.disconnect().await {
            warn!(addr = %self.config.addr, "receive disconnect: {}", e);
        }
        if let Err(e) = backend.io.disconnect().await {
            warn!(addr = %self.config.addr, "io disconnect: {}", e);
        }
        drop(backend);

        info!(addr = %self.config.addr, "Stopped connection with robot");
        self.report("stopScript", result)
    }

    /// Sets the tool center point offset relative to the flange.
    pub async fn set_tool_frame(&mut self, tool_frame: &Pose) -> Result<(), RobotError> {
        let backend = self.backend_mut("setTcp")?;
        let result = backend.control.set_tcp(tool_frame).await;
        self.report("setTcp", result)
    }

    /// Sets the payload mass (kg) and its center of gravity (m, flange frame).
    pub async fn set_payload(&mut self, mass: f64, center_of_gravity: &Vec3) -> Result<(), RobotError> {
        let backend = self.backend_mut("setPayload")?;
        let result = backend.control.set_payload(mass, center_of_gravity).await;
        self.report("setPayload", result)
    }

    pub async fn set_digital_output(&mut self, pin: u8, state: bool) -> Result<(), RobotError> {
        let backend = self.backend_mut("setStandardDigitalOut")?;
        let result = backend.io.set_standard_digital_out(pin, state).await;
        self.report("setStandardDigitalOut", result)?;
        info!(pin, state, "Digital output {} is {}", pin, state);
        Ok(())
    }

    /// Sets `pin` high, waits `duration`, then sets it low.
    ///
    /// The low step runs even if the high step failed; the first failure is
    /// returned. The calling task is held for the whole duration. If the future
    /// is dropped during the wait the pin is left high.
    pub async fn pulse_digital_output(&mut self, pin: u8, duration: Duration) -> Result<(), RobotError> {
        let high = self.set_digital_output(pin, true).await;
        if let Err(RobotError::NotConnected { .. }) = high {
            return high;
        }
        sleep(duration).await;
        let low = self.set_digital_output(pin, false).await;
        high.and(low)
    }

    pub async fn move_linear(&mut self, pose: &Pose, speed: f64, acceleration: f64) -> Result<(), RobotError> {
        let backend = self.backend_mut("moveL")?;
        let result = backend.control.move_l(pose, speed, acceleration).await;
        self.report("moveL", result)?;
        debug!(?pose, speed, acceleration, "moveL accepted");
        Ok(())
    }

    /// Moves through a blended sequence of linear waypoints.
    pub async fn move_linear_path(&mut self, path: &[PathWaypoint]) -> Result<(), RobotError> {
        let backend = self.backend_mut("moveL path")?;
        let result = backend.control.move_l_path(path).await;
        self.report("moveL path", result)?;
        debug!(waypoints = path.len(), "moveL path accepted");
        Ok(())
    }

    pub async fn move_joint(
        &mut self,
        joints: &JointPositions,
        speed: f64,
        acceleration: f64,
    ) -> Result<(), RobotError> {
        let backend = self.backend_mut("moveJ")?;
        let result = backend.control.move_j(joints, speed, acceleration).await;
        self.report("moveJ", result)?;
        debug!(?joints, speed, acceleration, "moveJ accepted");
        Ok(())
    }

    /// Linear move to the current TCP pose plus `delta`, added per component.
    /// Nothing is moved if the current pose cannot be read.
    pub async fn move_linear_relative(
        &mut self,
        delta: &Pose,
        speed: f64,
        acceleration: f64,
    ) -> Result<(), RobotError> {
        let current = self.actual_tcp_pose().await?;
        let target = add_relative(&current, delta);
        self.move_linear(&target, speed, acceleration).await
    }

    /// Joint move to the current joint positions plus `delta`.
    /// Nothing is moved if the current joint positions cannot be read.
    pub async fn move_joint_relative(
        &mut self,
        delta: &JointPositions,
        speed: f64,
        acceleration: f64,
    ) -> Result<(), RobotError> {
        let current = self.actual_joint_positions().await?;
        let target = add_relative_joints(&current, delta);
        self.move_joint(&target, speed, acceleration).await
    }

    /// Linear move that keeps the current translation and replaces the rotation
    /// vector with `(rx, ry, rz)` radians. The previous rotation is discarded,
    /// not composed with.
    pub async fn set_tcp_rotation(
        &mut self,
        rx: f64,
        ry: f64,
        rz: f64,
        speed: f64,
        acceleration: f64,
    ) -> Result<(), RobotError> {
        let current = self.actual_tcp_pose().await?;
        let target = current.with_rotation(rx, ry, rz);
        self.move_linear(&target, speed, acceleration).await
    }

    pub async fn actual_tcp_pose(&mut self) -> Result<Pose, RobotError> {
        let backend = self.backend_mut("getActualTCPPose")?;
        let result = backend.receive.actual_tcp_pose().await;
        self.report("getActualTCPPose", result)
    }

    pub async fn actual_joint_positions(&mut self) -> Result<JointPositions, RobotError> {
        let backend = self.backend_mut("getActualQ")?;
        let result = backend.receive.actual_q().await;
        self.report("getActualQ", result)
    }

    /// Standard digital inputs as a bit mask, input 0 in the lowest bit.
    pub async fn digital_input_bits(&mut self) -> Result<u64, RobotError> {
        let backend = self.backend_mut("getActualDigitalInputBits")?;
        let result = backend.receive.actual_digital_input_bits().await;
        self.report("getActualDigitalInputBits", result)
    }

    fn backend_mut(&mut self, command: &str) -> Result<&mut Backend, RobotError> {
        match self.backend.as_mut() {
            Some(backend) => Ok(backend),
            None => {
                error!(addr = %self.config.addr, command, "Not connected to robot");
                Err(RobotError::not_connected(command))
            }
        }
    }

    fn report<T>(&self, command: &str, result: Result<T, BackendError>) -> Result<T, RobotError> {
        result.map_err(|e| {
            error!(addr = %self.config.addr, command, "Backend rejected {}: {}", command, e);
            log_register_conflict(&e);
            RobotError::BackendCommand {
                command: command.to_string(),
                reason: e.to_string(),
            }
        })
    }
}

fn log_register_conflict(e: &BackendError) {
    if e.is_register_conflict() {
        error!("RTDE register conflict: remove the conflicting URCap and reboot the controller");
    }
}

impl<C: RtdeConnector + std::fmt::Debug> std::fmt::Debug for MotionSession<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MotionSession")
            .field("config", &self.config)
            .field("connector", &self.connector)
            .field("connected", &self.is_connected())
            .finish()
    }
}
