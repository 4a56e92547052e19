//! Capability interfaces of the real-time (RTDE) backend.
//!
//! The session never talks to the controller's real-time port itself. It asks an
//! [`RtdeConnector`] for the three interfaces below and drives them. Hardware
//! clients, the simulator and test doubles all plug in here.

use async_trait::async_trait;

use crate::{BackendError, JointPositions, PathWaypoint, Pose, Vec3};

/// Motion commands, script control and tool configuration.
#[async_trait]
pub trait RtdeControl: Send {
    async fn move_l(&mut self, pose: &Pose, speed: f64, acceleration: f64) -> Result<(), BackendError>;

    async fn move_l_path(&mut self, path: &[PathWaypoint]) -> Result<(), BackendError>;

    async fn move_j(&mut self, joints: &JointPositions, speed: f64, acceleration: f64) -> Result<(), BackendError>;

    async fn set_tcp(&mut self, tool_frame: &Pose) -> Result<(), BackendError>;

    async fn set_payload(&mut self, mass: f64, center_of_gravity: &Vec3) -> Result<(), BackendError>;

    async fn stop_script(&mut self) -> Result<(), BackendError>;

    async fn disconnect(&mut self) -> Result<(), BackendError> {
        Ok(())
    }
}

/// Robot state as streamed by the controller.
#[async_trait]
pub trait RtdeReceive: Send {
    async fn actual_tcp_pose(&mut self) -> Result<Pose, BackendError>;

    async fn actual_q(&mut self) -> Result<JointPositions, BackendError>;

    async fn actual_digital_input_bits(&mut self) -> Result<u64, BackendError>;

    async fn disconnect(&mut self) -> Result<(), BackendError> {
        Ok(())
    }
}

/// Output side of the controller IO.
#[async_trait]
pub trait RtdeIo: Send {
    async fn set_standard_digital_out(&mut self, pin: u8, state: bool) -> Result<(), BackendError>;

    async fn disconnect(&mut self) -> Result<(), BackendError> {
        Ok(())
    }
}

/// Builds the backend interfaces for a controller address.
///
/// Each call opens a fresh interface. A failure leaves nothing behind that the
/// caller has to clean up.
#[async_trait]
pub trait RtdeConnector: Send + Sync {
    async fn control(&self, addr: &str) -> Result<Box<dyn RtdeControl>, BackendError>;

    async fn receive(&self, addr: &str) -> Result<Box<dyn RtdeReceive>, BackendError>;

    async fn io(&self, addr: &str) -> Result<Box<dyn RtdeIo>, BackendError>;
}

/// The three interfaces of one live backend session. They are created together
/// and dropped together.
pub struct Backend {
    pub(crate) control: Box<dyn RtdeControl>,
    pub(crate) receive: Box<dyn RtdeReceive>,
    pub(crate) io: Box<dyn RtdeIo>,
}

impl Backend {
    /// Opens control, receive and IO in that order. If one of them fails the
    /// ones already opened are dropped and the error is returned.
    pub async fn open<C: RtdeConnector + ?Sized>(connector: &C, addr: &str) -> Result<Self, BackendError> {
        let control = connector.control(addr).await?;
        let receive = connector.receive(addr).await?;
        let io = connector.io(addr).await?;
        Ok(Self { control, receive, io })
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend").finish_non_exhaustive()
    }
}
