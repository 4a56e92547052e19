//! Recording stand-in for the RTDE backend.
//!
//! Every call is appended to a shared log and answered from a script, so tests
//! can assert what the session sent without hardware.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::time::Instant;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use ur_control::drivers::{RtdeConnector, RtdeControl, RtdeIo, RtdeReceive};
use ur_control::{BackendError, JointPositions, PathWaypoint, Pose, Vec3};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    MoveL(Pose, f64, f64),
    MoveLPath(Vec<PathWaypoint>),
    MoveJ(JointPositions, f64, f64),
    SetTcp(Pose),
    SetPayload(f64, Vec3),
    StopScript,
    SetDigitalOut(u8, bool),
}

#[derive(Debug, Default)]
pub struct FakeState {
    /// Number of upcoming connect attempts whose receive interface fails to open.
    pub failing_attempts: u32,
    pub control_opened: u32,
    pub receive_attempts: u32,
    /// Interfaces currently alive (opened and not yet dropped).
    pub live_interfaces: i32,
    pub tcp_pose: Option<Pose>,
    pub joints: Option<JointPositions>,
    pub input_bits: Option<u64>,
    pub rejected: HashSet<&'static str>,
    pub calls: Vec<Call>,
    pub outputs: Vec<(u8, bool, Instant)>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeConnector {
    pub state: Arc<Mutex<FakeState>>,
}

impl FakeConnector {
    pub fn new() -> Self {
        let connector = Self::default();
        {
            let mut state = connector.state.lock().unwrap();
            state.tcp_pose = Some(Pose::default());
            state.joints = Some(JointPositions::default());
            state.input_bits = Some(0);
        }
        connector
    }

    pub fn failing_first(self, attempts: u32) -> Self {
        self.state.lock().unwrap().failing_attempts = attempts;
        self
    }

    pub fn with_tcp_pose(self, pose: Option<Pose>) -> Self {
        self.state.lock().unwrap().tcp_pose = pose;
        self
    }

    pub fn with_joints(self, joints: Option<JointPositions>) -> Self {
        self.state.lock().unwrap().joints = joints;
        self
    }

    pub fn rejecting(self, command: &'static str) -> Self {
        self.state.lock().unwrap().rejected.insert(command);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn outputs(&self) -> Vec<(u8, bool, Instant)> {
        self.state.lock().unwrap().outputs.clone()
    }

    pub fn live_interfaces(&self) -> i32 {
        self.state.lock().unwrap().live_interfaces
    }

    pub fn receive_attempts(&self) -> u32 {
        self.state.lock().unwrap().receive_attempts
    }

    fn handle(&self) -> Handle {
        self.state.lock().unwrap().live_interfaces += 1;
        Handle {
            state: self.state.clone(),
        }
    }
}

/// Shared by the three fake interfaces; counts itself out when dropped.
#[derive(Debug)]
pub struct Handle {
    state: Arc<Mutex<FakeState>>,
}

impl Handle {
    fn record(&self, command: &'static str, call: Call) -> Result<(), BackendError> {
        let mut state = self.state.lock().unwrap();
        if state.rejected.contains(command) {
            return Err(BackendError::new(format!("{} rejected by fake", command)));
        }
        state.calls.push(call);
        Ok(())
    }

    fn read<T>(&self, command: &'static str, pick: impl FnOnce(&FakeState) -> Option<T>) -> Result<T, BackendError> {
        let state = self.state.lock().unwrap();
        if state.rejected.contains(command) {
            return Err(BackendError::new(format!("{} rejected by fake", command)));
        }
        pick(&state).ok_or_else(|| BackendError::new(format!("{} unavailable", command)))
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.live_interfaces -= 1;
        }
    }
}

#[async_trait]
impl RtdeControl for Handle {
    async fn move_l(&mut self, pose: &Pose, speed: f64, acceleration: f64) -> Result<(), BackendError> {
        self.record("moveL", Call::MoveL(*pose, speed, acceleration))
    }

    async fn move_l_path(&mut self, path: &[PathWaypoint]) -> Result<(), BackendError> {
        self.record("moveL path", Call::MoveLPath(path.to_vec()))
    }

    async fn move_j(&mut self, joints: &JointPositions, speed: f64, acceleration: f64) -> Result<(), BackendError> {
        self.record("moveJ", Call::MoveJ(*joints, speed, acceleration))
    }

    async fn set_tcp(&mut self, tool_frame: &Pose) -> Result<(), BackendError> {
        self.record("setTcp", Call::SetTcp(*tool_frame))
    }

    async fn set_payload(&mut self, mass: f64, center_of_gravity: &Vec3) -> Result<(), BackendError> {
        self.record("setPayload", Call::SetPayload(mass, *center_of_gravity))
    }

    async fn stop_script(&mut self) -> Result<(), BackendError> {
        self.record("stopScript", Call::StopScript)
    }
}

#[async_trait]
impl RtdeReceive for Handle {
    async fn actual_tcp_pose(&mut self) -> Result<Pose, BackendError> {
        self.read("getActualTCPPose", |s| s.tcp_pose)
    }

    async fn actual_q(&mut self) -> Result<JointPositions, BackendError> {
        self.read("getActualQ", |s| s.joints)
    }

    async fn actual_digital_input_bits(&mut self) -> Result<u64, BackendError> {
        self.read("getActualDigitalInputBits", |s| s.input_bits)
    }
}

#[async_trait]
impl RtdeIo for Handle {
    async fn set_standard_digital_out(&mut self, pin: u8, state: bool) -> Result<(), BackendError> {
        self.record("setStandardDigitalOut", Call::SetDigitalOut(pin, state))?;
        self.state.lock().unwrap().outputs.push((pin, state, Instant::now()));
        Ok(())
    }
}

#[async_trait]
impl RtdeConnector for FakeConnector {
    async fn control(&self, _addr: &str) -> Result<Box<dyn RtdeControl>, BackendError> {
        self.state.lock().unwrap().control_opened += 1;
        Ok(Box::new(self.handle()))
    }

    async fn receive(&self, _addr: &str) -> Result<Box<dyn RtdeReceive>, BackendError> {
        {
            let mut state = self.state.lock().unwrap();
            state.receive_attempts += 1;
            if state.failing_attempts > 0 {
                state.failing_attempts -= 1;
                return Err(BackendError::new("receive interface refused connection"));
            }
        }
        Ok(Box::new(self.handle()))
    }

    async fn io(&self, _addr: &str) -> Result<Box<dyn RtdeIo>, BackendError> {
        Ok(Box::new(self.handle()))
    }
}

/// Routes library logs to the test harness output. Safe to call from every test.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

/// Counts ERROR events emitted while installed as the thread's default subscriber.
#[derive(Clone, Default)]
pub struct ErrorCounter(Arc<AtomicUsize>);

impl ErrorCounter {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    /// Installs the counter for the current thread until the guard is dropped.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        tracing_subscriber::registry().with(self.clone()).set_default()
    }
}

impl<S: tracing::Subscriber> Layer<S> for ErrorCounter {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == tracing::Level::ERROR {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}
