// End-to-end demo against the in-process simulator: dashboard power-on, then a
// short motion and IO sequence.
// Run with: cargo run -p example

use std::time::Duration;

use example::init_logging;
use sim::{DashboardSimulator, SimulatedRobot};
use tracing::{error, info, warn};
use ur_control::drivers::{DashboardClient, DashboardConfig, MotionConfig, MotionSession};
use ur_control::{JointPositions, PathWaypoint, Pose, RobotError, Vec3};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_logging();

    let dashboard = DashboardSimulator::bind("127.0.0.1:0").await?;
    let dashboard_addr = dashboard.local_addr()?;
    tokio::spawn(dashboard.run());

    let dashboard_config = DashboardConfig {
        port: dashboard_addr.port(),
        settle_delay_ms: 500,
        ..DashboardConfig::new(dashboard_addr.ip().to_string())
    };
    let report = DashboardClient::power_on_and_release_brakes(dashboard_config).await?;
    if !report.brakes_released() {
        warn!("brakes not confirmed released: {}", report.brake_response.trim());
    }

    let robot = SimulatedRobot::default();
    let mut session = MotionSession::new(MotionConfig::new(dashboard_addr.ip().to_string()), robot.clone());
    session.connect().await?;
    info!("connected: {}", session.is_connected());

    let result = run_sequence(&mut session).await;
    if let Err(e) = &result {
        error!("sequence aborted: {}", e);
    }

    let state = robot.snapshot().await;
    info!(
        "final TCP pose {:?}, outputs {:?}",
        state.tcp_pose.to_array(),
        state.digital_outputs
    );

    session.disconnect().await?;
    result.map_err(Into::into)
}

async fn run_sequence(session: &mut MotionSession<SimulatedRobot>) -> Result<(), RobotError> {
    // 10 cm straight tool, 0.5 kg gripper
    session
        .set_tool_frame(&Pose::new(0.0, 0.0, 0.1, 0.0, 0.0, 0.0))
        .await?;
    session.set_payload(0.5, &Vec3::new(0.0, 0.0, 0.05)).await?;

    let start = session.actual_tcp_pose().await?;
    info!("start pose {:?}", start.to_array());

    session
        .set_tcp_rotation(std::f64::consts::PI, 0.0, 0.0, 0.25, 0.5)
        .await?;
    session
        .move_linear_relative(&Pose::new(0.0, 0.0, 0.05, 0.0, 0.0, 0.0), 0.1, 0.2)
        .await?;

    let corner = session.actual_tcp_pose().await?;
    let path: Vec<PathWaypoint> = [0.05, -0.05, 0.0]
        .into_iter()
        .map(|dx| PathWaypoint {
            pose: Pose { x: corner.x + dx, ..corner },
            speed: 0.1,
            acceleration: 0.2,
            blend: 0.01,
        })
        .collect();
    session.move_linear_path(&path).await?;

    let (speed, acceleration) = (session.config().default_speed, session.config().default_acceleration);
    session
        .move_joint_relative(&JointPositions([0.1, 0.0, 0.0, 0.0, 0.0, -0.1]), speed, acceleration)
        .await?;
    info!("joints {:?}", session.actual_joint_positions().await?.0);

    session.pulse_digital_output(0, Duration::from_millis(250)).await?;
    info!("digital inputs {:#010b}", session.digital_input_bits().await?);
    Ok(())
}
