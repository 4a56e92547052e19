// Moves the tool 1 cm up (base Z) with a linear move.
// Runs against the in-process simulated robot.
// Run with: cargo run -p example --bin move_test

use std::time::Duration;

use example::{config_from_args, init_logging};
use sim::SimulatedRobot;
use tokio::time::sleep;
use tracing::{error, info};
use ur_control::drivers::MotionSession;
use ur_control::{Pose, RobotError};

#[tokio::main]
async fn main() -> Result<(), RobotError> {
    init_logging();
    let config = config_from_args()?;
    let mut robot = MotionSession::new(config.motion, SimulatedRobot::default());
    robot.connect().await?;

    let result = move_up(&mut robot).await;
    if let Err(e) = &result {
        error!("move test failed: {}", e);
    }

    robot.disconnect().await?;
    result
}

async fn move_up(robot: &mut MotionSession<SimulatedRobot>) -> Result<(), RobotError> {
    let current = robot.actual_tcp_pose().await?;
    info!("Current pose (X,Y,Z,Rx,Ry,Rz): {:?}", current.to_array());

    // slow on purpose
    robot
        .move_linear_relative(&Pose::new(0.0, 0.0, 0.01, 0.0, 0.0, 0.0), 0.1, 0.1)
        .await?;
    sleep(Duration::from_secs(1)).await;

    info!("Move complete: {:?}", robot.actual_tcp_pose().await?.to_array());
    Ok(())
}
