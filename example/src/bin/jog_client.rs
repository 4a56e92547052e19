// Interactive step jogging against the simulated robot.
// Run with: cargo run -p example --bin jog_client

use std::error::Error;
use std::io::{self, Write};

use example::{config_from_args, init_logging};
use sim::SimulatedRobot;
use ur_control::drivers::MotionSession;
use ur_control::{compose_poses, Pose};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JogFrame {
    Base,
    Tool,
}

impl std::fmt::Display for JogFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JogFrame::Base => write!(f, "Base"),
            JogFrame::Tool => write!(f, "Tool"),
        }
    }
}

#[derive(Debug, Clone)]
struct JogConfig {
    speed: f64,         // m/s
    acceleration: f64,  // m/s^2
    step_distance: f64, // m
    frame: JogFrame,
}

impl Default for JogConfig {
    fn default() -> Self {
        Self {
            speed: 0.05,
            acceleration: 0.1,
            step_distance: 0.005,
            frame: JogFrame::Base,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_logging();
    println!("=== UR Interactive Jogging Client (simulated robot) ===\n");

    let robot_config = config_from_args()?;
    let mut robot = MotionSession::new(robot_config.motion, SimulatedRobot::default());
    robot.connect().await?;
    println!("\n✓ Connected to {}\n", robot.config().addr);

    let mut config = JogConfig::default();
    loop {
        display_status(&robot, &config).await;
        print_help();

        let input = prompt("\nCommand: ")?;
        let Some(cmd) = input.chars().next() else {
            continue;
        };

        match cmd {
            'q' => {
                println!("\nShutting down...");
                robot.disconnect().await?;
                break;
            }
            's' => match read_in_range("Enter jog speed (m/s): ", 0.0, 0.25) {
                Ok(speed) => config.speed = speed,
                Err(e) => println!("Error: {}", e),
            },
            'd' => match read_in_range("Enter step distance (m): ", 0.0, 0.1) {
                Ok(distance) => config.step_distance = distance,
                Err(e) => println!("Error: {}", e),
            },
            'm' => {
                config.frame = match config.frame {
                    JogFrame::Base => JogFrame::Tool,
                    JogFrame::Tool => JogFrame::Base,
                };
                println!("✓ Jog frame set to: {}", config.frame);
            }
            'j' | 'k' | 'h' | 'l' | 'f' | 'b' => {
                if let Err(e) = jog_step(&mut robot, cmd, &config).await {
                    println!("Jog error: {}", e);
                }
            }
            _ => println!("Unknown command: '{}'", cmd),
        }
    }

    println!("Disconnected.");
    Ok(())
}

async fn display_status(robot: &MotionSession<SimulatedRobot>, config: &JogConfig) {
    println!("\n╔════════════════════════════════════════╗");
    println!("║         JOGGING CONFIGURATION          ║");
    println!("╠════════════════════════════════════════╣");
    println!("║ Jog Speed:      {:>8.3} m/s          ║", config.speed);
    println!("║ Step Distance:  {:>8.4} m            ║", config.step_distance);
    println!("║ Jog Frame:      {:>12}           ║", config.frame);
    println!("║ Connected:      {:>12}           ║", robot.is_connected());
    println!("╚════════════════════════════════════════╝");
}

fn print_help() {
    println!("\n┌─────────────────────────────────────────┐");
    println!("│ MOTION CONTROLS:                        │");
    println!("│  k = Up    (+Z)    j = Down   (-Z)      │");
    println!("│  h = Left  (-Y)    l = Right  (+Y)      │");
    println!("│  f = Forward (+X)  b = Backward (-X)    │");
    println!("│                                         │");
    println!("│ CONFIGURATION:                          │");
    println!("│  s = Set jog speed                      │");
    println!("│  d = Set step distance                  │");
    println!("│  m = Toggle jog frame (Base/Tool)       │");
    println!("│                                         │");
    println!("│ OTHER:                                  │");
    println!("│  q = Quit                               │");
    println!("└─────────────────────────────────────────┘");
}

fn prompt(text: &str) -> io::Result<String> {
    print!("{}", text);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn read_in_range(text: &str, min: f64, max: f64) -> Result<f64, String> {
    let input = prompt(text).map_err(|e| e.to_string())?;
    let value: f64 = input.parse().map_err(|_| "Invalid number".to_string())?;
    if value <= min || value > max {
        return Err(format!("Value must be in ({}, {}]", min, max));
    }
    println!("✓ Set to {}", value);
    Ok(value)
}

fn direction_offset(key: char, distance: f64) -> Pose {
    match key {
        'k' => Pose { z: distance, ..Default::default() },
        'j' => Pose { z: -distance, ..Default::default() },
        'h' => Pose { y: -distance, ..Default::default() },
        'l' => Pose { y: distance, ..Default::default() },
        'f' => Pose { x: distance, ..Default::default() },
        'b' => Pose { x: -distance, ..Default::default() },
        _ => Pose::default(),
    }
}

fn direction_name(key: char) -> &'static str {
    match key {
        'k' => "Up (+Z)",
        'j' => "Down (-Z)",
        'h' => "Left (-Y)",
        'l' => "Right (+Y)",
        'f' => "Forward (+X)",
        'b' => "Backward (-X)",
        _ => "Unknown",
    }
}

async fn jog_step(
    robot: &mut MotionSession<SimulatedRobot>,
    key: char,
    config: &JogConfig,
) -> Result<(), ur_control::RobotError> {
    let offset = direction_offset(key, config.step_distance);
    match config.frame {
        JogFrame::Base => {
            robot
                .move_linear_relative(&offset, config.speed, config.acceleration)
                .await?;
        }
        // offset expressed along the tool axes
        JogFrame::Tool => {
            let current = robot.actual_tcp_pose().await?;
            let target = compose_poses(&current, &offset);
            robot.move_linear(&target, config.speed, config.acceleration).await?;
        }
    }

    let pose = robot.actual_tcp_pose().await?;
    println!(
        "→ Step {} ({:.4} m) now at [{:.4}, {:.4}, {:.4}]",
        direction_name(key),
        config.step_distance,
        pose.x,
        pose.y,
        pose.z
    );
    Ok(())
}
