use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use ur_control::drivers::{DashboardCommand, BRAKE_RELEASE_CONFIRMATION};

pub const GREETING: &str = "Connected: Universal Robots Dashboard Server\n";

/// Robot modes reported by `robotmode`, in power-up order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RobotMode {
    #[default]
    PowerOff,
    Idle,
    Running,
}

impl RobotMode {
    fn as_str(&self) -> &'static str {
        match self {
            RobotMode::PowerOff => "POWER_OFF",
            RobotMode::Idle => "IDLE",
            RobotMode::Running => "RUNNING",
        }
    }
}

/// Answers a single dashboard command line and updates the mode.
pub fn respond(mode: &mut RobotMode, line: &str) -> String {
    match DashboardCommand::parse(line) {
        Some(DashboardCommand::PowerOn) => {
            if *mode == RobotMode::PowerOff {
                *mode = RobotMode::Idle;
            }
            "Powering on\n".to_string()
        }
        Some(DashboardCommand::PowerOff) => {
            *mode = RobotMode::PowerOff;
            "Powering off\n".to_string()
        }
        Some(DashboardCommand::BrakeRelease) => match *mode {
            RobotMode::PowerOff => "Brake release failed: robot is powered off\n".to_string(),
            _ => {
                *mode = RobotMode::Running;
                format!("{}\n", BRAKE_RELEASE_CONFIRMATION)
            }
        },
        Some(DashboardCommand::RobotMode) => format!("Robotmode: {}\n", mode.as_str()),
        None => format!("could not understand: '{}'\n", line.trim()),
    }
}

/// TCP server speaking the dashboard protocol. The robot mode is shared by all
/// connections, like on a real controller.
pub struct DashboardSimulator {
    listener: TcpListener,
    mode: Arc<Mutex<RobotMode>>,
}

impl DashboardSimulator {
    pub async fn bind(addr: &str) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            mode: Arc::new(Mutex::new(RobotMode::default())),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn mode(&self) -> Arc<Mutex<RobotMode>> {
        Arc::clone(&self.mode)
    }

    /// Accepts connections forever, one task per client.
    pub async fn run(self) {
        loop {
            let (socket, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    continue;
                }
            };
            info!(%peer, "dashboard client connected");

            let mode = Arc::clone(&self.mode);
            tokio::spawn(async move {
                if let Err(e) = handle_client(socket, mode).await {
                    warn!(%peer, "dashboard client error: {}", e);
                }
                info!(%peer, "dashboard client disconnected");
            });
        }
    }
}

async fn handle_client(
    mut socket: TcpStream,
    mode: Arc<Mutex<RobotMode>>,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    socket.write_all(GREETING.as_bytes()).await?;

    let mut buffer = vec![0; 1024];
    let mut temp_buffer = Vec::new();
    loop {
        let n = socket.read(&mut buffer).await?;
        if n == 0 {
            return Ok(());
        }
        temp_buffer.extend_from_slice(&buffer[..n]);

        while let Some(pos) = temp_buffer.iter().position(|&x| x == b'\n') {
            let request: Vec<u8> = temp_buffer.drain(..=pos).collect();
            let request = String::from_utf8_lossy(&request[..request.len() - 1]).to_string();

            let response = {
                let mut mode = mode.lock().await;
                respond(&mut mode, &request)
            };
            info!("{:?} -> {:?}", request.trim(), response.trim());
            socket.write_all(response.as_bytes()).await?;
        }
    }
}
