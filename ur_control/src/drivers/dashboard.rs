use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tracing::{error, info, warn};

use super::{BrakeStatus, DashboardCommand, DashboardConfig, DashboardState, PowerOnReport};
use crate::RobotError;

/// Client for the controller's dashboard server.
///
/// The dashboard speaks a line based text protocol: the server greets first,
/// then answers every newline terminated command with one text frame.
///
/// Most callers only need [`DashboardClient::power_on_and_release_brakes`], which
/// runs the whole power-on sequence and always closes the connection. The
/// step-wise methods are there for anything else.
///
/// ```rust,ignore
/// let config = DashboardConfig::new("192.168.1.10".to_string());
/// let report = DashboardClient::power_on_and_release_brakes(config).await?;
/// if !report.brakes_released() {
///     println!("check the teach pendant: {}", report.brake_response);
/// }
/// ```
#[derive(Debug)]
pub struct DashboardClient {
    config: DashboardConfig,
    stream: Option<TcpStream>,
    state: DashboardState,
}

impl DashboardClient {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            stream: None,
            state: DashboardState::Disconnected,
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    pub fn endpoint(&self) -> String {
        self.config.connection_url()
    }

    /// Powers the arm on and releases its brakes.
    ///
    /// Steps: connect, read the greeting, `power on`, wait for the power stage to
    /// settle, `brake release`. Connection and I/O failures abort the remaining
    /// steps. A `brake release` reply without the confirmation text is not an
    /// error: the report carries [`BrakeStatus::NotConfirmed`]. The connection is
    /// closed on every path.
    pub async fn power_on_and_release_brakes(config: DashboardConfig) -> Result<PowerOnReport, RobotError> {
        let mut client = Self::new(config);
        let result = client.run_power_on().await;
        client.close().await;
        result
    }

    async fn run_power_on(&mut self) -> Result<PowerOnReport, RobotError> {
        let greeting = self.connect().await?;
        let power_on_response = self.send_command(DashboardCommand::PowerOn).await?;
        self.state = DashboardState::PoweredOn;

        sleep(self.config.settle_delay()).await;

        let brake_response = self.send_command(DashboardCommand::BrakeRelease).await?;
        let brake_status = BrakeStatus::from_response(&brake_response);
        match brake_status {
            BrakeStatus::Released => {
                self.state = DashboardState::BrakesReleased;
                info!(endpoint = %self.endpoint(), "Robot powered on and brakes released");
            }
            BrakeStatus::NotConfirmed => {
                let mismatch = RobotError::ProtocolMismatch {
                    command: DashboardCommand::BrakeRelease.to_string(),
                    expected: super::BRAKE_RELEASE_CONFIRMATION.to_string(),
                    response: brake_response.trim().to_string(),
                };
                warn!(endpoint = %self.endpoint(), "{}. Check robot state, brakes may not have released", mismatch);
            }
        }

        Ok(PowerOnReport {
            greeting,
            power_on_response,
            brake_response,
            brake_status,
            final_state: self.state.clone(),
        })
    }

    /// Opens the connection and consumes the greeting, which is returned.
    pub async fn connect(&mut self) -> Result<String, RobotError> {
        if let Err(e) = self.config.validate() {
            return Err(self.fail(e));
        }
        let endpoint = match self.config.resolve() {
            Ok(resolved) => resolved,
            Err(e) => {
                return Err(self.fail(RobotError::Connection {
                    endpoint: self.endpoint(),
                    reason: e.to_string(),
                }))
            }
        };
        info!(endpoint = %endpoint, "Connecting to dashboard server");

        let stream = match timeout(self.config.connect_timeout(), TcpStream::connect(&endpoint)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return Err(self.fail(RobotError::Connection {
                    endpoint,
                    reason: e.to_string(),
                }))
            }
            Err(_) => {
                return Err(self.fail(RobotError::Connection {
                    endpoint,
                    reason: format!("timed out after {:?}", self.config.connect_timeout()),
                }))
            }
        };
        self.stream = Some(stream);

        let greeting = self.read_frame("greeting").await?;
        info!(endpoint = %endpoint, "Robot says: {}", greeting.trim());
        self.state = DashboardState::Connected;
        Ok(greeting)
    }

    /// Sends one command and returns the reply frame.
    pub async fn send_command(&mut self, command: DashboardCommand) -> Result<String, RobotError> {
        let line = command.line();
        info!(endpoint = %self.endpoint(), "Sending: {}", command);
        self.write_line(&line, command.as_str()).await?;

        let response = self.read_frame(command.as_str()).await?;
        info!(endpoint = %self.endpoint(), "Robot says: {}", response.trim());
        Ok(response)
    }

    /// Shuts the connection down. Safe to call when already closed.
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                warn!(endpoint = %self.endpoint(), "shutdown: {}", e);
            }
            info!(endpoint = %self.endpoint(), "Connection closed");
        }
        if !matches!(self.state, DashboardState::Failed(_)) {
            self.state = DashboardState::Disconnected;
        }
    }

    async fn write_line(&mut self, line: &str, operation: &str) -> Result<(), RobotError> {
        let endpoint = self.endpoint();
        let stream = match self.stream.as_mut() {
            Some(stream) => stream,
            None => return Err(RobotError::not_connected(format!("send {}", operation))),
        };

        let result = timeout(self.config.read_timeout(), stream.write_all(line.as_bytes())).await;
        match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(self.fail(RobotError::Io {
                endpoint,
                operation: format!("sending {}", operation),
                reason: e.to_string(),
            })),
            Err(_) => Err(self.fail(RobotError::Timeout {
                endpoint,
                operation: format!("sending {}", operation),
            })),
        }
    }

    /// Reads a single response frame of at most `buffer_size` bytes.
    async fn read_frame(&mut self, operation: &str) -> Result<String, RobotError> {
        let endpoint = self.endpoint();
        let mut buffer = vec![0; self.config.buffer_size];
        let stream = match self.stream.as_mut() {
            Some(stream) => stream,
            None => return Err(RobotError::not_connected(format!("read {}", operation))),
        };

        let result = timeout(self.config.read_timeout(), stream.read(&mut buffer)).await;
        match result {
            Ok(Ok(0)) => Err(self.fail(RobotError::Disconnected { endpoint })),
            Ok(Ok(n)) => Ok(decode_latin1(&buffer[..n])),
            Ok(Err(e)) => Err(self.fail(RobotError::Io {
                endpoint,
                operation: format!("reading {} response", operation),
                reason: e.to_string(),
            })),
            Err(_) => Err(self.fail(RobotError::Timeout {
                endpoint,
                operation: format!("reading {} response", operation),
            })),
        }
    }

    fn fail(&mut self, err: RobotError) -> RobotError {
        error!(endpoint = %self.endpoint(), "{}", err);
        self.state = DashboardState::Failed(err.to_string());
        err
    }
}

/// Decodes controller text byte for byte. Firmware output is not guaranteed to be
/// UTF-8, and Latin-1 maps every byte to a char, so decoding never fails.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}
