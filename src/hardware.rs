use crate::error::PhotoinoError;
use crate::instrument::Instrument;
use crate::line_protocol::{decode_reply, Command, ProtocolError};
use crate::transport::{PortOpener, SerialPortOpener, SerialTransport};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BAUD_RATE: u32 = 115_200;
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Static configuration of a hardware-backed instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareConfig {
    /// Serial device path. Empty selects the first candidate port.
    pub port: String,
    /// Zero selects [`DEFAULT_BAUD_RATE`].
    pub baud_rate: u32,
    /// Per-byte read timeout in milliseconds.
    pub read_timeout_ms: u64,
    /// Candidate device paths, usually from [`crate::discovery::candidate_ports`].
    pub candidate_ports: Vec<String>,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout_ms: DEFAULT_READ_TIMEOUT.as_millis() as u64,
            candidate_ports: Vec::new(),
        }
    }
}

impl HardwareConfig {
    pub fn new(port: &str, baud_rate: u32) -> Self {
        Self {
            port: port.to_string(),
            baud_rate,
            ..Self::default()
        }
    }

    pub fn with_candidate_ports(mut self, candidate_ports: Vec<String>) -> Self {
        self.candidate_ports = candidate_ports;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

struct Connection {
    port: String,
    baud_rate: u32,
    transport: Box<dyn SerialTransport>,
}

/// Driver for a photoino attached over a serial link.
///
/// Holds no cached instrument state: every getter queries the device.
pub struct HardwareDriver {
    config: HardwareConfig,
    opener: Box<dyn PortOpener>,
    connection: Option<Connection>,
}

impl std::fmt::Debug for HardwareDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HardwareDriver")
            .field("config", &self.config)
            .field("port", &self.port())
            .field("baud_rate", &self.baud_rate())
            .finish_non_exhaustive()
    }
}

impl HardwareDriver {
    pub fn new(config: HardwareConfig) -> Self {
        Self::with_opener(config, SerialPortOpener)
    }

    /// Use `opener` instead of the `serialport` crate to reach the device.
    pub fn with_opener(config: HardwareConfig, opener: impl PortOpener + 'static) -> Self {
        Self {
            config,
            opener: Box::new(opener),
            connection: None,
        }
    }

    pub fn config(&self) -> &HardwareConfig {
        &self.config
    }

    /// Path of the open connection, if any.
    pub fn port(&self) -> Option<&str> {
        self.connection.as_ref().map(|c| c.port.as_str())
    }

    pub fn baud_rate(&self) -> Option<u32> {
        self.connection.as_ref().map(|c| c.baud_rate)
    }

    /// Open using the port and baud rate from the configuration.
    pub fn open_configured(&mut self) -> Result<(), PhotoinoError> {
        let port = self.config.port.clone();
        let baud_rate = self.config.baud_rate;
        self.open(&port, baud_rate)
    }

    fn resolve_port(&self, port: &str) -> Result<String, PhotoinoError> {
        if !port.is_empty() {
            return Ok(port.to_string());
        }
        self.config
            .candidate_ports
            .first()
            .cloned()
            .ok_or(PhotoinoError::NoCandidatePort)
    }

    fn transport(&mut self) -> Result<&mut dyn SerialTransport, PhotoinoError> {
        match self.connection.as_mut() {
            Some(connection) => Ok(connection.transport.as_mut()),
            None => Err(PhotoinoError::NotConnected),
        }
    }

    fn send(&mut self, command: Command) -> Result<(), PhotoinoError> {
        let transport = self.transport()?;
        log::debug!("Sending {:?}", command);
        transport
            .write_bytes(&command.encode())
            .map_err(ProtocolError::from)?;
        Ok(())
    }

    fn query(&mut self, command: Command) -> Result<u64, PhotoinoError> {
        let span = tracing::trace_span!("photoino_query", command = command.name());
        let _guard = span.enter();

        let transport = self.transport()?;
        log::debug!("Sending {:?}", command);
        transport
            .write_bytes(&command.encode())
            .map_err(ProtocolError::from)?;

        let value = decode_reply(transport)?;
        log::trace!("{} -> {}", command.name(), value);
        Ok(value)
    }
}

impl Instrument for HardwareDriver {
    fn open(&mut self, port: &str, baud_rate: u32) -> Result<(), PhotoinoError> {
        if self.connection.is_some() {
            log::debug!("Connection already open, closing it before reopening");
            self.close();
        }

        let port = self.resolve_port(port)?;
        let baud_rate = if baud_rate == 0 {
            DEFAULT_BAUD_RATE
        } else {
            baud_rate
        };

        log::debug!("Connecting to photoino on {} at {} baud", port, baud_rate);
        let transport = self
            .opener
            .open(&port, baud_rate, self.config.read_timeout())
            .map_err(|source| PhotoinoError::Connection {
                port: port.clone(),
                source,
            })?;

        self.connection = Some(Connection {
            port,
            baud_rate,
            transport,
        });
        Ok(())
    }

    fn close(&mut self) {
        if self.connection.is_none() {
            return;
        }
        if let Err(e) = self.send(Command::Stop) {
            log::warn!("Ignoring failure to stop acquisition during close: {}", e);
        }
        if let Some(connection) = self.connection.take() {
            log::debug!("Closed connection to {}", connection.port);
        }
    }

    fn is_open(&self) -> bool {
        self.connection.is_some()
    }

    fn start(&mut self) -> Result<(), PhotoinoError> {
        self.send(Command::Start)
    }

    fn stop(&mut self) -> Result<(), PhotoinoError> {
        self.send(Command::Stop)
    }

    fn count_rate(&mut self) -> Result<u64, PhotoinoError> {
        self.query(Command::QueryRate)
    }

    fn time_base(&mut self) -> Result<f64, PhotoinoError> {
        Ok(self.query(Command::QueryTimeBase)? as f64)
    }

    fn set_time_base(&mut self, value: f64) -> Result<(), PhotoinoError> {
        self.send(Command::SetTimeBase(value))
    }

    fn trigger_level(&mut self) -> Result<f64, PhotoinoError> {
        Ok(self.query(Command::QueryLevel)? as f64)
    }

    fn set_trigger_level(&mut self, value: f64) -> Result<(), PhotoinoError> {
        self.send(Command::SetLevel(value))
    }
}

impl Drop for HardwareDriver {
    fn drop(&mut self) {
        self.close();
    }
}
