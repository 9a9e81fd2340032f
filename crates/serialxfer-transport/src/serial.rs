use std::io::{self, Read, Write};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::ports::{available_ports, resolve_port, PortPolicy};
use crate::traits::Connection;

/// Link speed used when none is requested.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default I/O timeout handed to the serial driver.
///
/// Reads are only issued for bytes already buffered, so this effectively
/// bounds how long a single frame write may stall.
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_millis(50);

/// Parameters for opening a serial device.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Device path or shorthand name (`/dev/ttyUSB0`, `ttyUSB0`, `COM3`).
    pub port: String,
    /// Link speed in baud.
    pub baud_rate: u32,
    /// Whether the port must appear in the enumerated device list.
    pub policy: PortPolicy,
    /// Driver-level I/O timeout.
    pub io_timeout: Duration,
}

impl SerialConfig {
    /// Configuration for `port` with default speed and strict resolution.
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            policy: PortPolicy::default(),
            io_timeout: DEFAULT_IO_TIMEOUT,
        }
    }

    /// Override the link speed.
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Override the port resolution policy.
    pub fn policy(mut self, policy: PortPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// A [`Connection`] over an open serial device.
pub struct SerialConnection {
    port: Box<dyn serialport::SerialPort>,
    name: String,
    baud_rate: u32,
}

impl SerialConnection {
    /// Resolve the configured port name and open the device.
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let ports = match (available_ports(), config.policy) {
            (Ok(ports), _) => ports,
            (Err(err), PortPolicy::Lenient) => {
                debug!(error = %err, "port enumeration failed; continuing without device list");
                Vec::new()
            }
            (Err(err), PortPolicy::Strict) => return Err(err),
        };
        let name = resolve_port(&config.port, &ports, config.policy)?;

        let port = serialport::new(&name, config.baud_rate)
            .timeout(config.io_timeout)
            .open()
            .map_err(|source| TransportError::Open {
                port: name.clone(),
                source,
            })?;

        info!(port = %name, baud = config.baud_rate, "opened serial port");

        Ok(Self {
            port,
            name,
            baud_rate: config.baud_rate,
        })
    }

    /// Resolved device path.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Link speed the device was opened with.
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Borrow the underlying driver handle.
    pub fn get_ref(&self) -> &dyn serialport::SerialPort {
        self.port.as_ref()
    }
}

impl Connection for SerialConnection {
    fn bytes_available(&mut self) -> io::Result<usize> {
        let pending = self.port.bytes_to_read().map_err(io::Error::from)?;
        Ok(pending as usize)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.port.read(buf) {
            Ok(n) => Ok(n),
            Err(err) if is_transient(&err) => Ok(0),
            Err(err) => Err(err),
        }
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        loop {
            match self.port.write(bytes) {
                Ok(n) => return Ok(n),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) if is_transient(&err) => return Ok(0),
                Err(err) => return Err(err),
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }
}

impl std::fmt::Debug for SerialConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialConnection")
            .field("name", &self.name)
            .field("baud_rate", &self.baud_rate)
            .finish()
    }
}

fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_baud_rate() {
        let config = SerialConfig::new("/dev/ttyUSB0");
        assert_eq!(config.baud_rate, 115_200);
        assert_eq!(config.policy, PortPolicy::Strict);
    }

    #[test]
    fn baud_rate_configurable() {
        let config = SerialConfig::new("/dev/ttyUSB0")
            .baud_rate(9600)
            .policy(PortPolicy::Lenient);
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.policy, PortPolicy::Lenient);
    }

    #[test]
    fn transient_errors_classified() {
        assert!(is_transient(&io::Error::from(io::ErrorKind::TimedOut)));
        assert!(is_transient(&io::Error::from(io::ErrorKind::WouldBlock)));
        assert!(!is_transient(&io::Error::from(io::ErrorKind::BrokenPipe)));
    }
}
