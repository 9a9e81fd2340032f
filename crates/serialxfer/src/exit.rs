use std::fmt;
use std::io;

use serialxfer_frame::FrameError;
use serialxfer_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound | io::ErrorKind::BrokenPipe => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::InvalidSerialPort { .. } => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        TransportError::Open { port, source } => {
            io_error(&format!("{context} ({port})"), io::Error::from(source))
        }
        TransportError::Enumerate(_) => CliError::new(FAILURE, format!("{context}: {err}")),
        TransportError::Io(source) => io_error(context, source),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::PacketOverflow { .. }
        | FrameError::PacketUnderflow { .. }
        | FrameError::InvalidUtf8 => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        FrameError::Write { .. } => CliError::new(TRANSPORT_ERROR, format!("{context}: {err}")),
        FrameError::InvalidConfig(_) => CliError::new(USAGE, format!("{context}: {err}")),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_port_is_usage_error() {
        let err = TransportError::InvalidSerialPort {
            port: "ttyACM9".into(),
            available: vec!["/dev/ttyUSB0".into()],
        };
        let cli = transport_error("open failed", err);
        assert_eq!(cli.code, USAGE);
        assert!(cli.message.contains("ttyACM9"));
    }

    #[test]
    fn enumeration_failure_is_general_failure() {
        let err = TransportError::Enumerate(serialport::Error::new(
            serialport::ErrorKind::Unknown,
            "no device manager",
        ));
        let cli = transport_error("listing ports", err);
        assert_eq!(cli.code, FAILURE);
        assert!(cli.message.contains("no device manager"));
    }

    #[test]
    fn oversized_payload_is_data_invalid() {
        let err = FrameError::PacketOverflow {
            needed: 300,
            available: 250,
        };
        assert_eq!(frame_error("send failed", err).code, DATA_INVALID);
    }

    #[test]
    fn short_write_is_transport_error() {
        let err = FrameError::Write {
            written: 2,
            expected: 9,
        };
        assert_eq!(frame_error("send failed", err).code, TRANSPORT_ERROR);
    }

    #[test]
    fn permission_denied_maps_through_io() {
        let err = io::Error::from(io::ErrorKind::PermissionDenied);
        assert_eq!(io_error("open", err).code, PERMISSION_DENIED);
    }
}
