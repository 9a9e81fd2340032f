/// Errors that can occur while locating or opening a connection.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The requested port is not one of the enumerated serial devices.
    #[error("invalid serial port specified: valid options are {available:?}, but {port} was provided")]
    InvalidSerialPort {
        port: String,
        available: Vec<String>,
    },

    /// Failed to open the serial device.
    #[error("failed to open {port}: {source}")]
    Open {
        port: String,
        source: serialport::Error,
    },

    /// Failed to enumerate serial devices.
    #[error("failed to enumerate serial ports: {0}")]
    Enumerate(serialport::Error),

    /// An I/O error occurred on the connection.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
