use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use serialxfer_transport::{PortPolicy, SerialConfig, DEFAULT_BAUD_RATE};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod listen;
pub mod ports;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List serial ports found on this machine.
    Ports(PortsArgs),
    /// Send a single packet.
    Send(SendArgs),
    /// Listen and print received packets.
    Listen(ListenArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Ports(args) => ports::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Port selection shared by every command that opens a device.
#[derive(Args, Debug)]
pub struct SerialArgs {
    /// Serial device path or shorthand (e.g. /dev/ttyUSB0, ttyUSB0, COM3).
    pub port: String,
    /// Link speed in baud.
    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,
    /// Open the port even if it is not in the enumerated device list.
    #[arg(long)]
    pub unrestricted: bool,
}

impl SerialArgs {
    pub fn config(&self) -> SerialConfig {
        let policy = if self.unrestricted {
            PortPolicy::Lenient
        } else {
            PortPolicy::Strict
        };
        SerialConfig::new(self.port.as_str())
            .baud_rate(self.baud)
            .policy(policy)
    }
}

#[derive(Args, Debug, Default)]
pub struct PortsArgs {}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub serial: SerialArgs,
    /// Packet identifier (0-255).
    #[arg(long, default_value = "0")]
    pub id: u8,
    /// Raw string payload.
    #[arg(long, conflicts_with_all = ["hex", "file"])]
    pub data: Option<String>,
    /// Hex-encoded payload (e.g. 7e0102).
    #[arg(long, conflicts_with_all = ["data", "file"])]
    pub hex: Option<String>,
    /// Read payload from file.
    #[arg(long, conflicts_with_all = ["data", "hex"])]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    #[command(flatten)]
    pub serial: SerialArgs,
    /// Filter to specific packet ids (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub ids: Option<Vec<u8>>,
    /// Exit after receiving N packets.
    #[arg(long)]
    pub count: Option<usize>,
    /// Give up when no packet arrives for this long (e.g. 5s, 500ms).
    #[arg(long)]
    pub idle_timeout: Option<String>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration(" ").is_err());
    }

    #[test]
    fn unrestricted_selects_lenient_policy() {
        let args = SerialArgs {
            port: "ttyUSB0".into(),
            baud: 9600,
            unrestricted: true,
        };
        let config = args.config();
        assert_eq!(config.policy, PortPolicy::Lenient);
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.port, "ttyUSB0");
    }
}
