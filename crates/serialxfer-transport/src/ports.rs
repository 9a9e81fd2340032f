//! Serial device enumeration and port-name resolution.

use std::path::Path;

use tracing::debug;

use crate::error::{Result, TransportError};

/// How strictly a requested port must match the enumerated devices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PortPolicy {
    /// Only enumerated devices (or their shorthand names) are accepted.
    #[default]
    Strict,
    /// Unknown identifiers are passed through unchanged.
    Lenient,
}

/// Device paths of all serial ports the OS currently reports.
pub fn available_ports() -> Result<Vec<String>> {
    let ports = serialport::available_ports().map_err(TransportError::Enumerate)?;
    Ok(ports.into_iter().map(|info| info.port_name).collect())
}

/// Resolve a requested port against the enumerated device list.
///
/// An exact match wins. Otherwise a listed device whose file name equals the
/// request is used, so `ttyUSB0` expands to `/dev/ttyUSB0`. Anything else is
/// rejected under [`PortPolicy::Strict`] and returned as-is under
/// [`PortPolicy::Lenient`].
pub fn resolve_port(requested: &str, ports: &[String], policy: PortPolicy) -> Result<String> {
    if ports.iter().any(|port| port == requested) {
        return Ok(requested.to_string());
    }

    let shorthand = ports.iter().find(|port| {
        Path::new(port.as_str())
            .file_name()
            .is_some_and(|name| name == requested)
    });
    if let Some(port) = shorthand {
        debug!(requested, resolved = %port, "expanded port shorthand");
        return Ok(port.clone());
    }

    match policy {
        PortPolicy::Strict => Err(TransportError::InvalidSerialPort {
            port: requested.to_string(),
            available: ports.to_vec(),
        }),
        PortPolicy::Lenient => Ok(requested.to_string()),
    }
}
