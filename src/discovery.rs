//! Receiver discovery via UDP broadcast.
//!
//! Receivers answer an `ECNQSTN` query broadcast to UDP port 60128 with a
//! packet describing themselves:
//!
//! ```text
//! !1ECNTX-NR609/60128/DX/0009B0123456
//!  │   │        │     │  └─ identifier (up to 12 chars)
//!  │   │        │     └──── area code
//!  │   │        └────────── ISCP port
//!  │   └─────────────────── model name
//!  └─────────────────────── device category
//! ```
//!
//! Every IPv4 interface with a broadcast address is probed with its own
//! socket. The same receiver is often seen through several interfaces, so
//! sightings are deduplicated by identifier.
//!
//! # Usage
//!
//! ```no_run
//! use eiscp::config::DiscoveryConfig;
//! use eiscp::discovery;
//!
//! # fn example() -> eiscp::Result<()> {
//! for device in discovery::discover(&DiscoveryConfig::default())? {
//!     println!("{} ({}) at {}:{}", device.model_name(), device.identifier(), device.host, device.port);
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::io::ErrorKind;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::time::Duration;

use if_addrs::IfAddr;
use serde::Serialize;

use crate::config::DiscoveryConfig;
use crate::error::{EiscpError, Result};
use crate::protocol::{encode_raw, parse_one};

/// Discovery query understood by Onkyo/Integra receivers
pub const ONKYO_MAGIC: &str = "!xECNQSTN";

/// Discovery query understood by Pioneer receivers
pub const PIONEER_MAGIC: &str = "!pECNQSTN";

/// Longest identifier carried in a discovery response
pub const MAX_IDENTIFIER_LEN: usize = 12;

/// What a receiver reports about itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    /// Device category digit (`1` for receivers)
    pub device_category: char,

    pub model_name: String,

    /// TCP port for command sessions
    pub iscp_port: u16,

    /// Destination area code (`DX`, `XX`, `JJ`, ...)
    pub area_code: String,

    /// Unique identifier, usually derived from the MAC address
    pub identifier: String,
}

/// A receiver found on the network
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Device {
    pub host: IpAddr,
    pub port: u16,
    pub info: DeviceInfo,
}

impl Device {
    pub fn identifier(&self) -> &str {
        &self.info.identifier
    }

    pub fn model_name(&self) -> &str {
        &self.info.model_name
    }
}

/// Parse the text of a discovery response
pub fn parse_info(response: &str) -> Result<DeviceInfo> {
    let invalid = || EiscpError::Framing(format!("Not a discovery response: {:?}", response));

    let text = response.trim_matches(|c: char| c.is_whitespace() || c == '\u{19}' || c == '\u{1a}');
    let mut chars = text.strip_prefix('!').ok_or_else(invalid)?.chars();

    let device_category = chars.next().filter(char::is_ascii_digit).ok_or_else(invalid)?;
    let rest = chars.as_str().strip_prefix("ECN").ok_or_else(invalid)?;

    let mut fields = rest.splitn(4, '/');
    let model_name = fields.next().ok_or_else(invalid)?;
    let port = fields
        .next()
        .filter(|p| p.len() == 5 && p.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(invalid)?;
    let area_code = fields
        .next()
        .filter(|a| a.chars().count() == 2 && a.chars().all(|c| c.is_alphanumeric() || c == '_'))
        .ok_or_else(invalid)?;
    let identifier: String = fields
        .next()
        .ok_or_else(invalid)?
        .chars()
        .take(MAX_IDENTIFIER_LEN)
        .collect();

    Ok(DeviceInfo {
        device_category,
        model_name: model_name.to_string(),
        iscp_port: port.parse().map_err(|_| invalid())?,
        area_code: area_code.to_string(),
        identifier,
    })
}

/// Devices seen during a scan, keyed by identifier
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: HashMap<String, Device>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one response datagram received from `source`
    ///
    /// Returns true the first time an identifier is seen. A later
    /// sighting of the same identifier replaces the earlier record.
    pub fn record(&mut self, datagram: &[u8], source: SocketAddr) -> Result<bool> {
        let info = parse_info(&parse_one(datagram)?)?;
        let device = Device {
            host: source.ip(),
            port: info.iscp_port,
            info,
        };

        tracing::debug!(
            model = %device.info.model_name,
            identifier = %device.info.identifier,
            host = %device.host,
            "Discovered receiver"
        );

        Ok(self
            .devices
            .insert(device.info.identifier.clone(), device)
            .is_none())
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// The deduplicated devices, ordered by identifier
    pub fn into_devices(self) -> Vec<Device> {
        let mut devices: Vec<Device> = self.devices.into_values().collect();
        devices.sort_by(|a, b| a.info.identifier.cmp(&b.info.identifier));
        devices
    }
}

/// Scan every broadcast-capable IPv4 interface for receivers
///
/// Runs synchronously; each interface gets a throw-away socket that is
/// closed before returning. No TCP connection is made.
pub fn discover(config: &DiscoveryConfig) -> Result<Vec<Device>> {
    let mut registry = DeviceRegistry::new();

    for interface in if_addrs::get_if_addrs()? {
        let IfAddr::V4(ref v4) = interface.addr else {
            continue;
        };
        let Some(broadcast) = v4.broadcast else {
            continue;
        };

        tracing::debug!(
            interface = %interface.name,
            addr = %v4.ip,
            broadcast = %broadcast,
            "Probing interface"
        );

        let target = SocketAddr::new(IpAddr::V4(broadcast), config.port);
        if let Err(e) = probe(v4.ip, target, config, &mut registry) {
            tracing::warn!(interface = %interface.name, error = %e, "Discovery probe failed");
        }
    }

    let devices = registry.into_devices();
    tracing::debug!(count = devices.len(), "Discovery complete");
    Ok(devices)
}

/// Send both discovery queries from `bind_ip` to `target` and collect
/// replies until no datagram arrives for `config.timeout`
pub fn probe(
    bind_ip: Ipv4Addr,
    target: SocketAddr,
    config: &DiscoveryConfig,
    registry: &mut DeviceRegistry,
) -> Result<()> {
    let socket = UdpSocket::bind((bind_ip, 0))?;
    socket.set_broadcast(true)?;
    socket.set_read_timeout(Some(non_zero(config.timeout)))?;

    socket.send_to(&encode_raw(ONKYO_MAGIC), target)?;
    socket.send_to(&encode_raw(PIONEER_MAGIC), target)?;

    let mut buf = vec![0u8; config.recv_buffer_size];
    loop {
        match socket.recv_from(&mut buf) {
            Ok((n, source)) => {
                if let Err(e) = registry.record(&buf[..n], source) {
                    tracing::trace!(source = %source, error = %e, "Ignoring datagram");
                }
            }
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => break,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

/// Ask a known host for its device info
///
/// Returns `None` if nothing answers within `timeout`.
pub fn query_info(host: &str, port: u16, timeout: Duration) -> Result<Option<DeviceInfo>> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
    socket.set_read_timeout(Some(non_zero(timeout)))?;
    socket.send_to(&encode_raw(ONKYO_MAGIC), (host, port))?;

    let mut buf = [0u8; 1024];
    match socket.recv(&mut buf) {
        Ok(n) => parse_one(&buf[..n]).and_then(|text| parse_info(&text)).map(Some),
        Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// A zero read timeout is rejected by the socket API
fn non_zero(timeout: Duration) -> Duration {
    timeout.max(Duration::from_millis(1))
}
