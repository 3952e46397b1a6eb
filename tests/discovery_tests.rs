//! Discovery Tests
//!
//! Tests for probing and info queries against fake UDP responders on
//! loopback.

use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use eiscp::config::DiscoveryConfig;
use eiscp::discovery::{self, DeviceRegistry, ONKYO_MAGIC, PIONEER_MAGIC};
use eiscp::protocol::{encode_raw, parse_one};

// =============================================================================
// Helpers
// =============================================================================

/// Answer the next `queries` datagrams with `replies` each
fn responder(queries: usize, replies: Vec<String>) -> (SocketAddr, JoinHandle<Vec<String>>) {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    socket
        .set_read_timeout(Some(Duration::from_secs(2)))
        .unwrap();
    let addr = socket.local_addr().unwrap();

    let handle = thread::spawn(move || {
        let mut seen = Vec::new();
        let mut buf = [0u8; 1024];
        for _ in 0..queries {
            let Ok((n, from)) = socket.recv_from(&mut buf) else {
                break;
            };
            seen.push(parse_one(&buf[..n]).unwrap());
            for reply in &replies {
                socket.send_to(&encode_raw(reply), from).unwrap();
            }
        }
        seen
    });

    (addr, handle)
}

fn config() -> DiscoveryConfig {
    DiscoveryConfig::builder()
        .timeout(Duration::from_millis(200))
        .build()
}

// =============================================================================
// Probe Tests
// =============================================================================

#[test]
fn test_probe_sends_both_queries() {
    let (addr, handle) = responder(2, Vec::new());
    let mut registry = DeviceRegistry::new();

    discovery::probe(Ipv4Addr::LOCALHOST, addr, &config(), &mut registry).unwrap();

    let seen = handle.join().unwrap();
    assert_eq!(seen, vec![ONKYO_MAGIC.to_string(), PIONEER_MAGIC.to_string()]);
    assert!(registry.is_empty());
}

#[test]
fn test_probe_deduplicates_responses() {
    // Each query is answered, so the receiver shows up twice
    let (addr, handle) = responder(
        2,
        vec!["!1ECNTX-NR609/60128/DX/0009B0123456\u{19}\r\n".to_string()],
    );
    let mut registry = DeviceRegistry::new();

    discovery::probe(Ipv4Addr::LOCALHOST, addr, &config(), &mut registry).unwrap();
    handle.join().unwrap();

    let devices = registry.into_devices();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].model_name(), "TX-NR609");
    assert_eq!(devices[0].identifier(), "0009B0123456");
    assert_eq!(devices[0].host, addr.ip());
    assert_eq!(devices[0].port, 60128);
}

#[test]
fn test_probe_skips_garbage() {
    let (addr, handle) = responder(
        1,
        vec![
            "not a receiver".to_string(),
            "!1ECNVSX-930/60128/XX/0009B0AAAAAA".to_string(),
        ],
    );
    let mut registry = DeviceRegistry::new();

    discovery::probe(Ipv4Addr::LOCALHOST, addr, &config(), &mut registry).unwrap();
    handle.join().unwrap();

    let devices = registry.into_devices();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].model_name(), "VSX-930");
}

// =============================================================================
// Info Query Tests
// =============================================================================

#[test]
fn test_query_info() {
    let (addr, handle) = responder(
        1,
        vec!["!1ECNTX-8050/60128/DX/0009B0ABCDEF\u{19}\r\n".to_string()],
    );

    let info = discovery::query_info("127.0.0.1", addr.port(), Duration::from_secs(1))
        .unwrap()
        .unwrap();
    assert_eq!(handle.join().unwrap(), vec![ONKYO_MAGIC.to_string()]);

    assert_eq!(info.model_name, "TX-8050");
    assert_eq!(info.area_code, "DX");
    assert_eq!(info.identifier, "0009B0ABCDEF");
}

#[test]
fn test_query_info_without_answer() {
    let silent = UdpSocket::bind("127.0.0.1:0").unwrap();
    let port = silent.local_addr().unwrap().port();

    let info = discovery::query_info("127.0.0.1", port, Duration::from_millis(100)).unwrap();
    assert!(info.is_none());
}
