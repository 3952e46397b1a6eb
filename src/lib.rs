//! # eiscp
//!
//! Discover and control networked AV receivers (Onkyo, Integra, Pioneer)
//! over the eISCP protocol:
//! - UDP broadcast discovery on every IPv4 interface
//! - Framed TCP sessions with request/reply correlation
//! - Human-readable commands (`"volume 42"`, `"zone2.power=on"`)
//! - A background client that reports unsolicited state changes
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │            AsyncClient (worker thread + callback)           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ owns
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                Client (blocking TCP session)                │
//! │         correlation · capabilities · multiroom groups       │
//! └──────────┬──────────────────────────────────┬───────────────┘
//!            │                                  │
//!            ▼                                  ▼
//!   ┌─────────────────┐                ┌─────────────────┐
//!   │    Commands     │                │    Protocol     │
//!   │ pretty ⇄ wire   │                │ codec · buffer  │
//!   └─────────────────┘                └────────┬────────┘
//!                                               │
//!                                      ┌────────▼────────┐
//!                                      │    Discovery    │
//!                                      │  (UDP 60128)    │
//!                                      └─────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use eiscp::{Client, ClientConfig};
//!
//! # fn example() -> eiscp::Result<()> {
//! let mut client = Client::new("192.168.1.20", ClientConfig::default());
//! client.power_on()?;
//! let volume = client.command("volume 30")?;
//! println!("{} = {}", volume.command, volume.value);
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod commands;
pub mod discovery;
pub mod client;
pub mod nri;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{EiscpError, Result};
pub use config::{ClientConfig, DiscoveryConfig};
pub use client::{AsyncClient, Client};
pub use commands::{CommandTranslator, PrettyCommand, Translated};
pub use discovery::{discover, Device, DeviceInfo};
pub use nri::Capabilities;
pub use protocol::MessageBuffer;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of eiscp
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
