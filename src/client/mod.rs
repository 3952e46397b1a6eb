//! Client Module
//!
//! Sessions with a receiver.
//!
//! ## Modes
//! - [`Client`]: blocking, single-threaded; messages are read on demand
//! - [`AsyncClient`]: a worker thread owns a `Client` and feeds
//!   unsolicited messages to a callback
//!
//! Both correlate requests with replies the same way (see
//! [`correlation`]).

mod async_client;
pub mod correlation;
mod groups;
mod sync;

pub use async_client::{AsyncClient, MessageHandler};
pub use groups::{group_message, parse_groups, GroupMember, GroupZone, GROUP_MAX_DELAY_MS};
pub use sync::{Client, UNKNOWN_IDENTIFIER, UNKNOWN_MODEL};

use crate::config::ClientConfig;
use crate::discovery::Device;
use crate::error::Result;

impl Device {
    /// A blocking client for this device; connects on first use
    pub fn into_client(self, config: ClientConfig) -> Client {
        Client::from_device(self, config)
    }

    /// A background client for this device, connected immediately
    pub fn into_async(self, config: ClientConfig) -> Result<AsyncClient> {
        AsyncClient::start(Client::from_device(self, config))
    }
}
