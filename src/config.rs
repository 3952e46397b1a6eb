//! Configuration for eiscp
//!
//! Centralized configuration with sensible defaults.

use std::time::Duration;

/// Default ISCP port used for both discovery and command sessions
pub const DEFAULT_PORT: u16 = 60128;

/// Default receive buffer capacity (64 KiB)
pub const DEFAULT_BUFFER_CAPACITY: usize = 64 * 1024;

/// Configuration for a receiver session (sync or async)
#[derive(Debug, Clone)]
pub struct ClientConfig {
    // -------------------------------------------------------------------------
    // Connection Configuration
    // -------------------------------------------------------------------------
    /// TCP port of the receiver
    pub port: u16,

    /// Timeout for establishing the TCP connection
    pub connect_timeout: Duration,

    // -------------------------------------------------------------------------
    // Request Configuration
    // -------------------------------------------------------------------------
    /// Overall budget for a correlated request to see its reply.
    /// Receivers usually answer within 200-300ms.
    pub request_timeout: Duration,

    /// Capacity of the receive buffer
    pub buffer_capacity: usize,

    /// How long to wait for a UDP info reply when the device info is unknown
    pub info_timeout: Duration,

    // -------------------------------------------------------------------------
    // Worker Configuration
    // -------------------------------------------------------------------------
    /// How long the async worker waits on the outbound queue before
    /// going back to the socket
    pub idle_wait: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(5),
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            info_timeout: Duration::from_millis(100),
            idle_wait: Duration::from_millis(10),
        }
    }
}

impl ClientConfig {
    /// Create a new config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for ClientConfig
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the receiver TCP port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the TCP connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the correlated request budget
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set the receive buffer capacity (in bytes)
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.config.buffer_capacity = capacity;
        self
    }

    /// Set the UDP info query timeout
    pub fn info_timeout(mut self, timeout: Duration) -> Self {
        self.config.info_timeout = timeout;
        self
    }

    /// Set the worker's idle wait on the outbound queue
    pub fn idle_wait(mut self, wait: Duration) -> Self {
        self.config.idle_wait = wait;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

/// Configuration for a discovery scan
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// UDP port the receivers listen on
    pub port: u16,

    /// How long to keep listening on an interface after the last reply
    pub timeout: Duration,

    /// Size of the datagram receive buffer
    pub recv_buffer_size: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            timeout: Duration::from_secs(5),
            recv_buffer_size: 1024,
        }
    }
}

impl DiscoveryConfig {
    /// Create a new config builder
    pub fn builder() -> DiscoveryConfigBuilder {
        DiscoveryConfigBuilder::default()
    }
}

/// Builder for DiscoveryConfig
#[derive(Default)]
pub struct DiscoveryConfigBuilder {
    config: DiscoveryConfig,
}

impl DiscoveryConfigBuilder {
    /// Set the UDP port to broadcast to
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the per-interface listen timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the datagram receive buffer size
    pub fn recv_buffer_size(mut self, size: usize) -> Self {
        self.config.recv_buffer_size = size;
        self
    }

    pub fn build(self) -> DiscoveryConfig {
        self.config
    }
}
