//! Synchronous Client
//!
//! One blocking TCP session with a receiver. All calls happen on the
//! caller's thread; there is no background reading, so unsolicited
//! messages queue up in the socket until the next `poll` or `request`.

use std::io::{ErrorKind, Read};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use super::correlation::{Offer, PendingReply};
use crate::commands::{CommandTranslator, PrettyCommand, Translated};
use crate::config::ClientConfig;
use crate::discovery::{self, Device, DeviceInfo};
use crate::error::{EiscpError, Result};
use crate::nri::{Capabilities, Listing};
use crate::protocol::{write_message, MessageBuffer, PREFIX_LEN};

/// Largest single socket read
const READ_CHUNK: usize = 4096;

/// Reported when the device info could not be queried
pub const UNKNOWN_MODEL: &str = "unknown-model";

/// Reported when the device info could not be queried
pub const UNKNOWN_IDENTIFIER: &str = "no-id";

/// Blocking session with one receiver
///
/// The connection is opened lazily by the first call that needs it and
/// re-opened after the peer closes it.
pub struct Client {
    host: String,
    config: ClientConfig,
    translator: CommandTranslator,

    /// Open session, if any
    stream: Option<TcpStream>,

    /// Bytes received but not yet returned as messages
    buffer: MessageBuffer,

    /// Cached discovery info
    info: Option<DeviceInfo>,

    /// Cached capability document
    capabilities: Option<Capabilities>,
}

impl Client {
    /// Create a client for `host`; nothing is connected yet
    pub fn new(host: impl Into<String>, config: ClientConfig) -> Self {
        let buffer = MessageBuffer::new(config.buffer_capacity);
        Self {
            host: host.into(),
            config,
            translator: CommandTranslator::default(),
            stream: None,
            buffer,
            info: None,
            capabilities: None,
        }
    }

    /// Create a client for a discovered device, keeping its info
    pub fn from_device(device: Device, config: ClientConfig) -> Self {
        let config = ClientConfig {
            port: device.port,
            ..config
        };
        let mut client = Self::new(device.host.to_string(), config);
        client.info = Some(device.info);
        client
    }

    /// Use a different command catalogue
    pub fn with_translator(mut self, translator: CommandTranslator) -> Self {
        self.translator = translator;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.config.port
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn translator(&self) -> &CommandTranslator {
        &self.translator
    }

    fn addr(&self) -> String {
        format!("{}:{}", self.host, self.config.port)
    }

    // =========================================================================
    // Connection
    // =========================================================================

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Open the TCP session; a no-op when already connected
    pub fn connect(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let addr = self.addr();
        tracing::info!("Connecting to {}", addr);

        let stream = self.open(&addr).map_err(|source| {
            tracing::warn!("Failed to connect to {}: {}", addr, source);
            EiscpError::Connection {
                addr: addr.clone(),
                source,
            }
        })?;

        self.buffer.reset();
        self.stream = Some(stream);
        Ok(())
    }

    fn open(&self, addr: &str) -> std::io::Result<TcpStream> {
        let candidates: Vec<SocketAddr> = (self.host.as_str(), self.config.port)
            .to_socket_addrs()?
            .collect();

        let mut last_error = None;
        for candidate in candidates {
            match TcpStream::connect_timeout(&candidate, self.config.connect_timeout) {
                Ok(stream) => {
                    // Disable Nagle's algorithm for low latency
                    stream.set_nodelay(true)?;
                    return Ok(stream);
                }
                Err(e) => last_error = Some(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            std::io::Error::new(ErrorKind::NotFound, format!("{} did not resolve", addr))
        }))
    }

    /// Close the session, if open
    pub fn disconnect(&mut self) {
        if self.stream.take().is_some() {
            tracing::info!("Disconnected from {}", self.addr());
        }
        self.buffer.reset();
    }

    // =========================================================================
    // Messages
    // =========================================================================

    /// Send one message body (e.g. `PWR01`) without waiting for anything
    pub fn send(&mut self, message: &str) -> Result<()> {
        self.connect()?;
        tracing::trace!("> {}", message);

        let Some(stream) = self.stream.as_mut() else {
            return Err(EiscpError::PeerClosed);
        };
        if let Err(e) = write_message(stream, message) {
            self.disconnect();
            return Err(e);
        }
        Ok(())
    }

    /// Return the next inbound message, waiting up to `timeout`
    ///
    /// Already buffered messages are returned without touching the socket.
    /// A zero timeout only takes what the socket has ready. `None` means
    /// nothing complete arrived, or the peer closed the connection (the
    /// client is then disconnected).
    pub fn poll(&mut self, timeout: Duration) -> Result<Option<String>> {
        if let Some(message) = self.next_buffered()? {
            return Ok(Some(message));
        }

        self.connect()?;

        let available = self.buffer.available();
        if available == 0 {
            self.disconnect();
            return Err(EiscpError::Framing("Receive buffer is full".into()));
        }

        let mut chunk = [0u8; READ_CHUNK];
        let want = available.min(READ_CHUNK);
        let read = match self.stream.as_mut() {
            Some(stream) => read_with_timeout(stream, &mut chunk[..want], timeout),
            None => return Ok(None),
        };

        match read {
            Ok(0) => {
                tracing::debug!("Connection closed by {}", self.addr());
                self.disconnect();
                Ok(None)
            }
            Ok(n) => {
                self.buffer.receive(&chunk[..n]);
                self.next_buffered()
            }
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
                ) =>
            {
                Ok(None)
            }
            Err(source) => {
                tracing::warn!("Error reading from {}: {}", self.addr(), source);
                self.disconnect();
                Err(EiscpError::Connection {
                    addr: self.addr(),
                    source,
                })
            }
        }
    }

    fn next_buffered(&mut self) -> Result<Option<String>> {
        match self.buffer.next_message() {
            Ok(Some(message)) => {
                tracing::trace!("< {}", message);
                Ok(Some(message))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                // The stream can't be resynchronized
                tracing::warn!("Dropping session with {}: {}", self.addr(), e);
                self.disconnect();
                Err(e)
            }
        }
    }

    /// Discard every message that is already waiting
    pub fn drain(&mut self) -> Result<usize> {
        let mut dropped = 0;
        while let Some(message) = self.poll(Duration::ZERO)? {
            tracing::trace!("Discarding queued message {}", message);
            dropped += 1;
        }
        Ok(dropped)
    }

    /// Send `message` and wait for its reply
    ///
    /// Messages queued before the send are discarded, as are unrelated
    /// messages that arrive while waiting.
    pub fn request(&mut self, message: &str) -> Result<String> {
        self.drain()?;
        self.send(message)?;

        let mut pending = PendingReply::new(message, self.config.request_timeout);
        self.await_reply(&mut pending, |unrelated| {
            tracing::trace!("Ignoring unrelated message {}", unrelated);
        })
    }

    /// Wait until `pending` is matched or times out
    ///
    /// Messages that are not the reply go to `unrelated`.
    pub(crate) fn await_reply<F>(&mut self, pending: &mut PendingReply, mut unrelated: F) -> Result<String>
    where
        F: FnMut(String),
    {
        loop {
            if let Some(reply) = pending.reply() {
                return Ok(reply.to_string());
            }

            let Some(remaining) = pending.remaining() else {
                tracing::debug!("No reply to {} from {}", pending.sent(), self.addr());
                return Err(pending.timeout_error());
            };

            match self.poll(remaining)? {
                Some(message) => {
                    if let Offer::Unrelated(message) = pending.offer(message) {
                        unrelated(message);
                    }
                }
                None if !self.is_connected() => return Err(EiscpError::PeerClosed),
                None => {}
            }
        }
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Run a pretty command (`"volume 42"`, `"zone2.power=on"`) and
    /// translate the reply
    pub fn command(&mut self, input: &str) -> Result<Translated> {
        self.execute(&PrettyCommand::parse(input)?)
    }

    /// Run an already parsed pretty command
    pub fn execute(&mut self, command: &PrettyCommand) -> Result<Translated> {
        let message = self.translator.to_protocol(command)?;
        let reply = self.request(&message)?;
        self.translator.from_protocol(&reply)
    }

    pub fn power_on(&mut self) -> Result<Translated> {
        self.command("system-power=on")
    }

    pub fn power_off(&mut self) -> Result<Translated> {
        self.command("system-power=standby")
    }

    // =========================================================================
    // Device Information
    // =========================================================================

    /// Discovery info for this receiver, queried over UDP on first use
    pub fn info(&mut self) -> Option<&DeviceInfo> {
        if self.info.is_none() {
            match discovery::query_info(&self.host, self.config.port, self.config.info_timeout) {
                Ok(Some(info)) => self.info = Some(info),
                Ok(None) => tracing::debug!("No info reply from {}", self.addr()),
                Err(e) => tracing::debug!("Info query to {} failed: {}", self.addr(), e),
            }
        }
        self.info.as_ref()
    }

    pub fn model_name(&mut self) -> String {
        self.info()
            .map(|info| info.model_name.clone())
            .unwrap_or_else(|| UNKNOWN_MODEL.to_string())
    }

    pub fn identifier(&mut self) -> String {
        self.info()
            .map(|info| info.identifier.clone())
            .unwrap_or_else(|| UNKNOWN_IDENTIFIER.to_string())
    }

    /// Capability document, fetched once per client
    pub fn capabilities(&mut self) -> Result<&Capabilities> {
        let capabilities = match self.capabilities.take() {
            Some(capabilities) => capabilities,
            None => self.fetch_capabilities()?,
        };
        Ok(&*self.capabilities.insert(capabilities))
    }

    fn fetch_capabilities(&mut self) -> Result<Capabilities> {
        let message = self
            .translator
            .to_protocol_str("dock.receiver-information=query")?;
        let reply = self.request(&message)?;
        let xml = reply.get(PREFIX_LEN..).unwrap_or_default();
        Capabilities::parse(xml)
    }

    pub fn zones(&mut self) -> Result<&Listing> {
        Ok(&self.capabilities()?.zones)
    }

    pub fn selectors(&mut self) -> Result<&Listing> {
        Ok(&self.capabilities()?.selectors)
    }

    pub fn presets(&mut self) -> Result<&Listing> {
        Ok(&self.capabilities()?.presets)
    }

    pub fn tuners(&mut self) -> Result<&Listing> {
        Ok(&self.capabilities()?.tuners)
    }

    pub fn functions(&mut self) -> Result<&Listing> {
        Ok(&self.capabilities()?.functions)
    }

    pub fn controls(&mut self) -> Result<&Listing> {
        Ok(&self.capabilities()?.controls)
    }

    pub fn net_services(&mut self) -> Result<&Listing> {
        Ok(&self.capabilities()?.net_services)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("host", &self.host)
            .field("port", &self.config.port)
            .field("connected", &self.stream.is_some())
            .field("info", &self.info)
            .finish()
    }
}

/// One read bounded by `timeout`; zero means "only what is ready"
fn read_with_timeout(stream: &mut TcpStream, buf: &mut [u8], timeout: Duration) -> std::io::Result<usize> {
    if timeout.is_zero() {
        stream.set_nonblocking(true)?;
        let result = stream.read(buf);
        stream.set_nonblocking(false)?;
        result
    } else {
        stream.set_read_timeout(Some(timeout))?;
        stream.read(buf)
    }
}
