//! Background Client
//!
//! Runs a [`Client`] on a dedicated worker thread so messages the receiver
//! sends on its own (volume changed on the remote, input switched, ...)
//! reach a callback as they arrive.
//!
//! ## Threading
//!
//! ```text
//!   caller threads                     worker thread
//!  ┌──────────────┐   Outbound FIFO   ┌──────────────────────────────┐
//!  │ send()       │ ────────────────► │ owns Client (socket, buffer) │
//!  │ request()    │ ────────────────► │                              │
//!  │   ▲          │                   │  1. inbound → callback       │
//!  │   └──────────┼── one-shot reply ─│  2. next outbound → socket   │
//!  └──────────────┘                   │  3. requests: await reply    │
//!                                     └──────────────────────────────┘
//! ```
//!
//! Only the worker touches the socket. Requests are handled one at a time
//! in queue order; each caller only sees its own reply.
//!
//! The message handler runs on the worker thread. A `request` made from
//! inside it fails with `WorkerStopped` since the worker cannot answer
//! while busy in the handler; a `close` from inside it only raises the
//! stop flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

use crossbeam::channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::RwLock;

use super::correlation::PendingReply;
use super::Client;
use crate::commands::{CommandTranslator, PrettyCommand, Translated};
use crate::config::ClientConfig;
use crate::error::{EiscpError, Result};

/// Callback for messages that are not the reply to a request
pub type MessageHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// Work queued for the worker
enum Outbound {
    /// Fire and forget
    Send(String),

    /// Send and deliver the correlated reply (or error) to `reply`
    Request {
        message: String,
        reply: Sender<Result<String>>,
    },
}

/// Receiver session driven by a background worker
pub struct AsyncClient {
    host: String,
    port: u16,
    translator: CommandTranslator,
    queue: Sender<Outbound>,
    handler: Arc<RwLock<Option<MessageHandler>>>,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    worker_id: ThreadId,
}

impl AsyncClient {
    /// Connect to `host` and start the worker
    pub fn connect(host: impl Into<String>, config: ClientConfig) -> Result<Self> {
        Self::start(Client::new(host, config))
    }

    /// Hand an existing client to a new worker
    ///
    /// The worker connects first; if that fails the worker is joined and
    /// the connection error returned.
    pub fn start(client: Client) -> Result<Self> {
        let host = client.host().to_string();
        let port = client.port();
        let translator = client.translator().clone();
        let idle_wait = client.config().idle_wait;

        let (queue, outbound) = unbounded();
        let (ready_tx, ready_rx) = bounded(1);
        let handler: Arc<RwLock<Option<MessageHandler>>> = Arc::new(RwLock::new(None));
        let running = Arc::new(AtomicBool::new(true));

        let worker = Worker {
            client,
            outbound,
            handler: Arc::clone(&handler),
            running: Arc::clone(&running),
            idle_wait,
        };

        let handle = thread::Builder::new()
            .name(format!("eiscp-{}", host))
            .spawn(move || worker.run(ready_tx))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = handle.join();
                return Err(e);
            }
            Err(_) => {
                let _ = handle.join();
                return Err(EiscpError::WorkerStopped);
            }
        }

        tracing::debug!("Worker started for {}:{}", host, port);

        let worker_id = handle.thread().id();
        Ok(Self {
            host,
            port,
            translator,
            queue,
            handler,
            running,
            worker: Some(handle),
            worker_id,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Install the callback for unsolicited messages
    ///
    /// Runs on the worker thread. The reply to a request is given to the
    /// requester only and never reaches the callback. Calling `request`
    /// (or `command`) from the callback returns `WorkerStopped`.
    pub fn set_message_handler<F>(&self, handler: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        *self.handler.write() = Some(Arc::new(handler));
    }

    pub fn clear_message_handler(&self) {
        *self.handler.write() = None;
    }

    /// Queue a message without waiting for anything
    pub fn send(&self, message: &str) -> Result<()> {
        self.enqueue(Outbound::Send(message.to_string()))
    }

    /// Queue a message and block until its reply arrives or the request
    /// times out
    pub fn request(&self, message: &str) -> Result<String> {
        if self.on_worker_thread() {
            tracing::warn!("Request {} made from the message handler", message);
            return Err(EiscpError::WorkerStopped);
        }

        let (reply, outcome) = bounded(1);
        self.enqueue(Outbound::Request {
            message: message.to_string(),
            reply,
        })?;
        outcome.recv().map_err(|_| EiscpError::WorkerStopped)?
    }

    /// Run a pretty command; translation happens on the calling thread
    pub fn command(&self, input: &str) -> Result<Translated> {
        self.execute(&PrettyCommand::parse(input)?)
    }

    pub fn execute(&self, command: &PrettyCommand) -> Result<Translated> {
        let message = self.translator.to_protocol(command)?;
        let reply = self.request(&message)?;
        self.translator.from_protocol(&reply)
    }

    pub fn power_on(&self) -> Result<Translated> {
        self.command("system-power=on")
    }

    pub fn power_off(&self) -> Result<Translated> {
        self.command("system-power=standby")
    }

    fn enqueue(&self, item: Outbound) -> Result<()> {
        if !self.is_running() {
            return Err(EiscpError::WorkerStopped);
        }
        self.queue.send(item).map_err(|_| EiscpError::WorkerStopped)
    }

    fn on_worker_thread(&self) -> bool {
        thread::current().id() == self.worker_id
    }

    /// Stop the worker and wait for it to exit
    ///
    /// Items still queued are dropped; their requesters get WorkerStopped.
    /// From the worker thread itself the worker is only told to stop.
    pub fn close(&mut self) {
        self.running.store(false, Ordering::Release);
        if self.on_worker_thread() {
            return;
        }
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                tracing::error!("Worker for {}:{} panicked", self.host, self.port);
            }
        }
    }
}

impl Drop for AsyncClient {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for AsyncClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncClient")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("running", &self.is_running())
            .finish()
    }
}

// =============================================================================
// Worker
// =============================================================================

struct Worker {
    client: Client,
    outbound: Receiver<Outbound>,
    handler: Arc<RwLock<Option<MessageHandler>>>,
    running: Arc<AtomicBool>,
    idle_wait: Duration,
}

impl Worker {
    fn run(mut self, ready: Sender<Result<()>>) {
        let connected = self.client.connect();
        let failed = connected.is_err();
        let _ = ready.send(connected);
        if failed {
            self.running.store(false, Ordering::Release);
            return;
        }

        while self.running.load(Ordering::Acquire) {
            self.dispatch_inbound();

            match self.outbound.recv_timeout(self.idle_wait) {
                Ok(Outbound::Send(message)) => {
                    if let Err(e) = self.client.send(&message) {
                        tracing::warn!("Failed to send {}: {}", message, e);
                    }
                }
                Ok(Outbound::Request { message, reply }) => {
                    let outcome = self.request(&message);
                    // The requester may have given up
                    let _ = reply.send(outcome);
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        self.running.store(false, Ordering::Release);
        tracing::debug!("Worker for {} exiting", self.client.host());
    }

    /// Hand everything already received to the callback
    ///
    /// Only an open session is read; a closed one is re-opened by the next
    /// outbound message.
    fn dispatch_inbound(&mut self) {
        while self.client.is_connected() {
            match self.client.poll(Duration::ZERO) {
                Ok(Some(message)) => deliver(&self.handler, &message),
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("Receive from {} failed: {}", self.client.host(), e);
                    break;
                }
            }
        }
    }

    fn request(&mut self, message: &str) -> Result<String> {
        self.client.send(message)?;
        let mut pending = PendingReply::new(message, self.client.config().request_timeout);
        let handler = &self.handler;
        self.client
            .await_reply(&mut pending, |unrelated| deliver(handler, &unrelated))
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.client.disconnect();
    }
}

fn deliver(handler: &RwLock<Option<MessageHandler>>, message: &str) {
    // Clone out so the callback can replace the handler
    let callback = handler.read().clone();
    match callback {
        Some(callback) => callback(message),
        None => tracing::trace!("Unhandled message {}", message),
    }
}
