//! Shared test helpers
//!
//! A fake receiver listening on loopback. It answers each message it
//! receives through a responder closure and can push unsolicited messages
//! to the connected client.

#![allow(dead_code)]

use std::io::Read;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use eiscp::protocol::{write_message, MessageBuffer};
use eiscp::ClientConfig;
use parking_lot::Mutex;

/// What the fake receiver does with one inbound message
pub enum Action {
    /// Send these messages back, in order
    Reply(Vec<String>),

    /// Drop the connection
    Close,
}

pub fn reply(messages: &[&str]) -> Action {
    Action::Reply(messages.iter().map(|m| m.to_string()).collect())
}

pub fn silence() -> Action {
    Action::Reply(Vec::new())
}

pub struct FakeReceiver {
    addr: SocketAddr,
    current: Arc<Mutex<Option<TcpStream>>>,
    received: Arc<Mutex<Vec<String>>>,
    connections: Arc<AtomicUsize>,
}

impl FakeReceiver {
    /// Start listening; connections are served one after another
    pub fn start<F>(respond: F) -> Self
    where
        F: Fn(&str) -> Action + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let current = Arc::new(Mutex::new(None));
        let received = Arc::new(Mutex::new(Vec::new()));
        let connections = Arc::new(AtomicUsize::new(0));

        let fake = Self {
            addr,
            current: Arc::clone(&current),
            received: Arc::clone(&received),
            connections: Arc::clone(&connections),
        };

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                connections.fetch_add(1, Ordering::SeqCst);
                *current.lock() = Some(stream.try_clone().unwrap());
                serve(stream, &respond, &received);
                *current.lock() = None;
            }
        });

        fake
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Client config pointing at this receiver with short timeouts
    pub fn config(&self) -> ClientConfig {
        ClientConfig::builder()
            .port(self.port())
            .connect_timeout(Duration::from_secs(1))
            .request_timeout(Duration::from_millis(500))
            .info_timeout(Duration::from_millis(20))
            .build()
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub fn received(&self) -> Vec<String> {
        self.received.lock().clone()
    }

    /// Send a message to the connected client, waiting for one to connect
    pub fn push(&self, message: &str) {
        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            if let Some(stream) = self.current.lock().as_mut() {
                write_message(stream, message).unwrap();
                return;
            }
            assert!(Instant::now() < deadline, "no client connected");
            thread::sleep(Duration::from_millis(5));
        }
    }
}

fn serve<F>(mut stream: TcpStream, respond: &F, received: &Mutex<Vec<String>>)
where
    F: Fn(&str) -> Action,
{
    let mut buffer = MessageBuffer::default();
    let mut chunk = [0u8; 4096];

    loop {
        let n = match stream.read(&mut chunk) {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        buffer.receive(&chunk[..n]);

        while let Ok(Some(message)) = buffer.next_message() {
            received.lock().push(message.clone());
            match respond(&message) {
                Action::Reply(replies) => {
                    for reply in replies {
                        if write_message(&mut stream, &reply).is_err() {
                            return;
                        }
                    }
                }
                Action::Close => return,
            }
        }
    }
}

/// Poll `check` until it holds or two seconds pass
pub fn wait_until<F: FnMut() -> bool>(mut check: F) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    check()
}
