//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use service_gateway::discovery::{Application, DiscoveryError, DiscoverySource, Instance};

/// Build an application from `(host, port)` pairs.
pub fn app(name: &str, instances: &[(&str, Option<u16>)]) -> Application {
    Application::new(
        name,
        instances
            .iter()
            .map(|(host, port)| Instance::new(*host, *port))
            .collect(),
    )
}

/// Discovery source replaying a queue of scripted answers, one per query.
#[derive(Default)]
pub struct ScriptedSource {
    answers: Mutex<VecDeque<Result<Vec<Application>, DiscoveryError>>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every query sleeps for `delay` before answering.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn push_ok(&self, apps: Vec<Application>) {
        self.answers.lock().unwrap().push_back(Ok(apps));
    }

    pub fn push_err(&self, reason: &str) {
        self.answers
            .lock()
            .unwrap()
            .push_back(Err(DiscoveryError::Request(reason.to_string())));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of queries that were in progress at the same time.
    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

impl DiscoverySource for ScriptedSource {
    async fn query_all(&self) -> Result<Vec<Application>, DiscoveryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let answer = self
            .answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(DiscoveryError::Request("script exhausted".into())));

        self.active.fetch_sub(1, Ordering::SeqCst);
        answer
    }
}

/// Start a mock backend on an ephemeral port. Every response body is
/// `"{tag} {method} {path}"` so tests can see what was forwarded.
pub async fn start_mock_backend(tag: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = Vec::new();
                        let mut chunk = [0u8; 1024];
                        while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                            match socket.read(&mut chunk).await {
                                Ok(0) | Err(_) => return,
                                Ok(n) => buf.extend_from_slice(&chunk[..n]),
                            }
                        }

                        let head = String::from_utf8_lossy(&buf);
                        let mut request_line = head.lines().next().unwrap_or("").split(' ');
                        let method = request_line.next().unwrap_or("");
                        let path = request_line.next().unwrap_or("");
                        let body = format!("{tag} {method} {path}");

                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}
