//! A canned HTTP server for source tests.
//!
//! Answers every request on a loopback port with one fixed status and body.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
struct CannedResponse {
    status: StatusCode,
    body: Vec<u8>,
}

impl CannedResponse {
    fn new(status: u16, body: Vec<u8>) -> Self {
        Self {
            status: StatusCode::from_u16(status).expect("valid HTTP status code"),
            body,
        }
    }
}

#[derive(Clone)]
struct Canned {
    response: Arc<Mutex<CannedResponse>>,
    hits: Arc<AtomicUsize>,
}

/// One-route HTTP server on `127.0.0.1`. Stops accepting when dropped.
pub struct CannedServer {
    addr: SocketAddr,
    canned: Canned,
    task: JoinHandle<()>,
}

impl CannedServer {
    /// Start serving `status` and `body` on an ephemeral port.
    pub async fn start(status: u16, body: impl Into<Vec<u8>>) -> io::Result<Self> {
        let canned = Canned {
            response: Arc::new(Mutex::new(CannedResponse::new(status, body.into()))),
            hits: Arc::new(AtomicUsize::new(0)),
        };

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let app = Router::new().fallback(answer).with_state(canned.clone());

        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self { addr, canned, task })
    }

    /// Serve the JSON form of `value` with status 200.
    pub async fn json<T: serde::Serialize>(value: &T) -> io::Result<Self> {
        let body = serde_json::to_vec(value)?;
        Self::start(200, body).await
    }

    /// URL of the served document.
    pub fn url(&self) -> String {
        format!("http://{}/bible.json", self.addr)
    }

    /// Change what subsequent requests receive.
    pub fn set_response(&self, status: u16, body: impl Into<Vec<u8>>) {
        let mut response = self
            .canned
            .response
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        *response = CannedResponse::new(status, body.into());
    }

    /// Number of requests answered so far.
    pub fn hits(&self) -> usize {
        self.canned.hits.load(Ordering::SeqCst)
    }
}

impl Drop for CannedServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn answer(State(canned): State<Canned>) -> Response {
    canned.hits.fetch_add(1, Ordering::SeqCst);
    let CannedResponse { status, body } = canned
        .response
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .clone();

    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}
