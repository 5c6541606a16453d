#![allow(dead_code)]

// Fake origin serving an in-memory bundle.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;

#[derive(Default)]
pub struct FakeOrigin {
    files: HashMap<String, (StatusCode, Vec<u8>)>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    requests: AtomicUsize,
}

impl FakeOrigin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` at the absolute path `path` (e.g. `/rtv/15/v0.js`).
    pub fn file(mut self, path: &str, body: impl Into<Vec<u8>>) -> Self {
        self.files
            .insert(path.to_string(), (StatusCode::OK, body.into()));
        self
    }

    pub fn status(mut self, path: &str, status: StatusCode) -> Self {
        self.files.insert(path.to_string(), (status, Vec::new()));
        self
    }

    /// Hold every response for `delay` so concurrent requests overlap.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Serve a bundle under `/rtv/<version>/`, manifest included.
    pub fn bundle(mut self, version: &str, files: &[(&str, &str)]) -> Self {
        let mut manifest = String::from("files.txt\n");
        for (path, body) in files {
            manifest.push_str(path);
            manifest.push('\n');
            self = self.file(&format!("/rtv/{}/{}", version, path), body.as_bytes());
        }
        self.file(&format!("/rtv/{}/files.txt", version), manifest)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

async fn serve(State(origin): State<Arc<FakeOrigin>>, uri: Uri) -> Response {
    origin.requests.fetch_add(1, Ordering::SeqCst);
    let now = origin.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    origin.peak_in_flight.fetch_max(now, Ordering::SeqCst);

    if let Some(delay) = origin.delay {
        tokio::time::sleep(delay).await;
    }

    let response = match origin.files.get(uri.path()) {
        Some((status, body)) => (*status, body.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, "not found").into_response(),
    };
    origin.in_flight.fetch_sub(1, Ordering::SeqCst);
    response
}

/// Start `origin` on a random port and return its base URL (no trailing slash).
pub async fn start_origin(origin: FakeOrigin) -> (String, Arc<FakeOrigin>) {
    let origin = Arc::new(origin);
    let app = Router::new().fallback(serve).with_state(origin.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    (format!("http://{}", addr), origin)
}
