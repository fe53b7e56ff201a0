//! In-process stand-in for the outbound mail provider.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

type Captured = Arc<Mutex<Vec<serde_json::Value>>>;

/// A tiny HTTP server speaking just enough of the provider's API to
/// accept sends: `POST /v1/email` captures the payload and answers with
/// a sequential message id.
pub struct StubProvider {
    address: SocketAddr,
    captured: Captured,
    cancel: CancellationToken,
}

impl StubProvider {
    /// Bind on an ephemeral port and start serving.
    pub async fn start() -> Self {
        let captured = Captured::default();
        let cancel = CancellationToken::new();

        let router = Router::new()
            .route("/v1/email", post(accept_email))
            .with_state(Arc::clone(&captured));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("stub provider should bind");
        let address = listener
            .local_addr()
            .expect("stub provider address should resolve");

        let shutdown = cancel.clone();
        tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await
                .expect("stub provider should serve");
        });

        Self {
            address,
            captured,
            cancel,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.address)
    }

    /// Every payload accepted so far, oldest first.
    pub fn captured(&self) -> Vec<serde_json::Value> {
        self.captured.lock().clone()
    }

    /// Poll until `expected` sends have arrived or `timeout` elapses.
    pub async fn wait_for(&self, expected: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if self.captured.lock().len() >= expected {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        self.captured.lock().len() >= expected
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

async fn accept_email(
    State(captured): State<Captured>,
    Json(payload): Json<serde_json::Value>,
) -> (StatusCode, Json<serde_json::Value>) {
    let mut captured = captured.lock();
    captured.push(payload);
    let message_id = format!("stub-{}", captured.len());

    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "message_id": message_id })),
    )
}
