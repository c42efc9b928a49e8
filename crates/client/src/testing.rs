//! In-process stand-in for the Paperless upload endpoint
//!
//! Serves `POST /api/documents/post_document/` on an ephemeral local port and
//! reports every multipart upload it receives over a channel.

use axum::extract::{Multipart, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// One request as seen by the fake server
#[derive(Debug, Clone, Default)]
pub struct ReceivedUpload {
    pub file_name: Option<String>,
    pub document: Vec<u8>,
    pub tags: Option<String>,
    pub authorization: Option<String>,
}

enum Reply {
    /// `200` with ids `1`, `2`, ...
    Sequential(AtomicU32),
    Fixed(StatusCode, String),
}

struct ServerState {
    reply: Reply,
    uploads: mpsc::UnboundedSender<ReceivedUpload>,
}

/// Fake Paperless instance bound to `127.0.0.1`
pub struct FakePaperless {
    host: String,
    uploads: mpsc::UnboundedReceiver<ReceivedUpload>,
}

impl FakePaperless {
    /// Accept every upload, answering with sequential document ids
    pub async fn start() -> Self {
        Self::serve(Reply::Sequential(AtomicU32::new(1))).await
    }

    /// Answer every upload with `status` and `body`
    pub async fn responding(status: u16, body: &str) -> Self {
        let status = StatusCode::from_u16(status).expect("valid status code");
        Self::serve(Reply::Fixed(status, body.to_string())).await
    }

    async fn serve(reply: Reply) -> Self {
        let (tx, uploads) = mpsc::unbounded_channel();
        let state = Arc::new(ServerState { reply, uploads: tx });

        let app = Router::new()
            .route("/api/documents/post_document/", post(post_document))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind fake server");
        let port = listener.local_addr().expect("local addr").port();

        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            host: format!("127.0.0.1:{port}"),
            uploads,
        }
    }

    /// Host in the form the client expects (`ip:port`)
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Wait for the next upload, panicking after `wait`
    pub async fn next_upload(&mut self, wait: Duration) -> ReceivedUpload {
        tokio::time::timeout(wait, self.uploads.recv())
            .await
            .expect("timed out waiting for upload")
            .expect("fake server stopped")
    }

    /// Uploads received so far, without waiting
    pub fn drain(&mut self) -> Vec<ReceivedUpload> {
        let mut uploads = Vec::new();
        while let Ok(upload) = self.uploads.try_recv() {
            uploads.push(upload);
        }
        uploads
    }
}

async fn post_document(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> (StatusCode, String) {
    let mut upload = ReceivedUpload {
        authorization: headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(String::from),
        ..Default::default()
    };

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("document") => {
                upload.file_name = field.file_name().map(str::to_owned);
                upload.document = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
            }
            Some("tags") => upload.tags = field.text().await.ok(),
            _ => {}
        }
    }

    let _ = state.uploads.send(upload);

    match &state.reply {
        Reply::Sequential(next_id) => (
            StatusCode::OK,
            next_id.fetch_add(1, Ordering::SeqCst).to_string(),
        ),
        Reply::Fixed(status, body) => (*status, body.clone()),
    }
}
