use crate::error::UploadError;
use crate::upload::types::{FileSlot, SelectedFile, SubmissionId, UploadEvent, UploadRequest};
use futures::{stream, StreamExt};
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Response};
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use tracing::{debug, error, info, trace};

const CHUNK_SIZE: usize = 64 * 1024;

/// Failure body produced by the filter service.
#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Posts the two inputs to the filter endpoint and returns the raw result.
#[derive(Clone)]
pub struct FilterClient {
    http: reqwest::Client,
    endpoint: String,
}

impl FilterClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            // no timeout: a request runs until the server answers or the transport fails
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Runs one submission to completion and reports the outcome on `events`.
    pub async fn run(&self, request: UploadRequest, events: &Sender<UploadEvent>) {
        let id = request.id;
        let event = match self.filter(&request, events).await {
            Ok(bytes) => {
                info!(id = id.0, bytes = bytes.len(), "filter result received");
                UploadEvent::Completed { id, bytes }
            }
            Err(err) => {
                error!(id = id.0, error = %err, "upload failed");
                UploadEvent::Failed {
                    id,
                    reason: err.to_string(),
                }
            }
        };
        events.send(event).unwrap_or_default();
    }

    /// One multipart POST with `data_file` and `sku_file`. Progress ticks are
    /// sent while the body streams out.
    pub async fn filter(
        &self,
        request: &UploadRequest,
        events: &Sender<UploadEvent>,
    ) -> Result<Vec<u8>, UploadError> {
        let data = read_file(&request.data_file).await?;
        let sku = read_file(&request.sku_file).await?;

        let reporter = ProgressReporter {
            id: request.id,
            sent: Arc::new(AtomicU64::new(0)),
            total: (data.len() + sku.len()) as u64,
            events: events.clone(),
        };

        let form = Form::new()
            .part(
                FileSlot::Data.field_name(),
                reporter.part(&request.file(FileSlot::Data).name, data),
            )
            .part(
                FileSlot::Sku.field_name(),
                reporter.part(&request.file(FileSlot::Sku).name, sku),
            );

        info!(
            id = request.id.0,
            endpoint = %self.endpoint,
            data_file = %request.data_file.name,
            sku_file = %request.sku_file.name,
            total_bytes = reporter.total,
            "posting files"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(UploadError::Request)?;

        let status = response.status();
        if !status.is_success() {
            let detail = error_detail(response).await;
            return Err(UploadError::Status { status, detail });
        }

        debug!(
            %status,
            content_type = ?response.headers().get(CONTENT_TYPE),
            "response headers received"
        );

        let body = response.bytes().await.map_err(UploadError::ResponseBody)?;
        Ok(body.to_vec())
    }
}

async fn read_file(file: &SelectedFile) -> Result<Vec<u8>, UploadError> {
    tokio::fs::read(&file.path)
        .await
        .map_err(|source| UploadError::ReadFile {
            path: file.path.clone(),
            source,
        })
}

async fn error_detail(response: Response) -> String {
    match response.text().await {
        Ok(text) => match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => body.error,
            Err(_) => text,
        },
        Err(e) => format!("unreadable error body: {}", e),
    }
}

/// Counts body bytes handed to the transport, across both parts.
#[derive(Clone)]
struct ProgressReporter {
    id: SubmissionId,
    sent: Arc<AtomicU64>,
    total: u64,
    events: Sender<UploadEvent>,
}

impl ProgressReporter {
    fn part(&self, file_name: &str, bytes: Vec<u8>) -> Part {
        let length = bytes.len() as u64;
        let chunks: Vec<Result<Vec<u8>, std::io::Error>> = bytes
            .chunks(CHUNK_SIZE)
            .map(|chunk| Ok(chunk.to_vec()))
            .collect();

        let reporter = self.clone();
        let counted = stream::iter(chunks).inspect(move |chunk| {
            if let Ok(chunk) = chunk {
                reporter.record(chunk.len() as u64);
            }
        });

        Part::stream_with_length(Body::wrap_stream(counted), length).file_name(file_name.to_string())
    }

    fn record(&self, len: u64) {
        let loaded = self.sent.fetch_add(len, Ordering::SeqCst) + len;
        trace!(id = self.id.0, loaded, total = self.total, "upload progress");
        self.events
            .send(UploadEvent::Progress {
                id: self.id,
                loaded,
                total: Some(self.total).filter(|total| *total > 0),
            })
            .unwrap_or_default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Multipart;
    use axum::http::StatusCode as ServerStatus;
    use axum::routing::post;
    use axum::Router;
    use std::path::Path;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;

    async fn spawn_server(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/filter-excel/", addr)
    }

    /// Answers with one `name=file_name:len` line per received part.
    fn summarising_router(hits: Arc<AtomicUsize>) -> Router {
        Router::new().route(
            "/filter-excel/",
            post(move |mut multipart: Multipart| {
                let hits = hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    let mut lines = Vec::new();
                    while let Some(field) = multipart.next_field().await.unwrap() {
                        let name = field.name().unwrap_or_default().to_string();
                        let file_name = field.file_name().unwrap_or_default().to_string();
                        let data = field.bytes().await.unwrap();
                        lines.push(format!("{}={}:{}", name, file_name, data.len()));
                    }
                    (ServerStatus::OK, lines.join("\n").into_bytes())
                }
            }),
        )
    }

    fn write_file(dir: &Path, name: &str, len: usize) -> SelectedFile {
        let path = dir.join(name);
        std::fs::write(&path, vec![7u8; len]).unwrap();
        SelectedFile::from_path(path)
    }

    fn request(dir: &Path, data_len: usize, sku_len: usize) -> UploadRequest {
        UploadRequest {
            id: SubmissionId(1),
            data_file: write_file(dir, "sales.zip", data_len),
            sku_file: write_file(dir, "SKU List.xlsx", sku_len),
        }
    }

    #[tokio::test]
    async fn test_posts_both_named_parts_once() {
        let hits = Arc::new(AtomicUsize::new(0));
        let endpoint = spawn_server(summarising_router(hits.clone())).await;
        let dir = tempfile::tempdir().unwrap();
        let (tx, _rx) = mpsc::channel();

        let body = FilterClient::new(endpoint)
            .filter(&request(dir.path(), 10, 4), &tx)
            .await
            .unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(
            String::from_utf8(body).unwrap(),
            "data_file=sales.zip:10\nsku_file=SKU List.xlsx:4"
        );
    }

    #[tokio::test]
    async fn test_progress_ticks_are_cumulative() {
        let hits = Arc::new(AtomicUsize::new(0));
        let endpoint = spawn_server(summarising_router(hits)).await;
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path(), 3 * CHUNK_SIZE + 17, CHUNK_SIZE / 2);
        let total = (3 * CHUNK_SIZE + 17 + CHUNK_SIZE / 2) as u64;
        let (tx, rx) = mpsc::channel();

        FilterClient::new(endpoint).filter(&req, &tx).await.unwrap();

        let ticks: Vec<(u64, Option<u64>)> = rx
            .try_iter()
            .map(|event| match event {
                UploadEvent::Progress { loaded, total, .. } => (loaded, total),
                other => panic!("unexpected event {:?}", other),
            })
            .collect();

        assert_eq!(ticks.len(), 5);
        assert!(ticks.windows(2).all(|w| w[0].0 < w[1].0));
        assert!(ticks.iter().all(|(_, t)| *t == Some(total)));
        assert_eq!(ticks.last().unwrap().0, total);
    }

    #[tokio::test]
    async fn test_error_status_carries_server_message() {
        let router = Router::new().route(
            "/filter-excel/",
            post(|| async {
                (
                    ServerStatus::BAD_REQUEST,
                    r#"{"error": "'SKU Code' column not found in SKU file."}"#,
                )
            }),
        );
        let endpoint = spawn_server(router).await;
        let dir = tempfile::tempdir().unwrap();
        let (tx, _rx) = mpsc::channel();

        let err = FilterClient::new(endpoint)
            .filter(&request(dir.path(), 4, 4), &tx)
            .await
            .unwrap_err();

        match err {
            UploadError::Status { status, detail } => {
                assert_eq!(status.as_u16(), 400);
                assert_eq!(detail, "'SKU Code' column not found in SKU file.");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_json_error_body_is_kept_verbatim() {
        let router = Router::new().route(
            "/filter-excel/",
            post(|| async { (ServerStatus::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let endpoint = spawn_server(router).await;
        let dir = tempfile::tempdir().unwrap();
        let (tx, _rx) = mpsc::channel();

        let err = FilterClient::new(endpoint)
            .filter(&request(dir.path(), 4, 4), &tx)
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Status { ref detail, .. } if detail == "boom"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_a_request_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let dir = tempfile::tempdir().unwrap();
        let (tx, _rx) = mpsc::channel();

        let err = FilterClient::new(format!("http://{}/filter-excel/", addr))
            .filter(&request(dir.path(), 4, 4), &tx)
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Request(_)));
    }

    #[tokio::test]
    async fn test_unreadable_input_sends_nothing() {
        let hits = Arc::new(AtomicUsize::new(0));
        let endpoint = spawn_server(summarising_router(hits.clone())).await;
        let dir = tempfile::tempdir().unwrap();
        let mut req = request(dir.path(), 4, 4);
        req.sku_file = SelectedFile::from_path(dir.path().join("deleted.xlsx"));
        let (tx, _rx) = mpsc::channel();

        let err = FilterClient::new(endpoint).filter(&req, &tx).await.unwrap_err();

        assert!(matches!(err, UploadError::ReadFile { .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_run_reports_terminal_event() {
        let hits = Arc::new(AtomicUsize::new(0));
        let endpoint = spawn_server(summarising_router(hits)).await;
        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = mpsc::channel();

        FilterClient::new(endpoint).run(request(dir.path(), 2, 2), &tx).await;

        let last = rx.try_iter().last().unwrap();
        match last {
            UploadEvent::Completed { id, bytes } => {
                assert_eq!(id, SubmissionId(1));
                assert!(!bytes.is_empty());
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_reports_failure_event() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = mpsc::channel();

        FilterClient::new(format!("http://{}/filter-excel/", addr))
            .run(request(dir.path(), 2, 2), &tx)
            .await;

        let last = rx.try_iter().last().unwrap();
        assert!(matches!(last, UploadEvent::Failed { id: SubmissionId(1), .. }));
    }
}
