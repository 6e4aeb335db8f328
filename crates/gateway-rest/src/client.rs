//! HTTP client implementing [`DocumentGateway`] against the document store
//! REST API.
//!
//! Endpoints:
//!   GET    /v1/users/{uid}/{collection}            list a collection
//!   POST   /v1/users/{uid}/{collection}            create a document
//!   GET    /v1/users/{uid}/{collection}/{doc}      read a document (404 = absent)
//!   PATCH  /v1/users/{uid}/{collection}/{doc}      create-or-merge fields
//!   DELETE /v1/users/{uid}/{collection}/{doc}      delete a document
//!
//! The store has no push channel, so `subscribe` polls the path and emits a
//! snapshot event only when the payload differs from the previous poll.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;

use certihub_sync::{
    DocumentGateway, DocumentRecord, GatewayFault, Result, SnapshotEvent, StorePath, Subscription,
    SyncError,
};

use crate::config::RestGatewayConfig;

const MAX_LOG_BODY_CHARS: usize = 512;

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    code: String,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ListDocumentsResponse {
    documents: Vec<DocumentRecord>,
}

#[derive(Debug, Deserialize)]
struct DocumentResponse {
    fields: Value,
}

#[derive(Debug, Deserialize)]
struct CreateDocumentResponse {
    id: String,
}

fn transport(err: reqwest::Error) -> SyncError {
    SyncError::gateway("transport", err.to_string())
}

/// Document store client. Cheap to clone; the underlying connection pool is
/// shared.
#[derive(Debug, Clone)]
pub struct RestDocumentGateway {
    client: reqwest::Client,
    config: RestGatewayConfig,
}

impl RestDocumentGateway {
    pub fn new(config: RestGatewayConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(transport)?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &StorePath) -> String {
        format!("{}/v1/{}", self.config.base_url, path)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(api_key) = &self.config.api_key {
            let auth_value = HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|_| SyncError::gateway("config", "API key is not a valid header value"))?;
            headers.insert(AUTHORIZATION, auth_value);
        }
        Ok(headers)
    }

    fn log_response(status: StatusCode, body: &str) {
        if status.is_success() {
            debug!("store response status: {}", status);
            return;
        }
        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!("store response error ({}): {}", status, preview);
    }

    fn error_from_body(status: StatusCode, body: &str) -> SyncError {
        if let Ok(error) = serde_json::from_str::<ApiErrorResponse>(body) {
            return SyncError::gateway(error.code, error.message);
        }
        SyncError::gateway(
            format!("http_{}", status.as_u16()),
            format!("Request failed: {}", body),
        )
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let body = response.text().await.map_err(transport)?;
        Self::log_response(status, &body);

        if !status.is_success() {
            return Err(Self::error_from_body(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            log::error!("failed to deserialize store response. Body: {}, Error: {}", body, e);
            SyncError::gateway("bad_response", format!("Failed to parse response: {}", e))
        })
    }

    /// Check the status of a response whose body carries no data.
    async fn ensure_success(response: reqwest::Response) -> Result<()> {
        let status = response.status();
        if status.is_success() {
            debug!("store response status: {}", status);
            return Ok(());
        }
        let body = response.text().await.map_err(transport)?;
        Self::log_response(status, &body);
        Err(Self::error_from_body(status, &body))
    }

    async fn list_documents(&self, path: &StorePath) -> Result<Vec<DocumentRecord>> {
        let response = self
            .client
            .get(self.url(path))
            .headers(self.headers()?)
            .send()
            .await
            .map_err(transport)?;
        let list: ListDocumentsResponse = Self::parse_response(response).await?;
        Ok(list.documents)
    }

    async fn get_document(&self, path: &StorePath) -> Result<Option<Value>> {
        let response = self
            .client
            .get(self.url(path))
            .headers(self.headers()?)
            .send()
            .await
            .map_err(transport)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let document: DocumentResponse = Self::parse_response(response).await?;
        Ok(Some(document.fields))
    }

    /// One poll of `path`, returning the event plus a fingerprint used for
    /// change detection.
    async fn poll_once(&self, path: &StorePath) -> Result<(SnapshotEvent, String)> {
        match path {
            StorePath::Collection { .. } => {
                let documents = self.list_documents(path).await?;
                let fingerprint = serde_json::to_string(&documents)?;
                Ok((SnapshotEvent::Collection(documents), fingerprint))
            }
            StorePath::Document { .. } => {
                let fields = self.get_document(path).await?;
                let fingerprint = serde_json::to_string(&fields)?;
                Ok((SnapshotEvent::Document(fields), fingerprint))
            }
        }
    }

    async fn poll_loop(
        self,
        path: StorePath,
        events: mpsc::Sender<SnapshotEvent>,
        interval: Duration,
    ) {
        let mut last_fingerprint: Option<String> = None;
        let mut last_error: Option<String> = None;
        loop {
            match self.poll_once(&path).await {
                Ok((event, fingerprint)) => {
                    last_error = None;
                    if last_fingerprint.as_deref() != Some(&fingerprint) {
                        last_fingerprint = Some(fingerprint);
                        if events.send(event).await.is_err() {
                            return;
                        }
                    }
                }
                Err(err) => {
                    // Repeat faults are collapsed so an outage does not flood
                    // the notice stream once per poll.
                    let message = err.to_string();
                    if last_error.as_deref() != Some(&message) {
                        last_error = Some(message.clone());
                        let fault = GatewayFault {
                            code: err.gateway_code().unwrap_or("transport").to_string(),
                            message,
                        };
                        if events.send(SnapshotEvent::Error(fault)).await.is_err() {
                            return;
                        }
                    }
                }
            }
            tokio::time::sleep(interval).await;
        }
    }
}

#[async_trait]
impl DocumentGateway for RestDocumentGateway {
    async fn subscribe(&self, path: StorePath) -> Result<Subscription> {
        let (tx, rx) = mpsc::channel(16);
        let client = self.clone();
        let interval = self.config.poll_interval();
        debug!("opening polled subscription on {}", path);
        let task = tokio::spawn(client.poll_loop(path, tx, interval));
        Ok(Subscription::new(rx, Some(task)))
    }

    async fn create(&self, path: StorePath, fields: Value) -> Result<String> {
        let response = self
            .client
            .post(self.url(&path))
            .headers(self.headers()?)
            .json(&fields)
            .send()
            .await
            .map_err(transport)?;
        let created: CreateDocumentResponse = Self::parse_response(response).await?;
        debug!("created {} under {}", created.id, path);
        Ok(created.id)
    }

    async fn merge_upsert(&self, path: StorePath, fields: Value) -> Result<()> {
        let response = self
            .client
            .patch(self.url(&path))
            .headers(self.headers()?)
            .json(&fields)
            .send()
            .await
            .map_err(transport)?;
        Self::ensure_success(response).await
    }

    async fn delete(&self, path: StorePath) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&path))
            .headers(self.headers()?)
            .send()
            .await
            .map_err(transport)?;
        Self::ensure_success(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Arc;

    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::Mutex as TokioMutex;
    use tokio::time::timeout;

    #[derive(Debug, Clone)]
    struct CapturedRequest {
        request_line: String,
        authorization: Option<String>,
        body: String,
    }

    #[derive(Debug, Clone)]
    struct MockResponse {
        status: u16,
        body: String,
    }

    fn ok(body: &str) -> MockResponse {
        MockResponse {
            status: 200,
            body: body.to_string(),
        }
    }

    fn status_text(status: u16) -> &'static str {
        match status {
            200 => "OK",
            201 => "Created",
            404 => "Not Found",
            500 => "Internal Server Error",
            _ => "Error",
        }
    }

    fn header_end_offset(buffer: &[u8]) -> Option<usize> {
        buffer.windows(4).position(|window| window == b"\r\n\r\n")
    }

    async fn read_http_request(stream: &mut tokio::net::TcpStream) -> Option<CapturedRequest> {
        let mut buffer = Vec::new();
        loop {
            let mut chunk = [0_u8; 2048];
            let read = stream.read(&mut chunk).await.ok()?;
            if read == 0 {
                return None;
            }
            buffer.extend_from_slice(&chunk[..read]);
            if header_end_offset(&buffer).is_some() {
                break;
            }
        }

        let header_end = header_end_offset(&buffer)?;
        let head = String::from_utf8_lossy(&buffer[..header_end]).to_string();
        let mut lines = head.lines();
        let request_line = lines.next()?.to_string();

        let mut content_length = 0_usize;
        let mut authorization = None;
        for line in lines {
            if let Some((name, value)) = line.split_once(':') {
                match name.trim().to_ascii_lowercase().as_str() {
                    "content-length" => content_length = value.trim().parse().unwrap_or(0),
                    "authorization" => authorization = Some(value.trim().to_string()),
                    _ => {}
                }
            }
        }

        let mut body = buffer[header_end + 4..].to_vec();
        while body.len() < content_length {
            let mut chunk = [0_u8; 2048];
            let read = stream.read(&mut chunk).await.ok()?;
            if read == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..read]);
        }

        Some(CapturedRequest {
            request_line,
            authorization,
            body: String::from_utf8_lossy(&body).to_string(),
        })
    }

    async fn start_mock_server(
        responses: Vec<MockResponse>,
    ) -> (
        RestGatewayConfig,
        Arc<TokioMutex<Vec<CapturedRequest>>>,
        tokio::task::JoinHandle<()>,
    ) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("listener addr");
        let captured = Arc::new(TokioMutex::new(Vec::<CapturedRequest>::new()));
        let scripted = Arc::new(TokioMutex::new(VecDeque::from(responses)));
        let captured_clone = Arc::clone(&captured);

        let handle = tokio::spawn(async move {
            loop {
                let (mut stream, _) = match listener.accept().await {
                    Ok(value) => value,
                    Err(_) => break,
                };
                let Some(request) = read_http_request(&mut stream).await else {
                    continue;
                };
                captured_clone.lock().await.push(request);

                // Exhausted scripts repeat their last response.
                let response = {
                    let mut scripts = scripted.lock().await;
                    if scripts.len() > 1 {
                        scripts.pop_front()
                    } else {
                        scripts.front().cloned()
                    }
                }
                .unwrap_or(MockResponse {
                    status: 500,
                    body: String::new(),
                });

                let raw = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    response.status,
                    status_text(response.status),
                    response.body.len(),
                    response.body
                );
                let _ = stream.write_all(raw.as_bytes()).await;
                let _ = stream.flush().await;
            }
        });

        let mut config = RestGatewayConfig::new(&format!("http://{}", addr));
        config.poll_interval_ms = 25;
        (config, captured, handle)
    }

    #[tokio::test]
    async fn create_posts_to_the_collection_path() {
        let (config, captured, server) = start_mock_server(vec![ok(r#"{"id":"doc-7"}"#)]).await;
        let gateway = RestDocumentGateway::new(config.with_api_key("secret")).unwrap();

        let id = gateway
            .create(StorePath::certifications("u1"), json!({"title": "Rust"}))
            .await
            .unwrap();
        assert_eq!(id, "doc-7");

        let requests = captured.lock().await;
        assert_eq!(
            requests[0].request_line,
            "POST /v1/users/u1/certifications HTTP/1.1"
        );
        assert_eq!(requests[0].authorization.as_deref(), Some("Bearer secret"));
        assert!(requests[0].body.contains("\"title\":\"Rust\""));
        server.abort();
    }

    #[tokio::test]
    async fn merge_upsert_patches_the_document_path() {
        let (config, captured, server) = start_mock_server(vec![ok("{}")]).await;
        let gateway = RestDocumentGateway::new(config).unwrap();

        gateway
            .merge_upsert(StorePath::profile("u1"), json!({"bio": "Rust dev"}))
            .await
            .unwrap();

        let requests = captured.lock().await;
        assert_eq!(
            requests[0].request_line,
            "PATCH /v1/users/u1/profile/main HTTP/1.1"
        );
        server.abort();
    }

    #[tokio::test]
    async fn api_error_body_is_surfaced_with_its_code() {
        let (config, _captured, server) = start_mock_server(vec![MockResponse {
            status: 500,
            body: r#"{"code":"internal","message":"boom"}"#.to_string(),
        }])
        .await;
        let gateway = RestDocumentGateway::new(config).unwrap();

        let err = gateway
            .delete(StorePath::document(
                "u1",
                certihub_sync::StoreCollection::Courses,
                "doc-1",
            ))
            .await
            .unwrap_err();
        assert_eq!(err.gateway_code(), Some("internal"));
        server.abort();
    }

    #[tokio::test]
    async fn missing_document_snapshot_is_none() {
        let (config, _captured, server) = start_mock_server(vec![MockResponse {
            status: 404,
            body: r#"{"code":"not_found","message":"no such document"}"#.to_string(),
        }])
        .await;
        let gateway = RestDocumentGateway::new(config).unwrap();

        let mut subscription = gateway.subscribe(StorePath::profile("u1")).await.unwrap();
        let event = timeout(Duration::from_secs(2), subscription.next_event())
            .await
            .expect("first snapshot")
            .expect("stream open");
        assert!(matches!(event, SnapshotEvent::Document(None)));
        server.abort();
    }

    #[tokio::test]
    async fn subscription_emits_only_when_the_payload_changes() {
        let unchanged = r#"{"documents":[]}"#;
        let changed =
            r#"{"documents":[{"id":"c1","fields":{"title":"Rust Basics","issuer":"edX","month":"May","year":"2024"}}]}"#;
        let (config, captured, server) = start_mock_server(vec![
            ok(unchanged),
            ok(unchanged),
            ok(unchanged),
            ok(changed),
        ])
        .await;
        let gateway = RestDocumentGateway::new(config).unwrap();

        let mut subscription = gateway
            .subscribe(StorePath::certifications("u1"))
            .await
            .unwrap();

        let first = timeout(Duration::from_secs(2), subscription.next_event())
            .await
            .expect("first snapshot")
            .expect("stream open");
        match first {
            SnapshotEvent::Collection(records) => assert!(records.is_empty()),
            other => panic!("unexpected event: {:?}", other),
        }

        // The identical polls in between must not produce events.
        let second = timeout(Duration::from_secs(2), subscription.next_event())
            .await
            .expect("changed snapshot")
            .expect("stream open");
        match second {
            SnapshotEvent::Collection(records) => {
                assert_eq!(records.len(), 1);
                assert_eq!(records[0].id, "c1");
            }
            other => panic!("unexpected event: {:?}", other),
        }

        assert!(captured.lock().await.len() >= 4);
        server.abort();
    }

    #[tokio::test]
    async fn repeated_poll_failures_emit_one_fault() {
        let (config, _captured, server) = start_mock_server(vec![MockResponse {
            status: 500,
            body: r#"{"code":"internal","message":"down"}"#.to_string(),
        }])
        .await;
        let gateway = RestDocumentGateway::new(config).unwrap();

        let mut subscription = gateway
            .subscribe(StorePath::certifications("u1"))
            .await
            .unwrap();

        let event = timeout(Duration::from_secs(2), subscription.next_event())
            .await
            .expect("fault event")
            .expect("stream open");
        match event {
            SnapshotEvent::Error(fault) => assert_eq!(fault.code, "internal"),
            other => panic!("unexpected event: {:?}", other),
        }

        // The same failure keeps repeating; no further events should arrive.
        let next = timeout(Duration::from_millis(200), subscription.next_event()).await;
        assert!(next.is_err());
        server.abort();
    }

    #[tokio::test]
    async fn dropping_the_subscription_stops_polling() {
        let (config, captured, server) = start_mock_server(vec![ok(r#"{"documents":[]}"#)]).await;
        let gateway = RestDocumentGateway::new(config).unwrap();

        let subscription = gateway
            .subscribe(StorePath::certifications("u1"))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        drop(subscription);

        tokio::time::sleep(Duration::from_millis(60)).await;
        let polls_after_drop = captured.lock().await.len();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(captured.lock().await.len(), polls_after_drop);
        server.abort();
    }
}
