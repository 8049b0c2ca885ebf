//! Client for the parish spreadsheet's Apps Script web app.
//!
//! The script exposes one endpoint (ending in `/exec`). `GET ?sheet=<name>`
//! returns the sheet's rows as a JSON array; `POST ?sheet=<name>` with a
//! form-encoded `payload` field appends or updates one row.
//!
//! The client never fails hard: reads degrade to an empty list and writes
//! report a failed [`SyncResult`], so an unreachable spreadsheet leaves the
//! local copy usable.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, SecondsFormat, Utc};
use serde_json::{Map, Value};

use hillfoots_core::{Collection, ParishError, ParishResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Rows pushed per collection by [`SheetsClient::push_all`].
pub const PUSH_LIMIT: usize = 50;

const HEALTH_CHECK_SHEET: &str = "health_check";

/// Outcome of a write or connection check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncResult {
    pub success: bool,
    pub message: String,
    /// Local wall-clock time the result was produced (HH:MM:SS).
    pub timestamp: String,
}

impl SyncResult {
    fn ok(message: impl Into<String>) -> Self {
        Self::new(true, message)
    }

    fn failed(message: impl Into<String>) -> Self {
        Self::new(false, message)
    }

    fn new(success: bool, message: impl Into<String>) -> Self {
        SyncResult {
            success,
            message: message.into(),
            timestamp: Local::now().format("%H:%M:%S").to_string(),
        }
    }
}

/// Remote copy of the parish collections.
#[async_trait]
pub trait SyncApi: Send + Sync {
    /// All rows of `collection`, or an empty list if they can't be read.
    async fn fetch(&self, collection: Collection) -> Vec<Value>;

    async fn push(&self, collection: Collection, record: &Value) -> SyncResult;

    async fn test_connection(&self) -> SyncResult;
}

/// Trim whitespace and a single trailing slash.
pub fn sanitize_url(url: &str) -> String {
    let url = url.trim();
    url.strip_suffix('/').unwrap_or(url).to_string()
}

/// `url` with a `sheet` query parameter appended.
pub fn sheet_url(url: &str, sheet: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    let sheet: String = url::form_urlencoded::byte_serialize(sheet.as_bytes()).collect();
    format!("{}{}sheet={}", url, separator, sheet)
}

/// Interpret a fetch response body.
fn rows_from_response(sheet: &str, body: Value) -> Vec<Value> {
    match body {
        Value::Array(rows) => rows,
        Value::Object(ref obj) if obj.contains_key("error") => {
            tracing::error!(sheet, "script error: {}", obj["error"]);
            Vec::new()
        }
        other => {
            tracing::warn!(sheet, "expected a JSON array, got: {other}");
            Vec::new()
        }
    }
}

/// The record as sent to the script: its own fields plus `sheet` and
/// `sync_timestamp`.
fn push_payload(sheet: &str, record: &Value) -> Value {
    let mut payload = match record {
        Value::Object(fields) => fields.clone(),
        other => {
            let mut wrapped = Map::new();
            wrapped.insert("value".to_string(), other.clone());
            wrapped
        }
    };

    payload.insert("sheet".to_string(), Value::from(sheet));
    payload.insert(
        "sync_timestamp".to_string(),
        Value::from(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
    Value::Object(payload)
}

pub struct SheetsClient {
    http: reqwest::Client,
    url: String,
}

impl SheetsClient {
    pub fn new(url: &str) -> ParishResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ParishError::Sync(format!("Could not build HTTP client: {e}")))?;

        Ok(SheetsClient {
            http,
            url: sanitize_url(url),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn is_valid(&self) -> bool {
        !self.url.is_empty() && self.url.contains("/exec")
    }

    /// Push the most recent [`PUSH_LIMIT`] records one after another.
    pub async fn push_all(&self, collection: Collection, records: &[Value]) -> Vec<SyncResult> {
        let recent = &records[records.len().saturating_sub(PUSH_LIMIT)..];

        let mut results = Vec::with_capacity(recent.len());
        for record in recent {
            results.push(self.push(collection, record).await);
        }
        results
    }
}

#[async_trait]
impl SyncApi for SheetsClient {
    async fn fetch(&self, collection: Collection) -> Vec<Value> {
        if !self.is_valid() {
            return Vec::new();
        }

        let sheet = collection.name();
        let response = match self.http.get(sheet_url(&self.url, sheet)).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(sheet, "fetch error: {e}");
                return Vec::new();
            }
        };

        if !response.status().is_success() {
            tracing::warn!(sheet, status = %response.status(), "fetch failed");
            return Vec::new();
        }

        match response.json::<Value>().await {
            Ok(body) => {
                let rows = rows_from_response(sheet, body);
                tracing::debug!(sheet, rows = rows.len(), "fetched sheet");
                rows
            }
            Err(e) => {
                tracing::error!(sheet, "unreadable response: {e}");
                Vec::new()
            }
        }
    }

    async fn push(&self, collection: Collection, record: &Value) -> SyncResult {
        if !self.is_valid() {
            return SyncResult::failed("Invalid Script URL");
        }

        let sheet = collection.name();
        let payload = push_payload(sheet, record).to_string();
        tracing::debug!(sheet, "syncing record");

        let result = self
            .http
            .post(sheet_url(&self.url, sheet))
            .form(&[("payload", payload)])
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_client_error() || response.status().is_server_error() => {
                tracing::warn!(sheet, status = %response.status(), "sync rejected");
                SyncResult::failed(format!("Server error: {}", response.status().as_u16()))
            }
            Ok(_) => SyncResult::ok(format!("Sync dispatched to '{sheet}'.")),
            Err(e) => {
                tracing::error!(sheet, "sync dispatch failed: {e}");
                SyncResult::failed(format!("Network error: {e}"))
            }
        }
    }

    async fn test_connection(&self) -> SyncResult {
        if !self.is_valid() {
            return SyncResult::failed("URL must end in /exec");
        }

        match self.http.get(sheet_url(&self.url, HEALTH_CHECK_SHEET)).send().await {
            Ok(response) if response.status().is_success() => {
                SyncResult::ok("Connection Verified! Script is active.")
            }
            Ok(response) => {
                SyncResult::failed(format!("Server error: {}", response.status().as_u16()))
            }
            Err(e) => {
                tracing::warn!("connection check failed: {e}");
                SyncResult::failed("Network error. Check script deployment and access (Anyone).")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve one canned response per expected request and hand back the raw
    /// requests that were received.
    async fn serve(responses: Vec<(u16, String)>) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let mut requests = Vec::new();
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                requests.push(read_request(&mut socket).await);

                let response = format!(
                    "HTTP/1.1 {status} Status\r\nContent-Type: application/json\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();
            }
            requests
        });

        (format!("http://{addr}/macros/s/abc/exec"), handle)
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|l| {
                        let (name, value) = l.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())?
                    })
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }

        String::from_utf8_lossy(&buf).into_owned()
    }

    fn form_payload(request: &str) -> Value {
        let body = request.split("\r\n\r\n").nth(1).unwrap();
        let (_, payload) = url::form_urlencoded::parse(body.as_bytes())
            .find(|(k, _)| k == "payload")
            .unwrap();
        serde_json::from_str(&payload).unwrap()
    }

    #[test]
    fn test_sanitize_url() {
        assert_eq!(
            sanitize_url("  https://script.google.com/macros/s/abc/exec/ "),
            "https://script.google.com/macros/s/abc/exec"
        );
        assert_eq!(sanitize_url(""), "");
    }

    #[test]
    fn test_sheet_url_separator() {
        assert_eq!(sheet_url("https://x/exec", "events"), "https://x/exec?sheet=events");
        assert_eq!(
            sheet_url("https://x/exec?key=1", "events"),
            "https://x/exec?key=1&sheet=events"
        );
        assert_eq!(sheet_url("https://x/exec", "my sheet"), "https://x/exec?sheet=my+sheet");
    }

    #[test]
    fn test_rows_from_response() {
        assert_eq!(rows_from_response("events", json!([{"id": 1}])).len(), 1);
        assert!(rows_from_response("events", json!({"error": "no such sheet"})).is_empty());
        assert!(rows_from_response("events", json!({"rows": []})).is_empty());
        assert!(rows_from_response("events", json!(null)).is_empty());
    }

    #[test]
    fn test_push_payload_adds_sheet_and_timestamp() {
        let payload = push_payload("groups", &json!({"id": "g1", "name": "Guild"}));

        assert_eq!(payload["id"], "g1");
        assert_eq!(payload["sheet"], "groups");
        let stamp = payload["sync_timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok());
    }

    #[tokio::test]
    async fn test_invalid_url_short_circuits() {
        let client = SheetsClient::new("https://example.com/not-a-script").unwrap();

        assert!(client.fetch(Collection::Events).await.is_empty());

        let check = client.test_connection().await;
        assert!(!check.success);
        assert_eq!(check.message, "URL must end in /exec");

        let push = client.push(Collection::Events, &json!({"id": "e"})).await;
        assert!(!push.success);
        assert_eq!(push.message, "Invalid Script URL");
    }

    #[tokio::test]
    async fn test_fetch_reads_rows() {
        let (url, server) = serve(vec![(200, r#"[{"Title": "Choir"}, {"Title": "Guild"}]"#.into())]).await;
        let client = SheetsClient::new(&url).unwrap();

        let rows = client.fetch(Collection::Subscribers).await;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["Title"], "Guild");

        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("GET /macros/s/abc/exec?sheet=subscriber HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_fetch_degrades_on_errors() {
        let (url, server) = serve(vec![
            (500, "{}".into()),
            (200, r#"{"error": "Sheet not found"}"#.into()),
            (200, "not json".into()),
        ])
        .await;
        let client = SheetsClient::new(&url).unwrap();

        assert!(client.fetch(Collection::Events).await.is_empty());
        assert!(client.fetch(Collection::Events).await.is_empty());
        assert!(client.fetch(Collection::Events).await.is_empty());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_push_posts_form_payload() {
        let (url, server) = serve(vec![(200, "{}".into())]).await;
        let client = SheetsClient::new(&url).unwrap();

        let result = client
            .push(Collection::Requests, &json!({"id": "r1", "name": "Ann"}))
            .await;
        assert!(result.success);
        assert_eq!(result.message, "Sync dispatched to 'requests'.");

        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("POST /macros/s/abc/exec?sheet=requests HTTP/1.1"));
        assert!(requests[0].to_lowercase().contains("content-type: application/x-www-form-urlencoded"));

        let payload = form_payload(&requests[0]);
        assert_eq!(payload["name"], "Ann");
        assert_eq!(payload["sheet"], "requests");
    }

    #[tokio::test]
    async fn test_push_all_sends_last_fifty() {
        let records: Vec<Value> = (0..55).map(|i| json!({"id": format!("s{i}")})).collect();
        let (url, server) = serve(vec![(200, "{}".into()); PUSH_LIMIT]).await;
        let client = SheetsClient::new(&url).unwrap();

        let results = client.push_all(Collection::Subscribers, &records).await;
        assert_eq!(results.len(), PUSH_LIMIT);
        assert!(results.iter().all(|r| r.success));

        let requests = server.await.unwrap();
        assert_eq!(form_payload(&requests[0])["id"], "s5");
        assert_eq!(form_payload(&requests[49])["id"], "s54");
    }

    #[tokio::test]
    async fn test_connection_check() {
        let (url, server) = serve(vec![(200, "{}".into()), (403, "{}".into())]).await;
        let client = SheetsClient::new(&format!("{url}/")).unwrap();

        let ok = client.test_connection().await;
        assert!(ok.success, "{}", ok.message);

        let denied = client.test_connection().await;
        assert!(!denied.success);
        assert_eq!(denied.message, "Server error: 403");

        let requests = server.await.unwrap();
        assert!(requests[0].contains("?sheet=health_check"));
    }
}
