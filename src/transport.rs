//! HTTP transport against the portal backend.
//!
//! All network access goes through the [`Transport`] trait so the rest of
//! the crate can be exercised against a fixture double. [`HttpTransport`]
//! is the real implementation over a blocking `reqwest` client.
//!
//! Error policy: every failure surfaces to the caller — nothing is
//! swallowed. GETs retry exactly once on a network failure (idempotent);
//! writes and uploads never retry, a duplicate side effect being worse
//! than a visible error.

use std::io::Read;
use std::sync::Arc;

use serde_json::Value;

use crate::config;

/// Fractional-progress callback, invoked with values in [0.0, 1.0].
pub type ProgressCallback = Arc<dyn Fn(f64) + Send + Sync>;

/// Transport-level failures.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("HTTP {status}")]
    Http { status: u16, message: Option<String> },
    #[error("Request timed out")]
    Timeout,
    #[error("Invalid response body: {0}")]
    Decode(String),
    /// Failure reported inside a 2xx JSON envelope (`{"error": ...}`).
    /// Several list endpoints answer this way instead of a status code.
    #[error("Backend error: {0}")]
    Backend(String),
}

impl TransportError {
    /// Server-supplied message when present, else a generic fallback.
    /// Never exposes transport internals to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Http {
                message: Some(msg), ..
            } => msg.clone(),
            Self::Backend(msg) => msg.clone(),
            Self::Timeout => "The request timed out. Please try again.".to_string(),
            _ => "Something went wrong. Please try again.".to_string(),
        }
    }
}

/// One file handed to the multipart upload endpoint.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub patient_id: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    pub note: Option<String>,
}

/// Backend access primitives.
///
/// Object-safe by design: the portal holds a `Box<dyn Transport>` chosen at
/// startup (real client or test fixture), never resolved at call time.
pub trait Transport: Send + Sync {
    fn get(&self, path: &str) -> Result<Value, TransportError>;
    fn post_json(&self, path: &str, body: &Value) -> Result<Value, TransportError>;
    fn put(&self, path: &str, body: &Value) -> Result<Value, TransportError>;
    fn delete(&self, path: &str) -> Result<Value, TransportError>;

    /// Multipart upload with fractional progress reporting. Bounded by
    /// [`config::UPLOAD_TIMEOUT`]; hitting the ceiling yields `Timeout`.
    fn upload_with_progress(
        &self,
        path: &str,
        upload: FileUpload,
        on_progress: ProgressCallback,
    ) -> Result<Value, TransportError>;
}

// ---------------------------------------------------------------------------
// HttpTransport
// ---------------------------------------------------------------------------

/// Blocking reqwest transport against a configured base URL.
pub struct HttpTransport {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(config: &config::PortalConfig) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(config::REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: config.base_url().to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn dispatch(&self, request: reqwest::blocking::RequestBuilder) -> Result<Value, TransportError> {
        let response = request.send().map_err(map_send_error)?;
        read_json_body(response)
    }

    fn get_once(&self, path: &str) -> Result<Value, TransportError> {
        self.dispatch(self.client.get(self.url(path)))
    }
}

impl Transport for HttpTransport {
    fn get(&self, path: &str) -> Result<Value, TransportError> {
        get_with_retry(path, || self.get_once(path))
    }

    fn post_json(&self, path: &str, body: &Value) -> Result<Value, TransportError> {
        self.dispatch(self.client.post(self.url(path)).json(body))
    }

    fn put(&self, path: &str, body: &Value) -> Result<Value, TransportError> {
        self.dispatch(self.client.put(self.url(path)).json(body))
    }

    fn delete(&self, path: &str) -> Result<Value, TransportError> {
        self.dispatch(self.client.delete(self.url(path)))
    }

    fn upload_with_progress(
        &self,
        path: &str,
        upload: FileUpload,
        on_progress: ProgressCallback,
    ) -> Result<Value, TransportError> {
        let total = upload.bytes.len() as u64;
        let reader = ProgressReader::new(
            std::io::Cursor::new(upload.bytes),
            total,
            Arc::clone(&on_progress),
        );

        let part = reqwest::blocking::multipart::Part::reader_with_length(reader, total)
            .file_name(upload.file_name.clone())
            .mime_str(&upload.content_type)
            .map_err(|e| TransportError::Decode(format!("invalid content type: {e}")))?;

        let mut form = reqwest::blocking::multipart::Form::new()
            .text("patientId", upload.patient_id.clone())
            .part("file", part);
        if let Some(note) = upload.note {
            form = form.text("note", note);
        }

        let result = self.dispatch(
            self.client
                .post(self.url(path))
                .multipart(form)
                .timeout(config::UPLOAD_TIMEOUT),
        );

        if result.is_ok() {
            // The reader only sees bytes handed to the HTTP stack; pin the
            // bar to complete once the server has acknowledged.
            on_progress(1.0);
        }
        result
    }
}

/// One extra attempt for idempotent reads, taken only after a
/// connection-level failure. HTTP statuses and timeouts surface as-is,
/// and writes never come through here.
fn get_with_retry<F>(path: &str, mut attempt: F) -> Result<Value, TransportError>
where
    F: FnMut() -> Result<Value, TransportError>,
{
    match attempt() {
        Err(TransportError::Network(first)) => {
            tracing::warn!(path, error = %first, "GET failed, retrying once");
            attempt()
        }
        other => other,
    }
}

fn map_send_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Network(error.to_string())
    }
}

fn read_json_body(response: reqwest::blocking::Response) -> Result<Value, TransportError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(http_error(status.as_u16(), &body));
    }
    response
        .json()
        .map_err(|e| TransportError::Decode(e.to_string()))
}

/// Build an `Http` error, extracting the server's `{"error": ...}` message
/// when the body carries one.
fn http_error(status: u16, body: &str) -> TransportError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string));
    TransportError::Http { status, message }
}

/// Unpack a `{"<key>": [...]}` list envelope.
///
/// An `{"error": ...}` envelope is a failed fetch — it must never be
/// mistaken for an empty list. A missing key reads as an empty list
/// (the backend omits it when there is nothing to return).
pub fn parse_list_envelope<T: serde::de::DeserializeOwned>(
    body: Value,
    key: &str,
) -> Result<Vec<T>, TransportError> {
    if let Some(error) = body.get("error").and_then(Value::as_str) {
        return Err(TransportError::Backend(error.to_string()));
    }
    match body.get(key) {
        None => Ok(Vec::new()),
        Some(list) => serde_json::from_value(list.clone())
            .map_err(|e| TransportError::Decode(e.to_string())),
    }
}

// ---------------------------------------------------------------------------
// ProgressReader
// ---------------------------------------------------------------------------

/// `Read` adapter that reports the fraction of `total` bytes consumed.
struct ProgressReader<R> {
    inner: R,
    total: u64,
    sent: u64,
    on_progress: ProgressCallback,
}

impl<R: Read> ProgressReader<R> {
    fn new(inner: R, total: u64, on_progress: ProgressCallback) -> Self {
        Self {
            inner,
            total,
            sent: 0,
            on_progress,
        }
    }
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.sent += n as u64;
        let fraction = if self.total == 0 {
            1.0
        } else {
            (self.sent as f64 / self.total as f64).min(1.0)
        };
        (self.on_progress)(fraction);
        Ok(n)
    }
}

// ---------------------------------------------------------------------------
// Test fixture
// ---------------------------------------------------------------------------

/// Scripted transport double used across the crate's tests.
///
/// Responses are consumed in FIFO order; every call is recorded as a
/// `(method, path)` pair so tests can assert on exactly which requests
/// were (or were not) issued.
#[cfg(test)]
pub(crate) mod fixture {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub(crate) struct FixtureTransport {
        responses: Mutex<VecDeque<Result<Value, TransportError>>>,
        calls: Mutex<Vec<(String, String)>>,
        progress_steps: Vec<f64>,
    }

    impl FixtureTransport {
        pub(crate) fn new() -> Self {
            Self {
                progress_steps: vec![0.5, 1.0],
                ..Self::default()
            }
        }

        pub(crate) fn push_ok(&self, value: Value) {
            self.responses.lock().unwrap().push_back(Ok(value));
        }

        pub(crate) fn push_err(&self, error: TransportError) {
            self.responses.lock().unwrap().push_back(Err(error));
        }

        pub(crate) fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn next(&self, method: &str, path: &str) -> Result<Value, TransportError> {
            self.calls
                .lock()
                .unwrap()
                .push((method.to_string(), path.to_string()));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| panic!("fixture exhausted at {method} {path}"))
        }
    }

    impl Transport for FixtureTransport {
        fn get(&self, path: &str) -> Result<Value, TransportError> {
            self.next("GET", path)
        }

        fn post_json(&self, path: &str, _body: &Value) -> Result<Value, TransportError> {
            self.next("POST", path)
        }

        fn put(&self, path: &str, _body: &Value) -> Result<Value, TransportError> {
            self.next("PUT", path)
        }

        fn delete(&self, path: &str) -> Result<Value, TransportError> {
            self.next("DELETE", path)
        }

        fn upload_with_progress(
            &self,
            path: &str,
            _upload: FileUpload,
            on_progress: ProgressCallback,
        ) -> Result<Value, TransportError> {
            // Streamed fractions are replayed before the response
            // surfaces, the way a real server consumes the whole body
            // before answering (possibly with an error).
            for &step in &self.progress_steps {
                on_progress(step);
            }
            self.next("POST", path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn collect_progress(payload: &[u8], chunk: usize) -> Vec<f64> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: ProgressCallback = Arc::new(move |f| sink.lock().unwrap().push(f));

        let mut reader = ProgressReader::new(
            std::io::Cursor::new(payload.to_vec()),
            payload.len() as u64,
            callback,
        );
        let mut buf = vec![0u8; chunk];
        while reader.read(&mut buf).unwrap() > 0 {}

        let out = seen.lock().unwrap().clone();
        out
    }

    // ── ProgressReader ──

    #[test]
    fn progress_is_monotone_and_reaches_one() {
        let fractions = collect_progress(&[7u8; 100], 32);
        assert!(!fractions.is_empty());
        assert!(fractions.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*fractions.last().unwrap(), 1.0);
    }

    #[test]
    fn empty_payload_reports_complete() {
        let fractions = collect_progress(&[], 16);
        assert!(fractions.iter().all(|&f| f == 1.0));
    }

    // ── GET retry ──

    #[test]
    fn network_failure_is_retried_once_and_recovers() {
        let calls = std::cell::Cell::new(0);
        let result = get_with_retry("/records", || {
            calls.set(calls.get() + 1);
            if calls.get() == 1 {
                Err(TransportError::Network("connection refused".into()))
            } else {
                Ok(serde_json::json!({"records": []}))
            }
        });
        assert!(result.is_ok());
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn second_network_failure_surfaces() {
        let calls = std::cell::Cell::new(0);
        let result = get_with_retry("/records", || {
            calls.set(calls.get() + 1);
            Err(TransportError::Network("connection refused".into()))
        });
        assert!(matches!(result, Err(TransportError::Network(_))));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn http_status_is_not_retried() {
        let calls = std::cell::Cell::new(0);
        let result = get_with_retry("/records", || {
            calls.set(calls.get() + 1);
            Err(TransportError::Http {
                status: 500,
                message: None,
            })
        });
        assert!(matches!(result, Err(TransportError::Http { status: 500, .. })));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn timeout_is_not_retried() {
        let calls = std::cell::Cell::new(0);
        let result = get_with_retry("/records", || {
            calls.set(calls.get() + 1);
            Err(TransportError::Timeout)
        });
        assert!(matches!(result, Err(TransportError::Timeout)));
        assert_eq!(calls.get(), 1);
    }

    // ── Error mapping ──

    #[test]
    fn http_error_extracts_server_message() {
        let err = http_error(404, r#"{"error": "Patient not found"}"#);
        match err {
            TransportError::Http { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message.as_deref(), Some("Patient not found"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn http_error_tolerates_non_json_body() {
        let err = http_error(502, "<html>Bad Gateway</html>");
        match err {
            TransportError::Http { status, message } => {
                assert_eq!(status, 502);
                assert!(message.is_none());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn user_message_prefers_server_text() {
        let err = TransportError::Http {
            status: 400,
            message: Some("File too large".to_string()),
        };
        assert_eq!(err.user_message(), "File too large");
    }

    #[test]
    fn user_message_falls_back_on_generic_text() {
        let err = TransportError::Network("connection refused".to_string());
        assert_eq!(err.user_message(), "Something went wrong. Please try again.");
        assert!(!err.user_message().contains("connection refused"));
    }

    #[test]
    fn timeout_has_distinct_user_message() {
        assert!(TransportError::Timeout.user_message().contains("timed out"));
    }

    // ── List envelopes ──

    #[test]
    fn list_envelope_unpacks_items() {
        let body = serde_json::json!({"records": [1, 2, 3]});
        let items: Vec<i64> = parse_list_envelope(body, "records").unwrap();
        assert_eq!(items, vec![1, 2, 3]);
    }

    #[test]
    fn missing_key_reads_as_empty_list() {
        let items: Vec<i64> = parse_list_envelope(serde_json::json!({}), "records").unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn error_envelope_is_a_failure_not_an_empty_list() {
        let body = serde_json::json!({"error": "database unavailable"});
        let result: Result<Vec<i64>, _> = parse_list_envelope(body, "records");
        match result {
            Err(TransportError::Backend(msg)) => assert_eq!(msg, "database unavailable"),
            other => panic!("expected backend error, got {other:?}"),
        }
    }
}
