//! Blocking HTTP client for the upload and keyword endpoints

use std::path::Path;
use std::time::Duration;

use log::{debug, info};
use reqwest::blocking::{Client, multipart};
use serde_json::Value;

use super::error::BackendError;
use super::types::{KeywordRequest, SearchResult, UploadResponse, WireResult};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
const PDF_MIME: &str = "application/pdf";

/// The two backend operations the viewer depends on.
///
/// Implementations are called from backend worker threads.
pub trait Backend: Send + Sync {
    /// Store a PDF and return the backend-assigned path
    fn upload(&self, local_path: &Path, file_name: &str) -> Result<String, BackendError>;

    /// Find keyword matches in a previously uploaded PDF
    fn keyword_search(
        &self,
        pdf_path: &str,
        keyword: &str,
    ) -> Result<Vec<SearchResult>, BackendError>;
}

/// `Backend` talking to the REST service
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("rayo/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    #[must_use]
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Backend for HttpBackend {
    fn upload(&self, local_path: &Path, file_name: &str) -> Result<String, BackendError> {
        let bytes = std::fs::read(local_path).map_err(|source| BackendError::Io {
            path: local_path.display().to_string(),
            source,
        })?;
        info!("Uploading {file_name} ({} bytes)", bytes.len());

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(PDF_MIME)?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(format!("{}/upload", self.base_url))
            .multipart(form)
            .send()?;
        let status = response.status().as_u16();
        let body = response.text()?;

        parse_upload_response(status, &body)
    }

    fn keyword_search(
        &self,
        pdf_path: &str,
        keyword: &str,
    ) -> Result<Vec<SearchResult>, BackendError> {
        debug!("Keyword search for {keyword:?} in {pdf_path}");
        let response = self
            .client
            .post(format!("{}/keyword", self.base_url))
            .json(&KeywordRequest { pdf_path, keyword })
            .send()?;
        let status = response.status().as_u16();
        let body = response.text()?;

        parse_search_response(status, &body)
    }
}

fn check_status(status: u16, body: &str) -> Result<(), BackendError> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(BackendError::Status {
            status,
            message: body.chars().take(200).collect(),
        })
    }
}

/// Interpret the status and body of an upload response
pub fn parse_upload_response(status: u16, body: &str) -> Result<String, BackendError> {
    check_status(status, body)?;
    let value: Value = serde_json::from_str(body).map_err(BackendError::InvalidJson)?;
    if value.get("file_path").is_none() {
        return Err(BackendError::MissingField("file_path"));
    }
    let parsed: UploadResponse = serde_json::from_value(value).map_err(BackendError::Malformed)?;
    Ok(parsed.file_path)
}

/// Interpret the status and body of a keyword search response
pub fn parse_search_response(status: u16, body: &str) -> Result<Vec<SearchResult>, BackendError> {
    check_status(status, body)?;
    let mut value: Value = serde_json::from_str(body).map_err(BackendError::InvalidJson)?;
    let results = value
        .get_mut("results")
        .map(Value::take)
        .ok_or(BackendError::MissingField("results"))?;
    let wire: Vec<WireResult> = serde_json::from_value(results).map_err(BackendError::Malformed)?;
    Ok(wire.into_iter().map(SearchResult::from).collect())
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::JoinHandle;

    use super::*;
    use crate::backend::BoundingBox;

    /// Serve one HTTP exchange on a local port and hand back the raw request
    fn serve_once(reply: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let handle = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let request = read_request(&mut stream);
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{reply}",
                reply.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
            request
        });
        (url, handle)
    }

    fn local_backend(url: &str) -> HttpBackend {
        let client = Client::builder().no_proxy().build().unwrap();
        HttpBackend::with_client(client, url)
    }

    fn read_request(stream: &mut impl Read) -> String {
        let mut raw = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).unwrap();
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&raw);
            let Some(split) = text.find("\r\n\r\n") else {
                continue;
            };
            let head = text[..split].to_ascii_lowercase();
            let body_len = raw.len() - split - 4;
            let complete = match head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
            {
                Some(len) => body_len >= len.trim().parse::<usize>().unwrap(),
                None => !head.contains("chunked") || text.ends_with("0\r\n\r\n"),
            };
            if complete {
                break;
            }
        }
        String::from_utf8_lossy(&raw).into_owned()
    }

    #[test]
    fn upload_posts_the_file_as_multipart_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paper.pdf");
        std::fs::write(&path, b"%PDF-1.4 body").unwrap();
        let (url, server) = serve_once(r#"{"file_path": "uploads/paper.pdf"}"#);

        let backend = local_backend(&url);
        let remote = backend.upload(&path, "paper.pdf").unwrap();
        let request = server.join().unwrap();

        assert_eq!(remote, "uploads/paper.pdf");
        assert!(request.starts_with("POST /upload HTTP/1.1\r\n"));
        assert!(request.contains("%PDF-1.4 body"));
        let lower = request.to_ascii_lowercase();
        assert!(lower.contains("content-type: multipart/form-data; boundary="));
        assert!(lower.contains(r#"name="file"; filename="paper.pdf""#));
        assert!(lower.contains("content-type: application/pdf"));
    }

    #[test]
    fn keyword_search_posts_path_and_keyword_as_json() {
        let (url, server) = serve_once(
            r#"{"results": [{"page": 1, "coordinates": {"x0":1,"y0":2,"x1":3,"y1":4}}]}"#,
        );

        let backend = local_backend(&url);
        let results = backend.keyword_search("uploads/paper.pdf", "lorem").unwrap();
        let request = server.join().unwrap();

        assert!(request.starts_with("POST /keyword HTTP/1.1\r\n"));
        assert!(request.to_ascii_lowercase().contains("content-type: application/json"));
        let body = &request[request.find("\r\n\r\n").unwrap() + 4..];
        let sent: Value = serde_json::from_str(body).unwrap();
        assert_eq!(
            sent,
            serde_json::json!({"pdf_path": "uploads/paper.pdf", "keyword": "lorem"})
        );
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].boxes, vec![BoundingBox::new(1.0, 2.0, 3.0, 4.0)]);
    }

    #[test]
    fn search_response_with_single_box() {
        let body = r#"{"results": [{"page": 2, "coordinates": {"x0":0,"y0":0,"x1":10,"y1":10}}]}"#;
        let results = parse_search_response(200, body).unwrap();
        assert_eq!(
            results,
            vec![SearchResult {
                page: 2,
                boxes: vec![BoundingBox::new(0.0, 0.0, 10.0, 10.0)],
            }]
        );
    }

    #[test]
    fn non_success_status_is_reported_before_parsing() {
        let err = parse_search_response(500, "not json at all").unwrap_err();
        assert!(matches!(err, BackendError::Status { status: 500, .. }));
    }

    #[test]
    fn non_json_body_is_rejected() {
        let err = parse_search_response(200, "<html>oops</html>").unwrap_err();
        assert!(matches!(err, BackendError::InvalidJson(_)));
    }

    #[test]
    fn missing_results_field_is_rejected() {
        let err = parse_search_response(200, r#"{"matches": []}"#).unwrap_err();
        assert!(matches!(err, BackendError::MissingField("results")));
    }

    #[test]
    fn results_with_wrong_shape_are_malformed() {
        let err = parse_search_response(200, r#"{"results": [{"page": "two"}]}"#).unwrap_err();
        assert!(matches!(err, BackendError::Malformed(_)));
    }

    #[test]
    fn empty_results_are_fine() {
        assert!(parse_search_response(200, r#"{"results": []}"#).unwrap().is_empty());
    }

    #[test]
    fn upload_response_yields_file_path() {
        let path = parse_upload_response(200, r#"{"file_path": "uploads/paper.pdf"}"#).unwrap();
        assert_eq!(path, "uploads/paper.pdf");
    }

    #[test]
    fn upload_response_without_file_path() {
        let err = parse_upload_response(201, r#"{"ok": true}"#).unwrap_err();
        assert!(matches!(err, BackendError::MissingField("file_path")));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let backend = HttpBackend::new("http://localhost:9000/", 5).unwrap();
        assert_eq!(backend.base_url(), "http://localhost:9000");
    }
}
