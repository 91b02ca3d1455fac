//! Blocking client for the document API.
//!
//! Covers document listing and download, access tracking, admin login and the
//! analytics reports. Every failure is an [`ApiError`]; callers decide whether
//! to surface it, nothing here retries.

use doc_model::{
    Analytics, LoginRequest, LoginResponse, PdfDetails, PdfEntry, TrackAccessRequest,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Read;
use std::time::Duration;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub const DEFAULT_API_BASE: &str = "http://localhost:5000/api";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_DOCUMENT_BYTES: u64 = 256 * 1024 * 1024;
const USER_AGENT: &str = concat!("page-analyzer/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    base: String,
    agent: ureq::Agent,
    max_document_bytes: u64,
}

impl ApiClient {
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into().trim_end_matches('/').to_owned();
        let agent =
            ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).user_agent(USER_AGENT).build();

        Self { base, agent, max_document_bytes: MAX_DOCUMENT_BYTES }
    }

    /// Caps document downloads at `bytes` instead of the default 256 MiB.
    pub fn with_download_limit(mut self, bytes: u64) -> Self {
        self.max_document_bytes = bytes;
        self
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    pub fn document_url(&self, filename: &str) -> String {
        self.endpoint(&format!("pdf/{}", encode_path_segment(filename)))
    }

    pub fn list_pdfs(&self) -> Result<Vec<PdfEntry>, ApiError> {
        self.get_json("pdfs")
    }

    pub fn track_access(&self, filename: &str) -> Result<(), ApiError> {
        let body = TrackAccessRequest { filename: filename.to_owned() };
        self.post_json("track-access", &body).map(|_| ())
    }

    pub fn download_pdf(&self, filename: &str) -> Result<Vec<u8>, ApiError> {
        self.download(&self.document_url(filename))
    }

    /// Fetches raw document bytes from an absolute URL.
    pub fn download(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        log::debug!("GET {url}");
        let resp = self.agent.get(url).call().map_err(network_error)?;

        let mut bytes = Vec::new();
        resp.into_reader()
            .take(self.max_document_bytes.saturating_add(1))
            .read_to_end(&mut bytes)
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if bytes.len() as u64 > self.max_document_bytes {
            return Err(ApiError::InvalidResponse(format!(
                "document exceeds {} bytes",
                self.max_document_bytes
            )));
        }

        Ok(bytes)
    }

    /// Asks the API to check credentials.
    ///
    /// A rejection comes back as `success: false`, whether the server answers
    /// with 200 or with an error status.
    pub fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let body = LoginRequest { username: username.to_owned(), password: password.to_owned() };
        let json = encode_body(&body)?;
        let url = self.endpoint("login");

        log::debug!("POST {url}");
        let result =
            self.agent.post(&url).set("Content-Type", "application/json").send_string(&json);

        let body = match result {
            Ok(resp) => read_body(resp)?,
            Err(ureq::Error::Status(code, resp)) => {
                let body = read_body(resp)?;
                return Ok(parse_json(&body).unwrap_or_else(|_| {
                    log::debug!("login rejected with status {code}");
                    LoginResponse { success: false }
                }));
            }
            Err(err) => return Err(network_error(err)),
        };

        parse_json(&body)
    }

    pub fn analytics(&self) -> Result<Analytics, ApiError> {
        self.get_json("analytics")
    }

    pub fn pdf_details(&self, filename: &str) -> Result<PdfDetails, ApiError> {
        self.get_json(&format!("pdf-details/{}", encode_path_segment(filename)))
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.endpoint(path);
        log::debug!("GET {url}");

        let resp = self.agent.get(&url).call().map_err(network_error)?;
        parse_json(&read_body(resp)?)
    }

    fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Result<String, ApiError> {
        let url = self.endpoint(path);
        let json = encode_body(body)?;
        log::debug!("POST {url}");

        let resp = self
            .agent
            .post(&url)
            .set("Content-Type", "application/json")
            .send_string(&json)
            .map_err(network_error)?;

        read_body(resp)
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE)
    }
}

fn network_error(err: ureq::Error) -> ApiError {
    match err {
        ureq::Error::Status(code, resp) => {
            ApiError::Network(format!("{} returned status {code}", resp.get_url()))
        }
        ureq::Error::Transport(transport) => ApiError::Network(transport.to_string()),
    }
}

fn read_body(resp: ureq::Response) -> Result<String, ApiError> {
    resp.into_string().map_err(|e| ApiError::InvalidResponse(e.to_string()))
}

fn encode_body<B: Serialize>(body: &B) -> Result<String, ApiError> {
    serde_json::to_string(body).map_err(|e| ApiError::InvalidResponse(e.to_string()))
}

fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::InvalidResponse(e.to_string()))
}

/// Percent-encodes everything outside the RFC 3986 unreserved set.
fn encode_path_segment(segment: &str) -> String {
    let mut encoded = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{StubResponse, StubServer};

    #[test]
    fn endpoints_join_base_and_path() {
        let client = ApiClient::new("http://example.invalid/api/");

        assert_eq!(client.base(), "http://example.invalid/api");
        assert_eq!(client.endpoint("pdfs"), "http://example.invalid/api/pdfs");
        assert_eq!(client.endpoint("/analytics"), "http://example.invalid/api/analytics");
    }

    #[test]
    fn document_urls_escape_filenames() {
        let client = ApiClient::new("http://example.invalid/api");

        assert_eq!(
            client.document_url("Q3 report#1.pdf"),
            "http://example.invalid/api/pdf/Q3%20report%231.pdf"
        );
        assert_eq!(
            client.document_url("plain_file-1.pdf"),
            "http://example.invalid/api/pdf/plain_file-1.pdf"
        );
    }

    #[test]
    fn list_payload_parses() {
        let pdfs: Vec<PdfEntry> = parse_json(
            r#"[{"name": "Manual", "filename": "manual.pdf", "size": 2048},
                {"name": "Empty", "filename": "empty.pdf"}]"#,
        )
        .expect("list should parse");

        assert_eq!(pdfs.len(), 2);
        assert_eq!(pdfs[0].size, 2048);
        assert_eq!(pdfs[1].size, 0);
    }

    #[test]
    fn malformed_payload_is_invalid_response() {
        let err = parse_json::<Analytics>("<html>oops</html>").expect_err("html is not json");

        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[test]
    fn unreachable_server_is_network_error() {
        let client = ApiClient::new("http://127.0.0.1:9/api");

        let err = client.list_pdfs().expect_err("nothing listens on the discard port");

        assert!(matches!(err, ApiError::Network(_)));
    }

    #[test]
    fn rejected_login_status_reads_as_unsuccessful() {
        let stub = StubServer::new()
            .route(
                "POST",
                "/api/login",
                StubResponse::json("401 Unauthorized", r#"{"success":false}"#),
            )
            .start()
            .expect("stub should start");

        let response = ApiClient::new(stub.base()).login("admin", "wrong").expect("login answered");

        assert_eq!(response, LoginResponse { success: false });
        assert_eq!(stub.requests(), ["POST /api/login"]);
    }

    #[test]
    fn accepted_login_reads_as_successful() {
        let stub = StubServer::new()
            .route("POST", "/api/login", StubResponse::json("200 OK", r#"{"success":true}"#))
            .start()
            .expect("stub should start");

        let response =
            ApiClient::new(stub.base()).login("admin", "secret").expect("login answered");

        assert!(response.success);
    }

    #[test]
    fn server_error_on_track_access_is_network_error() {
        let stub = StubServer::new()
            .route(
                "POST",
                "/api/track-access",
                StubResponse::json("500 Internal Server Error", "{}"),
            )
            .start()
            .expect("stub should start");

        let err = ApiClient::new(stub.base()).track_access("x.pdf").expect_err("500 should fail");

        assert!(matches!(err, ApiError::Network(_)));
    }

    #[test]
    fn download_returns_document_bytes() {
        let stub = StubServer::new()
            .route(
                "GET",
                "/api/pdf/Q3%20report.pdf",
                StubResponse::bytes("200 OK", b"%PDF-1.5".to_vec()),
            )
            .start()
            .expect("stub should start");

        let bytes = ApiClient::new(stub.base()).download_pdf("Q3 report.pdf").expect("download");

        assert_eq!(bytes, b"%PDF-1.5");
    }

    #[test]
    fn download_over_the_limit_is_invalid_response() {
        let stub = StubServer::new()
            .route("GET", "/api/pdf/big.pdf", StubResponse::bytes("200 OK", vec![b'x'; 64]))
            .start()
            .expect("stub should start");

        let client = ApiClient::new(stub.base()).with_download_limit(16);
        let err = client.download_pdf("big.pdf").expect_err("body exceeds the limit");

        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[test]
    fn download_at_the_limit_succeeds() {
        let stub = StubServer::new()
            .route("GET", "/api/pdf/exact.pdf", StubResponse::bytes("200 OK", vec![b'x'; 16]))
            .start()
            .expect("stub should start");

        let client = ApiClient::new(stub.base()).with_download_limit(16);

        assert_eq!(client.download_pdf("exact.pdf").expect("download").len(), 16);
    }
}
