//! Canned-response HTTP server for exercising [`crate::ApiClient`] in tests.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct StubResponse {
    status: &'static str,
    content_type: &'static str,
    body: Vec<u8>,
}

impl StubResponse {
    /// `status` is the full status line tail, e.g. `"401 Unauthorized"`.
    pub fn json(status: &'static str, body: &str) -> Self {
        Self { status, content_type: "application/json", body: body.as_bytes().to_vec() }
    }

    pub fn bytes(status: &'static str, body: Vec<u8>) -> Self {
        Self { status, content_type: "application/pdf", body }
    }
}

#[derive(Debug, Clone)]
struct Route {
    method: &'static str,
    path: String,
    response: StubResponse,
}

/// Serves fixed responses keyed by method and path on an ephemeral local port.
///
/// The accept loop runs on a detached thread for the rest of the process.
#[derive(Debug, Default)]
pub struct StubServer {
    routes: Vec<Route>,
}

#[derive(Debug, Clone)]
pub struct RunningStub {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// `path` is the full request path, including the `/api` prefix.
    pub fn route(mut self, method: &'static str, path: &str, response: StubResponse) -> Self {
        self.routes.push(Route { method, path: path.to_owned(), response });
        self
    }

    pub fn start(self) -> std::io::Result<RunningStub> {
        let listener = TcpListener::bind(("127.0.0.1", 0))?;
        let addr = listener.local_addr()?;
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&requests);

        thread::spawn(move || {
            for incoming in listener.incoming() {
                let Ok(mut stream) = incoming else { continue };
                let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
                let _ = serve(&mut stream, &self.routes, &log);
            }
        });

        Ok(RunningStub { addr, requests })
    }
}

impl RunningStub {
    /// API base URL for an [`crate::ApiClient`].
    pub fn base(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// `"METHOD /path"` of every request served so far, in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|seen| seen.clone()).unwrap_or_default()
    }
}

fn serve(
    stream: &mut TcpStream,
    routes: &[Route],
    log: &Mutex<Vec<String>>,
) -> std::io::Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);

    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_owned();
    let path = parts.next().unwrap_or_default().to_owned();

    let mut content_length = 0usize;
    loop {
        let mut header = String::new();
        if reader.read_line(&mut header)? == 0 || header.trim().is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }
    let mut body = vec![0; content_length];
    reader.read_exact(&mut body)?;

    if let Ok(mut seen) = log.lock() {
        seen.push(format!("{method} {path}"));
    }

    let not_found = StubResponse::json("404 Not Found", r#"{"error":"not_found"}"#);
    let response = routes
        .iter()
        .find(|route| route.method == method && route.path == path)
        .map_or(&not_found, |route| &route.response);

    let header = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response.status,
        response.content_type,
        response.body.len()
    );
    stream.write_all(header.as_bytes())?;
    // The client may hang up early on oversized bodies.
    let _ = stream.write_all(&response.body);
    Ok(())
}
