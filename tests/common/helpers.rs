#![allow(dead_code)]

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode},
    response::Response,
    routing::get,
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use butler::{Download, DownloaderBuilder};
use md5::{Digest, Md5};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::task::JoinHandle;

/// Name the test server serves its file under.
pub const FILE_NAME: &str = "file.bin";

/// Creates a temporary directory for testing purposes
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temporary directory")
}

/// Creates a temporary file with the given content
pub fn create_temp_file(dir: &Path, filename: &str, content: &[u8]) -> PathBuf {
    let file_path = dir.join(filename);
    fs::write(&file_path, content).expect("Failed to write temporary file");
    file_path
}

/// Random bytes, so that digests differ from one run to the next.
pub fn random_content(size: usize) -> Vec<u8> {
    (0..size).map(|_| rand::random::<u8>()).collect()
}

/// Asserts that a file has the expected size
pub fn assert_file_size(path: &Path, expected_size: u64) {
    let metadata = fs::metadata(path).expect("Failed to get file metadata");
    assert_eq!(
        metadata.len(),
        expected_size,
        "File size mismatch at path: {:?}",
        path
    );
}

/// Base64 CRC32C of `data`, as it appears in `x-goog-hash`.
pub fn crc32c_b64(data: &[u8]) -> String {
    STANDARD.encode(crc32c::crc32c(data).to_be_bytes())
}

/// Base64 MD5 of `data`, as it appears in `x-goog-hash`.
pub fn md5_b64(data: &[u8]) -> String {
    STANDARD.encode(Md5::digest(data))
}

/// A downloader that retries quickly and reports progress often.
pub fn test_downloader(chunk_size: usize) -> butler::Downloader {
    DownloaderBuilder::new().chunk_size(chunk_size).build()
}

/// Creates a download of the test server's file into `dir`.
pub fn create_test_download(server: &TestServer, dir: &Path) -> Download {
    Download::new(&server.url(), dir.join(FILE_NAME)).expect("Failed to create download")
}

// === Test Server ===

/// How the test server answers `GET` requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Serve ranges correctly.
    Honest,
    /// Answer every `GET` with the full body and a 200.
    IgnoreRange,
    /// Answer every `GET` with a 416.
    RangeNotSatisfiable,
    /// Declare a zero length on `HEAD`, and stream `GET` bodies without a
    /// length.
    Unsized,
}

/// A request as the server saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub range: Option<String>,
}

#[derive(Clone)]
struct ServerState {
    content: Arc<Vec<u8>>,
    goog_hash: Option<String>,
    behavior: Behavior,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl ServerState {
    fn record(&self, method: Method, headers: &HeaderMap) {
        let range = headers
            .get(header::RANGE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.requests
            .lock()
            .unwrap()
            .push(RecordedRequest { method, range });
    }

    fn response(&self) -> axum::http::response::Builder {
        let builder = Response::builder().header(header::ACCEPT_RANGES, "bytes");
        match &self.goog_hash {
            Some(hash) => builder.header("x-goog-hash", hash.as_str()),
            None => builder,
        }
    }
}

/// An HTTP server on a random local port, serving one file.
pub struct TestServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    task: JoinHandle<()>,
}

impl TestServer {
    /// Serve `content` with the given `x-goog-hash` value.
    pub async fn start(content: Vec<u8>, goog_hash: Option<String>, behavior: Behavior) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = ServerState {
            content: Arc::new(content),
            goog_hash,
            behavior,
            requests: requests.clone(),
        };

        let app = Router::new()
            .route(&format!("/{}", FILE_NAME), get(serve_get).head(serve_head))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test server");
        let addr = listener.local_addr().expect("Failed to read local address");
        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Test server failed");
        });

        Self {
            addr,
            requests,
            task,
        }
    }

    /// Serve `content` with a correct `crc32c` hint.
    pub async fn with_crc32c(content: Vec<u8>) -> Self {
        let hash = format!("crc32c={}", crc32c_b64(&content));
        Self::start(content, Some(hash), Behavior::Honest).await
    }

    pub fn url(&self) -> String {
        format!("http://{}/{}", self.addr, FILE_NAME)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// `Range` headers of every `GET`, in order.
    pub fn get_ranges(&self) -> Vec<Option<String>> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == Method::GET)
            .map(|r| r.range)
            .collect()
    }

    pub fn count(&self, method: Method) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method)
            .count()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve_head(State(state): State<ServerState>, headers: HeaderMap) -> Response {
    state.record(Method::HEAD, &headers);

    let length = match state.behavior {
        Behavior::Unsized => 0,
        _ => state.content.len(),
    };
    state
        .response()
        .status(StatusCode::OK)
        .header(header::CONTENT_LENGTH, length)
        .body(Body::empty())
        .unwrap()
}

async fn serve_get(State(state): State<ServerState>, headers: HeaderMap) -> Response {
    state.record(Method::GET, &headers);

    let len = state.content.len();
    let offset = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("bytes="))
        .and_then(|v| v.strip_suffix('-'))
        .and_then(|v| v.parse::<usize>().ok());

    match (state.behavior, offset) {
        (Behavior::RangeNotSatisfiable, _) => not_satisfiable(len),
        (Behavior::Unsized, _) => {
            let chunks: Vec<Result<Vec<u8>, std::io::Error>> =
                state.content.chunks(100).map(|c| Ok(c.to_vec())).collect();
            state
                .response()
                .status(StatusCode::OK)
                .body(Body::from_stream(futures::stream::iter(chunks)))
                .unwrap()
        }
        (Behavior::IgnoreRange, _) | (Behavior::Honest, None) => full_body(&state),
        (Behavior::Honest, Some(_)) if len == 0 => full_body(&state),
        (Behavior::Honest, Some(start)) if start >= len => not_satisfiable(len),
        (Behavior::Honest, Some(start)) => state
            .response()
            .status(StatusCode::PARTIAL_CONTENT)
            .header(
                header::CONTENT_RANGE,
                format!("bytes {}-{}/{}", start, len.saturating_sub(1), len),
            )
            .body(Body::from(state.content[start.min(len)..].to_vec()))
            .unwrap(),
    }
}

fn full_body(state: &ServerState) -> Response {
    state
        .response()
        .status(StatusCode::OK)
        .body(Body::from(state.content.to_vec()))
        .unwrap()
}

fn not_satisfiable(len: usize) -> Response {
    Response::builder()
        .status(StatusCode::RANGE_NOT_SATISFIABLE)
        .header(header::CONTENT_RANGE, format!("bytes */{}", len))
        .body(Body::empty())
        .unwrap()
}
