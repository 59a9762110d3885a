//! Shared fixtures: a loopback HTTP stub and archive/script builders.
#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Write;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use catclient_lib::core::config::{Endpoints, LauncherConfig, LauncherPaths};
use catclient_lib::core::java::RuntimeSource;
use sha2::{Digest, Sha256};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

#[derive(Clone)]
struct Canned {
    status: u16,
    body: Vec<u8>,
    delay: Duration,
}

type Routes = Arc<Mutex<HashMap<String, Canned>>>;
type Journal = Arc<Mutex<Vec<RecordedRequest>>>;

/// Minimal HTTP/1.1 server on 127.0.0.1 serving canned responses per path.
/// Unknown paths answer 404.
pub struct StubServer {
    addr: SocketAddr,
    routes: Routes,
    journal: Journal,
    accept_task: tokio::task::JoinHandle<()>,
}

impl StubServer {
    pub async fn start() -> Self {
        // Loopback must never go through a proxy picked up from the environment.
        std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
        std::env::set_var("no_proxy", "127.0.0.1,localhost");

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let routes = Routes::default();
        let journal = Journal::default();

        let accept_task = {
            let routes = routes.clone();
            let journal = journal.clone();
            tokio::spawn(async move {
                loop {
                    let Ok((stream, _)) = listener.accept().await else {
                        break;
                    };
                    let routes = routes.clone();
                    let journal = journal.clone();
                    tokio::spawn(async move {
                        let _ = serve_one(stream, routes, journal).await;
                    });
                }
            })
        };

        Self {
            addr,
            routes,
            journal,
            accept_task,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn route(&self, path: &str, status: u16, body: impl Into<Vec<u8>>) {
        self.route_delayed(path, status, body, Duration::ZERO);
    }

    /// Like `route`, but the response is held back for `delay` after the
    /// request has been recorded.
    pub fn route_delayed(&self, path: &str, status: u16, body: impl Into<Vec<u8>>, delay: Duration) {
        self.routes.lock().unwrap().insert(
            path.to_string(),
            Canned {
                status,
                body: body.into(),
                delay,
            },
        );
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.journal.lock().unwrap().clone()
    }

    pub fn hits(&self, path: &str) -> usize {
        self.journal
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path == path)
            .count()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

async fn serve_one(mut stream: TcpStream, routes: Routes, journal: Journal) -> std::io::Result<()> {
    let mut buffer = Vec::new();
    let mut chunk = [0_u8; 4096];
    let header_end = loop {
        let read = stream.read(&mut chunk).await?;
        if read == 0 {
            return Ok(());
        }
        buffer.extend_from_slice(&chunk[..read]);
        if let Some(pos) = find_header_end(&buffer) {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(&buffer[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let mut headers = HashMap::new();
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }

    let content_length: usize = headers
        .get("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let mut body = buffer[header_end + 4..].to_vec();
    while body.len() < content_length {
        let read = stream.read(&mut chunk).await?;
        if read == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..read]);
    }

    let canned = routes.lock().unwrap().get(&path).cloned();
    journal.lock().unwrap().push(RecordedRequest {
        method,
        path,
        headers,
        body,
    });

    let canned = canned.unwrap_or(Canned {
        status: 404,
        body: b"not found".to_vec(),
        delay: Duration::ZERO,
    });
    if !canned.delay.is_zero() {
        tokio::time::sleep(canned.delay).await;
    }
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nContent-Type: application/octet-stream\r\nConnection: close\r\n\r\n",
        canned.status,
        reason_phrase(canned.status),
        canned.body.len()
    );
    stream.write_all(head.as_bytes()).await?;
    stream.write_all(&canned.body).await?;
    stream.shutdown().await
}

fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|w| w == b"\r\n\r\n")
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Status",
    }
}

pub const MANIFEST: &str = r#"{
    "latest": {"release": "1.20.1", "snapshot": "23w31a"},
    "versions": [
        {"id": "1.20.1", "type": "release", "url": "https://example.invalid/1.20.1.json"},
        {"id": "23w31a", "type": "snapshot", "url": "https://example.invalid/23w31a.json"},
        {"id": "1.8.9", "type": "release", "url": "https://example.invalid/1.8.9.json"}
    ]
}"#;

/// Java stand-in: writes one argument per line to `args-<pid>.txt` in the
/// working directory.
pub const FAKE_JAVA: &str = "#!/bin/sh\nprintf '%s\\n' \"$@\" > \"args-$$.txt\"\necho ready\n";

pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Zip laid out like a vendor JRE: one top directory with `bin/java`.
pub fn runtime_zip(java_script: &str) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default().unix_permissions(0o644);
    writer
        .start_file("jdk-17.0.9+9-jre/bin/java", options)
        .unwrap();
    writer.write_all(java_script.as_bytes()).unwrap();
    writer
        .start_file("jdk-17.0.9+9-jre/release", options)
        .unwrap();
    writer.write_all(b"JAVA_VERSION=\"17.0.9\"\n").unwrap();
    writer.finish().unwrap().into_inner()
}

/// Launcher config rooted in `root` with every endpoint on the stub.
pub fn stub_config(root: &Path, stub: &StubServer) -> LauncherConfig {
    let endpoints = Endpoints {
        manifest_url: stub.url("/manifest.json"),
        auth_url: stub.url("/authenticate"),
        runtime_source: RuntimeSource::Direct {
            url: stub.url("/jre.zip"),
            sha256: None,
        },
        ..Endpoints::default()
    };
    LauncherConfig::new(LauncherPaths::under(root), endpoints)
}
