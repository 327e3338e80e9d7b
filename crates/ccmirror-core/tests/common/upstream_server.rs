//! Minimal HTTP/1.1 server posing as the upstream distribution bucket.
//!
//! Serves `/latest`, `/{version}/manifest.json` and the per-platform
//! binaries from an in-memory route table, and records every request so
//! tests can assert which endpoints a sync run touched. Runs until the
//! process exits.

use ccmirror_core::checksum::sha256_bytes;
use ccmirror_core::platform::Platform;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

/// Knobs for misbehaving-upstream scenarios.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureOptions {
    /// Leave this platform out of the manifest entirely.
    pub omit_platform: Option<Platform>,
    /// Advertise a checksum that does not match the served bytes.
    pub corrupt_platform: Option<Platform>,
    /// Answer this platform's binary download with HTTP 500.
    pub fail_download: Option<Platform>,
}

/// A running fixture server plus its request log.
pub struct UpstreamFixture {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl UpstreamFixture {
    /// Every request seen so far, as `"GET /path"` strings.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests whose path contains `needle`.
    pub fn requests_containing(&self, needle: &str) -> usize {
        self.requests()
            .iter()
            .filter(|line| line.contains(needle))
            .count()
    }

    /// Number of binary download requests (any platform).
    pub fn binary_requests(&self) -> usize {
        self.requests_containing("/claude")
    }
}

/// Deterministic fake binary content for one platform.
pub fn binary_body(version: &str, platform: Platform) -> Vec<u8> {
    format!("{}-{}-binary\n", platform.key(), version)
        .repeat(64)
        .into_bytes()
}

/// Start a fixture bucket serving `version` with all seven platforms.
pub fn start(version: &str, opts: FixtureOptions) -> UpstreamFixture {
    let mut routes: HashMap<String, (u32, Vec<u8>)> = HashMap::new();
    routes.insert("/latest".to_string(), (200, version.as_bytes().to_vec()));

    let mut platforms = serde_json::Map::new();
    for platform in Platform::ALL {
        let body = binary_body(version, platform);
        let advertised = if opts.corrupt_platform == Some(platform) {
            sha256_bytes(b"not the real content")
        } else {
            // Uppercase on purpose: digest comparison must be case-insensitive.
            sha256_bytes(&body).to_uppercase()
        };
        if opts.omit_platform != Some(platform) {
            platforms.insert(
                platform.key().to_string(),
                serde_json::json!({ "checksum": advertised, "size": body.len() }),
            );
        }

        let path = format!(
            "/{}/{}/{}",
            version,
            platform.key(),
            platform.remote_object()
        );
        if opts.fail_download == Some(platform) {
            routes.insert(path, (500, b"upstream exploded".to_vec()));
        } else {
            routes.insert(path, (200, body));
        }
    }

    let manifest = serde_json::json!({
        "version": version,
        "buildDate": "2024-06-01T00:00:00Z",
        "platforms": platforms,
    });
    routes.insert(
        format!("/{version}/manifest.json"),
        (200, manifest.to_string().into_bytes()),
    );

    serve(routes)
}

fn serve(routes: HashMap<String, (u32, Vec<u8>)>) -> UpstreamFixture {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let routes = Arc::new(routes);

    let log = Arc::clone(&requests);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let routes = Arc::clone(&routes);
            let log = Arc::clone(&log);
            thread::spawn(move || handle(stream, &routes, &log));
        }
    });

    UpstreamFixture {
        base_url: format!("http://127.0.0.1:{port}"),
        requests,
    }
}

fn handle(
    mut stream: TcpStream,
    routes: &HashMap<String, (u32, Vec<u8>)>,
    log: &Mutex<Vec<String>>,
) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let mut parts = request.split_whitespace();
    let method = parts.next().unwrap_or("");
    let path = parts.next().unwrap_or("");
    log.lock().unwrap().push(format!("{method} {path}"));

    let (status, body) = match routes.get(path) {
        Some((status, body)) => (*status, body.as_slice()),
        None => (404, b"not found".as_slice()),
    };
    let reason = match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Error",
    };
    let header = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        reason,
        body.len()
    );
    let _ = stream.write_all(header.as_bytes());
    let _ = stream.write_all(body);
}
