//! HTTP fetch layer: plain GETs over curl (libcurl).
//!
//! Everything here is blocking; call from `spawn_blocking` if used from
//! async code. Requests follow redirects and enforce the configured connect
//! and total timeouts.

use curl::easy::Easy;
use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

/// Error from a single HTTP request.
///
/// Kept separate from the run-level sync taxonomy so the retry layer can
/// classify it (timeout vs. throttling vs. hard failure) before anything is
/// reported upward.
#[derive(Debug)]
pub enum RequestError {
    /// Curl reported an error (timeout, connection, TLS, etc.).
    Curl(curl::Error),
    /// Response had a non-2xx status.
    Http { status: u32, url: String },
    /// Local IO failed (writing a staged file) or the body was malformed.
    Io(io::Error),
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::Curl(e) => write!(f, "{}", e),
            RequestError::Http { status, url } => write!(f, "HTTP {} from {}", status, url),
            RequestError::Io(e) => write!(f, "io: {}", e),
        }
    }
}

impl std::error::Error for RequestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RequestError::Curl(e) => Some(e),
            RequestError::Io(e) => Some(e),
            RequestError::Http { .. } => None,
        }
    }
}

/// Connection settings shared by every request in a run.
#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(120),
        }
    }
}

/// Configure an `Easy` handle the way every ccmirror request wants it.
pub(crate) fn new_easy(url: &str, opts: &FetchOptions) -> Result<Easy, RequestError> {
    let mut easy = Easy::new();
    easy.url(url).map_err(RequestError::Curl)?;
    easy.follow_location(true).map_err(RequestError::Curl)?;
    easy.connect_timeout(opts.connect_timeout)
        .map_err(RequestError::Curl)?;
    easy.timeout(opts.request_timeout).map_err(RequestError::Curl)?;
    easy.useragent("ccmirror").map_err(RequestError::Curl)?;
    Ok(easy)
}

/// Fail unless the response status is 2xx.
pub(crate) fn check_status(easy: &mut Easy, url: &str) -> Result<(), RequestError> {
    let code = easy.response_code().map_err(RequestError::Curl)?;
    if !(200..300).contains(&code) {
        return Err(RequestError::Http {
            status: code,
            url: url.to_string(),
        });
    }
    Ok(())
}

/// GET a URL and return the body bytes.
pub fn get_bytes(url: &str, opts: &FetchOptions) -> Result<Vec<u8>, RequestError> {
    let mut easy = new_easy(url, opts)?;
    let mut body = Vec::new();
    {
        let mut transfer = easy.transfer();
        transfer
            .write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })
            .map_err(RequestError::Curl)?;
        transfer.perform().map_err(RequestError::Curl)?;
    }
    check_status(&mut easy, url)?;
    Ok(body)
}

/// GET a URL and return the body as UTF-8 text.
pub fn get_text(url: &str, opts: &FetchOptions) -> Result<String, RequestError> {
    let body = get_bytes(url, opts)?;
    String::from_utf8(body)
        .map_err(|e| RequestError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

/// GET a URL, streaming the body into `dest`. Returns the byte count.
///
/// An existing file at `dest` is truncated; on failure the partial file is
/// left for the caller (retry overwrites it, nothing external observes it).
pub fn get_to_file(url: &str, dest: &Path, opts: &FetchOptions) -> Result<u64, RequestError> {
    let mut easy = new_easy(url, opts)?;
    let mut file = File::create(dest).map_err(RequestError::Io)?;
    let mut written = 0u64;
    let mut write_err: Option<io::Error> = None;
    {
        let mut transfer = easy.transfer();
        transfer
            .write_function(|data| match file.write_all(data) {
                Ok(()) => {
                    written += data.len() as u64;
                    Ok(data.len())
                }
                // A short count makes curl abort the transfer.
                Err(e) => {
                    write_err = Some(e);
                    Ok(0)
                }
            })
            .map_err(RequestError::Curl)?;
        if let Err(e) = transfer.perform() {
            drop(transfer);
            return Err(match write_err {
                Some(io_err) => RequestError::Io(io_err),
                None => RequestError::Curl(e),
            });
        }
    }
    check_status(&mut easy, url)?;
    file.flush().map_err(RequestError::Io)?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timeouts() {
        let opts = FetchOptions::default();
        assert_eq!(opts.connect_timeout, Duration::from_secs(30));
        assert_eq!(opts.request_timeout, Duration::from_secs(120));
    }

    #[test]
    fn request_error_display_includes_status_and_url() {
        let err = RequestError::Http {
            status: 503,
            url: "https://example.com/latest".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("example.com"));
    }
}
