//! Map request failures onto retry error kinds.

use crate::fetch::RequestError;
use crate::retry::policy::ErrorKind;

/// Classify an HTTP status code for retry decisions.
fn classify_status(code: u32) -> ErrorKind {
    match code {
        429 | 503 => ErrorKind::Throttled,
        500..=599 => ErrorKind::Http5xx(code as u16),
        _ => ErrorKind::Other,
    }
}

/// Classify a curl error for retry decisions.
fn classify_curl(e: &curl::Error) -> ErrorKind {
    if e.is_operation_timedout() {
        return ErrorKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
    {
        return ErrorKind::Connection;
    }
    ErrorKind::Other
}

/// Classify a request error into an [`ErrorKind`]. Local IO failures and
/// malformed bodies are `Other`: retrying won't fix a full disk or a bad
/// manifest.
pub fn classify(e: &RequestError) -> ErrorKind {
    match e {
        RequestError::Curl(ce) => classify_curl(ce),
        RequestError::Http { status, .. } => classify_status(*status),
        RequestError::Io(_) => ErrorKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(status: u32) -> RequestError {
        RequestError::Http {
            status,
            url: "https://example.com/x".to_string(),
        }
    }

    #[test]
    fn throttling_statuses() {
        assert_eq!(classify(&http(429)), ErrorKind::Throttled);
        assert_eq!(classify(&http(503)), ErrorKind::Throttled);
    }

    #[test]
    fn server_errors_are_retryable() {
        assert!(matches!(classify(&http(500)), ErrorKind::Http5xx(500)));
        assert!(matches!(classify(&http(502)), ErrorKind::Http5xx(502)));
    }

    #[test]
    fn client_errors_are_not_retried() {
        assert_eq!(classify(&http(404)), ErrorKind::Other);
        assert_eq!(classify(&http(403)), ErrorKind::Other);
    }

    #[test]
    fn io_errors_are_not_retried() {
        let e = RequestError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
        assert_eq!(classify(&e), ErrorKind::Other);
    }
}
