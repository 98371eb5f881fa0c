//! HTTP response types and wire serialization

use std::time::SystemTime;

/// HTTP Status Code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCode(pub u16);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(200);
    pub const NO_CONTENT: StatusCode = StatusCode(204);
    pub const FOUND: StatusCode = StatusCode(302);
    pub const BAD_REQUEST: StatusCode = StatusCode(400);
    pub const UNAUTHORIZED: StatusCode = StatusCode(401);
    pub const NOT_FOUND: StatusCode = StatusCode(404);
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);

    /// Get the numeric code
    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// Get the reason phrase
    pub fn reason_phrase(&self) -> &'static str {
        match self.0 {
            200 => "OK",
            204 => "No Content",
            302 => "Found",
            400 => "Bad Request",
            401 => "Unauthorized",
            404 => "Not Found",
            500 => "Internal Server Error",
            _ => "Unknown",
        }
    }

    /// Check if this is a success status (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.0)
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.0, self.reason_phrase())
    }
}

/// An HTTP response, constructed once per request and serialized to bytes.
///
/// `Content-Length` is always derived from the body at serialization time;
/// explicit values under that name are discarded. The protocol is strictly
/// non-persistent, so `Connection: close` is always emitted.
#[derive(Debug, Clone)]
pub struct Response {
    /// Status code
    pub status: StatusCode,
    /// Response headers, in insertion order
    pub headers: Vec<(String, String)>,
    /// Response body
    pub body: bytes::Bytes,
}

impl Response {
    /// Create a new empty response
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: bytes::Bytes::new(),
        }
    }

    /// Builder-style: add a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Builder-style: set the body
    pub fn body(mut self, body: impl Into<bytes::Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Create a JSON response
    pub fn json(status: StatusCode, body: impl Into<bytes::Bytes>) -> Self {
        Self::new(status)
            .header("Content-Type", "application/json")
            .body(body)
    }

    /// Create a plain-text response
    pub fn text(status: StatusCode, body: impl Into<bytes::Bytes>) -> Self {
        Self::new(status)
            .header("Content-Type", "text/plain")
            .body(body)
    }

    /// Create an HTML response
    pub fn html(status: StatusCode, body: impl Into<bytes::Bytes>) -> Self {
        Self::new(status)
            .header("Content-Type", "text/html")
            .body(body)
    }

    /// The canonical 404: fixed 13-byte plain-text body.
    pub fn not_found() -> Self {
        Self::text(StatusCode::NOT_FOUND, "404 Not Found")
    }

    /// Get a header value (case-insensitive)
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Serialize to HTTP/1.1 wire format.
    ///
    /// Emits the explicit headers in insertion order, then the computed
    /// `Content-Length`, a `Date` (RFC 1123, unless already set) and
    /// `Connection: close`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(256 + self.body.len());

        buf.extend_from_slice(b"HTTP/1.1 ");
        buf.extend_from_slice(self.status.as_u16().to_string().as_bytes());
        buf.push(b' ');
        buf.extend_from_slice(self.status.reason_phrase().as_bytes());
        buf.extend_from_slice(b"\r\n");

        for (name, value) in &self.headers {
            if name.eq_ignore_ascii_case("content-length")
                || name.eq_ignore_ascii_case("connection")
            {
                continue;
            }
            buf.extend_from_slice(name.as_bytes());
            buf.extend_from_slice(b": ");
            buf.extend_from_slice(value.as_bytes());
            buf.extend_from_slice(b"\r\n");
        }

        buf.extend_from_slice(b"Content-Length: ");
        buf.extend_from_slice(self.body.len().to_string().as_bytes());
        buf.extend_from_slice(b"\r\n");

        if self.get_header("date").is_none() {
            buf.extend_from_slice(b"Date: ");
            buf.extend_from_slice(httpdate::fmt_http_date(SystemTime::now()).as_bytes());
            buf.extend_from_slice(b"\r\n");
        }

        buf.extend_from_slice(b"Connection: close\r\n\r\n");
        buf.extend_from_slice(&self.body);
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        assert_eq!(StatusCode::NOT_FOUND.to_string(), "404 Not Found");
        assert!(StatusCode::OK.is_success());
        assert!(!StatusCode::UNAUTHORIZED.is_success());
    }

    #[test]
    fn test_wire_format() {
        let res = Response::new(StatusCode::OK)
            .header("Content-Type", "text/plain")
            .header("X-Custom", "value")
            .body("Hello");

        let bytes = res.to_bytes();
        let s = std::str::from_utf8(&bytes).unwrap();

        assert!(s.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(s.contains("Content-Type: text/plain\r\n"));
        assert!(s.contains("X-Custom: value\r\n"));
        assert!(s.contains("Content-Length: 5\r\n"));
        assert!(s.contains("Date: "));
        assert!(s.contains("Connection: close\r\n"));
        assert!(s.ends_with("\r\n\r\nHello"));
    }

    #[test]
    fn test_content_length_always_derived() {
        // An explicit Content-Length lies about the body; the derived one wins.
        let res = Response::new(StatusCode::OK)
            .header("Content-Length", "999")
            .body("abc");

        let s = String::from_utf8(res.to_bytes()).unwrap();
        assert!(s.contains("Content-Length: 3\r\n"));
        assert!(!s.contains("999"));
    }

    #[test]
    fn test_canonical_not_found() {
        let res = Response::not_found();
        assert_eq!(res.status, StatusCode::NOT_FOUND);
        assert_eq!(res.body.len(), 13);

        let s = String::from_utf8(res.to_bytes()).unwrap();
        assert!(s.contains("Content-Length: 13\r\n"));
        assert!(s.ends_with("404 Not Found"));
    }
}
