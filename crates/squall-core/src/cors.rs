//! Fixed CORS header block
//!
//! Every response carries the same five headers; the only dynamic part
//! is the echoed `Origin`.

use crate::Response;

pub const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type, Authorization";
pub const MAX_AGE: &str = "86400";

/// Append the CORS block to a response.
///
/// `Access-Control-Allow-Origin` echoes the request's `Origin` header
/// when present, else `*`.
pub fn apply(res: Response, origin: Option<&str>) -> Response {
    let allow_origin = match origin {
        Some(o) if !o.is_empty() => o,
        _ => "*",
    };
    res.header("Access-Control-Allow-Origin", allow_origin)
        .header("Access-Control-Allow-Methods", ALLOW_METHODS)
        .header("Access-Control-Allow-Headers", ALLOW_HEADERS)
        .header("Access-Control-Allow-Credentials", "true")
        .header("Access-Control-Max-Age", MAX_AGE)
}
