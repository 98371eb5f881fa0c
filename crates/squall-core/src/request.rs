//! HTTP request types and wire parsing

use crate::config::PathRewrites;
use crate::handler::HandlerFn;
use crate::{Error, HeaderMap, Result};
use squall_router::RouteTable;
use std::collections::HashMap;
use std::fmt;

/// HTTP Methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl Method {
    /// Parse from string (case-insensitive).
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "PATCH" => Ok(Method::Patch),
            "HEAD" => Ok(Method::Head),
            "OPTIONS" => Ok(Method::Options),
            _ => Err(Error::InvalidMethod(s.to_string())),
        }
    }

    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }

    /// Whether this method carries a request body.
    pub fn has_body(&self) -> bool {
        matches!(self, Method::Post | Method::Put)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A parsed HTTP request.
///
/// Constructed fresh per connection, populated once by [`Request::parse`],
/// discarded when the connection closes.
#[derive(Clone)]
pub struct Request {
    /// HTTP method
    pub method: Method,
    /// Request path, after rewrites, always starting with `/`
    pub path: String,
    /// Protocol version string, e.g. `HTTP/1.1`
    pub version: String,
    /// Request headers
    pub headers: HeaderMap,
    /// Cookies parsed from the `Cookie` header
    pub cookies: HashMap<String, String>,
    /// Request body; empty unless method is POST/PUT
    pub body: bytes::Bytes,
    /// Handler resolved from the route table at parse time
    pub hook: Option<HandlerFn>,
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("version", &self.version)
            .field("headers", &self.headers)
            .field("cookies", &self.cookies)
            .field("body_len", &self.body.len())
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

impl Request {
    /// Parse raw request bytes into a structured request.
    ///
    /// The request line must split on whitespace into exactly method,
    /// path and version. `/` rewrites to the configured default document
    /// and `/login` to the configured login page before the route table
    /// is consulted. Header lines without a `:` are skipped. The body is
    /// everything after the first blank line, taken verbatim, and only
    /// kept for POST/PUT.
    pub fn parse(
        raw: &[u8],
        routes: Option<&RouteTable<HandlerFn>>,
        rewrites: &PathRewrites,
    ) -> Result<Self> {
        let (head, body) = split_head(raw);
        let head = String::from_utf8_lossy(head);

        let mut lines = head.split("\r\n");
        let request_line = lines.next().unwrap_or("");
        let tokens: Vec<&str> = request_line.split_whitespace().collect();
        let &[method, path, version] = tokens.as_slice() else {
            return Err(Error::MalformedRequestLine(request_line.to_string()));
        };

        let method = Method::parse(method)?;
        let path = match path {
            "/" => rewrites.default_document.clone(),
            "/login" => rewrites.login_page.clone(),
            other => other.to_string(),
        };

        let headers: HeaderMap = lines
            .filter_map(|line| {
                let (key, value) = line.split_once(':')?;
                Some((key.trim().to_ascii_lowercase(), value.trim().to_string()))
            })
            .collect();

        let cookies = parse_cookies(headers.get("cookie").unwrap_or(""));

        let body = if method.has_body() {
            bytes::Bytes::copy_from_slice(body)
        } else {
            bytes::Bytes::new()
        };

        let hook = routes.and_then(|table| table.get(method.as_str(), &path).cloned());

        Ok(Self {
            method,
            path,
            version: version.to_string(),
            headers,
            cookies,
            body,
            hook,
        })
    }

    /// Body as UTF-8 text (lossy).
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Cookie value by name.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(|v| v.as_str())
    }
}

/// Split raw bytes at the first `\r\n\r\n` into (head, body).
fn split_head(raw: &[u8]) -> (&[u8], &[u8]) {
    match raw.windows(4).position(|w| w == b"\r\n\r\n") {
        Some(pos) => (&raw[..pos], &raw[pos + 4..]),
        None => (raw, &[][..]),
    }
}

/// Parse a `Cookie` header value into name → value pairs.
///
/// Tokens split on `;`, each on the first `=`; tokens without `=` are
/// dropped. An empty string yields an empty map.
pub fn parse_cookies(cookie_header: &str) -> HashMap<String, String> {
    cookie_header
        .split(';')
        .filter_map(|token| {
            let (key, value) = token.split_once('=')?;
            Some((key.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}
