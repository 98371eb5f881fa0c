//! Server configuration
//!
//! All tunables the listener, parser and dispatcher consume. Built once
//! at startup, then shared read-only with every connection worker.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Fixed accept backlog for both the app and proxy listeners.
pub const BACKLOG: i32 = 50;

/// Per-read buffer size for inbound requests.
pub const READ_BUF_SIZE: usize = 8192;

/// Hard cap on a buffered request (headers + body).
pub const MAX_REQUEST_SIZE: usize = 64 * 1024;

/// Single connect/read timeout applied uniformly to worker reads,
/// proxy connects and proxy relay reads.
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(5);

/// Request-path rewrites applied by the parser before route lookup.
#[derive(Debug, Clone)]
pub struct PathRewrites {
    /// What `/` becomes.
    pub default_document: String,
    /// What `/login` becomes.
    pub login_page: String,
}

impl Default for PathRewrites {
    fn default() -> Self {
        Self {
            default_document: "/index.html".to_string(),
            login_page: "/login.html".to_string(),
        }
    }
}

/// Filesystem roots for each class of static content.
///
/// Derived from one base directory, mirroring the on-disk layout the
/// stack serves: HTML under `www/`, assets under `static/` (split by
/// subpath), app payloads under `apps/`.
#[derive(Debug, Clone)]
pub struct ContentRoots {
    base: PathBuf,
}

impl ContentRoots {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// HTML document root.
    pub fn www(&self) -> PathBuf {
        self.base.join("www")
    }

    /// Generic static root.
    pub fn assets(&self) -> PathBuf {
        self.base.join("static")
    }

    pub fn css(&self) -> PathBuf {
        self.base.join("static").join("css")
    }

    pub fn js(&self) -> PathBuf {
        self.base.join("static").join("js")
    }

    pub fn images(&self) -> PathBuf {
        self.base.join("static").join("images")
    }

    /// Application payload root.
    pub fn apps(&self) -> PathBuf {
        self.base.join("apps")
    }

    /// Fallback location tried before giving up on a missed file.
    pub fn icons(&self) -> PathBuf {
        self.base.join("static").join("icons")
    }
}

impl Default for ContentRoots {
    fn default() -> Self {
        Self::new(".")
    }
}

/// App-server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub roots: ContentRoots,
    pub rewrites: PathRewrites,
    /// Paths gated behind the `auth=true` cookie.
    pub protected: Vec<String>,
    /// The single accepted credential pair for `POST /login`.
    pub username: String,
    pub password: String,
    /// Connect/read timeout for socket operations.
    pub io_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let rewrites = PathRewrites::default();
        Self {
            roots: ContentRoots::default(),
            protected: vec![rewrites.default_document.clone()],
            rewrites,
            username: "admin".to_string(),
            password: "password".to_string(),
            io_timeout: DEFAULT_IO_TIMEOUT,
        }
    }
}

impl ServerConfig {
    /// Config rooted at a given content base directory.
    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        Self {
            roots: ContentRoots::new(base),
            ..Default::default()
        }
    }

    /// Whether a (rewritten) path sits behind the auth gate.
    pub fn is_protected(&self, path: &str) -> bool {
        self.protected.iter().any(|p| p == path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roots_layout() {
        let roots = ContentRoots::new("/srv/site");
        assert_eq!(roots.www(), PathBuf::from("/srv/site/www"));
        assert_eq!(roots.css(), PathBuf::from("/srv/site/static/css"));
        assert_eq!(roots.apps(), PathBuf::from("/srv/site/apps"));
        assert_eq!(roots.icons(), PathBuf::from("/srv/site/static/icons"));
    }

    #[test]
    fn test_default_protects_index() {
        let config = ServerConfig::default();
        assert!(config.is_protected("/index.html"));
        assert!(!config.is_protected("/login.html"));
    }
}
