//! Static content resolution and serving
//!
//! Maps a request path to a filesystem root, a path relative to that
//! root and a MIME type, then loads the file. Misses fall back to the
//! icon directory before yielding the canonical 404.

use crate::config::ContentRoots;
use crate::Response;
use std::path::{Component, Path, PathBuf};

/// Outcome of path → root resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Filesystem base directory the file lives under
    pub dir: PathBuf,
    /// Path relative to `dir`, leading `/` stripped
    pub rel: String,
    /// Content-Type to send
    pub mime: &'static str,
}

/// Guess a MIME type from the path's extension.
pub fn mime_for(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");

    match ext.to_ascii_lowercase().as_str() {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" | "mjs" => "application/javascript",
        "json" => "application/json",
        "xml" => "application/xml",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Resolve a request path to (root, relative path, MIME type).
///
/// Prefix classes pin both the root and (for CSS/JS) the MIME type;
/// HTML-looking paths go to the document root; everything else to the
/// generic static root.
pub fn resolve(path: &str, roots: &ContentRoots) -> Resolved {
    if let Some(rel) = path.strip_prefix("/css/") {
        return Resolved {
            dir: roots.css(),
            rel: rel.to_string(),
            mime: "text/css",
        };
    }
    if let Some(rel) = path.strip_prefix("/js/") {
        return Resolved {
            dir: roots.js(),
            rel: rel.to_string(),
            mime: "application/javascript",
        };
    }
    if let Some(rel) = path.strip_prefix("/images/") {
        return Resolved {
            dir: roots.images(),
            rel: rel.to_string(),
            mime: mime_for(path),
        };
    }
    if let Some(rel) = path.strip_prefix("/apps/") {
        return Resolved {
            dir: roots.apps(),
            rel: rel.to_string(),
            mime: mime_for(path),
        };
    }

    let rel = path.trim_start_matches('/').to_string();
    if path.ends_with(".html") || mime_for(path) == "text/html" {
        return Resolved {
            dir: roots.www(),
            rel,
            mime: "text/html",
        };
    }

    Resolved {
        dir: roots.assets(),
        rel,
        mime: mime_for(path),
    }
}

/// Normalize a relative path, rejecting traversal and dot-files.
fn sanitize(rel: &str) -> Option<PathBuf> {
    if rel.split('/').any(|seg| seg.starts_with('.')) {
        return None;
    }

    let mut clean = PathBuf::new();
    for component in Path::new(rel).components() {
        match component {
            Component::Normal(c) => clean.push(c),
            Component::ParentDir => return None,
            _ => {}
        }
    }
    Some(clean)
}

/// Load the resolved file, trying the icon fallback before giving up.
pub fn load(resolved: &Resolved, roots: &ContentRoots) -> Option<Vec<u8>> {
    let rel = sanitize(&resolved.rel)?;

    let primary = resolved.dir.join(&rel);
    if let Ok(content) = std::fs::read(&primary) {
        return Some(content);
    }
    tracing::debug!(path = %primary.display(), "static file miss");

    let fallback = rel.file_name().map(|name| roots.icons().join(name))?;
    std::fs::read(&fallback).ok()
}

/// Serve a static path: resolve, load, wrap; miss yields the canonical 404.
pub fn serve(path: &str, roots: &ContentRoots) -> Response {
    let resolved = resolve(path, roots);
    match load(&resolved, roots) {
        Some(content) => Response::new(crate::StatusCode::OK)
            .header("Content-Type", resolved.mime)
            .body(content),
        None => Response::not_found(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roots() -> ContentRoots {
        ContentRoots::new("/srv/site")
    }

    #[test]
    fn test_prefix_classes() {
        let r = resolve("/css/site.css", &roots());
        assert_eq!(r.dir, PathBuf::from("/srv/site/static/css"));
        assert_eq!(r.rel, "site.css");
        assert_eq!(r.mime, "text/css");

        let r = resolve("/js/chat.js", &roots());
        assert_eq!(r.dir, PathBuf::from("/srv/site/static/js"));
        assert_eq!(r.mime, "application/javascript");

        let r = resolve("/images/logo.png", &roots());
        assert_eq!(r.dir, PathBuf::from("/srv/site/static/images"));
        assert_eq!(r.mime, "image/png");

        let r = resolve("/apps/data.json", &roots());
        assert_eq!(r.dir, PathBuf::from("/srv/site/apps"));
        assert_eq!(r.mime, "application/json");
    }

    #[test]
    fn test_html_goes_to_document_root() {
        let r = resolve("/index.html", &roots());
        assert_eq!(r.dir, PathBuf::from("/srv/site/www"));
        assert_eq!(r.rel, "index.html");
        assert_eq!(r.mime, "text/html");
    }

    #[test]
    fn test_everything_else_goes_to_assets() {
        let r = resolve("/robots.txt", &roots());
        assert_eq!(r.dir, PathBuf::from("/srv/site/static"));
        assert_eq!(r.rel, "robots.txt");
        assert_eq!(r.mime, "text/plain");
    }

    #[test]
    fn test_sanitize_rejects_traversal() {
        assert!(sanitize("css/site.css").is_some());
        assert!(sanitize("../etc/passwd").is_none());
        assert!(sanitize("a/../../b").is_none());
        assert!(sanitize(".hidden").is_none());
    }

    #[test]
    fn test_mime_default() {
        assert_eq!(mime_for("/blob"), "application/octet-stream");
        assert_eq!(mime_for("/archive.tar.gz"), "application/octet-stream");
    }

    #[test]
    fn test_serve_hit_and_miss() {
        let tmp = tempfile::tempdir().unwrap();
        let www = tmp.path().join("www");
        std::fs::create_dir_all(&www).unwrap();
        std::fs::write(www.join("index.html"), b"<h1>hi</h1>").unwrap();

        let roots = ContentRoots::new(tmp.path());

        let res = serve("/index.html", &roots);
        assert_eq!(res.status.as_u16(), 200);
        assert_eq!(res.get_header("content-type"), Some("text/html"));
        assert_eq!(&res.body[..], b"<h1>hi</h1>");

        let res = serve("/missing.html", &roots);
        assert_eq!(res.status.as_u16(), 404);
        assert_eq!(&res.body[..], b"404 Not Found");
    }

    #[test]
    fn test_icon_fallback() {
        let tmp = tempfile::tempdir().unwrap();
        let icons = tmp.path().join("static").join("icons");
        std::fs::create_dir_all(&icons).unwrap();
        std::fs::write(icons.join("favicon.ico"), b"icon-bytes").unwrap();

        let roots = ContentRoots::new(tmp.path());
        let res = serve("/images/favicon.ico", &roots);

        assert_eq!(res.status.as_u16(), 200);
        assert_eq!(&res.body[..], b"icon-bytes");
    }
}
