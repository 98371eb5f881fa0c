//! squall-core: Minimal HTTP stack on raw stream sockets
//!
//! A request parser, an exact-match routed dispatcher, a static-content
//! resolver and a virtual-host reverse proxy, all speaking plain
//! HTTP/1.1 over TCP with one short-lived connection per exchange.
//!
//! ## Model
//! - One spawned task per accepted connection: read, parse, dispatch,
//!   write, close. `Connection: close` always.
//! - Route and virtual-host tables are frozen before serving and shared
//!   read-only; handler-owned state brings its own locking.
//! - No keep-alive, no TLS, no chunked encoding, no HTTP/2.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod app;
pub mod config;
pub mod cors;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod headers;
pub mod proxy;
pub mod request;
pub mod response;
pub mod server;
pub mod static_files;

// Re-exports
pub use app::{App, AppState};
pub use config::{ContentRoots, PathRewrites, ServerConfig};
pub use error::{Error, Result};
pub use handler::{handler, HandlerFn, HandlerReply};
pub use headers::HeaderMap;
pub use proxy::{Policy, ProxyConfig, VirtualHosts};
pub use request::{Method, Request};
pub use response::{Response, StatusCode};
