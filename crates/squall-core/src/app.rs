//! Application builder
//!
//! Register routes, freeze the table, serve. Registration happens before
//! the listener starts; afterwards the frozen state is shared read-only
//! across every connection worker.

use crate::config::ServerConfig;
use crate::handler::{handler, HandlerFn, HandlerReply};
use crate::request::Method;
use crate::{HeaderMap, Result};
use squall_router::RouteTable;
use std::net::SocketAddr;
use std::sync::Arc;

/// Frozen application state shared by all workers.
pub struct AppState {
    pub table: RouteTable<HandlerFn>,
    pub config: ServerConfig,
}

/// Builder for a routed application.
///
/// ```
/// use squall_core::{App, HandlerReply, Method};
///
/// let app = App::new()
///     .route(Method::Get, "/whoami", |_headers, _body| {
///         Ok(HandlerReply::Json(serde_json::json!({"id": "127.0.0.1:8000"})))
///     });
/// let state = app.build();
/// assert_eq!(state.table.len(), 1);
/// ```
pub struct App {
    table: RouteTable<HandlerFn>,
    config: ServerConfig,
}

impl App {
    /// New app with default configuration.
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    /// New app with explicit configuration.
    pub fn with_config(config: ServerConfig) -> Self {
        Self {
            table: RouteTable::new(),
            config,
        }
    }

    /// Register a handler for (method, path). Last registration wins.
    pub fn route<F>(self, method: Method, path: &str, f: F) -> Self
    where
        F: Fn(&HeaderMap, &str) -> Result<HandlerReply> + Send + Sync + 'static,
    {
        self.route_fn(method, path, handler(f))
    }

    /// Register an already-shared handler for (method, path).
    pub fn route_fn(mut self, method: Method, path: &str, f: HandlerFn) -> Self {
        self.table.insert(method.as_str(), path, f);
        self
    }

    /// Freeze the route table into shared state.
    pub fn build(self) -> Arc<AppState> {
        Arc::new(AppState {
            table: self.table,
            config: self.config,
        })
    }

    /// Freeze and serve forever on `addr`.
    pub async fn serve(self, addr: SocketAddr) -> Result<()> {
        crate::server::run(self.build(), addr).await
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_registration_overwrites() {
        let app = App::new()
            .route(Method::Get, "/user", |_h, _b| Ok(HandlerReply::text("one")))
            .route(Method::Get, "/user", |_h, _b| Ok(HandlerReply::text("two")));

        let state = app.build();
        assert_eq!(state.table.len(), 1);

        let hook = state.table.get("GET", "/user").unwrap();
        let reply = hook(&HeaderMap::new(), "").unwrap();
        assert_eq!(reply, HandlerReply::Text("two".to_string()));
    }
}
