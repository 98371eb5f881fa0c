//! squall-router: Zero-dependency exact-match HTTP route table
//!
//! Single Source of Truth (SSOT) route table used by squall-core.
//!
//! ## Matching
//! - Keys are (HTTP method, exact path) pairs: `("GET", "/users")`
//! - No parameters, no wildcards, no prefix matching
//! - Registering the same key twice silently overwrites (last wins)
//!
//! ## Lifecycle
//! Register everything up front, then share the frozen table read-only
//! across connection workers. The table itself never locks.
//!
//! ## Example
//! ```
//! use squall_router::RouteTable;
//!
//! let mut table = RouteTable::new();
//! table.insert("GET", "/users", 0);
//! table.insert("GET", "/users", 1); // overwrites
//!
//! assert_eq!(table.get("GET", "/users"), Some(&1));
//! assert_eq!(table.get("POST", "/users"), None);
//! ```

use std::collections::HashMap;

/// Exact-match route table keyed by (method, path).
#[derive(Debug, Clone)]
pub struct RouteTable<T> {
    routes: HashMap<(String, String), T>,
}

impl<T> RouteTable<T> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    /// Register a value under (method, path).
    ///
    /// The method is upper-cased so `get`/`GET` register the same key.
    /// Re-registering a key replaces the previous value; the returned
    /// option carries the displaced value.
    pub fn insert(&mut self, method: &str, path: &str, value: T) -> Option<T> {
        self.routes
            .insert((method.to_ascii_uppercase(), path.to_string()), value)
    }

    /// Look up the value registered for (method, path), if any.
    pub fn get(&self, method: &str, path: &str) -> Option<&T> {
        self.routes
            .get(&(method.to_ascii_uppercase(), path.to_string()))
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the table has no routes.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Iterate over (method, path) keys, in arbitrary order.
    pub fn keys(&self) -> impl Iterator<Item = (&str, &str)> {
        self.routes.keys().map(|(m, p)| (m.as_str(), p.as_str()))
    }
}

impl<T> Default for RouteTable<T> {
    fn default() -> Self {
        Self::new()
    }
}
