//! Virtual-host table and backend selection
//!
//! Immutable hostname → backend-pool mapping built once at startup.
//! The distribution policy tag is carried through and handed to a
//! [`BackendPicker`] strategy; the shipped picker always takes the
//! first pool entry, so declared policies like `round-robin` parse but
//! do not rotate yet.

use std::collections::HashMap;

/// Fallback endpoint for unregistered hostnames.
pub const FALLBACK_HOST: &str = "127.0.0.1";
pub const FALLBACK_PORT: u16 = 9000;

/// Declared distribution policy tag, e.g. `round-robin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy(String);

impl Policy {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn tag(&self) -> &str {
        &self.0
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self("round-robin".to_string())
    }
}

/// One registered virtual host: ordered backend pool plus policy tag.
#[derive(Debug, Clone)]
pub struct VirtualHostEntry {
    /// Ordered `"host:port"` backend endpoints; never empty for a
    /// registered host.
    pub backends: Vec<String>,
    pub policy: Policy,
}

/// Strategy seam for choosing among a pool's backends.
///
/// The policy tag is passed so a future picker can rotate, hash or
/// weigh; [`PickFirst`] ignores it.
pub trait BackendPicker: Send + Sync {
    fn pick<'a>(&self, policy: &Policy, pool: &'a [String]) -> Option<&'a str>;
}

/// The only shipped strategy: always the first pool entry.
#[derive(Debug, Default)]
pub struct PickFirst;

impl BackendPicker for PickFirst {
    fn pick<'a>(&self, _policy: &Policy, pool: &'a [String]) -> Option<&'a str> {
        pool.first().map(String::as_str)
    }
}

/// Hostname → backend-pool table consumed by the reverse proxy.
pub struct VirtualHosts {
    entries: HashMap<String, VirtualHostEntry>,
    picker: Box<dyn BackendPicker>,
}

impl VirtualHosts {
    /// Empty table with the default picker.
    pub fn new() -> Self {
        Self::with_picker(Box::new(PickFirst))
    }

    /// Empty table with a custom selection strategy.
    pub fn with_picker(picker: Box<dyn BackendPicker>) -> Self {
        Self {
            entries: HashMap::new(),
            picker,
        }
    }

    /// Register a host. Called while building the table, before serving;
    /// the table is read-only afterward.
    pub fn insert(
        &mut self,
        hostname: impl Into<String>,
        backends: Vec<String>,
        policy: Policy,
    ) -> &mut Self {
        self.entries
            .insert(hostname.into(), VirtualHostEntry { backends, policy });
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a hostname to a concrete (host, port) backend.
    ///
    /// Unknown hostnames, empty pools and unparsable endpoints all land
    /// on the fixed fallback; resolution never fails.
    pub fn resolve(&self, hostname: &str) -> (String, u16) {
        let fallback = (FALLBACK_HOST.to_string(), FALLBACK_PORT);

        let Some(entry) = self.entries.get(hostname.trim()) else {
            tracing::debug!(hostname, "no virtual host registered, using fallback");
            return fallback;
        };

        let Some(endpoint) = self.picker.pick(&entry.policy, &entry.backends) else {
            tracing::warn!(hostname, "empty backend pool, using fallback");
            return fallback;
        };

        match split_endpoint(endpoint) {
            Some((host, port)) => (host.to_string(), port),
            None => {
                tracing::warn!(hostname, endpoint, "unparsable backend endpoint, using fallback");
                fallback
            }
        }
    }
}

impl Default for VirtualHosts {
    fn default() -> Self {
        Self::new()
    }
}

/// Split `"host:port"` once on the last `:`.
fn split_endpoint(endpoint: &str) -> Option<(&str, u16)> {
    let (host, port) = endpoint.rsplit_once(':')?;
    let port = port.trim().parse().ok()?;
    Some((host, port))
}
