//! squall-cli: launcher plumbing
//!
//! Everything the binaries need that the core deliberately does not
//! own: telemetry initialization and the virtual-host config-file
//! syntax. The core only ever sees the finished [`VirtualHosts`] table.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

use regex::Regex;
use squall_core::proxy::Policy;
use squall_core::VirtualHosts;
use std::path::Path;
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Config-file failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Initialize the tracing subscriber; `RUST_LOG` overrides the default.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "squall=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Parse virtual-host blocks from a config file into the proxy's table.
///
/// Block syntax:
/// ```text
/// host "app1.local" {
///     proxy_pass http://10.0.0.5:9001;
///     proxy_pass http://10.0.0.6:9002;
///     dist_policy round-robin;
/// }
/// ```
///
/// A missing `dist_policy` defaults to `round-robin`. A block without
/// any `proxy_pass` still registers; resolution then lands on the
/// proxy's fallback endpoint.
pub fn parse_virtual_hosts(path: impl AsRef<Path>) -> Result<VirtualHosts, ConfigError> {
    let text = std::fs::read_to_string(path)?;

    let block_re = Regex::new(r#"(?s)host\s+"([^"]+)"\s*\{(.*?)\}"#)?;
    let pass_re = Regex::new(r"proxy_pass\s+http://([^\s;]+);")?;
    let policy_re = Regex::new(r"dist_policy\s+([\w-]+)")?;

    let mut hosts = VirtualHosts::new();
    for block in block_re.captures_iter(&text) {
        let hostname = &block[1];
        let body = &block[2];

        let backends: Vec<String> = pass_re
            .captures_iter(body)
            .map(|c| c[1].to_string())
            .collect();

        let policy = policy_re
            .captures(body)
            .map(|c| Policy::new(&c[1]))
            .unwrap_or_default();

        tracing::info!(
            hostname,
            backends = backends.len(),
            policy = policy.tag(),
            "virtual host registered"
        );
        hosts.insert(hostname, backends, policy);
    }

    Ok(hosts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_conf(text: &str) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), text).unwrap();
        file
    }

    #[test]
    fn test_parse_single_backend_block() {
        let conf = write_conf(
            r#"
            host "app1.local" {
                proxy_pass http://10.0.0.5:9001;
            }
            "#,
        );

        let hosts = parse_virtual_hosts(conf.path()).unwrap();
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts.resolve("app1.local"), ("10.0.0.5".to_string(), 9001));
    }

    #[test]
    fn test_parse_multi_backend_with_policy() {
        let conf = write_conf(
            r#"
            host "app2.local" {
                proxy_pass http://10.0.0.5:9001;
                proxy_pass http://10.0.0.6:9002;
                dist_policy round-robin;
            }
            host "pool.local:8080" {
                proxy_pass http://10.0.0.7:9003;
            }
            "#,
        );

        let hosts = parse_virtual_hosts(conf.path()).unwrap();
        assert_eq!(hosts.len(), 2);
        // Declared round-robin resolves to first-of-list.
        assert_eq!(hosts.resolve("app2.local"), ("10.0.0.5".to_string(), 9001));
        assert_eq!(
            hosts.resolve("pool.local:8080"),
            ("10.0.0.7".to_string(), 9003)
        );
    }

    #[test]
    fn test_unknown_host_uses_fallback() {
        let conf = write_conf("");
        let hosts = parse_virtual_hosts(conf.path()).unwrap();
        assert!(hosts.is_empty());
        assert_eq!(
            hosts.resolve("unknown.local"),
            (
                squall_core::proxy::FALLBACK_HOST.to_string(),
                squall_core::proxy::FALLBACK_PORT
            )
        );
    }
}
