//! Reverse proxy
//!
//! Resolves the inbound `Host` header against the virtual-host table,
//! relays the raw request bytes to the selected backend and streams the
//! full backend response back. Strictly one exchange per connection.

mod vhost;

pub use vhost::{
    BackendPicker, PickFirst, Policy, VirtualHostEntry, VirtualHosts, FALLBACK_HOST, FALLBACK_PORT,
};

use crate::config::DEFAULT_IO_TIMEOUT;
use crate::{server, Error, Response, Result, StatusCode};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Proxy tunables.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Connect/read timeout applied to both sides of the relay.
    pub io_timeout: Duration,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            io_timeout: DEFAULT_IO_TIMEOUT,
        }
    }
}

/// Bind and serve the proxy forever.
pub async fn run(hosts: Arc<VirtualHosts>, addr: SocketAddr, config: ProxyConfig) -> Result<()> {
    let listener = server::bind_listener(addr)?;
    tracing::info!(%addr, hosts = hosts.len(), "proxy listening");
    run_with_listener(hosts, listener, config).await
}

/// Accept-loop over an already-bound listener; same shape as the app
/// listener, feeding the relay instead of the dispatcher.
pub async fn run_with_listener(
    hosts: Arc<VirtualHosts>,
    listener: TcpListener,
    config: ProxyConfig,
) -> Result<()> {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                let hosts = hosts.clone();
                let config = config.clone();
                tokio::spawn(async move {
                    if let Err(err) = handle_client(hosts, config, stream).await {
                        tracing::debug!(%err, %peer, "proxy connection closed with error");
                    }
                });
            }
            Err(err) => {
                tracing::warn!(%err, "proxy accept failed");
            }
        }
    }
}

async fn handle_client(
    hosts: Arc<VirtualHosts>,
    config: ProxyConfig,
    mut stream: TcpStream,
) -> Result<()> {
    let raw = match server::read_request(&mut stream, config.io_timeout).await? {
        Some(raw) => raw,
        None => return Ok(()),
    };

    let response = match host_header(&raw) {
        Some(hostname) => {
            let (host, port) = hosts.resolve(&hostname);
            tracing::debug!(%hostname, backend = %format!("{host}:{port}"), "forwarding");
            forward(&host, port, &raw, config.io_timeout).await
        }
        None => {
            tracing::warn!("request without Host header");
            Response::text(StatusCode::BAD_REQUEST, "400 Bad Request").to_bytes()
        }
    };

    stream.write_all(&response).await?;
    stream.shutdown().await.ok();
    Ok(())
}

/// Extract the first `Host` header value, trimmed. Case-insensitive on
/// the header name; the value (which may carry a port) is kept verbatim.
pub fn host_header(raw: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(raw);
    let head = text.split("\r\n\r\n").next()?;

    head.split("\r\n").skip(1).find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim()
            .eq_ignore_ascii_case("host")
            .then(|| value.trim().to_string())
    })
}

/// Relay the raw request to a backend and collect its full response.
///
/// Any failure along the way (connect refused, timeout, broken relay)
/// yields the canonical 404 bytes; the proxy deliberately does not
/// distinguish an unreachable backend from a missing resource.
async fn forward(host: &str, port: u16, raw: &[u8], timeout: Duration) -> Vec<u8> {
    match relay(host, port, raw, timeout).await {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(%err, backend = %format!("{host}:{port}"), "forward failed");
            Response::not_found().to_bytes()
        }
    }
}

async fn relay(host: &str, port: u16, raw: &[u8], timeout: Duration) -> Result<Vec<u8>> {
    let mut backend = tokio::time::timeout(timeout, TcpStream::connect((host, port)))
        .await
        .map_err(|_| Error::Timeout(timeout))??;

    backend.write_all(raw).await?;
    backend.shutdown().await?;

    let mut response = Vec::new();
    let mut buf = vec![0u8; 4096];
    loop {
        let n = tokio::time::timeout(timeout, backend.read(&mut buf))
            .await
            .map_err(|_| Error::Timeout(timeout))??;
        if n == 0 {
            break;
        }
        response.extend_from_slice(&buf[..n]);
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_millis(500);

    fn config() -> ProxyConfig {
        ProxyConfig {
            io_timeout: TIMEOUT,
        }
    }

    #[test]
    fn test_host_header_extraction() {
        let raw = b"GET / HTTP/1.1\r\nUser-Agent: curl\r\nhOsT: app1.local:9000 \r\nHost: second.local\r\n\r\n";
        assert_eq!(host_header(raw), Some("app1.local:9000".to_string()));

        let raw = b"GET / HTTP/1.1\r\nUser-Agent: curl\r\n\r\n";
        assert_eq!(host_header(raw), None);
    }

    async fn spawn_canned_backend(body: &'static [u8]) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let _ = stream.read(&mut buf).await.unwrap();
            stream.write_all(body).await.unwrap();
        });
        addr
    }

    async fn spawn_proxy(hosts: VirtualHosts) -> SocketAddr {
        let listener = server::bind_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(run_with_listener(Arc::new(hosts), listener, config()));
        addr
    }

    async fn roundtrip(proxy: SocketAddr, request: &[u8]) -> Vec<u8> {
        let mut stream = TcpStream::connect(proxy).await.unwrap();
        stream.write_all(request).await.unwrap();
        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_relay_roundtrip() {
        let canned = b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok";
        let backend = spawn_canned_backend(canned).await;

        let mut hosts = VirtualHosts::new();
        hosts.insert("app1.local", vec![backend.to_string()], Policy::default());
        let proxy = spawn_proxy(hosts).await;

        let response =
            roundtrip(proxy, b"GET /x HTTP/1.1\r\nHost: app1.local\r\n\r\n").await;
        assert_eq!(response, canned);
    }

    #[tokio::test]
    async fn test_missing_host_is_bad_request() {
        let proxy = spawn_proxy(VirtualHosts::new()).await;

        let response = roundtrip(proxy, b"GET / HTTP/1.1\r\nUser-Agent: curl\r\n\r\n").await;
        let text = String::from_utf8_lossy(&response);
        assert!(text.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_not_found() {
        // Grab a port nobody is listening on.
        let parked = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dead = parked.local_addr().unwrap();
        drop(parked);

        let mut hosts = VirtualHosts::new();
        hosts.insert("gone.local", vec![dead.to_string()], Policy::default());
        let proxy = spawn_proxy(hosts).await;

        let response = roundtrip(proxy, b"GET / HTTP/1.1\r\nHost: gone.local\r\n\r\n").await;
        let text = String::from_utf8_lossy(&response);
        assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(text.ends_with("404 Not Found"));
    }
}
