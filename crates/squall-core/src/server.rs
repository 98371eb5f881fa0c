//! Listener and per-connection workers
//!
//! One task per accepted connection: one bounded read, one parse, one
//! dispatch, one write, close. No admission control, no graceful
//! shutdown; the process is terminated externally.

use crate::app::AppState;
use crate::config::{BACKLOG, MAX_REQUEST_SIZE, READ_BUF_SIZE};
use crate::request::Method;
use crate::{dispatch, Error, Result};
use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Build a bound, listening TCP socket.
///
/// SO_REUSEADDR for quick rebinds, TCP_NODELAY for small responses,
/// the fixed accept backlog, nonblocking for tokio registration.
pub fn bind_listener(addr: SocketAddr) -> std::io::Result<TcpListener> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.set_nodelay(true)?;
    socket.bind(&addr.into())?;
    socket.listen(BACKLOG)?;
    socket.set_nonblocking(true)?;

    TcpListener::from_std(socket.into())
}

/// Bind and serve forever.
pub async fn run(state: Arc<AppState>, addr: SocketAddr) -> Result<()> {
    let listener = bind_listener(addr)?;
    tracing::info!(%addr, routes = state.table.len(), "listening");
    run_with_listener(state, listener).await
}

/// Accept-loop over an already-bound listener, spawning one worker per
/// connection. Accept errors are logged and never stop the loop.
pub async fn run_with_listener(state: Arc<AppState>, listener: TcpListener) -> Result<()> {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                let state = state.clone();
                tokio::spawn(async move {
                    if let Err(err) = handle_connection(state, stream).await {
                        tracing::debug!(%err, %peer, "connection closed with error");
                    }
                });
            }
            Err(err) => {
                tracing::warn!(%err, "accept failed");
            }
        }
    }
}

async fn handle_connection(state: Arc<AppState>, mut stream: TcpStream) -> Result<()> {
    let raw = match read_request(&mut stream, state.config.io_timeout).await? {
        Some(raw) => raw,
        // Peer closed before sending anything: no response.
        None => return Ok(()),
    };

    let response = dispatch::respond(&state, &raw);
    stream.write_all(&response.to_bytes()).await?;
    stream.shutdown().await.ok();
    Ok(())
}

/// Read one request from the stream under the configured timeout.
///
/// Reads until the header block is complete, then continues only as far
/// as the declared `Content-Length` (for body-carrying methods), capped
/// at [`MAX_REQUEST_SIZE`]. Returns `None` when the peer closed without
/// sending a byte.
pub async fn read_request<S>(stream: &mut S, timeout: Duration) -> Result<Option<Vec<u8>>>
where
    S: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; READ_BUF_SIZE];
    let mut data: Vec<u8> = Vec::new();

    loop {
        let n = tokio::time::timeout(timeout, stream.read(&mut buf))
            .await
            .map_err(|_| Error::Timeout(timeout))??;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);

        if data.len() > MAX_REQUEST_SIZE {
            return Err(Error::RequestTooLarge {
                size: data.len(),
                limit: MAX_REQUEST_SIZE,
            });
        }

        if let Some(body_start) = head_end(&data) {
            match declared_body_len(&data[..body_start]) {
                Some(len) if data.len() < body_start + len => continue,
                _ => break,
            }
        }
    }

    if data.is_empty() {
        Ok(None)
    } else {
        Ok(Some(data))
    }
}

/// Offset of the first byte after `\r\n\r\n`, if the head is complete.
fn head_end(data: &[u8]) -> Option<usize> {
    data.windows(4).position(|w| w == b"\r\n\r\n").map(|p| p + 4)
}

/// Declared body length, honored only for body-carrying methods.
fn declared_body_len(head: &[u8]) -> Option<usize> {
    let head = String::from_utf8_lossy(head);
    let mut lines = head.split("\r\n");

    let method = lines.next()?.split_whitespace().next()?;
    if !Method::parse(method).ok()?.has_body() {
        return None;
    }

    lines.find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim()
            .eq_ignore_ascii_case("content-length")
            .then(|| value.trim().parse().ok())?
    })
}
