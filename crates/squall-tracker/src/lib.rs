//! squall-tracker: In-memory peer and shared-info registry
//!
//! A thin consumer of the squall core: the registry is plain shared
//! state behind one mutex, exposed to peers through dynamic handlers.
//! The core runs handlers concurrently, one per connection, and offers
//! no locking of its own, so every read and write goes through the
//! registry's lock.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use squall_core::{App, HandlerReply, Method};
use std::collections::HashMap;
use std::sync::Arc;

/// A registered peer endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerInfo {
    pub ip: String,
    pub port: u16,
}

#[derive(Default)]
struct Registry {
    peers: Vec<PeerInfo>,
    shared_info: HashMap<String, serde_json::Value>,
}

/// Peer registry guarded by a single mutex.
#[derive(Default)]
pub struct Tracker {
    inner: Mutex<Registry>,
}

impl Tracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a peer unless the same ip:port is already registered.
    pub fn add_peer(&self, peer: PeerInfo) -> bool {
        let mut registry = self.inner.lock();
        if registry.peers.contains(&peer) {
            return false;
        }
        tracing::info!(ip = %peer.ip, port = peer.port, "peer added");
        registry.peers.push(peer);
        true
    }

    /// Remove a peer; true when something was actually dropped.
    pub fn remove_peer(&self, peer: &PeerInfo) -> bool {
        let mut registry = self.inner.lock();
        let before = registry.peers.len();
        registry.peers.retain(|p| p != peer);
        let removed = registry.peers.len() != before;
        if removed {
            tracing::info!(ip = %peer.ip, port = peer.port, "peer removed");
        }
        removed
    }

    pub fn peers(&self) -> Vec<PeerInfo> {
        self.inner.lock().peers.clone()
    }

    /// Record shared info under a key, replacing any previous entry.
    pub fn submit_info(&self, key: impl Into<String>, info: serde_json::Value) {
        self.inner.lock().shared_info.insert(key.into(), info);
    }

    /// Info for one key; `{}` when absent.
    pub fn info(&self, key: &str) -> serde_json::Value {
        self.inner
            .lock()
            .shared_info
            .get(key)
            .cloned()
            .unwrap_or_else(|| serde_json::json!({}))
    }

    pub fn all_info(&self) -> HashMap<String, serde_json::Value> {
        self.inner.lock().shared_info.clone()
    }
}

fn invalid_json() -> HandlerReply {
    HandlerReply::Json(serde_json::json!({
        "status": "error",
        "message": "Invalid JSON body",
    }))
}

/// Install the tracker routes on an app builder.
///
/// `POST /submit-info`, `POST /add-list`, `POST /rm-list`,
/// `GET /get-list`, `GET /get-info`.
pub fn routes(app: App, tracker: Arc<Tracker>) -> App {
    let t = tracker.clone();
    let app = app.route(Method::Post, "/submit-info", move |_headers, body| {
        let Ok(info) = serde_json::from_str::<serde_json::Value>(body) else {
            return Ok(invalid_json());
        };
        let name = info
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string();
        t.submit_info(&name, info);
        Ok(HandlerReply::Json(serde_json::json!({
            "status": "ok",
            "message": format!("Info submitted for {name}"),
        })))
    });

    let t = tracker.clone();
    let app = app.route(Method::Post, "/add-list", move |_headers, body| {
        let Ok(peer) = serde_json::from_str::<PeerInfo>(body) else {
            return Ok(invalid_json());
        };
        let status = if t.add_peer(peer) { "ok" } else { "exists" };
        Ok(HandlerReply::Json(serde_json::json!({
            "status": status,
            "peers": t.peers(),
        })))
    });

    let t = tracker.clone();
    let app = app.route(Method::Post, "/rm-list", move |_headers, body| {
        let Ok(peer) = serde_json::from_str::<PeerInfo>(body) else {
            return Ok(invalid_json());
        };
        let status = if t.remove_peer(&peer) { "removed" } else { "not-found" };
        Ok(HandlerReply::Json(serde_json::json!({ "status": status })))
    });

    let t = tracker.clone();
    let app = app.route(Method::Get, "/get-list", move |_headers, _body| {
        Ok(HandlerReply::Json(serde_json::json!({ "peers": t.peers() })))
    });

    let t = tracker;
    app.route(Method::Get, "/get-info", move |_headers, _body| {
        HandlerReply::json(&t.all_info())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use squall_core::dispatch;

    #[test]
    fn test_add_peer_deduplicates() {
        let tracker = Tracker::new();
        let peer = PeerInfo {
            ip: "10.0.0.1".to_string(),
            port: 8000,
        };

        assert!(tracker.add_peer(peer.clone()));
        assert!(!tracker.add_peer(peer.clone()));
        assert_eq!(tracker.peers().len(), 1);

        assert!(tracker.remove_peer(&peer));
        assert!(!tracker.remove_peer(&peer));
        assert!(tracker.peers().is_empty());
    }

    #[test]
    fn test_info_defaults_to_empty_object() {
        let tracker = Tracker::new();
        assert_eq!(tracker.info("nobody"), serde_json::json!({}));

        tracker.submit_info("alice", serde_json::json!({"name": "alice"}));
        assert_eq!(tracker.info("alice")["name"], "alice");
    }

    fn post(path: &str, body: &str) -> Vec<u8> {
        format!(
            "POST {path} HTTP/1.1\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        )
        .into_bytes()
    }

    #[test]
    fn test_routes_over_dispatch() {
        let tracker = Arc::new(Tracker::new());
        let state = routes(App::new(), tracker.clone()).build();

        let res = dispatch::respond(&state, &post("/add-list", r#"{"ip":"10.0.0.1","port":8000}"#));
        let value: serde_json::Value = serde_json::from_slice(&res.body).unwrap();
        assert_eq!(value["status"], "ok");

        let res = dispatch::respond(&state, &post("/add-list", r#"{"ip":"10.0.0.1","port":8000}"#));
        let value: serde_json::Value = serde_json::from_slice(&res.body).unwrap();
        assert_eq!(value["status"], "exists");

        let res = dispatch::respond(&state, b"GET /get-list HTTP/1.1\r\n\r\n");
        let value: serde_json::Value = serde_json::from_slice(&res.body).unwrap();
        assert_eq!(value["peers"].as_array().unwrap().len(), 1);

        let res = dispatch::respond(&state, &post("/submit-info", "not json"));
        let value: serde_json::Value = serde_json::from_slice(&res.body).unwrap();
        assert_eq!(value["status"], "error");
    }

    #[test]
    fn test_concurrent_submissions_are_not_lost() {
        let tracker = Arc::new(Tracker::new());
        let state = routes(App::new(), tracker.clone()).build();

        let handles: Vec<_> = (0..2)
            .map(|i| {
                let state = state.clone();
                std::thread::spawn(move || {
                    let body = format!(r#"{{"name":"peer-{i}","ip":"10.0.0.{i}","port":800{i}}}"#);
                    dispatch::respond(&state, &post("/submit-info", &body))
                })
            })
            .collect();

        for handle in handles {
            let res = handle.join().unwrap();
            assert_eq!(res.status.as_u16(), 200);
        }

        let info = tracker.all_info();
        assert!(info.contains_key("peer-0"));
        assert!(info.contains_key("peer-1"));
    }
}
