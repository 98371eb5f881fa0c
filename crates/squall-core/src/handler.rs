//! Dynamic handler contract
//!
//! A handler is invoked with the parsed request headers and body and
//! returns a tagged reply. The closed reply set keeps response
//! serialization a total match instead of runtime type inspection.

use crate::{HeaderMap, Result};
use std::sync::Arc;

/// What a dynamic handler hands back to the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerReply {
    /// Serialized as `application/json` with a 200 envelope.
    Json(serde_json::Value),
    /// Tried as JSON first (re-tagged when it parses), else `text/plain`.
    Text(String),
}

impl HandlerReply {
    /// Build a JSON reply from any serializable value.
    ///
    /// Serialization failures surface as handler errors so dispatch can
    /// wrap them in the usual error envelope.
    pub fn json<T: serde::Serialize>(value: &T) -> Result<Self> {
        let value = serde_json::to_value(value).map_err(|e| crate::Error::handler(e.to_string()))?;
        Ok(HandlerReply::Json(value))
    }

    /// Build a plain-text reply.
    pub fn text(body: impl Into<String>) -> Self {
        HandlerReply::Text(body.into())
    }
}

/// Shared dynamic handler: `(headers, body) -> reply`.
///
/// Handlers run on the connection's own worker and may be one of many
/// concurrent invocations; any shared state they touch must bring its
/// own mutual exclusion.
pub type HandlerFn = Arc<dyn Fn(&HeaderMap, &str) -> Result<HandlerReply> + Send + Sync>;

/// Wrap a closure into the shared handler type.
pub fn handler<F>(f: F) -> HandlerFn
where
    F: Fn(&HeaderMap, &str) -> Result<HandlerReply> + Send + Sync + 'static,
{
    Arc::new(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_reply_from_serializable() {
        let reply = HandlerReply::json(&serde_json::json!({"status": "ok"})).unwrap();
        match reply {
            HandlerReply::Json(v) => assert_eq!(v["status"], "ok"),
            HandlerReply::Text(_) => panic!("expected JSON reply"),
        }
    }

    #[test]
    fn test_handler_invocation() {
        let h = handler(|_headers, body| Ok(HandlerReply::text(format!("echo: {body}"))));
        let reply = h(&HeaderMap::new(), "hi").unwrap();
        assert_eq!(reply, HandlerReply::Text("echo: hi".to_string()));
    }
}
