//! Request dispatch
//!
//! Turns raw request bytes into a complete response: OPTIONS preflight,
//! dynamic-handler invocation, the login/auth gate, then static serving.
//! Every path out of here carries the CORS block; handler failures are
//! absorbed into a JSON envelope so a worker never dies on a bad hook.

use crate::app::AppState;
use crate::handler::HandlerReply;
use crate::request::{Method, Request};
use crate::{cors, static_files, Response, StatusCode};
use std::collections::HashMap;

/// Produce the response bytes-source for one parsed-or-not request.
pub fn respond(state: &AppState, raw: &[u8]) -> Response {
    let req = match Request::parse(raw, Some(&state.table), &state.config.rewrites) {
        Ok(req) => req,
        Err(err) => {
            tracing::warn!(%err, "unparseable request");
            return cors::apply(Response::text(StatusCode::BAD_REQUEST, "400 Bad Request"), None);
        }
    };

    tracing::debug!(method = %req.method, path = %req.path, "dispatch");
    let origin = req.headers.get("origin");

    if req.method == Method::Options {
        return cors::apply(Response::text(StatusCode::NO_CONTENT, ""), origin);
    }

    if let Some(hook) = &req.hook {
        let res = invoke_hook(hook, &req);
        return cors::apply(res, origin);
    }

    if req.method == Method::Post && req.path == state.config.rewrites.login_page {
        return cors::apply(login(state, &req), origin);
    }

    if state.config.is_protected(&req.path) && req.cookie("auth") != Some("true") {
        return cors::apply(unauthorized(state), origin);
    }

    cors::apply(static_files::serve(&req.path, &state.config.roots), origin)
}

/// Run a bound handler and serialize its tagged reply.
///
/// Text replies that parse as JSON are promoted to JSON. A handler error
/// becomes a JSON error envelope; the connection is never torn down for it.
fn invoke_hook(hook: &crate::handler::HandlerFn, req: &Request) -> Response {
    match hook(&req.headers, &req.body_text()) {
        Ok(HandlerReply::Json(value)) => Response::json(StatusCode::OK, value.to_string()),
        Ok(HandlerReply::Text(text)) => {
            match serde_json::from_str::<serde_json::Value>(&text) {
                Ok(value) => Response::json(StatusCode::OK, value.to_string()),
                Err(_) => Response::text(StatusCode::OK, text),
            }
        }
        Err(err) => {
            tracing::warn!(%err, path = %req.path, "handler failed");
            let envelope = serde_json::json!({
                "error": "hook error",
                "detail": err.to_string(),
            });
            Response::json(StatusCode::OK, envelope.to_string())
        }
    }
}

/// `POST /login`: one fixed credential pair.
///
/// Success answers 200 with `Set-Cookie: auth=true` and the protected
/// document's body; anything else is a 401 with no cookie.
fn login(state: &AppState, req: &Request) -> Response {
    let form = parse_form(&req.body_text());
    let username = form.get("username").map(String::as_str);
    let password = form.get("password").map(String::as_str);

    if username == Some(state.config.username.as_str())
        && password == Some(state.config.password.as_str())
    {
        let document = &state.config.rewrites.default_document;
        static_files::serve(document, &state.config.roots)
            .header("Set-Cookie", "auth=true; Path=/")
    } else {
        Response::text(StatusCode::UNAUTHORIZED, "Unauthorized")
    }
}

/// 401 for a protected page: the 401 document when present, plain text
/// otherwise. Never the protected content.
fn unauthorized(state: &AppState) -> Response {
    let page = state.config.roots.www().join("401.html");
    match std::fs::read(&page) {
        Ok(body) => Response::html(StatusCode::UNAUTHORIZED, body),
        Err(_) => Response::text(StatusCode::UNAUTHORIZED, "401 Unauthorized"),
    }
}

/// Parse an `application/x-www-form-urlencoded` body.
pub fn parse_form(body: &str) -> HashMap<String, String> {
    body.split('&')
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            Some((key.to_string(), percent_decode(value)))
        })
        .collect()
}

/// Simple URL decoding (no external dependency)
fn percent_decode(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '%' {
            let hex: String = chars.by_ref().take(2).collect();
            if hex.len() == 2 {
                if let Ok(byte) = u8::from_str_radix(&hex, 16) {
                    result.push(byte as char);
                    continue;
                }
            }
            result.push('%');
            result.push_str(&hex);
        } else if c == '+' {
            result.push(' ');
        } else {
            result.push(c);
        }
    }
    result
}
