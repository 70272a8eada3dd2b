// SPDX-License-Identifier: Apache-2.0

use crate::AppState;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request};
use leadline_core::sha256_hex;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

pub(crate) const REQUEST_ID_HEADER: &str = "x-request-id";
const REQUEST_ID_MAX_LEN: usize = 128;
const GENERATED_ID_HEX_LEN: usize = 16;

/// Mints `req-<16 hex>` ids by hashing a per-process salt with a counter,
/// so restarts and replicas do not hand out the same sequence.
pub(crate) struct RequestIdSource {
    salt: String,
    counter: AtomicU64,
}

impl RequestIdSource {
    pub(crate) fn new() -> Self {
        let started_ns = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos());
        Self::with_salt(format!("{started_ns}:{}", std::process::id()))
    }

    pub(crate) fn with_salt(salt: String) -> Self {
        Self {
            salt,
            counter: AtomicU64::new(1),
        }
    }

    pub(crate) fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let digest = sha256_hex(format!("{}:{n}", self.salt).as_bytes());
        format!("req-{}", &digest[..GENERATED_ID_HEX_LEN])
    }
}

/// Request id attached to the request extensions by the tracing middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RequestId(pub String);

fn acceptable_request_id(raw: &str) -> bool {
    !raw.is_empty()
        && raw.len() <= REQUEST_ID_MAX_LEN
        && raw
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b':'))
}

#[must_use]
pub(crate) fn extract_request_id(headers: &HeaderMap, state: &AppState) -> RequestId {
    let propagated = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| acceptable_request_id(v))
        .map(ToString::to_string);
    RequestId(propagated.unwrap_or_else(|| state.request_ids.next_id()))
}

/// First `x-forwarded-for` hop, when it looks like an address.
pub(crate) fn normalized_forwarded_for(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get("x-forwarded-for")?.to_str().ok()?;
    let first = raw.split(',').next()?.trim();
    if first.is_empty() || first.len() > 64 {
        return None;
    }
    if first
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b':' || b == b'-')
    {
        Some(first.to_string())
    } else {
        None
    }
}

/// Key used for rate limiting and audit lines. `x-forwarded-for` is only
/// honoured behind a trusted proxy.
pub(crate) fn client_address(req: &Request<Body>, state: &AppState) -> String {
    if state.api.trust_forwarded_for {
        if let Some(ip) = normalized_forwarded_for(req.headers()) {
            return ip;
        }
    }
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| "unknown".to_string(), |ConnectInfo(addr)| addr.ip().to_string())
}
