//! Per-request correlation ids.

use axum::{
    extract::Request,
    http::{header::HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{info_span, Instrument};
use uuid::Uuid;

pub static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

const MAX_ID_LEN: usize = 128;

/// Correlation id attached to every request, available to handlers as an
/// extension.
#[derive(Debug, Clone)]
pub struct RequestId(Arc<str>);

impl RequestId {
    fn fresh() -> Self {
        Self(Arc::from(Uuid::new_v4().to_string()))
    }

    fn accept(raw: &str) -> Option<Self> {
        let ok = !raw.is_empty()
            && raw.len() <= MAX_ID_LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        ok.then(|| Self(Arc::from(raw)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reuses a well-formed caller-supplied `x-request-id`, otherwise mints one.
/// The id names the request span and is echoed in the response headers.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(RequestId::accept)
        .unwrap_or_else(RequestId::fresh);

    request.extensions_mut().insert(id.clone());

    let span = info_span!(
        "request",
        request_id = %id,
        method = %request.method(),
        uri = %request.uri(),
    );
    let mut response = next.run(request).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(id.as_str()) {
        response.headers_mut().insert(REQUEST_ID_HEADER.clone(), value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ids_are_unique() {
        assert_ne!(RequestId::fresh().as_str(), RequestId::fresh().as_str());
    }

    #[test]
    fn accepts_well_formed_ids() {
        assert!(RequestId::accept("abc-123_XYZ").is_some());
        assert!(RequestId::accept(&"a".repeat(MAX_ID_LEN)).is_some());
    }

    #[test]
    fn rejects_malformed_ids() {
        assert!(RequestId::accept("").is_none());
        assert!(RequestId::accept("abc 123").is_none());
        assert!(RequestId::accept("abc/123").is_none());
        assert!(RequestId::accept(&"a".repeat(MAX_ID_LEN + 1)).is_none());
    }
}
