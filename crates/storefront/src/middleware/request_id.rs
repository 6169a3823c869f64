//! Request ID middleware for tracing and Sentry correlation.
//!
//! An ID forwarded by a proxy is reused when it looks sane; anything else gets
//! a fresh UUID v4. The ID ends up in the tracing span, the Sentry scope and
//! the `x-request-id` response header, so a customer's "pesanan gagal" report
//! can be matched to the logs.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest upstream ID that is passed through.
const MAX_UPSTREAM_ID_LEN: usize = 128;

/// Reuse an upstream ID if it is short, printable ASCII without spaces.
fn upstream_id(value: Option<&HeaderValue>) -> Option<String> {
    let id = value?.to_str().ok()?.trim();
    let usable = !id.is_empty()
        && id.len() <= MAX_UPSTREAM_ID_LEN
        && id.bytes().all(|b| b.is_ascii_graphic());
    usable.then(|| id.to_string())
}

/// Middleware that ensures every request carries a request ID.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = upstream_id(request.headers().get(REQUEST_ID_HEADER))
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    Span::current().record("request_id", &request_id);
    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_id_reused() {
        let value = HeaderValue::from_static("cf-8a1b2c3d");
        assert_eq!(upstream_id(Some(&value)).as_deref(), Some("cf-8a1b2c3d"));
    }

    #[test]
    fn test_upstream_id_rejected() {
        assert_eq!(upstream_id(None), None);
        assert_eq!(upstream_id(Some(&HeaderValue::from_static("   "))), None);
        assert_eq!(upstream_id(Some(&HeaderValue::from_static("a b"))), None);

        let long = "x".repeat(MAX_UPSTREAM_ID_LEN + 1);
        let value = HeaderValue::from_str(&long).unwrap();
        assert_eq!(upstream_id(Some(&value)), None);
    }
}
