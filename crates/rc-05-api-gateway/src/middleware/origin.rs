//! Origin allow-list middleware.
//!
//! Rejects report submissions from pages outside `allowed_domains` before
//! the body is read.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{
        header::{ORIGIN, REFERER},
        HeaderMap,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::domain::origin::{OriginPolicy, OriginRejection};

/// `axum::middleware::from_fn_with_state` handler enforcing `policy`.
pub async fn enforce_origin(
    State(policy): State<Arc<OriginPolicy>>,
    request: Request,
    next: Next,
) -> Response {
    let verdict = origin_value(request.headers()).and_then(|origin| policy.check(origin));

    match verdict {
        Ok(()) => next.run(request).await,
        Err(rejection) => {
            debug!(?rejection, path = %request.uri().path(), "Report origin rejected");
            (rejection.status(), rejection.message()).into_response()
        }
    }
}

/// `Origin`, falling back to `Referer` when absent or empty.
fn origin_value(headers: &HeaderMap) -> Result<Option<&str>, OriginRejection> {
    for name in [ORIGIN, REFERER] {
        if let Some(value) = headers.get(&name) {
            let value = value.to_str().map_err(|_| OriginRejection::Invalid)?;
            if !value.is_empty() {
                return Ok(Some(value));
            }
        }
    }
    Ok(None)
}
