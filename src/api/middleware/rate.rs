//! Per-client rate limiting middleware.
//!
//! Applies sliding-window limits per caller:
//! - 100 requests per minute
//! - 1000 requests per hour
//!
//! A bearer token gets its own bucket only when it resolves to a live
//! session (keyed by staff id). Everything else, including unknown or
//! rotated tokens, shares the "anonymous" bucket.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::middleware::auth::bearer_token;
use crate::api::types::ApiContext;

const ANONYMOUS: &str = "anonymous";

fn rate_key(ctx: &ApiContext, req: &Request<axum::body::Body>) -> Result<String, ApiError> {
    let Some(token) = bearer_token(req) else {
        return Ok(ANONYMOUS.to_string());
    };
    Ok(match ctx.core.authenticate(token)? {
        Some(staff) => format!("staff:{}", staff.staff_id),
        None => ANONYMOUS.to_string(),
    })
}

/// Returns 429 with `Retry-After` when the caller is over its limit.
pub async fn limit(req: Request<axum::body::Body>, next: Next) -> Response {
    match limit_inner(req, next).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

async fn limit_inner(req: Request<axum::body::Body>, next: Next) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let key = rate_key(&ctx, &req)?;

    // MutexGuard is !Send, must drop before .await via block scope
    {
        let mut limiter = ctx
            .rate_limiter
            .lock()
            .map_err(|_| ApiError::Internal("rate limiter lock".into()))?;

        limiter.check(&key).map_err(|retry_after| {
            tracing::warn!(key = %key, retry_after, "Request rate limit exceeded");
            ApiError::RateLimited { retry_after }
        })?;
    }

    Ok(next.run(req).await)
}
