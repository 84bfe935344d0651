//! Staff login and logout.
//!
//! `POST /api/auth/login`: Public: exchanges username + password for a bearer token
//! `POST /api/auth/logout`: Protected: revokes the caller's token

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, StaffContext};

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub staff_id: Uuid,
    pub username: String,
}

/// `POST /api/auth/login`
///
/// Attempts are limited per username; a successful login clears the
/// count. Password hashing runs on the blocking pool.
pub async fn login(
    State(ctx): State<ApiContext>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let username = request.username.trim().to_string();
    if username.is_empty() || request.password.is_empty() {
        return Err(ApiError::BadRequest("username and password are required".into()));
    }

    {
        let mut limiter = ctx
            .login_limiter
            .lock()
            .map_err(|_| ApiError::Internal("login limiter lock".into()))?;
        limiter.check(&username).map_err(|retry_after| {
            tracing::warn!(retry_after, "Login attempts rate limited");
            ApiError::RateLimited { retry_after }
        })?;
    }

    let core = ctx.core.clone();
    let name = username.clone();
    let password = request.password;
    let (token, staff) = tokio::task::spawn_blocking(move || core.login(&name, &password))
        .await
        .map_err(|e| ApiError::Internal(format!("login task failed: {e}")))??;

    if let Ok(mut limiter) = ctx.login_limiter.lock() {
        limiter.clear(&username);
    }

    Ok(Json(LoginResponse {
        token,
        staff_id: staff.staff_id,
        username: staff.username,
    }))
}

/// `POST /api/auth/logout`
pub async fn logout(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<StaffContext>,
) -> Result<StatusCode, ApiError> {
    ctx.core.logout(&caller.token)?;
    tracing::info!(staff_id = %caller.staff.staff_id, "Staff logged out");
    Ok(StatusCode::NO_CONTENT)
}
