//! Audit logging middleware.
//!
//! Logs every protected API request with the staff user, method, path
//! and response status. Runs innermost (after auth has injected
//! `StaffContext`). Request and response bodies are never logged.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::types::StaffContext;

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let staff = req
        .extensions()
        .get::<StaffContext>()
        .map(|ctx| ctx.staff.username.clone())
        .unwrap_or_else(|| "-".to_string());

    let response = next.run(req).await;

    tracing::info!(
        target: "clinicdesk_lib::audit",
        staff = %staff,
        %method,
        path = %path,
        status = response.status().as_u16(),
        "API access"
    );

    response
}
