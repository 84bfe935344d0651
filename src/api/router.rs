//! HTTP API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`.
//!
//! Middleware stack (outermost → innermost):
//! 1. Rate limiter → 2. Auth validator → 3. Audit logger

use std::sync::Arc;

use axum::http::{header, HeaderValue};
use axum::routing::{get, post};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the clinic API router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn api_router(core: Arc<CoreState>) -> Router {
    build_router(ApiContext::new(core))
}

fn build_router(ctx: ApiContext) -> Router {
    // Layers are applied from bottom (innermost) to top (outermost):
    //   Extension (outermost) → Rate limit → Auth → Audit (innermost) → Handler
    //
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let protected = Router::new()
        .route("/auth/logout", post(endpoints::auth::logout))
        .route(
            "/patients",
            get(endpoints::patients::list).post(endpoints::patients::create),
        )
        .route(
            "/patients/:id",
            get(endpoints::patients::detail).delete(endpoints::patients::remove),
        )
        .route(
            "/appointments",
            get(endpoints::appointments::list).post(endpoints::appointments::create),
        )
        .route(
            "/analytics/appointments",
            get(endpoints::analytics::appointments),
        )
        .route(
            "/analytics/appointments/table",
            get(endpoints::analytics::table),
        )
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        .layer(axum::middleware::from_fn(middleware::rate::limit))
        .layer(axum::Extension(ctx.clone()));

    // Rate-limited only, no auth required
    let public = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/auth/login", post(endpoints::auth::login))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::rate::limit))
        .layer(axum::Extension(ctx));

    Router::new()
        .nest("/api", protected.merge(public))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use chrono::{Days, Local};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::core_state::test_state;

    const ADMIN_PASSWORD: &str = "front-desk-pass";

    /// CoreState on a temp database with one staff account.
    /// The tempdir guard must outlive the test.
    fn test_core() -> (Arc<CoreState>, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let core = test_state(tmp.path());
        core.bootstrap_admin("admin", ADMIN_PASSWORD).unwrap();
        (Arc::new(core), tmp)
    }

    fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            builder = builder.header("Authorization", format!("Bearer {t}"));
        }
        match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn login(app: &Router) -> String {
        let req = request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "username": "admin", "password": ADMIN_PASSWORD })),
        );
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await["token"].as_str().unwrap().to_string()
    }

    fn patient_form(name: &str) -> Value {
        json!({
            "name": name,
            "age": 42,
            "gender": "female",
            "contact": "+1 555 010 0199",
            "diagnosis": "Type 2 diabetes"
        })
    }

    async fn create_patient(app: &Router, token: &str, name: &str) -> String {
        let req = request("POST", "/api/patients", Some(token), Some(patient_form(name)));
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await["id"].as_str().unwrap().to_string()
    }

    // ── public routes ───────────────────────────────────────

    #[tokio::test]
    async fn health_is_public() {
        let (core, _tmp) = test_core();
        let app = api_router(core);
        let response = app.oneshot(request("GET", "/api/health", None, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("X-Content-Type-Options").unwrap(), "nosniff");
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn login_with_wrong_password_returns_401() {
        let (core, _tmp) = test_core();
        let app = api_router(core);
        let req = request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "username": "admin", "password": "nope" })),
        );
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn repeated_bad_logins_are_rate_limited() {
        let (core, _tmp) = test_core();
        let app = api_router(core);
        let mut last = StatusCode::OK;
        for _ in 0..6 {
            let req = request(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({ "username": "admin", "password": "guess" })),
            );
            last = app.clone().oneshot(req).await.unwrap().status();
        }
        assert_eq!(last, StatusCode::TOO_MANY_REQUESTS);
    }

    // ── auth gate ───────────────────────────────────────────

    #[tokio::test]
    async fn protected_routes_require_token() {
        let (core, _tmp) = test_core();
        let app = api_router(core);
        for uri in ["/api/patients", "/api/appointments", "/api/analytics/appointments"] {
            let response = app.clone().oneshot(request("GET", uri, None, None)).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        }
    }

    #[tokio::test]
    async fn invalid_token_returns_401() {
        let (core, _tmp) = test_core();
        let app = api_router(core);
        let req = request("GET", "/api/patients", Some("invalid-token"), None);
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn rotating_unknown_tokens_share_one_bucket() {
        let (core, _tmp) = test_core();
        let mut ctx = ApiContext::new(core);
        ctx.rate_limiter = Arc::new(std::sync::Mutex::new(
            crate::api::types::RateLimiter::with_limits(3, 1000),
        ));
        let app = build_router(ctx.clone());

        let mut statuses = Vec::new();
        for i in 0..4 {
            let token = format!("made-up-token-{i:04}-xxxxxxxxxxxxxxxx");
            let req = request("GET", "/api/health", Some(&token), None);
            statuses.push(app.clone().oneshot(req).await.unwrap().status());
        }
        assert!(statuses[..3].iter().all(|s| *s == StatusCode::OK), "{statuses:?}");
        assert_eq!(statuses[3], StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(ctx.rate_limiter.lock().unwrap().tracked_keys(), 1);
    }

    #[tokio::test]
    async fn live_session_gets_its_own_bucket() {
        let (core, _tmp) = test_core();
        let mut ctx = ApiContext::new(core);
        ctx.rate_limiter = Arc::new(std::sync::Mutex::new(
            crate::api::types::RateLimiter::with_limits(3, 1000),
        ));
        let app = build_router(ctx);

        // Uses the anonymous bucket once
        let token = login(&app).await;
        for _ in 0..3 {
            let req = request("GET", "/api/patients", Some(&token), None);
            assert_eq!(app.clone().oneshot(req).await.unwrap().status(), StatusCode::OK);
        }
        let req = request("GET", "/api/health", None, None);
        assert_eq!(app.oneshot(req).await.unwrap().status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn logout_revokes_token() {
        let (core, _tmp) = test_core();
        let app = api_router(core);
        let token = login(&app).await;

        let response = app
            .clone()
            .oneshot(request("POST", "/api/auth/logout", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(request("GET", "/api/patients", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn protected_responses_are_not_cached() {
        let (core, _tmp) = test_core();
        let app = api_router(core);
        let token = login(&app).await;
        let response = app
            .oneshot(request("GET", "/api/patients", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("Cache-Control").unwrap(), "no-store");
    }

    // ── patients ────────────────────────────────────────────

    #[tokio::test]
    async fn dashboard_masks_detail_decrypts() {
        let (core, _tmp) = test_core();
        let app = api_router(core);
        let token = login(&app).await;
        let id = create_patient(&app, &token, "Ada").await;

        let response = app
            .clone()
            .oneshot(request("GET", "/api/patients", Some(&token), None))
            .await
            .unwrap();
        let json = body_json(response).await;
        let row = &json["patients"][0];
        assert_eq!(row["name"], "Ada");
        assert_eq!(row["diagnosis"], "********");
        assert_eq!(row["appointment_count"], 0);

        let response = app
            .oneshot(request("GET", &format!("/api/patients/{id}"), Some(&token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["diagnosis"], "Type 2 diabetes");
    }

    #[tokio::test]
    async fn invalid_patient_form_returns_422_with_field() {
        let (core, _tmp) = test_core();
        let app = api_router(core);
        let token = login(&app).await;

        let mut form = patient_form("Bob");
        form["age"] = json!(200);
        let response = app
            .oneshot(request("POST", "/api/patients", Some(&token), Some(form)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(response).await;
        assert_eq!(json["error"]["field"], "age");
    }

    #[tokio::test]
    async fn patient_name_is_html_escaped() {
        let (core, _tmp) = test_core();
        let app = api_router(core);
        let token = login(&app).await;
        let id = create_patient(&app, &token, "<script>x</script>").await;

        let response = app
            .oneshot(request("GET", &format!("/api/patients/{id}"), Some(&token), None))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["name"], "&lt;script&gt;x&lt;/script&gt;");
    }

    #[tokio::test]
    async fn delete_patient_then_404() {
        let (core, _tmp) = test_core();
        let app = api_router(core);
        let token = login(&app).await;
        let id = create_patient(&app, &token, "Cy").await;
        let uri = format!("/api/patients/{id}");

        let response = app
            .clone()
            .oneshot(request("DELETE", &uri, Some(&token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        for method in ["GET", "DELETE"] {
            let response = app
                .clone()
                .oneshot(request(method, &uri, Some(&token), None))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{method}");
        }
    }

    #[tokio::test]
    async fn malformed_patient_id_returns_400() {
        let (core, _tmp) = test_core();
        let app = api_router(core);
        let token = login(&app).await;
        let response = app
            .oneshot(request("GET", "/api/patients/not-a-uuid", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    // ── appointments ────────────────────────────────────────

    #[tokio::test]
    async fn booking_for_unknown_patient_returns_404() {
        let (core, _tmp) = test_core();
        let app = api_router(core);
        let token = login(&app).await;
        let body = json!({
            "patient_id": uuid::Uuid::new_v4().to_string(),
            "date": "2025-05-01"
        });
        let response = app
            .oneshot(request("POST", "/api/appointments", Some(&token), Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn booking_with_bad_date_returns_422() {
        let (core, _tmp) = test_core();
        let app = api_router(core);
        let token = login(&app).await;
        let id = create_patient(&app, &token, "Dee").await;
        let body = json!({ "patient_id": id, "date": "01/05/2025" });
        let response = app
            .oneshot(request("POST", "/api/appointments", Some(&token), Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(response).await;
        assert_eq!(json["error"]["field"], "date");
    }

    // ── analytics ───────────────────────────────────────────

    #[tokio::test]
    async fn weekly_analytics_counts_booked_appointments() {
        let (core, _tmp) = test_core();
        let app = api_router(core);
        let token = login(&app).await;
        let id = create_patient(&app, &token, "Eve").await;

        let today = Local::now().date_naive();
        let in_two_days = today.checked_add_days(Days::new(2)).unwrap();
        for date in [today, today, in_two_days] {
            let body = json!({ "patient_id": id, "date": date.format("%Y-%m-%d").to_string() });
            let response = app
                .clone()
                .oneshot(request("POST", "/api/appointments", Some(&token), Some(body)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let response = app
            .oneshot(request(
                "GET",
                "/api/analytics/appointments?view=weekly",
                Some(&token),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;

        assert_eq!(json["result"]["counts"], json!([2, 0, 1, 0, 0, 0, 0]));
        assert_eq!(json["result"]["is_fallback"], false);
        assert_eq!(json["result"]["window"][0], today.format("%Y-%m-%d").to_string());
        assert_eq!(json["chart"]["serialized_counts"], "[2,0,1,0,0,0,0]");
        assert_eq!(json["config"]["type"], "bar");
        assert_eq!(json["config"]["data"]["datasets"][0]["label"], "Appointments");
        assert!(json["config"]["notice"].is_null());
    }

    #[tokio::test]
    async fn monthly_analytics_has_thirty_month_day_labels() {
        let (core, _tmp) = test_core();
        let app = api_router(core);
        let token = login(&app).await;

        let response = app
            .oneshot(request(
                "GET",
                "/api/analytics/appointments?view=monthly",
                Some(&token),
                None,
            ))
            .await
            .unwrap();
        let json = body_json(response).await;
        let labels = json["result"]["labels"].as_array().unwrap();
        assert_eq!(labels.len(), 30);
        let today = Local::now().date_naive();
        assert_eq!(labels[0], today.format("%b %-d").to_string());
    }

    #[tokio::test]
    async fn unknown_view_is_rejected() {
        let (core, _tmp) = test_core();
        let app = api_router(core);
        let token = login(&app).await;
        let response = app
            .oneshot(request(
                "GET",
                "/api/analytics/appointments?view=yearly",
                Some(&token),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn analytics_table_is_html() {
        let (core, _tmp) = test_core();
        let app = api_router(core);
        let token = login(&app).await;
        let response = app
            .oneshot(request(
                "GET",
                "/api/analytics/appointments/table",
                Some(&token),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers().get("Content-Type").unwrap().to_str().unwrap();
        assert!(content_type.starts_with("text/html"));
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert_eq!(html.matches("<tr><td>").count(), 7);
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let (core, _tmp) = test_core();
        let app = api_router(core);
        let response = app
            .oneshot(request("GET", "/nonexistent", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
