//! Appointment analytics endpoints.
//!
//! - `GET /api/analytics/appointments?view=weekly|monthly`: series, chart
//!   dataset and chart config as JSON
//! - `GET /api/analytics/appointments/table?view=...`: the same series as
//!   an HTML table
//!
//! The count query runs on the blocking pool under a deadline. Missing
//! the deadline, or any failure to reach the database, yields the
//! fallback series rather than an error response.

use std::time::Duration;

use axum::extract::{Query, State};
use axum::response::Html;
use axum::{Extension, Json};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::analytics::{
    chart_config, fallback_result, get_view_counts, render_table_html, AnalyticsError,
    AnalyticsResult, AnalyticsView, ChartConfig, ChartDataset, SqliteCountSource,
    UnavailableSource,
};
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, StaffContext};
use crate::core_state::CoreState;

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    #[serde(default = "default_view")]
    pub view: AnalyticsView,
}

fn default_view() -> AnalyticsView {
    AnalyticsView::Weekly
}

#[derive(Serialize)]
pub struct AnalyticsResponse {
    pub view: AnalyticsView,
    pub result: AnalyticsResult,
    pub chart: ChartDataset,
    pub config: ChartConfig,
}

pub async fn appointments(
    State(ctx): State<ApiContext>,
    Extension(_caller): Extension<StaffContext>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<AnalyticsResponse>, ApiError> {
    let result = compute(&ctx, query.view).await?;
    let chart = result.to_chart_dataset()?;
    let config = chart_config(&result, &chart);
    Ok(Json(AnalyticsResponse {
        view: query.view,
        result,
        chart,
        config,
    }))
}

pub async fn table(
    State(ctx): State<ApiContext>,
    Extension(_caller): Extension<StaffContext>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Html<String>, ApiError> {
    let result = compute(&ctx, query.view).await?;
    Ok(Html(render_table_html(&result)))
}

async fn compute(ctx: &ApiContext, view: AnalyticsView) -> Result<AnalyticsResult, ApiError> {
    let today = Local::now().date_naive();
    let core = ctx.core.clone();
    // busy_timeout bounds the query itself; this bounds everything around it
    let deadline = core.analytics_timeout() * 2;
    Ok(within_deadline(today, deadline, move || view_counts(&core, today, view)).await?)
}

/// Run `work` on the blocking pool. A missed deadline or a failed task
/// yields the fallback series for `today`.
async fn within_deadline<F>(
    today: NaiveDate,
    deadline: Duration,
    work: F,
) -> Result<AnalyticsResult, AnalyticsError>
where
    F: FnOnce() -> Result<AnalyticsResult, AnalyticsError> + Send + 'static,
{
    let task = tokio::task::spawn_blocking(work);
    match tokio::time::timeout(deadline, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => {
            tracing::warn!(error = %join_err, "Analytics task failed, serving fallback series");
            Ok(fallback_result(today))
        }
        Err(_) => {
            tracing::warn!(?deadline, "Analytics deadline exceeded, serving fallback series");
            Ok(fallback_result(today))
        }
    }
}

fn view_counts(
    core: &CoreState,
    today: NaiveDate,
    view: AnalyticsView,
) -> Result<AnalyticsResult, AnalyticsError> {
    match core.open_analytics_db() {
        Ok(conn) => get_view_counts(&SqliteCountSource::new(&conn), today, view),
        Err(err) => {
            let source = UnavailableSource {
                reason: err.to_string(),
            };
            get_view_counts(&source, today, view)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_defaults_to_weekly() {
        let query: AnalyticsQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.view, AnalyticsView::Weekly);
    }

    #[test]
    fn unreachable_database_yields_fallback() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the database file should be cannot be opened
        let blocked = dir.path().join("clinic.db");
        std::fs::create_dir(&blocked).unwrap();
        let core = CoreState::new(
            blocked,
            crate::crypto::keys::test_key("k"),
            Duration::from_secs(60),
            Duration::from_millis(100),
        );

        let today = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let result = view_counts(&core, today, AnalyticsView::Monthly).unwrap();
        assert!(result.is_fallback);
        assert_eq!(result.counts, vec![0; 7]);
        assert_eq!(result.labels[0], "Mon");
    }

    fn no_counts() -> std::collections::BTreeMap<NaiveDate, u64> {
        std::collections::BTreeMap::new()
    }

    fn june_2() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    #[tokio::test]
    async fn missed_deadline_serves_fallback() {
        let today = june_2();
        let started = std::time::Instant::now();
        let result = within_deadline(today, Duration::from_millis(20), move || {
            std::thread::sleep(Duration::from_millis(500));
            get_view_counts(&no_counts(), today, AnalyticsView::Monthly)
        })
        .await
        .unwrap();

        assert!(started.elapsed() < Duration::from_millis(400));
        assert_eq!(result, fallback_result(today));
    }

    #[tokio::test]
    async fn panicked_task_serves_fallback() {
        let today = june_2();
        let result = within_deadline(today, Duration::from_secs(5), || -> Result<_, _> {
            panic!("count query crashed")
        })
        .await
        .unwrap();
        assert!(result.is_fallback);
        assert_eq!(result.window.len(), 7);
    }

    #[tokio::test]
    async fn finished_work_passes_through() {
        let today = june_2();
        let result = within_deadline(today, Duration::from_secs(5), move || {
            get_view_counts(&no_counts(), today, AnalyticsView::Monthly)
        })
        .await
        .unwrap();
        assert!(!result.is_fallback);
        assert_eq!(result.counts.len(), 30);
    }

    #[tokio::test]
    async fn locked_database_serves_fallback_quickly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clinic.db");
        let holder = crate::db::open_database(&path).unwrap();
        holder.execute_batch("BEGIN EXCLUSIVE").unwrap();

        let core = std::sync::Arc::new(CoreState::new(
            path,
            crate::crypto::keys::test_key("k"),
            Duration::from_secs(60),
            Duration::from_millis(30),
        ));
        let ctx = ApiContext::new(core);

        let started = std::time::Instant::now();
        let result = compute(&ctx, AnalyticsView::Weekly).await.unwrap();
        assert!(started.elapsed() < Duration::from_secs(2), "took {:?}", started.elapsed());
        assert!(result.is_fallback);
        assert_eq!(result.counts, vec![0; 7]);

        holder.execute_batch("COMMIT").unwrap();
    }

    #[test]
    fn reachable_database_counts_live() {
        let dir = tempfile::tempdir().unwrap();
        let core = crate::core_state::test_state(dir.path());
        let today = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let result = view_counts(&core, today, AnalyticsView::Monthly).unwrap();
        assert!(!result.is_fallback);
        assert_eq!(result.counts.len(), 30);
        assert_eq!(result.labels[0], "Jun 2");
    }
}
