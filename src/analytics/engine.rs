use chrono::NaiveDate;

use super::labels::day_labels;
use super::source::CountSource;
use super::types::*;

/// Per-day appointment counts for a `window_days`-long window starting at `today`.
///
/// Dates the source does not report count as zero, and anything it reports
/// outside the window is ignored. If the source fails for any reason the
/// result is [`fallback_result`] instead of an error. Only a caller bug
/// (zero-length or unrepresentable window) is returned as `Err`.
pub fn get_appointment_counts(
    source: &dyn CountSource,
    today: NaiveDate,
    window_days: u32,
    mode: LabelMode,
) -> Result<AnalyticsResult, AnalyticsError> {
    let window = DateWindow::starting(today, window_days)?;
    let (start, end) = window.bounds();

    let by_date = match source.counts_between(start, end) {
        Ok(counts) => counts,
        Err(err) => {
            tracing::warn!(
                error = %err,
                window_days,
                %today,
                "Appointment count source failed, serving fallback series"
            );
            return Ok(fallback_result(today));
        }
    };

    let counts = window
        .iter()
        .map(|date| by_date.get(date).copied().unwrap_or(0))
        .collect();
    let labels = day_labels(window.iter(), mode);

    Ok(AnalyticsResult {
        window,
        labels,
        counts,
        is_fallback: false,
    })
}

/// Counts for one of the dashboard views (7-day weekly, 30-day monthly).
pub fn get_view_counts(
    source: &dyn CountSource,
    today: NaiveDate,
    view: AnalyticsView,
) -> Result<AnalyticsResult, AnalyticsError> {
    get_appointment_counts(source, today, view.window_days(), view.label_mode())
}

/// The degraded series: seven days from `today`, weekday labels, all zero.
///
/// Its shape does not depend on what window was originally requested.
pub fn fallback_result(today: NaiveDate) -> AnalyticsResult {
    let window = DateWindow::fitting(today, FALLBACK_WINDOW_DAYS);
    let labels = day_labels(window.iter(), LabelMode::Weekly);
    let counts = vec![0; window.len()];

    AnalyticsResult {
        window,
        labels,
        counts,
        is_fallback: true,
    }
}
