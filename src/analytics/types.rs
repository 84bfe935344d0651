use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Window length of the degraded result served when counts are unavailable.
pub const FALLBACK_WINDOW_DAYS: u32 = 7;

/// How a date is rendered on the chart axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelMode {
    /// Weekday abbreviation: "Mon".
    Weekly,
    /// Month abbreviation and unpadded day: "Dec 18".
    Monthly,
}

/// The two analytics views the dashboard offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsView {
    Weekly,
    Monthly,
}

impl AnalyticsView {
    pub fn window_days(self) -> u32 {
        match self {
            Self::Weekly => 7,
            Self::Monthly => 30,
        }
    }

    pub fn label_mode(self) -> LabelMode {
        match self {
            Self::Weekly => LabelMode::Weekly,
            Self::Monthly => LabelMode::Monthly,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalyticsError {
    #[error("window size must be a positive number of days, got {0}")]
    InvalidWindowSize(u32),

    #[error("a {days}-day window starting {start} runs past the last representable date")]
    WindowOutOfRange { start: NaiveDate, days: u32 },
}

/// Consecutive calendar dates, first element "today".
///
/// Construction guarantees a non-empty window where each date is exactly
/// one day after the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DateWindow {
    dates: Vec<NaiveDate>,
}

impl DateWindow {
    pub fn starting(today: NaiveDate, days: u32) -> Result<Self, AnalyticsError> {
        if days == 0 {
            return Err(AnalyticsError::InvalidWindowSize(days));
        }
        let dates = (0..days)
            .map(|offset| today.checked_add_days(Days::new(u64::from(offset))))
            .collect::<Option<Vec<_>>>()
            .ok_or(AnalyticsError::WindowOutOfRange { start: today, days })?;
        Ok(Self { dates })
    }

    /// Like [`starting`](Self::starting) but infallible: near the end of the
    /// calendar the window is shifted back so all `days` dates exist.
    pub(super) fn fitting(today: NaiveDate, days: u32) -> Self {
        let latest_start = NaiveDate::MAX
            .checked_sub_days(Days::new(u64::from(days.max(1) - 1)))
            .unwrap_or(NaiveDate::MIN);
        let start = today.min(latest_start);
        // Every offset fits: start is at most MAX - (days - 1)
        let dates = (0..days.max(1))
            .filter_map(|offset| start.checked_add_days(Days::new(u64::from(offset))))
            .collect();
        Self { dates }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// First and last date, inclusive.
    pub fn bounds(&self) -> (NaiveDate, NaiveDate) {
        // Non-empty by construction
        (self.dates[0], self.dates[self.dates.len() - 1])
    }

    pub fn iter(&self) -> impl Iterator<Item = &NaiveDate> {
        self.dates.iter()
    }
}

/// One computed analytics series. Built fresh per request, never cached.
///
/// `window`, `labels` and `counts` always have the same length. When
/// `is_fallback` is set the counts are all zero and the window is the
/// fixed seven-day weekly shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyticsResult {
    pub window: DateWindow,
    pub labels: Vec<String>,
    pub counts: Vec<u64>,
    pub is_fallback: bool,
}

impl AnalyticsResult {
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}
