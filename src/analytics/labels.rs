use chrono::NaiveDate;

use super::types::LabelMode;

/// Axis label for `date`. Pure: the same (date, mode) always gives the same text.
pub fn day_label(date: NaiveDate, mode: LabelMode) -> String {
    match mode {
        LabelMode::Weekly => date.format("%a").to_string(),
        LabelMode::Monthly => date.format("%b %-d").to_string(),
    }
}

pub fn day_labels<'a>(dates: impl IntoIterator<Item = &'a NaiveDate>, mode: LabelMode) -> Vec<String> {
    dates.into_iter().map(|d| day_label(*d, mode)).collect()
}
