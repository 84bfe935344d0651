//! Turns engine output into what the dashboard draws: a bar-chart
//! configuration and a plain HTML table. Colours and layout live in the
//! front end; this only fixes the chart kind, series name and notice.

use serde::Serialize;

use super::chart::ChartDataset;
use super::types::AnalyticsResult;
use crate::sanitize::escape_html;

pub const SERIES_LABEL: &str = "Appointments";
pub const FALLBACK_NOTICE: &str = "Live appointment data is unavailable";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartConfig {
    #[serde(rename = "type")]
    pub chart_type: &'static str,
    pub title: String,
    pub data: ChartData,
    pub options: ChartOptions,
    /// Shown next to the chart when the data is the fallback series.
    pub notice: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<ChartSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub label: &'static str,
    pub data: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartOptions {
    pub begin_at_zero: bool,
    /// Counts are whole appointments.
    pub tick_precision: u8,
}

pub fn chart_config(result: &AnalyticsResult, dataset: &ChartDataset) -> ChartConfig {
    let (start, end) = result.window.bounds();
    ChartConfig {
        chart_type: "bar",
        title: format!(
            "{SERIES_LABEL} {} to {}",
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        ),
        data: ChartData {
            labels: dataset.labels.clone(),
            datasets: vec![ChartSeries {
                label: SERIES_LABEL,
                data: dataset.counts.clone(),
            }],
        },
        options: ChartOptions {
            begin_at_zero: true,
            tick_precision: 0,
        },
        notice: result.is_fallback.then_some(FALLBACK_NOTICE),
    }
}

/// A two-column table (label, count) with a totals row.
pub fn render_table_html(result: &AnalyticsResult) -> String {
    let mut html = String::from("<table class=\"appointment-counts\">\n");
    if result.is_fallback {
        html.push_str(&format!("<caption>{}</caption>\n", escape_html(FALLBACK_NOTICE)));
    }
    html.push_str("<thead><tr><th>Day</th><th>Appointments</th></tr></thead>\n<tbody>\n");
    for ((date, label), count) in result.window.iter().zip(&result.labels).zip(&result.counts) {
        html.push_str(&format!(
            "<tr><td><time datetime=\"{}\">{}</time></td><td>{}</td></tr>\n",
            date.format("%Y-%m-%d"),
            escape_html(label),
            count
        ));
    }
    html.push_str(&format!(
        "</tbody>\n<tfoot><tr><th>Total</th><td>{}</td></tr></tfoot>\n</table>",
        result.total()
    ));
    html
}
