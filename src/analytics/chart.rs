use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::AnalyticsResult;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("chart labels ({labels}) and counts ({counts}) differ in length")]
    FormatMismatch { labels: usize, counts: usize },

    #[error("chart serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Renderer-agnostic chart input: the raw arrays plus their JSON text.
///
/// The serialized forms decode back to exactly `labels` and `counts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartDataset {
    pub labels: Vec<String>,
    pub counts: Vec<u64>,
    pub serialized_labels: String,
    pub serialized_counts: String,
}

impl ChartDataset {
    pub fn decode_labels(&self) -> Result<Vec<String>, serde_json::Error> {
        serde_json::from_str(&self.serialized_labels)
    }

    pub fn decode_counts(&self) -> Result<Vec<u64>, serde_json::Error> {
        serde_json::from_str(&self.serialized_counts)
    }
}

/// Pair up labels and counts for a chart. Unequal lengths are a bug in
/// whoever built the arrays and are reported, never truncated.
pub fn format_data_for_chart(labels: &[String], counts: &[u64]) -> Result<ChartDataset, ChartError> {
    if labels.len() != counts.len() {
        return Err(ChartError::FormatMismatch {
            labels: labels.len(),
            counts: counts.len(),
        });
    }

    Ok(ChartDataset {
        serialized_labels: serde_json::to_string(labels)?,
        serialized_counts: serde_json::to_string(counts)?,
        labels: labels.to_vec(),
        counts: counts.to_vec(),
    })
}

impl AnalyticsResult {
    pub fn to_chart_dataset(&self) -> Result<ChartDataset, ChartError> {
        format_data_for_chart(&self.labels, &self.counts)
    }
}
