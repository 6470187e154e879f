use crate::schema::{CanonicalColumn, CaseStatus, CaseTable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Substring that marks a closed case, compared case-insensitively.
pub const COMPLETED_MARKER: &str = "CONCLUÍDO";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardMetrics {
    pub total_count: usize,
    pub completed_count: usize,
    pub total_paid: f64,
    pub total_outstanding: f64,
    pub status_distribution: BTreeMap<String, usize>,
    pub count_by_artigo: BTreeMap<String, usize>,
    /// Modelled columns absent from the sheet. Metrics depending on them are
    /// zero/empty and should be shown as "no data".
    pub missing_columns: Vec<CanonicalColumn>,
}

impl DashboardMetrics {
    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }

    pub fn has_column(&self, column: CanonicalColumn) -> bool {
        !self.missing_columns.contains(&column)
    }
}

/// One bar or pie wedge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSlice {
    pub label: String,
    pub count: usize,
    /// count / total of the series, 0.0 when the series is empty.
    pub share: f64,
}

pub fn is_completed(status: &str) -> bool {
    status.to_uppercase().contains(COMPLETED_MARKER)
}

fn group_counts<'a>(values: impl Iterator<Item = Option<&'a str>>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for value in values.flatten() {
        if value.trim().is_empty() {
            continue;
        }
        *counts.entry(value.to_string()).or_insert(0) += 1;
    }
    counts
}

pub fn project_metrics(table: &CaseTable) -> DashboardMetrics {
    DashboardMetrics {
        total_count: table.len(),
        completed_count: table
            .iter()
            .filter(|record| is_completed(record.status_text()))
            .count(),
        total_paid: table.iter().map(|record| record.paid()).sum(),
        total_outstanding: table.iter().map(|record| record.balance()).sum(),
        status_distribution: group_counts(table.iter().map(|record| record.status.as_deref())),
        count_by_artigo: group_counts(table.iter().map(|record| record.artigo.as_deref())),
        missing_columns: table.missing_columns(),
    }
}

fn to_slices(groups: Vec<(String, usize)>) -> Vec<ChartSlice> {
    let total: usize = groups.iter().map(|(_, count)| count).sum();
    groups
        .into_iter()
        .map(|(label, count)| ChartSlice {
            share: if total == 0 {
                0.0
            } else {
                count as f64 / total as f64
            },
            label,
            count,
        })
        .collect()
}

/// Pie series: workflow statuses first in workflow order, then any other
/// stored values alphabetically.
pub fn status_chart(metrics: &DashboardMetrics) -> Vec<ChartSlice> {
    let mut ordered: Vec<(String, usize)> = metrics
        .status_distribution
        .iter()
        .map(|(label, count)| (label.clone(), *count))
        .collect();

    ordered.sort_by_key(|(label, _)| {
        let rank = CaseStatus::from_label(label)
            .map(|status| status.index())
            .unwrap_or(CaseStatus::ALL.len());
        (rank, label.clone())
    });

    to_slices(ordered)
}

/// Bar series, alphabetical by artigo.
pub fn artigo_chart(metrics: &DashboardMetrics) -> Vec<ChartSlice> {
    to_slices(
        metrics
            .count_by_artigo
            .iter()
            .map(|(label, count)| (label.clone(), *count))
            .collect(),
    )
}
