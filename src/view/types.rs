use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashSet;

use crate::ledger::types::{ComplianceStatus, Location, Transaction, TransactionType};

/// Filter parameters supplied by a polling dashboard client.
///
/// An open date bound is taken from the earliest / latest row of the
/// snapshot being filtered, never from a separate read of the ledger.
#[derive(Debug, Clone)]
pub struct ViewQuery {
    /// First day included. None means the first day in the ledger.
    pub start_date: Option<NaiveDate>,
    /// Last day included. None means the last day in the ledger.
    pub end_date: Option<NaiveDate>,
    pub amount_threshold: f64,
    pub types: HashSet<TransactionType>,
    pub locations: HashSet<Location>,
}

impl ViewQuery {
    /// A query over the given days with every type and location allowed.
    pub fn all(start_date: NaiveDate, end_date: NaiveDate, amount_threshold: f64) -> Self {
        Self {
            start_date: Some(start_date),
            end_date: Some(end_date),
            ..Self::unbounded(amount_threshold)
        }
    }

    /// Every row in the ledger, whatever its date, type or location.
    pub fn unbounded(amount_threshold: f64) -> Self {
        Self {
            start_date: None,
            end_date: None,
            amount_threshold,
            types: TransactionType::ALL.into_iter().collect(),
            locations: Location::ALL.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub transaction_count: usize,
    pub total_amount: f64,
    pub compliant_count: usize,
    pub non_compliant_count: usize,
    pub anomalous_count: usize,
    /// Estimated return from automating compliance over this view.
    pub expected_profit: f64,
}

impl Summary {
    /// Plain-text rendering for the dashboard summary panel.
    pub fn render(&self) -> String {
        format!(
            "Total moved: {:.2} SOL\n\
             Compliant transactions: {}\n\
             Non-compliant transactions: {}\n\
             Suspicious transactions: {}\n\
             Potential profit from automation: {:.2} SOL",
            self.total_amount,
            self.compliant_count,
            self.non_compliant_count,
            self.anomalous_count,
            self.expected_profit
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub amount: f64,
    pub compliance_status: ComplianceStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusShare {
    pub compliance_status: ComplianceStatus,
    pub count: usize,
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusCount {
    pub compliance_status: ComplianceStatus,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationAmount {
    pub location: Location,
    pub total_amount: f64,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapCell {
    pub location: Location,
    pub transaction_type: TransactionType,
    pub mean_amount: f64,
}

/// Everything a dashboard poll needs, computed from one ledger snapshot.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ViewResult {
    pub summary: Summary,
    /// Amount over time, ordered by timestamp.
    pub time_series: Vec<SeriesPoint>,
    pub compliance_distribution: Vec<StatusShare>,
    pub compliance_histogram: Vec<StatusCount>,
    pub location_amounts: Vec<LocationAmount>,
    /// Mean amount per (location, type) pair present in the view.
    pub heatmap: Vec<HeatmapCell>,
    /// Most recent rows, oldest first.
    pub recent: Vec<Transaction>,
}

/// Choices the dashboard offers for its filter widgets.
#[derive(Debug, Clone, Serialize)]
pub struct FilterOptions {
    pub transaction_types: Vec<TransactionType>,
    pub locations: Vec<Location>,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
    pub default_threshold: f64,
}
