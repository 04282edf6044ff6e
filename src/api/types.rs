use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::ledger::types::{Location, Transaction, TransactionType};
use crate::view::types::ViewQuery;

// ============================================================
// Query params
// ============================================================

/// Dashboard filters. Every field is optional; absent fields select everything.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardParams {
    /// `YYYY-MM-DD`
    pub start_date: Option<String>,
    /// `YYYY-MM-DD`, inclusive
    pub end_date: Option<String>,
    pub threshold: Option<String>,
    /// Comma-separated transaction types
    pub types: Option<String>,
    /// Comma-separated locations
    pub locations: Option<String>,
}

impl DashboardParams {
    /// Turn raw params into a query. Absent dates stay open and are bounded by
    /// the ledger at query time. Returns None for unparseable dates or threshold.
    pub fn resolve(&self, default_threshold: f64) -> Option<ViewQuery> {
        let start_date = match &self.start_date {
            Some(raw) => Some(parse_date(raw)?),
            None => None,
        };
        let end_date = match &self.end_date {
            Some(raw) => Some(parse_date(raw)?),
            None => None,
        };
        let amount_threshold = match &self.threshold {
            Some(raw) => raw.trim().parse::<f64>().ok().filter(|t| t.is_finite())?,
            None => default_threshold,
        };

        let types: HashSet<TransactionType> = match &self.types {
            Some(raw) => split_list(raw).filter_map(TransactionType::parse).collect(),
            None => TransactionType::ALL.into_iter().collect(),
        };
        let locations: HashSet<Location> = match &self.locations {
            Some(raw) => split_list(raw).filter_map(Location::parse).collect(),
            None => Location::ALL.into_iter().collect(),
        };

        Some(ViewQuery {
            start_date,
            end_date,
            amount_threshold,
            types,
            locations,
        })
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

// ============================================================
// Response types
// ============================================================

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub ledger_size: usize,
    pub last_transaction_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TransactionsResponse {
    pub transactions: Vec<Transaction>,
    pub count: usize,
}
