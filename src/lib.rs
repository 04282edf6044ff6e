//! Simulated transaction ledger with rule-based compliance checks, batch-relative
//! anomaly scoring, and a read API for polling dashboards.

pub mod anomaly;
pub mod api;
pub mod compliance;
pub mod config;
pub mod ledger;
pub mod pipeline;
pub mod simulation;
pub mod view;
