use crate::ledger::types::{AnomalyLabel, Transaction};

use super::forest::{IsolationForest, OutlierDetector, Sample};

/// Labels transactions as normal or anomalous relative to the batch they are scored in.
#[derive(Debug, Clone)]
pub struct AnomalyScorer<D = IsolationForest> {
    detector: D,
}

impl<D: OutlierDetector> AnomalyScorer<D> {
    pub fn new(detector: D) -> Self {
        Self { detector }
    }

    /// One label per input row, in input order. An empty batch never reaches the model.
    pub fn score(&self, transactions: &[Transaction]) -> Vec<AnomalyLabel> {
        if transactions.is_empty() {
            return Vec::new();
        }
        let samples: Vec<Sample> = transactions.iter().map(features).collect();
        self.detector.fit_predict(&samples)
    }
}

fn features(transaction: &Transaction) -> Sample {
    [transaction.amount, transaction.fee]
}
