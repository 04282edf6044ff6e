use crate::anomaly::{AnomalyScorer, IsolationForest};
use crate::compliance::{classify_batch, notify};
use crate::config::AnomalyConfig;
use crate::ledger::types::{AnomalyLabel, ComplianceStatus, Transaction};
use crate::simulation::blacklist::Blacklist;

/// Counts from running the enrichment pipeline on a batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EnrichmentResult {
    pub processed: u64,
    pub non_compliant: u64,
    pub anomalies_detected: u64,
}

/// Orchestrates the per-batch enrichment steps:
/// 1. Compliance classification
/// 2. Anomaly scoring (fit on this batch only)
/// 3. Notification
///
/// Stateless across calls, so the producer and the query path share one instance.
pub struct TransactionPipeline {
    scorer: AnomalyScorer<IsolationForest>,
}

impl TransactionPipeline {
    pub fn new(config: &AnomalyConfig) -> Self {
        Self {
            scorer: AnomalyScorer::new(IsolationForest::from_config(config)),
        }
    }

    /// Classify, score and annotate `transactions`, overwriting any earlier verdicts.
    pub fn enrich(
        &self,
        mut transactions: Vec<Transaction>,
        amount_threshold: f64,
        blacklist: &Blacklist,
    ) -> (Vec<Transaction>, EnrichmentResult) {
        if transactions.is_empty() {
            return (transactions, EnrichmentResult::default());
        }

        // Step 1: Compliance
        let verdicts = classify_batch(&transactions, amount_threshold, blacklist);
        for (transaction, verdict) in transactions.iter_mut().zip(verdicts) {
            transaction.compliance_status = verdict.status;
            transaction.compliance_reason = verdict.rule;
        }

        // Step 2: Anomaly scoring
        let labels = self.scorer.score(&transactions);

        // Step 3: Notification
        let mut result = EnrichmentResult::default();
        for (transaction, label) in transactions.iter_mut().zip(labels) {
            transaction.anomaly_score = label;
            transaction.notification =
                notify(transaction.compliance_status, label, transaction.id);

            result.processed += 1;
            if transaction.compliance_status == ComplianceStatus::NonCompliant {
                result.non_compliant += 1;
            }
            if label == AnomalyLabel::Anomalous {
                result.anomalies_detected += 1;
            }
        }

        (transactions, result)
    }
}
