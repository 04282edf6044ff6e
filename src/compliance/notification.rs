use crate::ledger::types::{AnomalyLabel, ComplianceStatus, TransactionId};

pub const COMPLIANT_NOTICE: &str = "Transaction compliant";

/// Human-facing notice for a classified transaction.
pub fn notify(
    compliance_status: ComplianceStatus,
    anomaly_score: AnomalyLabel,
    transaction_id: TransactionId,
) -> String {
    if compliance_status == ComplianceStatus::NonCompliant
        || anomaly_score == AnomalyLabel::Anomalous
    {
        return format!(
            "Alert: transaction {} is non-compliant or suspicious!",
            transaction_id
        );
    }
    COMPLIANT_NOTICE.to_string()
}
