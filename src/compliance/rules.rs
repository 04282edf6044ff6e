pub use crate::ledger::types::ComplianceRule;
use crate::ledger::types::{ComplianceStatus, Transaction, TransactionType};
use crate::simulation::blacklist::Blacklist;

/// Verdict for one row: the status plus the rule behind a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComplianceVerdict {
    pub status: ComplianceStatus,
    pub rule: Option<ComplianceRule>,
}

impl ComplianceVerdict {
    fn from_rule(rule: Option<ComplianceRule>) -> Self {
        let status = match rule {
            Some(_) => ComplianceStatus::NonCompliant,
            None => ComplianceStatus::Compliant,
        };
        Self { status, rule }
    }
}

/// Transaction types that are never compliant.
pub const RESTRICTED_TYPES: [TransactionType; 2] =
    [TransactionType::Refund, TransactionType::Withdrawal];

/// Run the rule chain in order and return the first rule that fires.
pub fn evaluate(
    transaction: &Transaction,
    amount_threshold: f64,
    blacklist: &Blacklist,
) -> Option<ComplianceRule> {
    // Rule 1: Amount above threshold
    if transaction.amount > amount_threshold {
        return Some(ComplianceRule::AmountAboveThreshold);
    }

    // Rule 2: Either counterparty blacklisted
    if blacklist.contains(&transaction.sender_id) || blacklist.contains(&transaction.receiver_id) {
        return Some(ComplianceRule::BlacklistedCounterparty);
    }

    // Rule 3: Restricted transaction type
    if RESTRICTED_TYPES.contains(&transaction.tx_type) {
        return Some(ComplianceRule::RestrictedType);
    }

    None
}

pub fn classify(
    transaction: &Transaction,
    amount_threshold: f64,
    blacklist: &Blacklist,
) -> ComplianceStatus {
    ComplianceVerdict::from_rule(evaluate(transaction, amount_threshold, blacklist)).status
}

/// Classify each row independently, preserving input order.
pub fn classify_batch(
    transactions: &[Transaction],
    amount_threshold: f64,
    blacklist: &Blacklist,
) -> Vec<ComplianceVerdict> {
    transactions
        .iter()
        .map(|t| ComplianceVerdict::from_rule(evaluate(t, amount_threshold, blacklist)))
        .collect()
}
