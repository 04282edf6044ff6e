use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::ops::RangeInclusive;

use crate::ledger::types::{
    AnomalyLabel, BlockchainStatus, ComplianceStatus, Location, Transaction, TransactionId,
    TransactionStatus, TransactionType,
};

use super::blacklist::account_id;

pub const AMOUNT_RANGE: RangeInclusive<f64> = 0.01..=20.0;
pub const FEE_RANGE: RangeInclusive<f64> = 0.0001..=0.01;

const SENDER_SPACE: RangeInclusive<u32> = 1000..=9999;
const RECEIVER_SPACE: RangeInclusive<u32> = 0..=9999;

/// Produces raw, unclassified transactions spread over a trailing window.
#[derive(Debug, Clone)]
pub struct TransactionSynthesizer {
    window_days: u32,
}

impl TransactionSynthesizer {
    pub fn new(window_days: u32) -> Self {
        Self { window_days }
    }

    /// Start of the window for a run beginning now.
    pub fn window_start(&self) -> DateTime<Utc> {
        Utc::now() - Duration::days(self.window_days as i64)
    }

    pub fn synthesize(&self, sequence: u64, window_start: DateTime<Utc>) -> Transaction {
        self.synthesize_with(&mut rand::thread_rng(), sequence, window_start)
    }

    pub fn synthesize_with<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        sequence: u64,
        window_start: DateTime<Utc>,
    ) -> Transaction {
        let offset = Duration::days(rng.gen_range(0..=self.window_days as i64))
            + Duration::hours(rng.gen_range(0..=23))
            + Duration::minutes(rng.gen_range(0..=59))
            + Duration::seconds(rng.gen_range(0..=59));

        Transaction {
            id: TransactionId(sequence),
            timestamp: window_start + offset,
            sender_id: account_id(rng.gen_range(SENDER_SPACE)),
            receiver_id: account_id(rng.gen_range(RECEIVER_SPACE)),
            amount: round_to(rng.gen_range(AMOUNT_RANGE), 4),
            fee: round_to(rng.gen_range(FEE_RANGE), 5),
            tx_type: pick(rng, &TransactionType::ALL),
            status: pick(rng, &TransactionStatus::ALL),
            compliance_status: ComplianceStatus::Pending,
            location: pick(rng, &Location::ALL),
            anomaly_score: AnomalyLabel::Unscored,
            blockchain_status: BlockchainStatus::Registered,
            notification: String::new(),
            compliance_reason: None,
        }
    }
}

fn pick<R: Rng + ?Sized, T: Copy, const N: usize>(rng: &mut R, values: &[T; N]) -> T {
    values[rng.gen_range(0..N)]
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_fields_within_bounds() {
        let synthesizer = TransactionSynthesizer::new(30);
        let start = Utc::now() - Duration::days(30);
        let latest = start + Duration::days(30) + Duration::seconds(23 * 3600 + 59 * 60 + 59);
        let mut rng = StdRng::seed_from_u64(1);

        for seq in 1..=1000 {
            let tx = synthesizer.synthesize_with(&mut rng, seq, start);
            assert_eq!(tx.id, TransactionId(seq));
            assert!(tx.timestamp >= start && tx.timestamp <= latest);
            assert!(AMOUNT_RANGE.contains(&tx.amount));
            assert!(FEE_RANGE.contains(&tx.fee));
            assert!(tx.sender_id.starts_with("Account"));
            assert!(tx.receiver_id.starts_with("Account"));
            assert_eq!(tx.compliance_status, ComplianceStatus::Pending);
            assert_eq!(tx.anomaly_score, AnomalyLabel::Unscored);
            assert!(!tx.is_enriched());
        }
    }

    #[test]
    fn test_amounts_are_rounded() {
        let synthesizer = TransactionSynthesizer::new(1);
        let mut rng = StdRng::seed_from_u64(99);
        let tx = synthesizer.synthesize_with(&mut rng, 1, Utc::now());
        assert_eq!(tx.amount, round_to(tx.amount, 4));
        assert_eq!(tx.fee, round_to(tx.fee, 5));
    }

    #[test]
    fn test_window_start_trails_now() {
        let synthesizer = TransactionSynthesizer::new(30);
        let start = synthesizer.window_start();
        let age = Utc::now() - start;
        assert!(age >= Duration::days(30) && age < Duration::days(30) + Duration::minutes(1));
    }
}
