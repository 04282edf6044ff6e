use chrono::{DateTime, Utc};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::{Config, ProducerConfig};
use crate::ledger::store::LedgerStore;
use crate::ledger::types::{AnomalyLabel, ComplianceStatus, Transaction};
use crate::pipeline::{EnrichmentResult, TransactionPipeline};

use super::blacklist::Blacklist;
use super::synthesizer::TransactionSynthesizer;

/// The single writer of the ledger: seeds the initial history, then keeps
/// appending one enriched transaction per randomized interval.
pub struct Producer {
    synthesizer: TransactionSynthesizer,
    pipeline: Arc<TransactionPipeline>,
    store: LedgerStore,
    blacklist: Blacklist,
    amount_threshold: f64,
    window_start: DateTime<Utc>,
    next_sequence: u64,
    config: ProducerConfig,
}

impl Producer {
    pub fn new(
        config: &Config,
        pipeline: Arc<TransactionPipeline>,
        store: LedgerStore,
        blacklist: Blacklist,
    ) -> Self {
        let synthesizer = TransactionSynthesizer::new(config.simulation.window_days);
        let window_start = synthesizer.window_start();
        Self {
            synthesizer,
            pipeline,
            store,
            blacklist,
            amount_threshold: config.compliance.amount_threshold,
            window_start,
            next_sequence: 1,
            config: config.producer.clone(),
        }
    }

    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Generate `count` transactions and enrich them as one batch before storing.
    pub async fn seed(&mut self, count: u64) -> eyre::Result<EnrichmentResult> {
        let first = self.next_sequence;
        let batch: Vec<Transaction> = (first..first + count)
            .map(|seq| self.synthesizer.synthesize(seq, self.window_start))
            .collect();

        let (enriched, result) = self
            .pipeline
            .enrich(batch, self.amount_threshold, &self.blacklist);
        self.store.extend(enriched).await?;
        self.next_sequence = first + count;

        tracing::info!(
            count = result.processed,
            non_compliant = result.non_compliant,
            anomalous = result.anomalies_detected,
            "Initial ledger seeded"
        );
        Ok(result)
    }

    /// Run one cycle without the delay: synthesize, enrich (scored alone), append.
    pub async fn produce_one(&mut self) -> eyre::Result<Transaction> {
        let raw = self
            .synthesizer
            .synthesize(self.next_sequence, self.window_start);
        let (mut enriched, _) = self
            .pipeline
            .enrich(vec![raw], self.amount_threshold, &self.blacklist);
        let transaction = enriched
            .pop()
            .ok_or_else(|| eyre::eyre!("Enrichment returned no transaction"))?;

        self.store.append(transaction.clone()).await?;
        self.next_sequence += 1;

        if transaction.compliance_status == ComplianceStatus::NonCompliant
            || transaction.anomaly_score == AnomalyLabel::Anomalous
        {
            tracing::warn!(
                id = %transaction.id,
                amount = transaction.amount,
                compliance = transaction.compliance_status.as_str(),
                rule = transaction.compliance_reason.map_or("none", |r| r.as_str()),
                "{}",
                transaction.notification
            );
        } else {
            tracing::debug!(
                id = %transaction.id,
                amount = transaction.amount,
                "Transaction appended"
            );
        }

        Ok(transaction)
    }

    /// Loop until `shutdown` is cancelled. The delay is never spent holding the ledger lock.
    pub async fn run(mut self, shutdown: CancellationToken) -> eyre::Result<()> {
        tracing::info!(
            next_sequence = self.next_sequence,
            min_delay_ms = self.config.min_delay_ms,
            max_delay_ms = self.config.max_delay_ms,
            "Producer started"
        );

        loop {
            let delay_ms =
                rand::thread_rng().gen_range(self.config.min_delay_ms..=self.config.max_delay_ms);

            tokio::select! {
                _ = tokio::time::sleep(Duration::from_millis(delay_ms)) => {}
                _ = shutdown.cancelled() => {
                    tracing::info!("Shutdown received, stopping producer");
                    break;
                }
            }

            self.produce_one().await?;
        }

        Ok(())
    }
}
