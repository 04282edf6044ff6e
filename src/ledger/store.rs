use std::sync::Arc;
use tokio::sync::Mutex;

use super::types::{Transaction, TransactionId};

/// The shared, append-only transaction ledger.
///
/// Cloning is cheap and every clone refers to the same ledger. A single lock
/// guards both appends and snapshots, so a snapshot always sees a whole
/// prefix of the appended records.
#[derive(Clone, Default)]
pub struct LedgerStore {
    inner: Arc<Mutex<Vec<Transaction>>>,
}

impl LedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one enriched transaction. Its id must exceed the last stored id.
    pub async fn append(&self, transaction: Transaction) -> eyre::Result<()> {
        let mut ledger = self.inner.lock().await;
        check_appendable(ledger.last().map(|t| t.id), &transaction)?;
        ledger.push(transaction);
        Ok(())
    }

    /// Append a batch in order. Either the whole batch is stored or none of it.
    pub async fn extend(&self, transactions: Vec<Transaction>) -> eyre::Result<usize> {
        let mut ledger = self.inner.lock().await;
        let mut last = ledger.last().map(|t| t.id);
        for transaction in &transactions {
            check_appendable(last, transaction)?;
            last = Some(transaction.id);
        }
        let count = transactions.len();
        ledger.extend(transactions);
        Ok(count)
    }

    /// Copy of the full ledger in append order.
    pub async fn snapshot(&self) -> Vec<Transaction> {
        self.inner.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }

    pub async fn last_id(&self) -> Option<TransactionId> {
        self.inner.lock().await.last().map(|t| t.id)
    }
}

fn check_appendable(last: Option<TransactionId>, transaction: &Transaction) -> eyre::Result<()> {
    if !transaction.is_enriched() {
        return Err(eyre::eyre!(
            "Transaction {} has not been classified and scored",
            transaction.id
        ));
    }
    if let Some(last) = last {
        if transaction.id <= last {
            return Err(eyre::eyre!(
                "Transaction {} does not follow last stored id {}",
                transaction.id,
                last
            ));
        }
    }
    Ok(())
}
