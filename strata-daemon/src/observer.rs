//! Ledger observer: feeds anchored operations into the projection.
//!
//! Polls the ledger for anchor transactions past a cursor, fetches the
//! anchor and batch files from CAS, and applies the contained operations to
//! the projection in `(transaction_number, operation_index)` order.
//!
//! Failure policy: transient CAS/ledger errors stop the poll without
//! advancing the cursor, so the next poll retries the same transaction.
//! Malformed anchored content is logged and skipped: it can never become
//! valid, and stalling on it would wedge the observer.

use std::sync::Arc;
use std::time::Duration;
use strata_codec::{AnchorFile, BatchFile, CodecError};
use strata_model::{
    Cas, CasError, Ledger, LedgerError, LedgerTransaction, OperationEnvelope, OperationError,
    ResolvedTransaction, WriteOperation,
};
use strata_resolver::{DidState, ProjectionError};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Errors from one observer poll.
#[derive(Debug, Error)]
pub enum ObserverError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Cas(#[from] CasError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    Projection(#[from] ProjectionError),
}

impl ObserverError {
    /// Whether retrying the same transaction later can succeed.
    fn is_transient(&self) -> bool {
        matches!(self, ObserverError::Ledger(_) | ObserverError::Cas(_))
    }
}

/// Polls the ledger and applies anchored operations to the projection.
pub struct LedgerObserver {
    ledger: Arc<dyn Ledger>,
    cas: Arc<dyn Cas>,
    state: Arc<DidState>,
    poll_interval: Duration,
    /// Highest transaction number fully processed (applied or skipped).
    cursor: Option<u64>,
}

impl LedgerObserver {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        cas: Arc<dyn Cas>,
        state: Arc<DidState>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            ledger,
            cas,
            state,
            poll_interval,
            cursor: None,
        }
    }

    /// Spawn the polling loop.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    async fn run(mut self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.poll_once().await {
                        tracing::warn!(error = %e, "observer poll failed; will retry");
                    }
                }
            }
        }
    }

    /// Process every anchor transaction past the cursor. Returns the number
    /// of operations applied.
    pub async fn poll_once(&mut self) -> Result<usize, ObserverError> {
        let transactions = self.ledger.transactions_since(self.cursor).await?;
        let mut applied = 0;

        for transaction in transactions {
            match self.process_transaction(&transaction).await {
                Ok(count) => {
                    applied += count;
                    self.cursor = Some(transaction.transaction_number);
                }
                Err(e) if e.is_transient() => {
                    tracing::warn!(
                        transaction = transaction.transaction_number,
                        error = %e,
                        "transient failure; transaction will be retried"
                    );
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(
                        transaction = transaction.transaction_number,
                        anchor = %transaction.anchor_file_hash,
                        error = %e,
                        "skipping malformed anchored content"
                    );
                    self.cursor = Some(transaction.transaction_number);
                }
            }
        }

        Ok(applied)
    }

    async fn process_transaction(
        &self,
        transaction: &LedgerTransaction,
    ) -> Result<usize, ObserverError> {
        let anchor_bytes = self
            .cas
            .read(transaction.anchor_file_hash.clone())
            .await?;
        let anchor = AnchorFile::from_buffer(&anchor_bytes)?;

        let batch_bytes = self.cas.read(anchor.batch_file_hash.clone()).await?;
        let batch = BatchFile::from_buffer(&batch_bytes)?;

        let mut applied = 0;
        for index in 0..batch.len() {
            let buffer = batch.operation_buffer(index)?;
            let envelope = OperationEnvelope::from_buffer(buffer)?;
            let operation = WriteOperation::resolved(
                envelope,
                ResolvedTransaction {
                    block_number: transaction.block_number,
                    transaction_number: transaction.transaction_number,
                    operation_index: index as u32,
                    batch_file_hash: anchor.batch_file_hash.clone(),
                    anchor_file_hash: Some(transaction.anchor_file_hash.clone()),
                },
            );
            if self.state.apply(&operation)?.is_some() {
                applied += 1;
            }
        }

        tracing::debug!(
            transaction = transaction.transaction_number,
            operations = applied,
            "applied anchored batch"
        );
        Ok(applied)
    }
}
