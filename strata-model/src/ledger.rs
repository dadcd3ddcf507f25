//! Anchoring ledger interface.
//!
//! The ledger is the source of truth for operation ordering. The rooter only
//! needs `write` (anchor a payload) and `last_block`; the observer reads back
//! anchor transactions in order via `transactions_since`.

use crate::types::OperationHash;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Ledger failure modes.
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// The most recent block on the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    pub block_number: u64,
}

/// An observed anchor transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerTransaction {
    pub block_number: u64,
    pub transaction_number: u64,
    /// CAS address of the anchor file committed by this transaction.
    pub anchor_file_hash: OperationHash,
}

/// An external ledger that anchors payloads and exposes its transactions.
pub trait Ledger: Send + Sync {
    /// Anchor `payload` (an anchor-file hash) in a ledger transaction.
    fn write(
        &self,
        payload: Vec<u8>,
    ) -> Pin<Box<dyn Future<Output = Result<(), LedgerError>> + Send + '_>>;

    /// The most recently produced block.
    fn last_block(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<BlockInfo, LedgerError>> + Send + '_>>;

    /// All anchor transactions with `transaction_number` greater than
    /// `after`, in ledger order. `None` returns everything.
    fn transactions_since(
        &self,
        after: Option<u64>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<LedgerTransaction>, LedgerError>> + Send + '_>>;
}
