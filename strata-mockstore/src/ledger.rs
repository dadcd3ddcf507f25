//! In-memory anchoring ledger.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use strata_model::{BlockInfo, Ledger, LedgerError, LedgerTransaction, OperationHash};

/// A payload anchored on the mock ledger, with its assigned position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchoredPayload {
    pub transaction: LedgerTransaction,
    pub payload: Vec<u8>,
}

#[derive(Default)]
struct LedgerState {
    /// Height of the most recently produced block. The genesis block is 0.
    block_number: u64,
    /// Globally monotonic transaction counter.
    transaction_number: u64,
    anchored: Vec<AnchoredPayload>,
}

/// A `Ledger` that assigns each anchored payload its own block.
///
/// Anchor payloads are the UTF-8 bytes of an anchor-file CAS address, which
/// is how the observed `LedgerTransaction` recovers the hash.
pub struct MemoryLedger {
    state: RwLock<LedgerState>,
    unavailable: AtomicBool,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(LedgerState::default()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Toggle failure injection: while set, every call returns
    /// `LedgerError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Everything anchored so far, in ledger order.
    pub fn anchored(&self) -> Vec<AnchoredPayload> {
        self.state
            .read()
            .expect("ledger lock poisoned")
            .anchored
            .clone()
    }

    fn check_available(&self) -> Result<(), LedgerError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable("injected failure".to_string()));
        }
        Ok(())
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger for MemoryLedger {
    fn write(
        &self,
        payload: Vec<u8>,
    ) -> Pin<Box<dyn Future<Output = Result<(), LedgerError>> + Send + '_>> {
        Box::pin(async move {
            self.check_available()?;
            let anchor_file_hash = OperationHash::from_encoded(
                String::from_utf8(payload.clone())
                    .map_err(|e| LedgerError::Unavailable(format!("non-utf8 payload: {e}")))?,
            );

            let mut state = self.state.write().expect("ledger lock poisoned");
            state.block_number += 1;
            state.transaction_number += 1;
            let transaction = LedgerTransaction {
                block_number: state.block_number,
                transaction_number: state.transaction_number,
                anchor_file_hash,
            };
            state.anchored.push(AnchoredPayload {
                transaction,
                payload,
            });
            Ok(())
        })
    }

    fn last_block(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<BlockInfo, LedgerError>> + Send + '_>> {
        Box::pin(async move {
            self.check_available()?;
            let state = self.state.read().expect("ledger lock poisoned");
            Ok(BlockInfo {
                block_number: state.block_number,
            })
        })
    }

    fn transactions_since(
        &self,
        after: Option<u64>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<LedgerTransaction>, LedgerError>> + Send + '_>>
    {
        Box::pin(async move {
            self.check_available()?;
            let state = self.state.read().expect("ledger lock poisoned");
            Ok(state
                .anchored
                .iter()
                .map(|a| a.transaction.clone())
                .filter(|t| after.map_or(true, |n| t.transaction_number > n))
                .collect())
        })
    }
}
