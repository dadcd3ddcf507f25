//! In-memory content-addressable store.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use strata_model::multihash::operation_hash;
use strata_model::{Cas, CasError, OperationHash, SHA256_CODE};

/// A `Cas` backed by a process-local map.
///
/// Addresses are the system's Base58 multihash of the content, so writes are
/// idempotent and addressing matches what a real content store would assign.
pub struct MemoryCas {
    blobs: RwLock<HashMap<OperationHash, Vec<u8>>>,
    hash_algorithm_code: u64,
    unavailable: AtomicBool,
}

impl MemoryCas {
    pub fn new() -> Self {
        Self::with_algorithm(SHA256_CODE)
    }

    pub fn with_algorithm(hash_algorithm_code: u64) -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            hash_algorithm_code,
            unavailable: AtomicBool::new(false),
        }
    }

    /// Toggle failure injection: while set, every call returns
    /// `CasError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.read().expect("cas lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> Result<(), CasError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CasError::Unavailable("injected failure".to_string()));
        }
        Ok(())
    }
}

impl Default for MemoryCas {
    fn default() -> Self {
        Self::new()
    }
}

impl Cas for MemoryCas {
    fn write(
        &self,
        content: Vec<u8>,
    ) -> Pin<Box<dyn Future<Output = Result<OperationHash, CasError>> + Send + '_>> {
        Box::pin(async move {
            self.check_available()?;
            let address = operation_hash(self.hash_algorithm_code, &content)
                .map_err(|e| CasError::Unavailable(e.to_string()))?;
            self.blobs
                .write()
                .expect("cas lock poisoned")
                .insert(address.clone(), content);
            Ok(address)
        })
    }

    fn read(
        &self,
        address: OperationHash,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>, CasError>> + Send + '_>> {
        Box::pin(async move {
            self.check_available()?;
            self.blobs
                .read()
                .expect("cas lock poisoned")
                .get(&address)
                .cloned()
                .ok_or(CasError::NotFound(address))
        })
    }
}
