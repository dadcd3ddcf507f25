//! Content-addressable store interface.
//!
//! The CAS is an external collaborator: `write(bytes) → hash` with
//! deterministic content addressing (idempotent on identical input) and
//! `read(hash) → bytes`. Uses `Pin<Box>` returns for dyn-safety so backends
//! can live behind `Arc<dyn Cas>`.

use crate::types::OperationHash;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// CAS failure modes.
#[derive(Debug, Clone, Error)]
pub enum CasError {
    #[error("content not found in CAS: {0}")]
    NotFound(OperationHash),

    #[error("CAS unavailable: {0}")]
    Unavailable(String),
}

/// An opaque content-addressable store.
pub trait Cas: Send + Sync {
    /// Store `content` and return its content address.
    fn write(
        &self,
        content: Vec<u8>,
    ) -> Pin<Box<dyn Future<Output = Result<OperationHash, CasError>> + Send + '_>>;

    /// Fetch the content previously stored at `address`.
    fn read(
        &self,
        address: OperationHash,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>, CasError>> + Send + '_>>;
}
