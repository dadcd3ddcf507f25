//! Strata Model
//!
//! Pure data types and traits for the Strata DID node, decoupled from
//! the batching pipeline, the projection, and any storage or ledger client.

pub mod cas;
pub mod document;
pub mod ledger;
pub mod multihash;
pub mod operation;
pub mod protocol;
pub mod types;

pub use cas::{Cas, CasError};
pub use document::DidDocument;
pub use ledger::{BlockInfo, Ledger, LedgerError, LedgerTransaction};
pub use multihash::{operation_hash, MultihashError, SHA256_CODE};
pub use operation::{
    OperationEnvelope, OperationError, OperationInfo, OperationType, ResolvedTransaction,
    WriteOperation,
};
pub use protocol::{ProtocolError, ProtocolParameters, ProtocolVersions};
pub use types::{OperationHash, OperationTimestamp, VersionId};
