//! Operation: the atomic write unit for a DID's version chain.
//!
//! An `OperationEnvelope` is the client-submitted wire form: the opaque
//! buffer that travels through the batching pipeline and into a batch file.
//! A `WriteOperation` wraps it with the transaction context gained when the
//! operation is later observed on the ledger.
//!
//! Serialization: envelopes use **Borsh** for deterministic hashing. The
//! bytes are never re-encoded; they flow from submission through the batch
//! file and back out of CAS unchanged.

use crate::multihash::{operation_hash, MultihashError};
use crate::types::{OperationHash, OperationTimestamp};
use borsh::{BorshDeserialize, BorshSerialize};
use thiserror::Error;

/// The kind of state change an operation makes to its DID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum OperationType {
    /// Registers a new DID; the root of a version chain.
    Create,
    /// Patches the current document.
    Update,
    /// Deactivates the DID.
    Delete,
    /// Replaces the document wholesale after key compromise.
    Recover,
}

/// Errors from envelope construction and decoding.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("malformed operation buffer: {0}")]
    MalformedBuffer(borsh::io::Error),

    #[error("{0:?} operation requires a previous operation hash")]
    MissingPreviousHash(OperationType),

    #[error("create operation must not reference a previous operation")]
    UnexpectedPreviousHash,
}

/// The client-submitted wire form of an operation.
///
/// Field order matches the canonical Borsh serialization order.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct OperationEnvelope {
    /// What this operation does to its DID.
    pub op_type: OperationType,
    /// Opaque payload bytes. Interpretation is left to the document layer.
    pub encoded_payload: Vec<u8>,
    /// Hash of the version this operation extends. `None` only for `Create`,
    /// which is the root of its chain.
    pub previous_operation_hash: Option<OperationHash>,
}

impl OperationEnvelope {
    /// Build a `Create` envelope, the genesis of a version chain.
    pub fn create(encoded_payload: Vec<u8>) -> Self {
        Self {
            op_type: OperationType::Create,
            encoded_payload,
            previous_operation_hash: None,
        }
    }

    /// Build a non-create envelope extending `previous`.
    pub fn extend(
        op_type: OperationType,
        previous: OperationHash,
        encoded_payload: Vec<u8>,
    ) -> Result<Self, OperationError> {
        if op_type == OperationType::Create {
            return Err(OperationError::UnexpectedPreviousHash);
        }
        Ok(Self {
            op_type,
            encoded_payload,
            previous_operation_hash: Some(previous),
        })
    }

    /// Serialize to canonical Borsh bytes.
    pub fn to_buffer(&self) -> Vec<u8> {
        borsh::to_vec(self).expect("borsh serialization cannot fail")
    }

    /// Deserialize from Borsh bytes, validating the previous-hash rule.
    pub fn from_buffer(bytes: &[u8]) -> Result<Self, OperationError> {
        let envelope: Self =
            borsh::from_slice(bytes).map_err(OperationError::MalformedBuffer)?;
        match (envelope.op_type, &envelope.previous_operation_hash) {
            (OperationType::Create, Some(_)) => Err(OperationError::UnexpectedPreviousHash),
            (OperationType::Create, None) => Ok(envelope),
            (op_type, None) => Err(OperationError::MissingPreviousHash(op_type)),
            (_, Some(_)) => Ok(envelope),
        }
    }

    /// Compute the canonical operation hash.
    ///
    /// `Create` hashes the encoded payload (so the DID's unique portion is
    /// independent of envelope framing); every other type hashes the full
    /// operation buffer.
    pub fn operation_hash(
        &self,
        hash_algorithm_code: u64,
    ) -> Result<OperationHash, MultihashError> {
        match self.op_type {
            OperationType::Create => operation_hash(hash_algorithm_code, &self.encoded_payload),
            _ => operation_hash(hash_algorithm_code, &self.to_buffer()),
        }
    }
}

/// Ledger context attached to an operation once its anchor transaction has
/// been observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTransaction {
    pub block_number: u64,
    pub transaction_number: u64,
    pub operation_index: u32,
    /// CAS address of the batch file the operation was anchored in.
    pub batch_file_hash: OperationHash,
    /// CAS address of the anchor file that committed the batch. Carried for
    /// fork detection.
    pub anchor_file_hash: Option<OperationHash>,
}

impl ResolvedTransaction {
    pub fn timestamp(&self) -> OperationTimestamp {
        OperationTimestamp::new(
            self.block_number,
            self.transaction_number,
            self.operation_index,
        )
    }
}

/// An operation together with its (possibly absent) resolved ledger context.
///
/// Client-submitted operations have `transaction: None`; the projection only
/// accepts operations that have been resolved by the observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOperation {
    pub envelope: OperationEnvelope,
    pub transaction: Option<ResolvedTransaction>,
}

impl WriteOperation {
    /// Pair an envelope with its observed transaction context.
    pub fn resolved(envelope: OperationEnvelope, transaction: ResolvedTransaction) -> Self {
        Self {
            envelope,
            transaction: Some(transaction),
        }
    }

    pub fn operation_hash(
        &self,
        hash_algorithm_code: u64,
    ) -> Result<OperationHash, MultihashError> {
        self.envelope.operation_hash(hash_algorithm_code)
    }
}

/// The projection's compressed record of an applied operation, sufficient to
/// fetch the full operation lazily via CAS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationInfo {
    pub batch_file_hash: OperationHash,
    pub op_type: OperationType,
    pub timestamp: OperationTimestamp,
    pub anchor_file_hash: Option<OperationHash>,
}
