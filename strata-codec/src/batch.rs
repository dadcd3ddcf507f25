//! Batch file: an ordered group of raw operation buffers as one CAS artifact.
//!
//! Wire form is a versioned Borsh envelope. Borsh gives the three properties
//! the artifact needs: length-prefixed elements, a self-delimiting layout,
//! and deterministic bytes for equal inputs. Decoding is strict: trailing
//! bytes and unknown versions are rejected.

use crate::error::CodecError;
use borsh::{BorshDeserialize, BorshSerialize};

/// Version number for serialized batch files.
pub const BATCH_FORMAT_VERSION: u16 = 1;

#[derive(BorshSerialize, BorshDeserialize)]
struct BatchEnvelope {
    format_version: u16,
    operations: Vec<Vec<u8>>,
}

/// An ordered, indexable group of raw operation buffers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFile {
    operations: Vec<Vec<u8>>,
}

impl BatchFile {
    /// Package an ordered sequence of operation buffers.
    pub fn from_operations(operations: Vec<Vec<u8>>) -> Self {
        Self { operations }
    }

    /// Decode a batch file fetched from CAS.
    pub fn from_buffer(bytes: &[u8]) -> Result<Self, CodecError> {
        let envelope: BatchEnvelope = borsh::from_slice(bytes)
            .map_err(|e| CodecError::MalformedBatchFile(e.to_string()))?;
        if envelope.format_version != BATCH_FORMAT_VERSION {
            return Err(CodecError::MalformedBatchFile(format!(
                "unsupported format version {}",
                envelope.format_version
            )));
        }
        Ok(Self {
            operations: envelope.operations,
        })
    }

    /// Serialize to the canonical wire form.
    pub fn to_buffer(&self) -> Vec<u8> {
        let envelope = BatchEnvelope {
            format_version: BATCH_FORMAT_VERSION,
            operations: self.operations.clone(),
        };
        borsh::to_vec(&envelope).expect("borsh serialization cannot fail")
    }

    /// The operation buffer at `index`.
    pub fn operation_buffer(&self, index: usize) -> Result<&[u8], CodecError> {
        self.operations
            .get(index)
            .map(Vec::as_slice)
            .ok_or(CodecError::IndexOutOfRange {
                index,
                len: self.operations.len(),
            })
    }

    /// All operation buffers in batch order.
    pub fn operations(&self) -> &[Vec<u8>] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
