//! Anchor file: the small CAS artifact whose hash is written to the ledger.
//!
//! Commits a batch by pairing the batch file's CAS address with the Merkle
//! root over its operations. Canonical form is the Borsh encoding with the
//! field order fixed by the struct definition (no optional fields, no
//! encoding variance), so re-anchoring identical content always produces
//! the same CAS address.

use crate::error::CodecError;
use borsh::{BorshDeserialize, BorshSerialize};
use strata_model::OperationHash;

/// Version number for serialized anchor files.
pub const ANCHOR_FORMAT_VERSION: u16 = 1;

/// Commitment to one batch of operations.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct AnchorFile {
    format_version: u16,
    /// CAS address of the committed batch file.
    pub batch_file_hash: OperationHash,
    /// Merkle root over the batch's operation buffers.
    pub merkle_root: OperationHash,
}

impl AnchorFile {
    pub fn new(batch_file_hash: OperationHash, merkle_root: OperationHash) -> Self {
        Self {
            format_version: ANCHOR_FORMAT_VERSION,
            batch_file_hash,
            merkle_root,
        }
    }

    /// Serialize to the canonical wire form.
    pub fn to_buffer(&self) -> Vec<u8> {
        borsh::to_vec(self).expect("borsh serialization cannot fail")
    }

    /// Decode an anchor file fetched from CAS.
    pub fn from_buffer(bytes: &[u8]) -> Result<Self, CodecError> {
        let anchor: Self = borsh::from_slice(bytes)
            .map_err(|e| CodecError::MalformedAnchorFile(e.to_string()))?;
        if anchor.format_version != ANCHOR_FORMAT_VERSION {
            return Err(CodecError::MalformedAnchorFile(format!(
                "unsupported format version {}",
                anchor.format_version
            )));
        }
        Ok(anchor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AnchorFile {
        AnchorFile::new(
            OperationHash::from_encoded("QmBatch"),
            OperationHash::from_encoded("QmRoot"),
        )
    }

    #[test]
    fn test_roundtrip() {
        let anchor = sample();
        let decoded = AnchorFile::from_buffer(&anchor.to_buffer()).unwrap();
        assert_eq!(decoded, anchor);
    }

    #[test]
    fn test_canonical_bytes() {
        assert_eq!(sample().to_buffer(), sample().to_buffer());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            AnchorFile::from_buffer(b"\x00"),
            Err(CodecError::MalformedAnchorFile(_))
        ));
    }
}
