//! Centralized content hashing for Strata.
//!
//! **All** operation and CAS address hashing goes through this module so the
//! multihash algorithm table has a single audit surface. A multihash is the
//! self-describing form `code ‖ digest-length ‖ digest`; operation hashes are
//! its Base58 encoding.
//!
//! The algorithm code is never assumed: callers obtain it from the protocol
//! parameter table for the relevant block (see `protocol::ProtocolVersions`).

use crate::types::OperationHash;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Multihash code for SHA2-256.
pub const SHA256_CODE: u64 = 0x12;

/// Hashing failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MultihashError {
    #[error("unsupported multihash algorithm code {0}")]
    UnsupportedAlgorithm(u64),
}

/// Compute the raw multihash bytes of `data` using the given algorithm code.
pub fn multihash(algorithm_code: u64, data: &[u8]) -> Result<Vec<u8>, MultihashError> {
    let digest: Vec<u8> = match algorithm_code {
        SHA256_CODE => Sha256::digest(data).to_vec(),
        other => return Err(MultihashError::UnsupportedAlgorithm(other)),
    };

    let mut out = Vec::with_capacity(2 + digest.len());
    out.push(algorithm_code as u8);
    out.push(digest.len() as u8);
    out.extend_from_slice(&digest);
    Ok(out)
}

/// Compute the Base58 multihash of `data`: the canonical operation hash.
pub fn operation_hash(
    algorithm_code: u64,
    data: &[u8],
) -> Result<OperationHash, MultihashError> {
    let bytes = multihash(algorithm_code, data)?;
    Ok(encode_base58(&bytes))
}

/// Encode already-computed multihash bytes in the Base58 form used for all
/// addressing across the system.
pub fn encode_base58(multihash_bytes: &[u8]) -> OperationHash {
    OperationHash::from_encoded(bs58::encode(multihash_bytes).into_string())
}
