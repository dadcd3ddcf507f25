//! Merkle commitment over an ordered batch of operation buffers.
//!
//! Convention (fixed, Bitcoin-style): leaves are the multihash of each
//! payload in batch order; a parent is the multihash of the concatenation of
//! its children's multihash bytes; a level with an odd node count duplicates
//! its last node. The root is returned in the system's Base58 form.

use crate::error::CodecError;
use strata_model::multihash::{encode_base58, multihash};
use strata_model::OperationHash;

/// Compute the Merkle root over a non-empty ordered sequence of operation
/// payloads.
///
/// The rooter guards the non-empty precondition; an empty input is rejected
/// here as well.
pub fn merkle_root(
    payloads: &[Vec<u8>],
    hash_algorithm_code: u64,
) -> Result<OperationHash, CodecError> {
    if payloads.is_empty() {
        return Err(CodecError::EmptyBatch);
    }

    let mut level: Vec<Vec<u8>> = payloads
        .iter()
        .map(|payload| multihash(hash_algorithm_code, payload))
        .collect::<Result<_, _>>()?;

    while level.len() > 1 {
        if level.len() % 2 == 1 {
            level.push(level[level.len() - 1].clone());
        }
        level = level
            .chunks(2)
            .map(|pair| {
                let mut joined = Vec::with_capacity(pair[0].len() + pair[1].len());
                joined.extend_from_slice(&pair[0]);
                joined.extend_from_slice(&pair[1]);
                multihash(hash_algorithm_code, &joined)
            })
            .collect::<Result<_, _>>()?;
    }

    Ok(encode_base58(&level[0]))
}
