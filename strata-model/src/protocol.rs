//! Versioned protocol parameters, keyed by ledger block number.
//!
//! Protocol upgrades activate at a block height: the table is a sorted list
//! of `(starting_block, parameters)` entries and a lookup returns the entry
//! with the greatest starting block at or below the queried block. The
//! rooter sizes batches from it (querying `latest_block + 1`) and the hash
//! functions take their multihash code from it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Parameters in force for a span of ledger blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolParameters {
    /// Cap on operations packaged into one batch file.
    pub max_operations_per_batch: usize,
    /// Multihash algorithm code used for operation and Merkle hashing.
    pub hash_algorithm_code: u64,
}

/// Table construction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("protocol table is empty")]
    Empty,

    #[error("first protocol entry must start at block 0, found {0}")]
    MissingGenesisEntry(u64),

    #[error("protocol entries must be strictly ascending by starting block (at block {0})")]
    OutOfOrder(u64),

    #[error("max_operations_per_batch must be positive (entry at block {0})")]
    ZeroBatchCap(u64),
}

/// Sorted `(starting_block, parameters)` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolVersions {
    entries: Vec<(u64, ProtocolParameters)>,
}

impl ProtocolVersions {
    /// Build a table, validating coverage and ordering.
    pub fn new(entries: Vec<(u64, ProtocolParameters)>) -> Result<Self, ProtocolError> {
        let first = entries.first().ok_or(ProtocolError::Empty)?;
        if first.0 != 0 {
            return Err(ProtocolError::MissingGenesisEntry(first.0));
        }
        for pair in entries.windows(2) {
            if pair[1].0 <= pair[0].0 {
                return Err(ProtocolError::OutOfOrder(pair[1].0));
            }
        }
        if let Some(&(block, _)) = entries
            .iter()
            .find(|(_, p)| p.max_operations_per_batch == 0)
        {
            return Err(ProtocolError::ZeroBatchCap(block));
        }
        Ok(Self { entries })
    }

    /// Parameters in force at `block_number`: the entry with the greatest
    /// starting block `<= block_number`.
    pub fn parameters_at(&self, block_number: u64) -> &ProtocolParameters {
        let index = self
            .entries
            .partition_point(|(start, _)| *start <= block_number);
        // index >= 1 because entry 0 starts at block 0.
        &self.entries[index - 1].1
    }
}

impl Default for ProtocolVersions {
    /// Single genesis entry: 100-operation batches, SHA2-256 multihash.
    fn default() -> Self {
        Self {
            entries: vec![(
                0,
                ProtocolParameters {
                    max_operations_per_batch: 100,
                    hash_algorithm_code: crate::multihash::SHA256_CODE,
                },
            )],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(cap: usize) -> ProtocolParameters {
        ProtocolParameters {
            max_operations_per_batch: cap,
            hash_algorithm_code: crate::multihash::SHA256_CODE,
        }
    }

    #[test]
    fn test_lookup_greatest_entry_at_or_below() {
        let table =
            ProtocolVersions::new(vec![(0, params(10)), (500, params(20)), (1000, params(30))])
                .unwrap();

        assert_eq!(table.parameters_at(0).max_operations_per_batch, 10);
        assert_eq!(table.parameters_at(499).max_operations_per_batch, 10);
        assert_eq!(table.parameters_at(500).max_operations_per_batch, 20);
        assert_eq!(table.parameters_at(999).max_operations_per_batch, 20);
        assert_eq!(table.parameters_at(1000).max_operations_per_batch, 30);
        assert_eq!(table.parameters_at(u64::MAX).max_operations_per_batch, 30);
    }

    #[test]
    fn test_rejects_bad_tables() {
        assert_eq!(
            ProtocolVersions::new(vec![]).unwrap_err(),
            ProtocolError::Empty
        );
        assert_eq!(
            ProtocolVersions::new(vec![(5, params(10))]).unwrap_err(),
            ProtocolError::MissingGenesisEntry(5)
        );
        assert_eq!(
            ProtocolVersions::new(vec![(0, params(10)), (100, params(10)), (100, params(20))])
                .unwrap_err(),
            ProtocolError::OutOfOrder(100)
        );
        assert_eq!(
            ProtocolVersions::new(vec![(0, params(0))]).unwrap_err(),
            ProtocolError::ZeroBatchCap(0)
        );
    }
}
