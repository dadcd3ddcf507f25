//! Strong types for operation identifiers and ledger timestamps.

use std::fmt;

/// Base58-encoded multihash of an operation.
///
/// This is the sole identifier used throughout the projection: it names both
/// an operation and the DID-document version that operation produced. For
/// `Create` operations the hash covers the encoded payload; for all other
/// types it covers the full operation buffer (see `operation::WriteOperation`).
#[derive(
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    serde::Serialize,
    serde::Deserialize,
    borsh::BorshSerialize,
    borsh::BorshDeserialize,
)]
#[repr(transparent)]
pub struct OperationHash(String);

impl OperationHash {
    /// Wrap an already-encoded Base58 multihash string.
    pub fn from_encoded(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Returns the Base58 string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the Base58 string form.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for OperationHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<OperationHash> for String {
    fn from(hash: OperationHash) -> String {
        hash.0
    }
}

impl fmt::Display for OperationHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for OperationHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OperationHash({})", self.0)
    }
}

/// Identifies a specific DID-document revision.
///
/// A version is named by the hash of the operation that produced it.
pub type VersionId = OperationHash;

/// Position of an operation in the anchored ledger history.
///
/// The linear order used by the projection is lexicographic on
/// `(transaction_number, operation_index)`. `block_number` is carried for
/// protocol-parameter lookup and rollback but does not participate in
/// ordering, so all comparison traits are implemented by hand.
#[derive(Debug, Clone, Copy)]
pub struct OperationTimestamp {
    /// Ledger block the operation's anchor transaction landed in.
    pub block_number: u64,
    /// Global position of the anchor transaction.
    pub transaction_number: u64,
    /// Position of the operation inside its batch file.
    pub operation_index: u32,
}

impl OperationTimestamp {
    pub fn new(block_number: u64, transaction_number: u64, operation_index: u32) -> Self {
        Self {
            block_number,
            transaction_number,
            operation_index,
        }
    }
}

impl PartialEq for OperationTimestamp {
    fn eq(&self, other: &Self) -> bool {
        self.transaction_number == other.transaction_number
            && self.operation_index == other.operation_index
    }
}

impl Eq for OperationTimestamp {}

impl Ord for OperationTimestamp {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.transaction_number
            .cmp(&other.transaction_number)
            .then_with(|| self.operation_index.cmp(&other.operation_index))
    }
}

impl PartialOrd for OperationTimestamp {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for OperationTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}",
            self.block_number, self.transaction_number, self.operation_index
        )
    }
}
