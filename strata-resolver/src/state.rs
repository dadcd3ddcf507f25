//! DidState - the rollback-capable projection of DID-document state.
//!
//! Two maps carry the whole view:
//! - `op_info_by_hash`: operation hash → compact [`OperationInfo`]. Among
//!   duplicate observations of one hash, the earliest-timestamped wins.
//! - `chosen_next`: version → the chosen successor version. Among siblings
//!   claiming the same predecessor, the earliest-timestamped wins
//!   (first-writer-wins on forks).
//!
//! Only compact records are held in RAM; full operations are refetched from
//! CAS through the batch file they were anchored in. `apply` and `rollback`
//! never suspend; traversal reads clone what they need out of the lock
//! before touching CAS.

use crate::error::ProjectionError;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use strata_codec::BatchFile;
use strata_model::{
    Cas, DidDocument, OperationEnvelope, OperationHash, OperationInfo, OperationType,
    ProtocolVersions, ResolvedTransaction, VersionId, WriteOperation,
};

#[derive(Default)]
struct Inner {
    op_info_by_hash: HashMap<OperationHash, OperationInfo>,
    chosen_next: HashMap<VersionId, VersionId>,
    /// Highest transaction number ever applied; wound back by rollback.
    last_processed_transaction: Option<u64>,
}

/// The projection. Shared freely; all methods take `&self`.
pub struct DidState {
    inner: RwLock<Inner>,
    cas: Arc<dyn Cas>,
    protocol: ProtocolVersions,
    did_method_name: String,
}

impl DidState {
    pub fn new(cas: Arc<dyn Cas>, protocol: ProtocolVersions, did_method_name: String) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            cas,
            protocol,
            did_method_name,
        }
    }

    /// Apply a ledger-resolved operation.
    ///
    /// Returns the operation's hash, or `Ok(None)` for a duplicate that
    /// loses the earliest-timestamp race. `Err(InvalidOperation)` marks an
    /// unresolved operation, which is a caller bug rather than a data
    /// condition.
    pub fn apply(&self, op: &WriteOperation) -> Result<Option<OperationHash>, ProjectionError> {
        let transaction = op
            .transaction
            .as_ref()
            .ok_or(ProjectionError::InvalidOperation)?;

        let code = self
            .protocol
            .parameters_at(transaction.block_number)
            .hash_algorithm_code;
        let hash = op.envelope.operation_hash(code)?;

        let info = OperationInfo {
            batch_file_hash: transaction.batch_file_hash.clone(),
            op_type: op.envelope.op_type,
            timestamp: transaction.timestamp(),
            anchor_file_hash: transaction.anchor_file_hash.clone(),
        };

        let mut inner = self.inner.write().expect("projection lock poisoned");

        // Duplicate resolution: the earliest-timestamped observation of a
        // hash is the one that stays.
        if let Some(existing) = inner.op_info_by_hash.get(&hash) {
            if existing.timestamp < info.timestamp {
                return Ok(None);
            }
        }
        inner.op_info_by_hash.insert(hash.clone(), info.clone());

        // Fork resolution: the earliest-timestamped sibling keeps the slot.
        if let Some(prev) = &op.envelope.previous_operation_hash {
            let keep_current = match inner.chosen_next.get(prev) {
                Some(current) => inner
                    .op_info_by_hash
                    .get(current)
                    .map_or(false, |current_info| current_info.timestamp < info.timestamp),
                None => false,
            };
            if !keep_current {
                inner.chosen_next.insert(prev.clone(), hash.clone());
            }
        }

        inner.last_processed_transaction = Some(
            inner
                .last_processed_transaction
                .map_or(transaction.transaction_number, |t| {
                    t.max(transaction.transaction_number)
                }),
        );

        Ok(Some(hash))
    }

    /// Rewind the projection past a ledger reorganization: drop everything
    /// at or above `transaction_number`.
    pub fn rollback(&self, transaction_number: u64) {
        let mut inner = self.inner.write().expect("projection lock poisoned");
        let Inner {
            op_info_by_hash,
            chosen_next,
            last_processed_transaction,
        } = &mut *inner;

        // chosen_next first: its predicate reads op_info_by_hash.
        chosen_next.retain(|_, next| {
            op_info_by_hash
                .get(next)
                .map_or(false, |info| info.timestamp.transaction_number < transaction_number)
        });
        op_info_by_hash
            .retain(|_, info| info.timestamp.transaction_number < transaction_number);

        *last_processed_transaction = op_info_by_hash
            .values()
            .map(|info| info.timestamp.transaction_number)
            .max();
    }

    /// Materialize the current document for a DID.
    ///
    /// The DID's unique portion is the version id of its genesis create
    /// operation; the current document is the one at the end of the chosen
    /// chain.
    pub async fn resolve(&self, did_unique_portion: &OperationHash) -> Option<DidDocument> {
        let newest = self.last(did_unique_portion)?;
        self.lookup(&newest).await
    }

    /// Materialize the document at a specific version.
    ///
    /// Returns `None` for unknown versions and for versions whose
    /// predecessor chain cannot be fully reconstructed.
    pub async fn lookup(&self, version: &VersionId) -> Option<DidDocument> {
        match self.lookup_chain(version).await {
            Ok(document) => document,
            Err(e) => {
                tracing::debug!(version = %version, error = %e, "version unresolvable");
                None
            }
        }
    }

    /// The version preceding `version`, read from the operation itself.
    pub async fn previous(&self, version: &VersionId) -> Option<VersionId> {
        let info = self.operation_info(version)?;
        match self.fetch_operation(&info).await {
            Ok(op) => op.envelope.previous_operation_hash,
            Err(e) => {
                tracing::debug!(version = %version, error = %e, "predecessor unresolvable");
                None
            }
        }
    }

    /// The genesis version of `version`'s chain.
    pub async fn first(&self, version: &VersionId) -> Option<VersionId> {
        // Fail-slow on unknown versions.
        self.operation_info(version)?;

        let mut current = version.clone();
        while let Some(prev) = self.previous(&current).await {
            current = prev;
        }
        Some(current)
    }

    /// The chosen successor of `version`, if one has been applied.
    pub fn next(&self, version: &VersionId) -> Option<VersionId> {
        self.inner
            .read()
            .expect("projection lock poisoned")
            .chosen_next
            .get(version)
            .cloned()
    }

    /// The newest version on `version`'s chosen chain.
    pub fn last(&self, version: &VersionId) -> Option<VersionId> {
        let inner = self.inner.read().expect("projection lock poisoned");
        if !inner.op_info_by_hash.contains_key(version) {
            return None;
        }
        let mut current = version.clone();
        while let Some(next) = inner.chosen_next.get(&current) {
            current = next.clone();
        }
        Some(current)
    }

    /// Highest transaction number fully applied, if any.
    pub fn last_processed_transaction(&self) -> Option<u64> {
        self.inner
            .read()
            .expect("projection lock poisoned")
            .last_processed_transaction
    }

    /// Compact record of an applied operation.
    pub fn operation_info(&self, hash: &OperationHash) -> Option<OperationInfo> {
        self.inner
            .read()
            .expect("projection lock poisoned")
            .op_info_by_hash
            .get(hash)
            .cloned()
    }

    /// Number of operations currently in the projection.
    pub fn operation_count(&self) -> usize {
        self.inner
            .read()
            .expect("projection lock poisoned")
            .op_info_by_hash
            .len()
    }

    /// Walk the predecessor chain to its genesis, then fold the document
    /// forward. Iterative on purpose: deep chains must not exhaust the
    /// stack.
    async fn lookup_chain(
        &self,
        version: &VersionId,
    ) -> Result<Option<DidDocument>, ProjectionError> {
        let mut chain: Vec<WriteOperation> = Vec::new();
        let mut visited: HashSet<VersionId> = HashSet::new();
        let mut cursor = version.clone();

        let genesis_version = loop {
            // A malformed chain could cycle; bail out instead of spinning.
            if !visited.insert(cursor.clone()) {
                return Ok(None);
            }
            let Some(info) = self.operation_info(&cursor) else {
                return Ok(None);
            };
            let op = self.fetch_operation(&info).await?;
            let prev = op.envelope.previous_operation_hash.clone();
            chain.push(op);
            match prev {
                Some(p) => cursor = p,
                None => break cursor,
            }
        };

        let Some(genesis) = chain.pop() else {
            return Ok(None);
        };
        if genesis.envelope.op_type != OperationType::Create {
            return Ok(None);
        }

        let Some(mut document) = DidDocument::from_create_payload(
            &genesis.envelope.encoded_payload,
            &self.did_method_name,
            &genesis_version,
        ) else {
            return Ok(None);
        };

        for op in chain.into_iter().rev() {
            document = match document.apply(&op.envelope) {
                Some(next) => next,
                None => return Ok(None),
            };
        }

        Ok(Some(document))
    }

    /// Lazily reconstruct a full operation from its compact record: fetch
    /// the batch file from CAS and decode the buffer at the recorded index.
    async fn fetch_operation(
        &self,
        info: &OperationInfo,
    ) -> Result<WriteOperation, ProjectionError> {
        let batch_bytes = self.cas.read(info.batch_file_hash.clone()).await?;
        let batch = BatchFile::from_buffer(&batch_bytes)?;
        let buffer = batch.operation_buffer(info.timestamp.operation_index as usize)?;
        let envelope = OperationEnvelope::from_buffer(buffer)?;

        Ok(WriteOperation::resolved(
            envelope,
            ResolvedTransaction {
                block_number: info.timestamp.block_number,
                transaction_number: info.timestamp.transaction_number,
                operation_index: info.timestamp.operation_index,
                batch_file_hash: info.batch_file_hash.clone(),
                anchor_file_hash: info.anchor_file_hash.clone(),
            },
        ))
    }
}

impl std::fmt::Debug for DidState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DidState")
            .field("did_method_name", &self.did_method_name)
            .finish_non_exhaustive()
    }
}
