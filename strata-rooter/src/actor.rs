//! BatchWriter - actor that owns the pending-operation queue and runs the
//! anchoring pipeline tick.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use strata_codec::{merkle_root, AnchorFile, BatchFile, CodecError};
use strata_model::{Cas, CasError, Ledger, LedgerError, OperationHash, ProtocolVersions};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_util::sync::CancellationToken;

/// Commands sent to the BatchWriter actor.
pub enum RooterCmd {
    /// Append an operation buffer to the queue tail.
    Submit {
        operation: Vec<u8>,
        resp: oneshot::Sender<()>,
    },
    /// Current queue length.
    QueueLen { resp: oneshot::Sender<usize> },
    /// Run a pipeline tick immediately (tests and admin tooling; the
    /// periodic ticker drives production).
    Tick {
        resp: oneshot::Sender<Result<Option<AnchoredBatch>, RooterError>>,
    },
    /// Shutdown the actor.
    Shutdown,
}

/// Errors from pipeline ticks and handle calls.
#[derive(Debug, Error)]
pub enum RooterError {
    #[error("rooter channel closed")]
    ChannelClosed,

    #[error(transparent)]
    Cas(#[from] CasError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Emitted after each successful tick, once the ledger write has landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchoredBatch {
    pub batch_file_hash: OperationHash,
    pub anchor_file_hash: OperationHash,
    pub merkle_root: OperationHash,
    pub operation_count: usize,
}

/// Actor owning the pending queue and the `processing` interlock.
pub(crate) struct BatchWriter {
    queue: VecDeque<Vec<u8>>,
    processing: bool,
    cas: Arc<dyn Cas>,
    ledger: Arc<dyn Ledger>,
    protocol: ProtocolVersions,
    rx: mpsc::Receiver<RooterCmd>,
    anchored_tx: broadcast::Sender<AnchoredBatch>,
}

impl BatchWriter {
    pub(crate) fn new(
        cas: Arc<dyn Cas>,
        ledger: Arc<dyn Ledger>,
        protocol: ProtocolVersions,
        rx: mpsc::Receiver<RooterCmd>,
        anchored_tx: broadcast::Sender<AnchoredBatch>,
    ) -> Self {
        Self {
            queue: VecDeque::new(),
            processing: false,
            cas,
            ledger,
            protocol,
            rx,
            anchored_tx,
        }
    }

    /// Run the actor loop: periodic rooting plus command processing, until
    /// shutdown or cancellation.
    pub(crate) async fn run(mut self, batch_interval: Duration, cancel: CancellationToken) {
        enum Event {
            Tick,
            Cmd(RooterCmd),
            Halt,
        }

        let mut ticker = tokio::time::interval(batch_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // interval fires immediately; consume that so the first batch waits a
        // full period.
        ticker.tick().await;

        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => Event::Halt,
                _ = ticker.tick() => Event::Tick,
                cmd = self.rx.recv() => match cmd {
                    Some(cmd) => Event::Cmd(cmd),
                    None => Event::Halt,
                },
            };

            match event {
                Event::Halt | Event::Cmd(RooterCmd::Shutdown) => break,
                Event::Tick => {
                    if let Err(e) = self.root_operations().await {
                        tracing::warn!(error = %e, "rooting tick failed; operations remain queued");
                    }
                }
                Event::Cmd(RooterCmd::Submit { operation, resp }) => {
                    self.queue.push_back(operation);
                    let _ = resp.send(());
                }
                Event::Cmd(RooterCmd::QueueLen { resp }) => {
                    let _ = resp.send(self.queue.len());
                }
                Event::Cmd(RooterCmd::Tick { resp }) => {
                    let result = self.root_operations().await;
                    if let Err(e) = &result {
                        tracing::warn!(error = %e, "rooting tick failed; operations remain queued");
                    }
                    let _ = resp.send(result);
                }
            }
        }
    }

    /// The pipeline tick. Overlapping invocations coalesce via `processing`,
    /// which is cleared on every exit path.
    async fn root_operations(&mut self) -> Result<Option<AnchoredBatch>, RooterError> {
        if self.processing {
            return Ok(None);
        }
        self.processing = true;
        let result = self.root_batch().await;
        self.processing = false;

        if let Ok(Some(anchored)) = &result {
            let _ = self.anchored_tx.send(anchored.clone());
        }
        result
    }

    async fn root_batch(&mut self) -> Result<Option<AnchoredBatch>, RooterError> {
        let last_block = self.ledger.last_block().await?;
        let params = self.protocol.parameters_at(last_block.block_number + 1);

        let count = self.queue.len().min(params.max_operations_per_batch);
        if count == 0 {
            return Ok(None);
        }

        // Peek the head slice without dequeuing: the slots are only consumed
        // after the ledger write succeeds, so a failed tick loses nothing and
        // the next tick retries the same operations.
        let operations: Vec<Vec<u8>> = self.queue.iter().take(count).cloned().collect();

        let batch_buffer = BatchFile::from_operations(operations.clone()).to_buffer();
        let batch_file_hash = self.cas.write(batch_buffer).await?;

        let merkle_root = merkle_root(&operations, params.hash_algorithm_code)?;

        let anchor = AnchorFile::new(batch_file_hash.clone(), merkle_root.clone());
        let anchor_file_hash = self.cas.write(anchor.to_buffer()).await?;

        self.ledger
            .write(anchor_file_hash.as_str().as_bytes().to_vec())
            .await?;

        self.queue.drain(..count);

        tracing::info!(
            operations = count,
            batch = %batch_file_hash,
            anchor = %anchor_file_hash,
            "anchored operation batch"
        );

        Ok(Some(AnchoredBatch {
            batch_file_hash,
            anchor_file_hash,
            merkle_root,
            operation_count: count,
        }))
    }
}
