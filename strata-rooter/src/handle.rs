//! RooterHandle - clonable async handle to the BatchWriter actor.

use crate::actor::{AnchoredBatch, BatchWriter, RooterCmd, RooterError};
use std::sync::Arc;
use std::time::Duration;
use strata_model::{Cas, Ledger, ProtocolVersions};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_util::sync::CancellationToken;

/// Handle to a running rooting pipeline.
///
/// All methods round-trip commands through the actor's channel, so queue
/// mutations and ticks are serialized with each other.
pub struct RooterHandle {
    tx: mpsc::Sender<RooterCmd>,
    anchored_tx: broadcast::Sender<AnchoredBatch>,
    cancel: CancellationToken,
}

impl Clone for RooterHandle {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            anchored_tx: self.anchored_tx.clone(),
            cancel: self.cancel.clone(),
        }
    }
}

impl RooterHandle {
    /// Spawn the pipeline actor with periodic rooting every `batch_interval`.
    pub fn spawn(
        cas: Arc<dyn Cas>,
        ledger: Arc<dyn Ledger>,
        protocol: ProtocolVersions,
        batch_interval: Duration,
    ) -> Self {
        let (tx, rx) = mpsc::channel(64);
        let (anchored_tx, _) = broadcast::channel(16);
        let cancel = CancellationToken::new();

        let writer = BatchWriter::new(cas, ledger, protocol, rx, anchored_tx.clone());
        tokio::spawn(writer.run(batch_interval, cancel.clone()));

        Self {
            tx,
            anchored_tx,
            cancel,
        }
    }

    /// Append an operation buffer to the queue tail.
    pub async fn submit(&self, operation: Vec<u8>) -> Result<(), RooterError> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.tx
            .send(RooterCmd::Submit {
                operation,
                resp: resp_tx,
            })
            .await
            .map_err(|_| RooterError::ChannelClosed)?;
        resp_rx.await.map_err(|_| RooterError::ChannelClosed)
    }

    /// Number of operations waiting to be anchored.
    pub async fn queue_len(&self) -> Result<usize, RooterError> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.tx
            .send(RooterCmd::QueueLen { resp: resp_tx })
            .await
            .map_err(|_| RooterError::ChannelClosed)?;
        resp_rx.await.map_err(|_| RooterError::ChannelClosed)
    }

    /// Run a pipeline tick now and return what it anchored, if anything.
    pub async fn tick_now(&self) -> Result<Option<AnchoredBatch>, RooterError> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.tx
            .send(RooterCmd::Tick { resp: resp_tx })
            .await
            .map_err(|_| RooterError::ChannelClosed)?;
        resp_rx.await.map_err(|_| RooterError::ChannelClosed)?
    }

    /// Subscribe to successful anchoring events.
    pub fn subscribe_anchored(&self) -> broadcast::Receiver<AnchoredBatch> {
        self.anchored_tx.subscribe()
    }

    /// Request actor shutdown (non-blocking).
    ///
    /// 1. Tries to send a polite `Shutdown` command (preserves order).
    /// 2. If the channel is full, cancels the token (immediate stop).
    pub fn shutdown(&self) {
        use tokio::sync::mpsc::error::TrySendError;

        match self.tx.try_send(RooterCmd::Shutdown) {
            Ok(_) => {}
            Err(TrySendError::Full(_)) => {
                self.cancel.cancel();
            }
            Err(TrySendError::Closed(_)) => {}
        }
    }

    /// Shut down and wait for the actor to exit.
    pub async fn close(&self) {
        self.shutdown();
        self.tx.closed().await;
    }
}
