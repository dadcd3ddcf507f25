//! StrataNode - wires the pipeline, the projection, and the observer.

use crate::config::{ConfigError, NodeConfig};
use crate::observer::LedgerObserver;
use std::sync::Arc;
use std::time::Duration;
use strata_mockstore::{MemoryCas, MemoryLedger};
use strata_resolver::DidState;
use strata_rooter::RooterHandle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A running Strata node over the in-memory CAS and ledger backends.
pub struct StrataNode {
    rooter: RooterHandle,
    state: Arc<DidState>,
    cas: Arc<MemoryCas>,
    ledger: Arc<MemoryLedger>,
    observer_task: JoinHandle<()>,
    cancel: CancellationToken,
}

impl StrataNode {
    /// Validate the config and start all services.
    pub fn start(config: &NodeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let protocol = config.protocol_versions()?;

        let cas = Arc::new(MemoryCas::new());
        let ledger = Arc::new(MemoryLedger::new());

        let rooter = RooterHandle::spawn(
            cas.clone(),
            ledger.clone(),
            protocol.clone(),
            Duration::from_secs(config.batch_interval_seconds),
        );

        let state = Arc::new(DidState::new(
            cas.clone(),
            protocol,
            config.did_method_name.clone(),
        ));

        let cancel = CancellationToken::new();
        let observer = LedgerObserver::new(
            ledger.clone(),
            cas.clone(),
            state.clone(),
            Duration::from_secs(config.observer_interval_seconds),
        );
        let observer_task = observer.spawn(cancel.clone());

        Ok(Self {
            rooter,
            state,
            cas,
            ledger,
            observer_task,
            cancel,
        })
    }

    /// Handle to the batching pipeline (the submission surface).
    pub fn rooter(&self) -> &RooterHandle {
        &self.rooter
    }

    /// The DID state projection (the read surface).
    pub fn state(&self) -> &Arc<DidState> {
        &self.state
    }

    pub fn cas(&self) -> &Arc<MemoryCas> {
        &self.cas
    }

    pub fn ledger(&self) -> &Arc<MemoryLedger> {
        &self.ledger
    }

    /// Stop the observer and the pipeline, waiting for both to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        self.rooter.close().await;
        let _ = self.observer_task.await;
    }
}
