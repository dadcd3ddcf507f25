//! Strata Daemon
//!
//! Wires the node together: configuration, the batching pipeline, the DID
//! state projection, and the ledger observer that feeds resolved operations
//! from anchor transactions into the projection.

pub mod config;
pub mod node;
pub mod observer;

pub use config::{ConfigError, NodeConfig};
pub use node::StrataNode;
pub use observer::{LedgerObserver, ObserverError};
