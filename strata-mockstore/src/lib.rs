//! In-memory CAS and ledger backends.
//!
//! Test doubles and local-run backends that implement the `Cas` and `Ledger`
//! traits without the real storage or chain clients. Both support failure
//! injection so the pipeline's retry paths can be exercised.

mod cas;
mod ledger;

pub use cas::MemoryCas;
pub use ledger::{AnchoredPayload, MemoryLedger};
