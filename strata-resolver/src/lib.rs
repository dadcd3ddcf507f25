//! Strata Resolver
//!
//! The in-memory DID state projection. Consumes ledger-resolved operations
//! in `(transaction_number, operation_index)` order and materializes DID
//! documents on demand by walking version chains and fetching full
//! operations lazily from CAS.
//!
//! The projection is a derived view: the ledger plus CAS is the source of
//! truth, and rollback rewinds the view when the ledger reorganizes.

mod error;
mod state;

pub use error::ProjectionError;
pub use state::DidState;
