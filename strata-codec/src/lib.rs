//! Strata Codec
//!
//! The canonical byte artifacts exchanged between the batching pipeline and
//! the projection: batch files, anchor files, and the Merkle commitment over
//! a batch. All three are deterministic (equal inputs produce byte-equal
//! outputs) so CAS addressing is stable.

pub mod anchor;
pub mod batch;
mod error;
pub mod merkle;

pub use anchor::AnchorFile;
pub use batch::BatchFile;
pub use error::CodecError;
pub use merkle::merkle_root;
