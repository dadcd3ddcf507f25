use strata_model::MultihashError;
use thiserror::Error;

/// Errors from artifact encoding, decoding, and commitment.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed batch file: {0}")]
    MalformedBatchFile(String),

    #[error("malformed anchor file: {0}")]
    MalformedAnchorFile(String),

    #[error("operation index {index} out of range for batch of {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("cannot commit an empty batch")]
    EmptyBatch,

    #[error(transparent)]
    Hash(#[from] MultihashError),
}
