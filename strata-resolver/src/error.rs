use strata_codec::CodecError;
use strata_model::{CasError, MultihashError, OperationError};
use thiserror::Error;

/// Errors from the projection.
///
/// Only `InvalidOperation` reaches callers of `apply`; it marks a caller
/// bug (unresolved operation fed to the projection). Everything else is an
/// internal traversal failure that the public lookup/resolve boundary maps
/// to `None`.
#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("operation is missing resolved transaction metadata")]
    InvalidOperation,

    #[error(transparent)]
    Hash(#[from] MultihashError),

    #[error(transparent)]
    Cas(#[from] CasError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Operation(#[from] OperationError),
}
