use thiserror::Error;

use crate::authn::BuildError;
use crate::binding::EncodeError;
use crate::signature::SignError;

/// Pipeline failure, split by stage: bad input, bad signing setup, or an
/// encoding failure.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Sign(#[from] SignError),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

pub type Result<T> = std::result::Result<T, Error>;
