use thiserror::Error;

/// Rejected input, detected before any document exists
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid service provider configuration: {0}")]
    InvalidConfig(String),

    #[error("requested authn context must name at least one context class")]
    EmptyAuthnContext,
}
