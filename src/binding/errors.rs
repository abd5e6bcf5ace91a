use std::io;

use thiserror::Error;

use crate::signature::SignError;
use crate::xml::XmlError;

/// Failures while turning a finished document into a transmittable form
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("DEFLATE compression failed: {0}")]
    CompressionFailed(#[source] io::Error),

    #[error("query string signing failed: {0}")]
    SigningFailed(#[from] SignError),

    #[error("request has no Destination attribute")]
    MissingDestination,

    #[error("XML serialization failed: {0}")]
    Serialization(#[from] XmlError),

    #[error("invalid redirect location: {0}")]
    InvalidLocation(String),

    #[error("message decoding failed: {0}")]
    Decode(String),
}
