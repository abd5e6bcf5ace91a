use thiserror::Error;

use crate::crypto::KeyKind;
use crate::signature::SignatureAlgorithm;
use crate::xml::XmlError;

/// Signing setup or execution failures
#[derive(Debug, Error)]
pub enum SignError {
    #[error("request signing is enabled but no signing key is configured")]
    NoKeyConfigured,

    #[error("signature algorithm {algorithm} cannot be used with a {key:?} key")]
    AlgorithmMismatch {
        algorithm: SignatureAlgorithm,
        key: KeyKind,
    },

    #[error("certificate public key does not match the signing key")]
    CertificateMismatch,

    #[error("document root has no ID attribute to reference")]
    MissingId,

    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] XmlError),

    #[error("crypto error: {0}")]
    Crypto(#[from] crate::crypto::Error),
}
