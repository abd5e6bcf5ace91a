use std::fmt;

use serde::Deserialize;

use crate::crypto::{HashAlg, KeyKind};

/// Signature algorithms an IdP may require for AuthnRequests.
///
/// Deserializes from either the XML-DSig URI (as published in IdP metadata)
/// or a short name such as `rsa-sha256`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
pub enum SignatureAlgorithm {
    #[serde(rename = "http://www.w3.org/2000/09/xmldsig#rsa-sha1", alias = "rsa-sha1")]
    RsaSha1,
    #[default]
    #[serde(
        rename = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256",
        alias = "rsa-sha256"
    )]
    RsaSha256,
    #[serde(
        rename = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha384",
        alias = "rsa-sha384"
    )]
    RsaSha384,
    #[serde(
        rename = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha512",
        alias = "rsa-sha512"
    )]
    RsaSha512,
    #[serde(
        rename = "http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha256",
        alias = "ecdsa-sha256"
    )]
    EcdsaSha256,
    #[serde(
        rename = "http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha384",
        alias = "ecdsa-sha384"
    )]
    EcdsaSha384,
    #[serde(
        rename = "http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha512",
        alias = "ecdsa-sha512"
    )]
    EcdsaSha512,
}

impl SignatureAlgorithm {
    pub const ALL: [SignatureAlgorithm; 7] = [
        SignatureAlgorithm::RsaSha1,
        SignatureAlgorithm::RsaSha256,
        SignatureAlgorithm::RsaSha384,
        SignatureAlgorithm::RsaSha512,
        SignatureAlgorithm::EcdsaSha256,
        SignatureAlgorithm::EcdsaSha384,
        SignatureAlgorithm::EcdsaSha512,
    ];

    /// Identifier written to `ds:SignatureMethod` and the `SigAlg` parameter
    pub const fn uri(self) -> &'static str {
        match self {
            SignatureAlgorithm::RsaSha1 => "http://www.w3.org/2000/09/xmldsig#rsa-sha1",
            SignatureAlgorithm::RsaSha256 => "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256",
            SignatureAlgorithm::RsaSha384 => "http://www.w3.org/2001/04/xmldsig-more#rsa-sha384",
            SignatureAlgorithm::RsaSha512 => "http://www.w3.org/2001/04/xmldsig-more#rsa-sha512",
            SignatureAlgorithm::EcdsaSha256 => {
                "http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha256"
            }
            SignatureAlgorithm::EcdsaSha384 => {
                "http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha384"
            }
            SignatureAlgorithm::EcdsaSha512 => {
                "http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha512"
            }
        }
    }

    /// Look up an algorithm by its XML-DSig URI, e.g. from IdP metadata.
    pub fn from_uri(uri: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|alg| alg.uri() == uri)
    }

    /// Hash used both for the signature and the reference digest
    pub const fn hash_alg(self) -> HashAlg {
        match self {
            SignatureAlgorithm::RsaSha1 => HashAlg::Sha1,
            SignatureAlgorithm::RsaSha256 | SignatureAlgorithm::EcdsaSha256 => HashAlg::Sha256,
            SignatureAlgorithm::RsaSha384 | SignatureAlgorithm::EcdsaSha384 => HashAlg::Sha384,
            SignatureAlgorithm::RsaSha512 | SignatureAlgorithm::EcdsaSha512 => HashAlg::Sha512,
        }
    }

    pub const fn is_ecdsa(self) -> bool {
        matches!(
            self,
            SignatureAlgorithm::EcdsaSha256
                | SignatureAlgorithm::EcdsaSha384
                | SignatureAlgorithm::EcdsaSha512
        )
    }

    /// Whether a key of the given kind can produce this signature
    pub fn is_compatible(self, kind: KeyKind) -> bool {
        if self.is_ecdsa() {
            kind.is_ec()
        } else {
            kind.is_rsa()
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.uri())
    }
}
