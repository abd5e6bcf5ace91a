mod certificate;
mod errors;
mod keys;

pub use certificate::Certificate;
pub use errors::Error;
pub use keys::{Curve, KeyKind, SigningKey};

pub(crate) use errors::CryptoResult;

use openssl::hash::{Hasher, MessageDigest as Digest};
use std::fmt;

/// Hash algorithms usable for XML-DSig digests and signatures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlg {
    /// SHA-1, kept for IdPs that still require it
    Sha1,
    /// SHA-256
    Sha256,
    /// SHA-384
    Sha384,
    /// SHA-512
    Sha512,
}

impl HashAlg {
    /// Hash the given data with this hash algorithm
    pub fn hash(&self, data: impl AsRef<[u8]>) -> CryptoResult<Vec<u8>> {
        let mut hasher = Hasher::new(self.into())?;
        hasher.update(data.as_ref())?;
        Ok(hasher.finish()?.to_vec())
    }

    /// Get the output size in bytes
    pub fn output_size(self) -> usize {
        match self {
            HashAlg::Sha1 => 20,
            HashAlg::Sha256 => 32,
            HashAlg::Sha384 => 48,
            HashAlg::Sha512 => 64,
        }
    }

    /// Identifier used in `ds:DigestMethod`
    pub const fn digest_uri(self) -> &'static str {
        match self {
            HashAlg::Sha1 => "http://www.w3.org/2000/09/xmldsig#sha1",
            HashAlg::Sha256 => "http://www.w3.org/2001/04/xmlenc#sha256",
            HashAlg::Sha384 => "http://www.w3.org/2001/04/xmldsig-more#sha384",
            HashAlg::Sha512 => "http://www.w3.org/2001/04/xmlenc#sha512",
        }
    }
}

impl From<&HashAlg> for Digest {
    fn from(hash_alg: &HashAlg) -> Self {
        match hash_alg {
            HashAlg::Sha1 => Digest::sha1(),
            HashAlg::Sha256 => Digest::sha256(),
            HashAlg::Sha384 => Digest::sha384(),
            HashAlg::Sha512 => Digest::sha512(),
        }
    }
}

impl From<HashAlg> for Digest {
    fn from(hash_alg: HashAlg) -> Self {
        (&hash_alg).into()
    }
}

impl fmt::Display for HashAlg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HashAlg::Sha1 => "SHA-1",
            HashAlg::Sha256 => "SHA-256",
            HashAlg::Sha384 => "SHA-384",
            HashAlg::Sha512 => "SHA-512",
        };
        write!(f, "{name}")
    }
}
