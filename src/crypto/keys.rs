use crate::crypto::HashAlg;
use crate::crypto::errors::{CryptoResult, Error};
use openssl::ec::{EcGroup, EcKey};
use openssl::ecdsa::EcdsaSig;
use openssl::nid::Nid;
use openssl::pkey::{Id, PKey, Private};
use openssl::rsa::Rsa;
use openssl::sign::Signer;
use std::fmt;

/// Elliptic curves accepted for ECDSA request signing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curve {
    /// NIST P-256 (secp256r1)
    NistP256,
    /// NIST P-384 (secp384r1)
    NistP384,
    /// NIST P-521 (secp521r1)
    NistP521,
}

impl Curve {
    /// Get the OpenSSL NID for this curve
    pub fn to_nid(self) -> Nid {
        match self {
            Curve::NistP256 => Nid::X9_62_PRIME256V1,
            Curve::NistP384 => Nid::SECP384R1,
            Curve::NistP521 => Nid::SECP521R1,
        }
    }
}

/// The algorithm family of a signing key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Rsa { bits: u32 },
    /// `field_bytes` is the width of each of `r` and `s` in a raw signature
    Ec { field_bytes: usize },
}

impl KeyKind {
    pub fn is_rsa(self) -> bool {
        matches!(self, KeyKind::Rsa { .. })
    }

    pub fn is_ec(self) -> bool {
        matches!(self, KeyKind::Ec { .. })
    }
}

/// Private key used to sign AuthnRequests.
///
/// The underlying OpenSSL key is reference counted and immutable, so clones
/// are cheap and may sign concurrently.
#[derive(Clone)]
pub struct SigningKey {
    key: PKey<Private>,
    kind: KeyKind,
}

impl SigningKey {
    /// Load from PEM-encoded PKCS#1/PKCS#8/SEC1.
    pub fn from_pem(pem_bytes: impl AsRef<[u8]>) -> CryptoResult<Self> {
        let key = PKey::private_key_from_pem(pem_bytes.as_ref())?;
        Self::from_pkey(key)
    }

    /// Load from DER-encoded PKCS#8.
    pub fn from_der(der_bytes: impl AsRef<[u8]>) -> CryptoResult<Self> {
        let key = PKey::private_key_from_der(der_bytes.as_ref())?;
        Self::from_pkey(key)
    }

    /// Generate a fresh RSA key
    pub fn generate_rsa(bits: u32) -> CryptoResult<Self> {
        let rsa = Rsa::generate(bits)?;
        Self::from_pkey(PKey::from_rsa(rsa)?)
    }

    /// Generate a fresh EC key on the given curve
    pub fn generate_ec(curve: Curve) -> CryptoResult<Self> {
        let group = EcGroup::from_curve_name(curve.to_nid())?;
        let ec = EcKey::generate(&group)?;
        Self::from_pkey(PKey::from_ec_key(ec)?)
    }

    fn from_pkey(key: PKey<Private>) -> CryptoResult<Self> {
        let kind = match key.id() {
            Id::RSA => KeyKind::Rsa { bits: key.bits() },
            Id::EC => {
                let degree = key.ec_key()?.group().degree();
                KeyKind::Ec {
                    field_bytes: degree.div_ceil(8) as usize,
                }
            }
            other => return Err(Error::UnsupportedKey(format!("{other:?}"))),
        };
        Ok(Self { key, kind })
    }

    pub fn kind(&self) -> KeyKind {
        self.kind
    }

    /// Serialize as PEM-encoded PKCS#8.
    pub fn to_pem(&self) -> CryptoResult<String> {
        let pem_bytes = self.key.private_key_to_pem_pkcs8()?;
        Ok(String::from_utf8_lossy(&pem_bytes).to_string())
    }

    /// Sign `data` with the given hash.
    ///
    /// RSA keys produce PKCS#1 v1.5 signatures. EC keys produce the
    /// fixed-width `r || s` encoding required by XML-DSig, not DER.
    pub fn sign(&self, data: impl AsRef<[u8]>, hash_alg: HashAlg) -> CryptoResult<Vec<u8>> {
        let mut signer = Signer::new(hash_alg.into(), &self.key)?;
        signer.update(data.as_ref())?;
        let signature = signer.sign_to_vec()?;

        match self.kind {
            KeyKind::Rsa { .. } => Ok(signature),
            KeyKind::Ec { field_bytes } => ecdsa_der_to_raw(&signature, field_bytes),
        }
    }

    /// Get the underlying OpenSSL private key
    pub(crate) fn pkey(&self) -> &PKey<Private> {
        &self.key
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

fn ecdsa_der_to_raw(der: &[u8], field_bytes: usize) -> CryptoResult<Vec<u8>> {
    let sig = EcdsaSig::from_der(der)?;
    let width = i32::try_from(field_bytes)
        .map_err(|_| Error::Invalid("EC field size out of range".into()))?;
    let mut raw = sig.r().to_vec_padded(width)?;
    raw.extend(sig.s().to_vec_padded(width)?);
    Ok(raw)
}
