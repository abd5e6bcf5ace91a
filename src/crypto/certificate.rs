use crate::crypto::HashAlg;
use crate::crypto::errors::{CryptoResult, Error};
use crate::crypto::keys::SigningKey;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use openssl::asn1::Asn1Time;
use openssl::bn::{BigNum, MsbOption};
use openssl::ecdsa::EcdsaSig;
use openssl::hash::MessageDigest;
use openssl::pkey::Id;
use openssl::sign::Verifier;
use openssl::x509::extension::KeyUsage;
use openssl::x509::{X509, X509Builder, X509NameBuilder};
use std::fmt;

/// X.509 certificate published alongside signed requests
#[derive(Clone)]
pub struct Certificate {
    x509: X509,
    der: Vec<u8>,
}

impl Certificate {
    pub fn from_pem(pem_bytes: impl AsRef<[u8]>) -> CryptoResult<Self> {
        let x509 = X509::from_pem(pem_bytes.as_ref())?;
        let der = x509.to_der()?;
        Ok(Self { x509, der })
    }

    pub fn from_der(der_bytes: impl AsRef<[u8]>) -> CryptoResult<Self> {
        let x509 = X509::from_der(der_bytes.as_ref())?;
        Ok(Self {
            x509,
            der: der_bytes.as_ref().to_vec(),
        })
    }

    /// Issue a self-signed certificate for `key`, valid from now for `days`.
    /// Meant for development setups and tests; production certificates come
    /// from the caller's key management.
    pub fn self_signed(key: &SigningKey, common_name: &str, days: u32) -> CryptoResult<Self> {
        let mut name = X509NameBuilder::new()?;
        name.append_entry_by_text("CN", common_name)?;
        let name = name.build();

        let mut serial = BigNum::new()?;
        serial.rand(127, MsbOption::MAYBE_ZERO, false)?;
        let serial = serial.to_asn1_integer()?;
        let not_before = Asn1Time::days_from_now(0)?;
        let not_after = Asn1Time::days_from_now(days)?;

        let mut builder = X509Builder::new()?;
        builder.set_version(2)?;
        builder.set_serial_number(&serial)?;
        builder.set_subject_name(&name)?;
        builder.set_issuer_name(&name)?;
        builder.set_pubkey(key.pkey())?;
        builder.set_not_before(&not_before)?;
        builder.set_not_after(&not_after)?;
        builder.append_extension(KeyUsage::new().critical().digital_signature().build()?)?;
        builder.sign(key.pkey(), MessageDigest::sha256())?;

        let x509 = builder.build();
        let der = x509.to_der()?;
        Ok(Self { x509, der })
    }

    pub fn to_pem(&self) -> CryptoResult<String> {
        let pem_bytes = self.x509.to_pem()?;
        Ok(String::from_utf8_lossy(&pem_bytes).to_string())
    }

    pub fn as_der(&self) -> &[u8] {
        &self.der
    }

    /// Base64 DER, as carried by `ds:X509Certificate`
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.der)
    }

    /// Whether the certificate's public key belongs to `key`
    pub fn matches_key(&self, key: &SigningKey) -> CryptoResult<bool> {
        Ok(self.x509.public_key()?.public_eq(key.pkey()))
    }

    /// Check a signature produced by [`SigningKey::sign`] against this
    /// certificate's public key.
    pub fn verify(
        &self,
        data: impl AsRef<[u8]>,
        signature: &[u8],
        hash_alg: HashAlg,
    ) -> CryptoResult<bool> {
        let public_key = self.x509.public_key()?;
        let signature = match public_key.id() {
            Id::RSA => signature.to_vec(),
            Id::EC => ecdsa_raw_to_der(signature)?,
            other => return Err(Error::UnsupportedKey(format!("{other:?}"))),
        };

        let mut verifier = Verifier::new(hash_alg.into(), &public_key)?;
        verifier.update(data.as_ref())?;
        Ok(verifier.verify(&signature)?)
    }
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("subject", &self.x509.subject_name())
            .field("size", &self.der.len())
            .finish()
    }
}

fn ecdsa_raw_to_der(raw: &[u8]) -> CryptoResult<Vec<u8>> {
    if raw.is_empty() || raw.len() % 2 != 0 {
        return Err(Error::Invalid("raw ECDSA signature has odd length".into()));
    }
    let (r, s) = raw.split_at(raw.len() / 2);
    let sig = EcdsaSig::from_private_components(BigNum::from_slice(r)?, BigNum::from_slice(s)?)?;
    Ok(sig.to_der()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Curve;

    #[test]
    fn test_self_signed_matches_its_key() {
        let key = SigningKey::generate_rsa(2048).unwrap();
        let other = SigningKey::generate_rsa(2048).unwrap();
        let cert = Certificate::self_signed(&key, "sp.test", 1).unwrap();

        assert!(cert.matches_key(&key).unwrap());
        assert!(!cert.matches_key(&other).unwrap());
    }

    #[test]
    fn test_self_signed_validity_window() {
        let key = SigningKey::generate_rsa(2048).unwrap();
        let cert = Certificate::self_signed(&key, "sp.test", 30).unwrap();
        let x509 = X509::from_der(cert.as_der()).unwrap();

        let now = Asn1Time::days_from_now(0).unwrap();
        assert!(now.diff(x509.not_before()).unwrap().days <= 0);
        let remaining = now.diff(x509.not_after()).unwrap();
        assert!((29..=30).contains(&remaining.days), "{}", remaining.days);
        assert!(x509.serial_number().to_bn().unwrap().num_bits() <= 127);
    }

    #[test]
    fn test_der_and_pem_agree() {
        let key = SigningKey::generate_ec(Curve::NistP256).unwrap();
        let cert = Certificate::self_signed(&key, "sp.test", 1).unwrap();
        let reloaded = Certificate::from_der(cert.as_der()).unwrap();
        assert_eq!(reloaded.to_base64(), cert.to_base64());
        let from_pem = Certificate::from_pem(cert.to_pem().unwrap()).unwrap();
        assert_eq!(from_pem.as_der(), cert.as_der());
        assert!(Certificate::from_pem("garbage").is_err());
    }

    #[test]
    fn test_verify_rsa_and_ecdsa() {
        for key in [
            SigningKey::generate_rsa(2048).unwrap(),
            SigningKey::generate_ec(Curve::NistP384).unwrap(),
        ] {
            let cert = Certificate::self_signed(&key, "sp.test", 1).unwrap();
            let signature = key.sign(b"signed bytes", HashAlg::Sha256).unwrap();

            assert!(cert.verify(b"signed bytes", &signature, HashAlg::Sha256).unwrap());
            assert!(!cert.verify(b"other bytes", &signature, HashAlg::Sha256).unwrap());
        }
    }
}
