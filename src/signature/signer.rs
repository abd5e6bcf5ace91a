use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use tracing::debug;

use crate::authn::{ServiceProviderConfig, SigningCredentials};
use crate::crypto::Certificate;
use crate::saml::ns;
use crate::signature::{SignError, SignatureAlgorithm, transforms};
use crate::xml::{Canonicalization, NodeId, XmlDocument, canonicalize};

/// Produces request signatures with one key, certificate and algorithm.
///
/// Construction checks that the key can produce the chosen algorithm and that
/// the certificate belongs to the key, so a `Signer` that exists can sign.
#[derive(Debug, Clone)]
pub struct Signer {
    credentials: Arc<SigningCredentials>,
    algorithm: SignatureAlgorithm,
    canonicalization: Canonicalization,
}

fn ds(local: &str) -> String {
    format!("{}:{local}", ns::DS_PREFIX)
}

impl Signer {
    pub fn new(
        credentials: Arc<SigningCredentials>,
        algorithm: SignatureAlgorithm,
        canonicalization: Canonicalization,
    ) -> Result<Self, SignError> {
        let kind = credentials.key.kind();
        if !algorithm.is_compatible(kind) {
            return Err(SignError::AlgorithmMismatch {
                algorithm,
                key: kind,
            });
        }
        if !credentials.certificate.matches_key(&credentials.key)? {
            return Err(SignError::CertificateMismatch);
        }

        Ok(Self {
            credentials,
            algorithm,
            canonicalization,
        })
    }

    /// Signer for the configured credentials and algorithms.
    pub fn from_config(config: &ServiceProviderConfig) -> Result<Self, SignError> {
        let credentials = config
            .credentials
            .clone()
            .ok_or(SignError::NoKeyConfigured)?;
        Self::new(
            credentials,
            config.signature_algorithm,
            config.canonicalization,
        )
    }

    pub fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    pub fn canonicalization(&self) -> Canonicalization {
        self.canonicalization
    }

    pub fn certificate(&self) -> &Certificate {
        &self.credentials.certificate
    }

    /// Sign the exact bytes of a Redirect binding query
    /// (`SAMLRequest=..&RelayState=..&SigAlg=..`).
    pub fn sign_query_string(&self, canonical_query: &[u8]) -> Result<Vec<u8>, SignError> {
        let signature = self
            .credentials
            .key
            .sign(canonical_query, self.algorithm.hash_alg())?;
        debug!(
            algorithm = %self.algorithm,
            len = canonical_query.len(),
            "Signed redirect query"
        );
        Ok(signature)
    }

    /// Add an enveloped `ds:Signature` to `doc`, placed right after the
    /// root's `Issuer`.
    ///
    /// The document is consumed; on error nothing partially signed is
    /// returned.
    pub fn sign(&self, mut doc: XmlDocument) -> Result<XmlDocument, SignError> {
        let root = doc.root();
        let id = doc
            .attribute(root, "ID")
            .filter(|id| !id.is_empty())
            .ok_or(SignError::MissingId)?
            .to_string();
        let hash_alg = self.algorithm.hash_alg();

        // The enveloped-signature transform removes the signature again, so
        // the digest is taken before it exists.
        let canonical_root = canonicalize(&doc.to_xml_string()?, self.canonicalization, &[])?;
        let digest = hash_alg.hash(canonical_root.as_bytes())?;

        let signature = doc.create_element(ds("Signature"));
        doc.set_attribute(signature, format!("xmlns:{}", ns::DS_PREFIX), ns::DS);

        let signed_info = doc.add_child(signature, ds("SignedInfo"));
        let c14n_method = doc.add_child(signed_info, ds("CanonicalizationMethod"));
        doc.set_attribute(c14n_method, "Algorithm", self.canonicalization.uri());
        let signature_method = doc.add_child(signed_info, ds("SignatureMethod"));
        doc.set_attribute(signature_method, "Algorithm", self.algorithm.uri());

        let reference = doc.add_child(signed_info, ds("Reference"));
        doc.set_attribute(reference, "URI", format!("#{id}"));
        let transform_list = doc.add_child(reference, ds("Transforms"));
        for algorithm in [
            transforms::ENVELOPED_SIGNATURE,
            self.canonicalization.uri(),
        ] {
            let transform = doc.add_child(transform_list, ds("Transform"));
            doc.set_attribute(transform, "Algorithm", algorithm);
        }
        let digest_method = doc.add_child(reference, ds("DigestMethod"));
        doc.set_attribute(digest_method, "Algorithm", hash_alg.digest_uri());
        let digest_value = doc.add_child(reference, ds("DigestValue"));
        doc.set_text(digest_value, BASE64.encode(&digest));

        let signature_value = doc.add_child(signature, ds("SignatureValue"));
        let key_info = doc.add_child(signature, ds("KeyInfo"));
        let x509_data = doc.add_child(key_info, ds("X509Data"));
        let x509_cert = doc.add_child(x509_data, ds("X509Certificate"));
        doc.set_text(x509_cert, self.credentials.certificate.to_base64());

        attach_after_issuer(&mut doc, signature);

        let canonical_signed_info = canonicalize(
            &doc.subtree_to_string(signed_info)?,
            self.canonicalization,
            &[],
        )?;
        let value = self
            .credentials
            .key
            .sign(canonical_signed_info.as_bytes(), hash_alg)?;
        doc.set_text(signature_value, BASE64.encode(&value));

        debug!(
            id = %id,
            algorithm = %self.algorithm,
            canonicalization = self.canonicalization.uri(),
            "Signed AuthnRequest"
        );
        Ok(doc)
    }
}

fn attach_after_issuer(doc: &mut XmlDocument, signature: NodeId) {
    let root = doc.root();
    match doc.find_child(root, "Issuer") {
        Some(issuer) => doc.insert_child_after(root, issuer, signature),
        None => doc.insert_child(root, 0, signature),
    }
}
