use std::sync::Arc;

use serde::Deserialize;

use crate::crypto::{Certificate, SigningKey};
use crate::signature::SignatureAlgorithm;
use crate::xml::Canonicalization;

/// How the IdP should compare the requested context classes with the one it
/// authenticates with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    #[default]
    Exact,
    Minimum,
    Maximum,
    Better,
}

impl Comparison {
    /// Token written to the `Comparison` attribute
    pub const fn as_str(self) -> &'static str {
        match self {
            Comparison::Exact => "exact",
            Comparison::Minimum => "minimum",
            Comparison::Maximum => "maximum",
            Comparison::Better => "better",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RequestedAuthnContext {
    #[serde(default)]
    pub comparison: Comparison,
    /// `AuthnContextClassRef` values, emitted in this order
    pub contexts: Vec<String>,
}

impl RequestedAuthnContext {
    pub fn new<I, S>(comparison: Comparison, contexts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            comparison,
            contexts: contexts.into_iter().map(Into::into).collect(),
        }
    }
}

/// A single IdP the request is scoped to (`Scoping/IDPList/IDPEntry`)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScopingIdp {
    pub provider_id: String,
    /// Display name; the `Name` attribute is left out when empty
    #[serde(default)]
    pub name: String,
}

/// Key and certificate used for request signatures
#[derive(Debug, Clone)]
pub struct SigningCredentials {
    pub key: SigningKey,
    pub certificate: Certificate,
}

impl SigningCredentials {
    pub fn new(key: SigningKey, certificate: Certificate) -> Self {
        Self { key, certificate }
    }
}

/// Long-lived service provider settings, reused across login attempts.
#[derive(Debug, Clone, Default)]
pub struct ServiceProviderConfig {
    /// Where the IdP sends its response
    pub assertion_consumer_service_url: String,
    /// Written as the request `Issuer`
    pub audience_uri: String,
    /// Issuer expected on IdP responses; unused when building requests
    pub identity_provider_issuer: String,
    /// IdP endpoint; both the transport target and the `Destination`
    pub identity_provider_sso_url: String,
    pub sign_authn_requests: bool,
    pub force_authn: bool,
    pub is_passive: bool,
    pub requested_authn_context: Option<RequestedAuthnContext>,
    /// `Format` of the emitted `NameIDPolicy`
    pub name_id_format: Option<String>,
    pub scoping: Option<ScopingIdp>,
    /// Algorithm the IdP metadata requires for request signatures
    pub signature_algorithm: SignatureAlgorithm,
    pub canonicalization: Canonicalization,
    pub credentials: Option<Arc<SigningCredentials>>,
}
