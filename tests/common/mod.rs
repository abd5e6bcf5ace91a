#![allow(dead_code)]

use std::sync::Arc;

use saml_sp::authn::{ServiceProviderConfig, SigningCredentials};
use saml_sp::crypto::{Certificate, Curve, SigningKey};
use saml_sp::telemetry;
use url::Url;

pub const SSO_URL: &str = "https://idp.test/saml/sso";
pub const SP_URL: &str = "https://sp.test";

pub fn sp_config() -> ServiceProviderConfig {
    telemetry::init_tracing();
    ServiceProviderConfig {
        assertion_consumer_service_url: SP_URL.to_string(),
        audience_uri: SP_URL.to_string(),
        identity_provider_issuer: SP_URL.to_string(),
        identity_provider_sso_url: SSO_URL.to_string(),
        ..Default::default()
    }
}

pub fn rsa_credentials() -> Arc<SigningCredentials> {
    let key = SigningKey::generate_rsa(2048).unwrap();
    let certificate = Certificate::self_signed(&key, "sp.test", 30).unwrap();
    Arc::new(SigningCredentials::new(key, certificate))
}

pub fn ec_credentials() -> Arc<SigningCredentials> {
    let key = SigningKey::generate_ec(Curve::NistP256).unwrap();
    let certificate = Certificate::self_signed(&key, "sp.test", 30).unwrap();
    Arc::new(SigningCredentials::new(key, certificate))
}

/// Query parameters of `url`, percent-decoded, in order
pub fn query_pairs(url: &str) -> Vec<(String, String)> {
    Url::parse(url)
        .unwrap()
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

pub fn query_param(url: &str, name: &str) -> Option<String> {
    query_pairs(url)
        .into_iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v)
}
