use std::{collections::HashMap, sync::Arc};

use config::{Config as ConfigLib, ConfigError, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use crate::authn::{RequestedAuthnContext, ScopingIdp, ServiceProviderConfig, SigningCredentials};
use crate::crypto::{Certificate, SigningKey};
use crate::signature::SignatureAlgorithm;
use crate::xml::Canonicalization;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service_provider: ServiceProviderSettings,
}

/// Service provider settings as read from files and the environment.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceProviderSettings {
    pub assertion_consumer_service_url: String,
    pub audience_uri: String,
    #[serde(default)]
    pub identity_provider_issuer: String,
    pub identity_provider_sso_url: String,
    #[serde(default)]
    pub sign_authn_requests: bool,
    #[serde(default)]
    pub force_authn: bool,
    #[serde(default)]
    pub is_passive: bool,
    #[serde(default)]
    pub requested_authn_context: Option<RequestedAuthnContext>,
    #[serde(default)]
    pub name_id_format: Option<String>,
    #[serde(default)]
    pub scoping: Option<ScopingIdp>,
    /// XML-DSig URI or short name such as `rsa-sha256`
    #[serde(default)]
    pub signature_algorithm: SignatureAlgorithm,
    #[serde(default)]
    pub canonicalization: Canonicalization,
    #[serde(default)]
    pub signing: Option<SigningSettings>,
}

/// PEM encoded request signing material
#[derive(Debug, Clone, Deserialize)]
pub struct SigningSettings {
    pub private_key_pem: SecretString,
    pub certificate_pem: String,
}

impl SigningSettings {
    /// Parse the key and certificate.
    ///
    /// # Errors
    /// Returns an error if either PEM block cannot be parsed.
    pub fn credentials(&self) -> Result<SigningCredentials, ConfigError> {
        let key = SigningKey::from_pem(self.private_key_pem.expose_secret().as_bytes())
            .map_err(|e| ConfigError::Message(format!("invalid signing key: {e}")))?;
        let certificate = Certificate::from_pem(self.certificate_pem.as_bytes())
            .map_err(|e| ConfigError::Message(format!("invalid signing certificate: {e}")))?;
        Ok(SigningCredentials::new(key, certificate))
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_sources(None)
    }

    pub fn load_with_sources(
        env_vars: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = ConfigLib::builder()
            .set_default(
                "service_provider.assertion_consumer_service_url",
                "http://localhost:3000/saml/acs",
            )?
            .set_default("service_provider.audience_uri", "http://localhost:3000")?
            .set_default("service_provider.identity_provider_sso_url", "")?
            .set_default("service_provider.sign_authn_requests", false)?
            .add_source(File::with_name("config/settings").required(false));

        // If env_vars is provided, we use it instead of system environment
        // This is to avoid systems variables pollution across tests
        if let Some(vars) = env_vars {
            for (key, value) in vars {
                builder = builder.set_override(&key, value)?;
            }
        } else {
            // Should be in the format APP_SERVICE_PROVIDER__AUDIENCE_URI
            builder = builder.add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(" ")
                    .with_list_parse_key("service_provider.requested_authn_context.contexts"),
            );
        }

        builder.build()?.try_deserialize()
    }

    /// Turn the loaded settings into the builder's configuration, parsing
    /// signing material when present.
    pub fn service_provider(&self) -> Result<ServiceProviderConfig, ConfigError> {
        let settings = &self.service_provider;
        let credentials = settings
            .signing
            .as_ref()
            .map(SigningSettings::credentials)
            .transpose()?
            .map(Arc::new);
        debug!(
            sso_url = %settings.identity_provider_sso_url,
            signing = settings.sign_authn_requests,
            has_credentials = credentials.is_some(),
            "Loaded service provider settings"
        );

        Ok(ServiceProviderConfig {
            assertion_consumer_service_url: settings.assertion_consumer_service_url.clone(),
            audience_uri: settings.audience_uri.clone(),
            identity_provider_issuer: settings.identity_provider_issuer.clone(),
            identity_provider_sso_url: settings.identity_provider_sso_url.clone(),
            sign_authn_requests: settings.sign_authn_requests,
            force_authn: settings.force_authn,
            is_passive: settings.is_passive,
            requested_authn_context: settings.requested_authn_context.clone(),
            name_id_format: settings.name_id_format.clone(),
            scoping: settings.scoping.clone(),
            signature_algorithm: settings.signature_algorithm,
            canonicalization: settings.canonicalization,
            credentials,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authn::Comparison;
    use crate::crypto::Curve;
    use config::FileFormat;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config =
            Config::load_with_sources(Some(HashMap::new())).expect("Failed to load config");
        let sp = &config.service_provider;

        assert_eq!(sp.assertion_consumer_service_url, "http://localhost:3000/saml/acs");
        assert_eq!(sp.audience_uri, "http://localhost:3000");
        assert_eq!(sp.identity_provider_sso_url, "");
        assert!(!sp.sign_authn_requests);
        assert_eq!(sp.signature_algorithm, SignatureAlgorithm::RsaSha256);
        assert_eq!(sp.canonicalization, Canonicalization::Exclusive);
        assert!(sp.signing.is_none());
    }

    #[test]
    fn test_env_config() {
        let mut env_vars = HashMap::new();
        env_vars.insert(
            "service_provider.assertion_consumer_service_url".to_string(),
            "https://sp.test/acs".to_string(),
        );
        env_vars.insert(
            "service_provider.audience_uri".to_string(),
            "https://sp.test".to_string(),
        );
        env_vars.insert(
            "service_provider.identity_provider_sso_url".to_string(),
            "https://idp.test/saml/sso".to_string(),
        );
        env_vars.insert(
            "service_provider.name_id_format".to_string(),
            "urn:oasis:names:tc:SAML:2.0:nameid-format:persistent".to_string(),
        );
        env_vars.insert(
            "service_provider.canonicalization".to_string(),
            "http://www.w3.org/TR/2001/REC-xml-c14n-20010315".to_string(),
        );
        env_vars.insert(
            "service_provider.scoping.provider_id".to_string(),
            "https://other-idp.test".to_string(),
        );
        env_vars.insert(
            "service_provider.scoping.name".to_string(),
            "Other".to_string(),
        );

        let config = Config::load_with_sources(Some(env_vars)).expect("Failed to load config");
        let sp = config.service_provider().unwrap();

        assert_eq!(sp.assertion_consumer_service_url, "https://sp.test/acs");
        assert_eq!(sp.audience_uri, "https://sp.test");
        assert_eq!(
            sp.name_id_format.as_deref(),
            Some("urn:oasis:names:tc:SAML:2.0:nameid-format:persistent")
        );
        assert_eq!(sp.canonicalization, Canonicalization::Inclusive);
        assert_eq!(sp.scoping.unwrap().provider_id, "https://other-idp.test");
    }

    #[test]
    fn test_authn_context_from_file() {
        let toml = r#"
            [service_provider]
            assertion_consumer_service_url = "https://sp.test/acs"
            audience_uri = "https://sp.test"
            identity_provider_sso_url = "https://idp.test/saml/sso"

            [service_provider.requested_authn_context]
            comparison = "minimum"
            contexts = [
                "urn:oasis:names:tc:SAML:2.0:ac:classes:PasswordProtectedTransport",
                "urn:oasis:names:tc:SAML:2.0:ac:classes:X509",
            ]
        "#;
        let config: Config = ConfigLib::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        let context = config
            .service_provider()
            .unwrap()
            .requested_authn_context
            .unwrap();
        assert_eq!(context.comparison, Comparison::Minimum);
        assert_eq!(
            context.contexts,
            [
                "urn:oasis:names:tc:SAML:2.0:ac:classes:PasswordProtectedTransport",
                "urn:oasis:names:tc:SAML:2.0:ac:classes:X509",
            ]
        );
    }

    #[test]
    fn test_partial_env_override() {
        let mut env_vars = HashMap::new();
        env_vars.insert(
            "service_provider.identity_provider_sso_url".to_string(),
            "https://idp.test/saml/sso".to_string(),
        );
        env_vars.insert(
            "service_provider.force_authn".to_string(),
            "true".to_string(),
        );
        env_vars.insert(
            "service_provider.signature_algorithm".to_string(),
            "ecdsa-sha384".to_string(),
        );

        let config = Config::load_with_sources(Some(env_vars)).expect("Failed to load config");
        let sp = config.service_provider().unwrap();

        assert_eq!(sp.identity_provider_sso_url, "https://idp.test/saml/sso");
        assert!(sp.force_authn);
        assert!(!sp.is_passive);
        assert_eq!(sp.signature_algorithm, SignatureAlgorithm::EcdsaSha384);
        // The other values should use default
        assert_eq!(sp.audience_uri, "http://localhost:3000");
        assert!(sp.credentials.is_none());
    }

    #[test]
    fn test_signing_material_from_pem() {
        let key = SigningKey::generate_ec(Curve::NistP256).unwrap();
        let certificate = Certificate::self_signed(&key, "sp.test", 1).unwrap();

        let mut env_vars = HashMap::new();
        env_vars.insert(
            "service_provider.sign_authn_requests".to_string(),
            "true".to_string(),
        );
        env_vars.insert(
            "service_provider.signing.private_key_pem".to_string(),
            key.to_pem().unwrap(),
        );
        env_vars.insert(
            "service_provider.signing.certificate_pem".to_string(),
            certificate.to_pem().unwrap(),
        );

        let config = Config::load_with_sources(Some(env_vars)).unwrap();
        let rendered = format!("{:?}", config.service_provider.signing);
        assert!(!rendered.contains("PRIVATE KEY"));

        let sp = config.service_provider().unwrap();
        assert!(sp.sign_authn_requests);
        let credentials = sp.credentials.unwrap();
        assert!(credentials.certificate.matches_key(&credentials.key).unwrap());
    }

    #[test]
    fn test_invalid_pem_is_rejected() {
        let mut env_vars = HashMap::new();
        env_vars.insert(
            "service_provider.signing.private_key_pem".to_string(),
            "not a key".to_string(),
        );
        env_vars.insert(
            "service_provider.signing.certificate_pem".to_string(),
            "not a certificate".to_string(),
        );

        let config = Config::load_with_sources(Some(env_vars)).unwrap();
        assert!(config.service_provider().is_err());
    }

    #[test]
    fn test_comparison_tokens_deserialize() {
        let comparison: Comparison = ConfigLib::builder()
            .set_override("value", "better")
            .unwrap()
            .build()
            .unwrap()
            .get("value")
            .unwrap();
        assert_eq!(comparison, Comparison::Better);
    }
}
