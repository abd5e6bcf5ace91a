use axum::response::{Html, Response};
use tracing::debug;

use crate::authn::{self, ServiceProviderConfig};
use crate::binding::{EncodeError, encode_post, encode_redirect};
use crate::error::Result;
use crate::saml::Binding;
use crate::signature::Signer;
use crate::transport;
use crate::xml::XmlDocument;

/// Entry point for starting logins at one IdP.
///
/// Holds the configuration and, when request signing is enabled, a signer
/// validated up front. Every call builds a new request.
#[derive(Debug, Clone)]
pub struct ServiceProvider {
    config: ServiceProviderConfig,
    signer: Option<Signer>,
}

impl ServiceProvider {
    /// Fails with [`SignError::NoKeyConfigured`](crate::signature::SignError)
    /// when signing is enabled without credentials, before any request is
    /// built.
    pub fn new(config: ServiceProviderConfig) -> Result<Self> {
        let signer = if config.sign_authn_requests {
            Some(Signer::from_config(&config)?)
        } else {
            None
        };
        Ok(Self { config, signer })
    }

    pub fn config(&self) -> &ServiceProviderConfig {
        &self.config
    }

    pub fn signer(&self) -> Option<&Signer> {
        self.signer.as_ref()
    }

    /// Unsigned AuthnRequest XML
    pub fn build_auth_request(&self) -> Result<String> {
        let doc = authn::build(&self.config)?;
        let xml = doc.to_xml_string().map_err(EncodeError::from)?;
        Ok(xml)
    }

    /// Request document ready for `binding`. Only the POST binding embeds a
    /// signature; Redirect requests are signed over the query instead.
    pub fn build_auth_request_document(&self, binding: Binding) -> Result<XmlDocument> {
        let doc = authn::build(&self.config)?;
        match (binding, &self.signer) {
            (Binding::HttpPost, Some(signer)) => Ok(signer.sign(doc)?),
            _ => Ok(doc),
        }
    }

    /// Login URL for the Redirect binding.
    pub fn build_auth_url(&self, relay_state: Option<&str>) -> Result<String> {
        let doc = self.build_auth_request_document(Binding::HttpRedirect)?;
        let url = encode_redirect(&doc, relay_state, self.signer.as_ref())?;
        debug!(signed = self.signer.is_some(), "Built Redirect binding URL");
        Ok(url)
    }

    /// Base64 `SAMLRequest` value for the POST binding.
    pub fn build_auth_body_post(&self) -> Result<String> {
        let doc = self.build_auth_request_document(Binding::HttpPost)?;
        Ok(encode_post(&doc)?)
    }

    /// `302` response sending the browser to the IdP.
    pub fn auth_redirect(&self, relay_state: Option<&str>) -> Result<Response> {
        let url = self.build_auth_url(relay_state)?;
        Ok(transport::redirect_response(&url)?)
    }

    /// Auto-submitting form posting the request to the IdP.
    pub fn auth_post_form(&self, relay_state: Option<&str>) -> Result<Html<String>> {
        let body = self.build_auth_body_post()?;
        Ok(transport::post_form(
            &self.config.identity_provider_sso_url,
            &body,
            relay_state,
        ))
    }
}
