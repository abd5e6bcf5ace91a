use tracing::debug;

use crate::authn::{AuthnRequest, BuildError, ServiceProviderConfig};
use crate::saml::{SAML_VERSION, ns};
use crate::xml::XmlDocument;

fn samlp(local: &str) -> String {
    format!("{}:{local}", ns::PROTOCOL_PREFIX)
}

fn saml(local: &str) -> String {
    format!("{}:{local}", ns::ASSERTION_PREFIX)
}

impl AuthnRequest {
    /// Render the request as a `samlp:AuthnRequest` document. Children follow
    /// schema order; an embedded signature, if any, is inserted later right
    /// after `Issuer`.
    pub fn to_document(&self) -> XmlDocument {
        let mut doc = XmlDocument::new(samlp("AuthnRequest"));
        let root = doc.root();

        doc.set_attribute(root, format!("xmlns:{}", ns::PROTOCOL_PREFIX), ns::PROTOCOL);
        doc.set_attribute(root, format!("xmlns:{}", ns::ASSERTION_PREFIX), ns::ASSERTION);
        doc.set_attribute(root, "ID", &self.id);
        doc.set_attribute(root, "Version", SAML_VERSION);
        doc.set_attribute(root, "ProtocolBinding", self.protocol_binding.uri());
        doc.set_attribute(
            root,
            "AssertionConsumerServiceURL",
            &self.assertion_consumer_service_url,
        );
        doc.set_attribute(root, "IssueInstant", self.issue_instant_string());
        doc.set_attribute(root, "Destination", &self.destination);
        if let Some(value) = self.force_authn.wire_value() {
            doc.set_attribute(root, "ForceAuthn", value);
        }
        if let Some(value) = self.is_passive.wire_value() {
            doc.set_attribute(root, "IsPassive", value);
        }

        let issuer = doc.add_child(root, saml("Issuer"));
        doc.set_text(issuer, &self.issuer);

        let policy = doc.add_child(root, samlp("NameIDPolicy"));
        doc.set_attribute(policy, "AllowCreate", "true");
        if let Some(format) = &self.name_id_policy.format {
            doc.set_attribute(policy, "Format", format);
        }

        if let Some(context) = &self.requested_authn_context {
            let requested = doc.add_child(root, samlp("RequestedAuthnContext"));
            doc.set_attribute(requested, "Comparison", context.comparison.as_str());
            for class_ref in &context.contexts {
                let el = doc.add_child(requested, saml("AuthnContextClassRef"));
                doc.set_text(el, class_ref);
            }
        }

        if let Some(scoping) = &self.scoping {
            let scoping_el = doc.add_child(root, samlp("Scoping"));
            let idp_list = doc.add_child(scoping_el, samlp("IDPList"));
            let entry = doc.add_child(idp_list, samlp("IDPEntry"));
            doc.set_attribute(entry, "ProviderID", &scoping.provider_id);
            if !scoping.name.is_empty() {
                doc.set_attribute(entry, "Name", &scoping.name);
            }
        }

        doc
    }
}

/// Build an unsigned AuthnRequest document for one login attempt.
pub fn build(config: &ServiceProviderConfig) -> Result<XmlDocument, BuildError> {
    let request = AuthnRequest::new(config)?;
    debug!(
        id = %request.id,
        destination = %request.destination,
        "Built AuthnRequest"
    );
    Ok(request.to_document())
}
