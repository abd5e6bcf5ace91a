//! SAML 2.0 protocol identifiers used when building requests.

pub const SAML_VERSION: &str = "2.0";

// Namespaces and the prefixes they are bound to in emitted documents
pub mod ns {
    pub const PROTOCOL: &str = "urn:oasis:names:tc:SAML:2.0:protocol";
    pub const ASSERTION: &str = "urn:oasis:names:tc:SAML:2.0:assertion";
    pub const DS: &str = "http://www.w3.org/2000/09/xmldsig#";

    pub const PROTOCOL_PREFIX: &str = "samlp";
    pub const ASSERTION_PREFIX: &str = "saml";
    pub const DS_PREFIX: &str = "ds";
}

// Query and form parameter names
pub mod params {
    pub const SAML_REQUEST: &str = "SAMLRequest";
    pub const RELAY_STATE: &str = "RelayState";
    pub const SIG_ALG: &str = "SigAlg";
    pub const SIGNATURE: &str = "Signature";
}

pub mod name_id_format {
    pub const UNSPECIFIED: &str = "urn:oasis:names:tc:SAML:1.1:nameid-format:unspecified";
    pub const EMAIL_ADDRESS: &str = "urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress";
    pub const PERSISTENT: &str = "urn:oasis:names:tc:SAML:2.0:nameid-format:persistent";
    pub const TRANSIENT: &str = "urn:oasis:names:tc:SAML:2.0:nameid-format:transient";
}

pub mod authn_context {
    pub const PASSWORD: &str = "urn:oasis:names:tc:SAML:2.0:ac:classes:Password";
    pub const PASSWORD_PROTECTED_TRANSPORT: &str =
        "urn:oasis:names:tc:SAML:2.0:ac:classes:PasswordProtectedTransport";
    pub const TLS_CLIENT: &str = "urn:oasis:names:tc:SAML:2.0:ac:classes:TLSClient";
    pub const X509: &str = "urn:oasis:names:tc:SAML:2.0:ac:classes:X509";
    pub const KERBEROS: &str = "urn:oasis:names:tc:SAML:2.0:ac:classes:Kerberos";
    pub const UNSPECIFIED: &str = "urn:oasis:names:tc:SAML:2.0:ac:classes:unspecified";
}

/// Transport bindings an AuthnRequest can be sent with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Binding {
    HttpRedirect,
    HttpPost,
}

impl Binding {
    pub const fn uri(self) -> &'static str {
        match self {
            Binding::HttpRedirect => "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-Redirect",
            Binding::HttpPost => "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-POST",
        }
    }

    pub fn from_uri(uri: &str) -> Option<Self> {
        [Binding::HttpRedirect, Binding::HttpPost]
            .into_iter()
            .find(|binding| binding.uri() == uri)
    }
}
