use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use tracing::warn;
use uuid::Uuid;

use crate::authn::{BuildError, RequestedAuthnContext, ScopingIdp, ServiceProviderConfig};
use crate::saml::Binding;

/// Optional boolean attribute that is either written as `"true"` or left
/// out. There is no way to express `"false"`: strict IdPs treat an explicit
/// false differently from an absent attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TrueOrAbsent {
    #[default]
    Absent,
    True,
}

impl TrueOrAbsent {
    pub const fn wire_value(self) -> Option<&'static str> {
        match self {
            TrueOrAbsent::Absent => None,
            TrueOrAbsent::True => Some("true"),
        }
    }
}

impl From<bool> for TrueOrAbsent {
    fn from(value: bool) -> Self {
        if value {
            TrueOrAbsent::True
        } else {
            TrueOrAbsent::Absent
        }
    }
}

/// `NameIDPolicy` is always sent with `AllowCreate="true"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameIdPolicy {
    pub format: Option<String>,
}

/// One login attempt. Created fresh per attempt and dropped after encoding.
#[derive(Debug, Clone)]
pub struct AuthnRequest {
    pub id: String,
    pub issue_instant: DateTime<Utc>,
    pub destination: String,
    pub issuer: String,
    pub assertion_consumer_service_url: String,
    /// Binding the IdP should answer with
    pub protocol_binding: Binding,
    pub force_authn: TrueOrAbsent,
    pub is_passive: TrueOrAbsent,
    pub name_id_policy: NameIdPolicy,
    pub requested_authn_context: Option<RequestedAuthnContext>,
    pub scoping: Option<ScopingIdp>,
}

/// Fresh request identifier: `_` followed by a random UUID, so the value is
/// a valid `xs:ID` and cannot be guessed.
pub fn generate_request_id() -> String {
    format!("_{}", Uuid::new_v4())
}

fn require(value: &str, field: &str) -> Result<(), BuildError> {
    if value.trim().is_empty() {
        warn!("Rejecting configuration: {field} is empty");
        return Err(BuildError::InvalidConfig(format!("{field} is empty")));
    }
    Ok(())
}

impl AuthnRequest {
    /// Validate `config` and stamp a new request with a fresh ID and the
    /// current time.
    pub fn new(config: &ServiceProviderConfig) -> Result<Self, BuildError> {
        require(
            &config.assertion_consumer_service_url,
            "assertion_consumer_service_url",
        )?;
        require(&config.audience_uri, "audience_uri")?;
        require(&config.identity_provider_sso_url, "identity_provider_sso_url")?;

        let sso_url = url::Url::parse(&config.identity_provider_sso_url).map_err(|err| {
            warn!("Rejecting configuration: invalid identity_provider_sso_url: {err}");
            BuildError::InvalidConfig(format!("identity_provider_sso_url: {err}"))
        })?;
        if !sso_url.has_host() {
            return Err(BuildError::InvalidConfig(
                "identity_provider_sso_url has no host".into(),
            ));
        }

        if let Some(context) = &config.requested_authn_context {
            if context.contexts.is_empty() {
                warn!("Rejecting configuration: requested_authn_context has no contexts");
                return Err(BuildError::EmptyAuthnContext);
            }
        }

        Ok(Self {
            id: generate_request_id(),
            issue_instant: Utc::now().trunc_subsecs(0),
            destination: config.identity_provider_sso_url.clone(),
            issuer: config.audience_uri.clone(),
            assertion_consumer_service_url: config.assertion_consumer_service_url.clone(),
            protocol_binding: Binding::HttpPost,
            force_authn: config.force_authn.into(),
            is_passive: config.is_passive.into(),
            name_id_policy: NameIdPolicy {
                format: config.name_id_format.clone(),
            },
            requested_authn_context: config.requested_authn_context.clone(),
            scoping: config.scoping.clone(),
        })
    }

    /// `IssueInstant` value: UTC, second precision, explicit `Z`.
    pub fn issue_instant_string(&self) -> String {
        self.issue_instant.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}
