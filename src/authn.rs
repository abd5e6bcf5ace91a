//! AuthnRequest model and builder.

mod builder;
mod errors;
mod model;
mod request;

pub use builder::build;
pub use errors::BuildError;
pub use model::{
    Comparison, RequestedAuthnContext, ScopingIdp, ServiceProviderConfig, SigningCredentials,
};
pub use request::{AuthnRequest, NameIdPolicy, TrueOrAbsent, generate_request_id};
