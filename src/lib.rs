pub mod authn;
pub mod binding;
pub mod config;
pub mod crypto;
pub mod error;
pub mod saml;
pub mod service_provider;
pub mod signature;
pub mod telemetry;
pub mod transport;
pub mod xml;

pub use error::Error;
pub use service_provider::ServiceProvider;
