//! XML-DSig signatures over AuthnRequests: enveloped signatures for the POST
//! binding and detached query-string signatures for the Redirect binding.

mod algorithms;
mod errors;
mod signer;


pub use algorithms::SignatureAlgorithm;
pub use errors::SignError;
pub use signer::Signer;

/// Transform identifiers used inside `ds:Reference`
pub mod transforms {
    pub const ENVELOPED_SIGNATURE: &str = "http://www.w3.org/2000/09/xmldsig#enveloped-signature";
}
