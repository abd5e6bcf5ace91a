//! SAML protocol bindings: how a request document travels to the IdP.

mod errors;
mod post;
mod redirect;

pub use errors::EncodeError;
pub use post::{decode_post, encode_post};
pub use redirect::{RedirectQuery, decode_redirect, encode_redirect, redirect_query};
