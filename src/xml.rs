//! In-memory XML tree used to build protocol messages, and the canonical
//! serialization that signatures are computed over.

mod c14n;
mod document;
mod errors;

pub use c14n::{Canonicalization, canonicalize};
pub use document::{Attribute, Element, NodeId, XmlDocument};
pub use errors::XmlError;

pub type Result<T> = std::result::Result<T, XmlError>;
