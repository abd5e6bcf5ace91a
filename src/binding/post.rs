use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use tracing::debug;

use crate::binding::EncodeError;
use crate::xml::XmlDocument;

/// Encode a document for the HTTP-POST binding: the serialized XML, base64
/// encoded, without compression.
///
/// Signing is not done here; an embedded signature has to be added to the
/// document beforehand.
pub fn encode_post(doc: &XmlDocument) -> Result<String, EncodeError> {
    let xml = doc.to_xml_string()?;
    let encoded = BASE64.encode(xml.as_bytes());
    debug!(xml_len = xml.len(), encoded_len = encoded.len(), "Encoded POST binding");
    Ok(encoded)
}

/// Inverse of [`encode_post`].
pub fn decode_post(value: &str) -> Result<String, EncodeError> {
    let bytes = BASE64
        .decode(value.trim())
        .map_err(|e| EncodeError::Decode(format!("base64: {e}")))?;
    String::from_utf8(bytes).map_err(|e| EncodeError::Decode(format!("utf-8: {e}")))
}
