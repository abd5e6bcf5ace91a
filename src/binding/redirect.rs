use std::fmt;
use std::io::{Read, Write};

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use flate2::Compression;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use tracing::debug;

use crate::binding::EncodeError;
use crate::saml::params;
use crate::signature::Signer;
use crate::xml::XmlDocument;

/// Query parameters of a Redirect binding URL, in transmission order.
///
/// Values are stored percent-encoded so the signed bytes and the transmitted
/// bytes are the same string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectQuery {
    pairs: Vec<(&'static str, String)>,
}

impl RedirectQuery {
    /// Append a parameter, percent-encoding `value`.
    pub fn push(&mut self, name: &'static str, value: &str) {
        self.pairs.push((name, urlencoding::encode(value).into_owned()));
    }

    pub fn pairs(&self) -> &[(&'static str, String)] {
        &self.pairs
    }

    /// Percent-encoded value of the first parameter called `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

impl fmt::Display for RedirectQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.pairs.iter().enumerate() {
            if i > 0 {
                f.write_str("&")?;
            }
            write!(f, "{name}={value}")?;
        }
        Ok(())
    }
}

fn deflate(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Build the ordered Redirect binding query for `doc`.
///
/// `SAMLRequest` first, then `RelayState` when present. With a signer,
/// `SigAlg` follows and `Signature` is computed over everything before it
/// and appended last. An empty relay state is treated as absent.
pub fn redirect_query(
    doc: &XmlDocument,
    relay_state: Option<&str>,
    signer: Option<&Signer>,
) -> Result<RedirectQuery, EncodeError> {
    let xml = doc.to_xml_string()?;
    let compressed = deflate(xml.as_bytes()).map_err(EncodeError::CompressionFailed)?;

    let mut query = RedirectQuery::default();
    query.push(params::SAML_REQUEST, &BASE64.encode(&compressed));
    if let Some(relay_state) = relay_state.filter(|rs| !rs.is_empty()) {
        query.push(params::RELAY_STATE, relay_state);
    }

    if let Some(signer) = signer {
        query.push(params::SIG_ALG, signer.algorithm().uri());
        let signature = signer.sign_query_string(query.to_string().as_bytes())?;
        query.push(params::SIGNATURE, &BASE64.encode(&signature));
    }

    debug!(
        xml_len = xml.len(),
        deflated_len = compressed.len(),
        signed = signer.is_some(),
        "Encoded Redirect binding query"
    );
    Ok(query)
}

/// Encode `doc` as an HTTP-Redirect binding URL.
///
/// The target is the document's `Destination` attribute, taken verbatim, so
/// the URL differs from `Destination` only by the appended query.
pub fn encode_redirect(
    doc: &XmlDocument,
    relay_state: Option<&str>,
    signer: Option<&Signer>,
) -> Result<String, EncodeError> {
    let destination = doc
        .attribute(doc.root(), "Destination")
        .filter(|d| !d.is_empty())
        .ok_or(EncodeError::MissingDestination)?;

    let query = redirect_query(doc, relay_state, signer)?;
    let separator = if destination.contains('?') { '&' } else { '?' };
    Ok(format!("{destination}{separator}{query}"))
}

/// Recover the XML from a `SAMLRequest` value as delivered by a query
/// parser (already percent-decoded).
pub fn decode_redirect(saml_request: &str) -> Result<String, EncodeError> {
    let compressed = BASE64
        .decode(saml_request.trim())
        .map_err(|e| EncodeError::Decode(format!("base64: {e}")))?;

    let mut xml = String::new();
    DeflateDecoder::new(compressed.as_slice())
        .read_to_string(&mut xml)
        .map_err(|e| EncodeError::Decode(format!("inflate: {e}")))?;
    Ok(xml)
}
