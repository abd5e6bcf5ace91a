use quick_xml::events::attributes::AttrError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("XML parse error: {0}")]
    Parse(String),

    #[error("XML write error: {0}")]
    Write(#[from] std::io::Error),

    #[error("document has no root element")]
    MissingRoot,

    #[error("namespace prefix `{0}` is not bound")]
    UnboundPrefix(String),

    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

impl From<quick_xml::Error> for XmlError {
    fn from(err: quick_xml::Error) -> Self {
        XmlError::Parse(err.to_string())
    }
}

impl From<AttrError> for XmlError {
    fn from(err: AttrError) -> Self {
        XmlError::Parse(err.to_string())
    }
}

impl From<std::string::FromUtf8Error> for XmlError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        XmlError::Utf8(err.utf8_error())
    }
}
