/// Data URL encoding
///
/// Images travel between the editor, the backend and the viewer as
/// `data:<mime>;base64,<payload>` strings.
use base64::{engine::general_purpose, Engine as _};
use std::fmt;

use crate::error::EncodingError;

/// A decoded data URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    /// Media type, e.g. `image/png`
    pub mime: String,
    /// Decoded payload bytes
    pub bytes: Vec<u8>,
}

impl DataUrl {
    pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            bytes,
        }
    }

    /// Parse a base64 data URL
    pub fn parse(url: &str) -> Result<Self, EncodingError> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| EncodingError::MalformedDataUrl("missing data: prefix".into()))?;

        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| EncodingError::MalformedDataUrl("missing ',' separator".into()))?;

        let mime = header
            .strip_suffix(";base64")
            .ok_or_else(|| EncodingError::MalformedDataUrl("only base64 payloads are supported".into()))?;

        let bytes = general_purpose::STANDARD.decode(payload.trim())?;

        Ok(Self::new(mime, bytes))
    }

    /// Encode raw bytes as a data URL string
    pub fn encode(mime: &str, bytes: &[u8]) -> String {
        format!("data:{};base64,{}", mime, general_purpose::STANDARD.encode(bytes))
    }
}

impl fmt::Display for DataUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Self::encode(&self.mime, &self.bytes))
    }
}
