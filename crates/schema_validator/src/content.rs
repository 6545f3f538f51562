//! Decoders for `contentEncoding` and `contentMediaType`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use schema_core::Value;

/// Supported `contentEncoding` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEncoding {
    Base64,
}

impl ContentEncoding {
    /// Looks up an encoding by name; unknown encodings are not asserted.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "base64" => Some(Self::Base64),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Base64 => "base64",
        }
    }

    pub fn decode(self, content: &str) -> Result<Vec<u8>, String> {
        match self {
            Self::Base64 => STANDARD.decode(content).map_err(|e| e.to_string()),
        }
    }
}

/// Supported `contentMediaType` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Json,
}

impl MediaType {
    /// Looks up a media type, ignoring parameters such as `charset`.
    pub fn from_name(name: &str) -> Option<Self> {
        let essence = name.split(';').next().unwrap_or_default().trim();
        if essence.eq_ignore_ascii_case("application/json") {
            Some(Self::Json)
        } else {
            None
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Json => "application/json",
        }
    }

    /// Parses the decoded bytes, returning the value for `contentSchema`.
    pub fn parse(self, bytes: &[u8]) -> Result<Value, String> {
        match self {
            Self::Json => {
                let json: serde_json::Value =
                    serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
                Value::try_from(json).map_err(|e| e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_base64() {
        let encoding = ContentEncoding::from_name("BASE64").unwrap();
        assert_eq!(encoding.decode("eyJhIjoxfQ==").unwrap(), br#"{"a":1}"#.to_vec());
        assert!(encoding.decode("not base64!").is_err());
        assert_eq!(ContentEncoding::from_name("quoted-printable"), None);
    }

    #[test]
    fn test_json_media_type() {
        let media = MediaType::from_name("application/json; charset=utf-8").unwrap();
        assert_eq!(media.parse(br#"{"a":1}"#).unwrap(), Value::try_from(json!({"a": 1})).unwrap());
        assert!(media.parse(b"{").is_err());
        assert_eq!(MediaType::from_name("text/html"), None);
    }
}
