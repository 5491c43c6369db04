use serde::{de::DeserializeOwned, Serialize};

use crate::{CascadeError, Result};

/// Response body handed to validators.
///
/// Bodies declared as JSON are parsed; everything else stays opaque text.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Json(serde_json::Value),
    Text(String),
}

impl Payload {
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            Self::Json(_) => None,
        }
    }

    /// Decodes the payload into a collaborator-defined type.
    ///
    /// Text payloads are parsed as JSON first, since some sources serve JSON
    /// under a `text/plain` content type.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        match self {
            Self::Json(value) => T::deserialize(value)
                .map_err(|err| CascadeError::Decode(format!("payload shape mismatch: {err}"))),
            Self::Text(body) => serde_json::from_str(body)
                .map_err(|err| CascadeError::Decode(format!("text payload is not JSON: {err}"))),
        }
    }
}

/// Returns true when a `Content-Type` value declares a JSON body.
///
/// Any `application/*` subtype ending in `json` counts, which covers
/// `application/json`, `application/dns-json` and `+json` suffixes.
/// Newline-delimited `ndjson` is not a single document and stays text.
pub(crate) fn is_json_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence
        .strip_prefix("application/")
        .is_some_and(|subtype| subtype.ends_with("json") && !subtype.ends_with("ndjson"))
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::{is_json_content_type, Payload};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Answer {
        status: u32,
    }

    #[test]
    fn json_content_types() {
        assert!(is_json_content_type("application/json"));
        assert!(is_json_content_type("Application/JSON; charset=utf-8"));
        assert!(is_json_content_type("application/dns-json"));
        assert!(is_json_content_type("application/problem+json"));
        assert!(!is_json_content_type("application/x-ndjson"));
        assert!(!is_json_content_type("application/jsonp"));
        assert!(!is_json_content_type("application/octet-stream"));
        assert!(!is_json_content_type("text/plain"));
        assert!(!is_json_content_type("text/html; charset=utf-8"));
        assert!(!is_json_content_type(""));
    }

    #[test]
    fn accessors_match_variant() {
        let json = Payload::Json(json!({"Status": 0}));
        assert!(json.as_json().is_some());
        assert!(json.as_text().is_none());

        let text = Payload::Text("1.2.3.4".to_owned());
        assert_eq!(text.as_text(), Some("1.2.3.4"));
        assert!(text.as_json().is_none());
    }

    #[test]
    fn decode_handles_both_shapes() {
        let json = Payload::Json(json!({"status": 3}));
        assert_eq!(json.decode::<Answer>().unwrap(), Answer { status: 3 });

        let text = Payload::Text(r#"{"status": 4}"#.to_owned());
        assert_eq!(text.decode::<Answer>().unwrap(), Answer { status: 4 });

        let bad = Payload::Text("<html>".to_owned());
        assert!(bad.decode::<Answer>().is_err());
    }
}
