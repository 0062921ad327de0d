//! Persisted wire format for per-target post copy.
//!
//! `copies` is stored as an opaque structured column. Older rows hold a JSON
//! string containing the encoded list; newer rows hold the list itself.
//! Anything else is treated as absent rather than failing the whole row.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::platform::Platform;

/// One platform- or profile-targeted variant of a post's text.
///
/// `profile_id` is absent on legacy rows written before per-profile copy
/// existed; those entries apply platform-wide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformCopy {
    pub platform: Platform,
    pub content: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<i64>,
}

/// Defensively parse a stored `copies` value.
///
/// A JSON string is parsed as an encoded list; a list is used as-is; any
/// other shape (object, number, null, malformed string) yields `None`.
#[must_use]
pub fn parse_copies(value: &Value) -> Option<Vec<PlatformCopy>> {
    match value {
        Value::String(raw) => serde_json::from_str(raw).ok(),
        Value::Array(_) => serde_json::from_value(value.clone()).ok(),
        _ => None,
    }
}

/// Encode copies in the canonical list form.
#[must_use]
pub fn encode_copies(copies: &[PlatformCopy]) -> Value {
    serde_json::to_value(copies).unwrap_or_else(|_| Value::Array(Vec::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Vec<PlatformCopy> {
        vec![
            PlatformCopy {
                platform: Platform::Instagram,
                content: "spring drop".to_owned(),
                hashtags: vec!["#spring".to_owned()],
                profile_id: Some(7),
            },
            PlatformCopy {
                platform: Platform::TikTok,
                content: "spring drop, but vertical".to_owned(),
                hashtags: vec![],
                profile_id: None,
            },
        ]
    }

    #[test]
    fn parses_a_json_list() {
        let value = encode_copies(&sample());
        assert_eq!(parse_copies(&value), Some(sample()));
    }

    #[test]
    fn parses_a_string_wrapped_list() {
        let encoded = serde_json::to_string(&sample()).unwrap();
        let value = Value::String(encoded);
        assert_eq!(parse_copies(&value), Some(sample()));
    }

    #[test]
    fn rejects_other_shapes() {
        assert_eq!(parse_copies(&json!({"platform": "instagram"})), None);
        assert_eq!(parse_copies(&json!(42)), None);
        assert_eq!(parse_copies(&Value::Null), None);
        assert_eq!(parse_copies(&Value::String("not json".to_owned())), None);
    }

    #[test]
    fn missing_hashtags_and_profile_id_default() {
        let value = json!([{"platform": "pinterest", "content": "pin it"}]);
        let copies = parse_copies(&value).unwrap();
        assert_eq!(copies[0].platform, Platform::Pinterest);
        assert!(copies[0].hashtags.is_empty());
        assert_eq!(copies[0].profile_id, None);
    }

    #[test]
    fn profile_id_is_omitted_from_encoding_when_absent() {
        let value = encode_copies(&[PlatformCopy {
            platform: Platform::X,
            content: "short".to_owned(),
            hashtags: vec![],
            profile_id: None,
        }]);
        assert!(value[0].get("profile_id").is_none());
    }
}
