use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A social platform. The six platforms the dashboard knows about carry
/// semantics (grouping, connector code paths); anything else round-trips as
/// a custom platform string and gets generic treatment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Platform {
    Instagram,
    TikTok,
    LinkedIn,
    X,
    Pinterest,
    YouTube,
    Other(String),
}

impl Platform {
    /// Canonical storage form: lowercase for known platforms, the original
    /// string for custom ones.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Platform::Instagram => "instagram",
            Platform::TikTok => "tiktok",
            Platform::LinkedIn => "linkedin",
            Platform::X => "x",
            Platform::Pinterest => "pinterest",
            Platform::YouTube => "youtube",
            Platform::Other(s) => s,
        }
    }

    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, Platform::Other(_))
    }
}

impl From<&str> for Platform {
    fn from(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "instagram" => Platform::Instagram,
            "tiktok" => Platform::TikTok,
            "linkedin" => Platform::LinkedIn,
            "x" | "twitter" => Platform::X,
            "pinterest" => Platform::Pinterest,
            "youtube" => Platform::YouTube,
            _ => Platform::Other(s.to_owned()),
        }
    }
}

impl From<String> for Platform {
    fn from(s: String) -> Self {
        Platform::from(s.as_str())
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Platform {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Platform {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Platform::from(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_platforms_round_trip() {
        for name in ["instagram", "tiktok", "linkedin", "x", "pinterest", "youtube"] {
            let platform = Platform::from(name);
            assert!(platform.is_known(), "{name} should be a known platform");
            assert_eq!(platform.as_str(), name);
        }
    }

    #[test]
    fn parsing_is_case_insensitive_for_known_platforms() {
        assert_eq!(Platform::from("Instagram"), Platform::Instagram);
        assert_eq!(Platform::from("TIKTOK"), Platform::TikTok);
    }

    #[test]
    fn twitter_is_an_alias_for_x() {
        assert_eq!(Platform::from("twitter"), Platform::X);
    }

    #[test]
    fn custom_platform_preserves_original_string() {
        let platform = Platform::from("Mastodon");
        assert_eq!(platform, Platform::Other("Mastodon".to_owned()));
        assert!(!platform.is_known());
        assert_eq!(platform.as_str(), "Mastodon");
    }

    #[test]
    fn serde_round_trip_uses_plain_strings() {
        let json = serde_json::to_string(&Platform::TikTok).unwrap();
        assert_eq!(json, "\"tiktok\"");
        let parsed: Platform = serde_json::from_str("\"threads\"").unwrap();
        assert_eq!(parsed, Platform::Other("threads".to_owned()));
    }
}
