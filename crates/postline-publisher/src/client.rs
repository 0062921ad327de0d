use std::time::Duration;

use postline_core::{AppConfig, Platform};

/// Connector construction settings.
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    pub request_timeout: Duration,
    pub user_agent: String,
    /// Test hook: when set, every platform endpoint is rooted here instead
    /// of the real API hosts.
    pub api_base_override: Option<String>,
}

impl PublisherConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            request_timeout: Duration::from_secs(config.publisher_request_timeout_secs),
            user_agent: config.publisher_user_agent.clone(),
            api_base_override: None,
        }
    }
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            user_agent: "postline/0.1 (content-ops)".to_string(),
            api_base_override: None,
        }
    }
}

/// Per-platform API tokens, read from `POSTLINE_<PLATFORM>_TOKEN`.
///
/// A missing token is not an error; the platform's connector synthesizes
/// results instead of calling out.
#[derive(Clone, Default)]
pub struct Credentials {
    pub instagram: Option<String>,
    pub tiktok: Option<String>,
    pub linkedin: Option<String>,
    pub x: Option<String>,
    pub pinterest: Option<String>,
    pub youtube: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |token: &Option<String>| token.as_ref().map(|_| "[redacted]");
        f.debug_struct("Credentials")
            .field("instagram", &redact(&self.instagram))
            .field("tiktok", &redact(&self.tiktok))
            .field("linkedin", &redact(&self.linkedin))
            .field("x", &redact(&self.x))
            .field("pinterest", &redact(&self.pinterest))
            .field("youtube", &redact(&self.youtube))
            .finish()
    }
}

impl Credentials {
    #[must_use]
    pub fn from_env() -> Self {
        let read = |var: &str| std::env::var(var).ok().filter(|v| !v.trim().is_empty());
        Self {
            instagram: read("POSTLINE_INSTAGRAM_TOKEN"),
            tiktok: read("POSTLINE_TIKTOK_TOKEN"),
            linkedin: read("POSTLINE_LINKEDIN_TOKEN"),
            x: read("POSTLINE_X_TOKEN"),
            pinterest: read("POSTLINE_PINTEREST_TOKEN"),
            youtube: read("POSTLINE_YOUTUBE_TOKEN"),
        }
    }

    #[must_use]
    pub fn token_for(&self, platform: &Platform) -> Option<&str> {
        match platform {
            Platform::Instagram => self.instagram.as_deref(),
            Platform::TikTok => self.tiktok.as_deref(),
            Platform::LinkedIn => self.linkedin.as_deref(),
            Platform::X => self.x.as_deref(),
            Platform::Pinterest => self.pinterest.as_deref(),
            Platform::YouTube => self.youtube.as_deref(),
            Platform::Other(_) => None,
        }
    }
}

/// Shared connector state: one HTTP client plus the credential set.
#[derive(Debug, Clone)]
pub struct Publisher {
    pub(crate) http: reqwest::Client,
    pub(crate) credentials: Credentials,
    pub(crate) api_base_override: Option<String>,
}

impl Publisher {
    /// Build the connector.
    ///
    /// # Errors
    ///
    /// Returns [`reqwest::Error`] if the HTTP client cannot be constructed.
    pub fn new(config: &PublisherConfig, credentials: Credentials) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            http,
            credentials,
            api_base_override: config.api_base_override.clone(),
        })
    }

    /// Resolve a platform's API base, honoring the test override.
    pub(crate) fn api_base<'a>(&'a self, default_base: &'a str) -> &'a str {
        self.api_base_override.as_deref().unwrap_or(default_base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_platforms_never_have_credentials() {
        let credentials = Credentials {
            instagram: Some("token".to_string()),
            ..Credentials::default()
        };
        assert_eq!(credentials.token_for(&Platform::Instagram), Some("token"));
        assert_eq!(
            credentials.token_for(&Platform::Other("threads".to_string())),
            None
        );
    }

    #[test]
    fn api_base_override_wins() {
        let publisher = Publisher::new(
            &PublisherConfig {
                api_base_override: Some("http://localhost:9999".to_string()),
                ..PublisherConfig::default()
            },
            Credentials::default(),
        )
        .expect("client");
        assert_eq!(
            publisher.api_base("https://graph.instagram.com"),
            "http://localhost:9999"
        );
    }
}
