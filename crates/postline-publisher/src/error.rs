use thiserror::Error;

#[derive(Debug, Error)]
pub enum PublisherError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected {platform} payload: {reason}")]
    UnexpectedPayload { platform: String, reason: String },
}
