//! Per-platform publish scheduling.

use rand::Rng;
use serde::Deserialize;
use serde_json::json;

use postline_core::Platform;

use crate::client::Publisher;
use crate::error::PublisherError;
use crate::types::{OutboundPost, ScheduleReceipt};

#[derive(Debug, Deserialize)]
struct RemoteReceipt {
    id: String,
}

impl Publisher {
    /// Hand a publish job to a platform and return its identifier.
    ///
    /// Known platforms with a configured token post to the real API;
    /// everything else gets a synthetic identifier so the queue can make
    /// progress in un-credentialed environments.
    ///
    /// # Errors
    ///
    /// Returns [`PublisherError`] on HTTP or payload failures from a real
    /// API call. The synthetic path cannot fail.
    pub async fn schedule_post(
        &self,
        platform: &Platform,
        handle: &str,
        post: &OutboundPost,
    ) -> Result<ScheduleReceipt, PublisherError> {
        let Some(token) = self.credentials.token_for(platform) else {
            tracing::debug!(platform = %platform, handle, "no credential; issuing synthetic receipt");
            return Ok(synthesize_receipt(platform));
        };

        let url = match platform {
            Platform::Instagram => format!(
                "{}/v19.0/{handle}/media_publish",
                self.api_base("https://graph.instagram.com")
            ),
            Platform::TikTok => format!(
                "{}/v2/post/publish/content/init/",
                self.api_base("https://open.tiktokapis.com")
            ),
            Platform::LinkedIn => format!("{}/v2/posts", self.api_base("https://api.linkedin.com")),
            Platform::X => format!("{}/2/tweets", self.api_base("https://api.x.com")),
            Platform::Pinterest => {
                format!("{}/v5/pins", self.api_base("https://api.pinterest.com"))
            }
            Platform::YouTube => format!(
                "{}/upload/youtube/v3/videos?part=snippet,status",
                self.api_base("https://www.googleapis.com")
            ),
            // `token_for` returns None for custom platforms.
            Platform::Other(_) => return Ok(synthesize_receipt(platform)),
        };

        let body = json!({
            "handle": handle,
            "text": compose_text(post),
            "media": post.media_urls,
            "publish_at": post.scheduled_for.to_rfc3339(),
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let payload: RemoteReceipt =
            response
                .json()
                .await
                .map_err(|e| PublisherError::UnexpectedPayload {
                    platform: platform.to_string(),
                    reason: e.to_string(),
                })?;

        Ok(ScheduleReceipt {
            external_id: payload.id,
        })
    }
}

fn compose_text(post: &OutboundPost) -> String {
    if post.hashtags.is_empty() {
        return post.content.clone();
    }
    format!("{}\n\n{}", post.content, post.hashtags.join(" "))
}

fn synthesize_receipt(platform: &Platform) -> ScheduleReceipt {
    let mut rng = rand::rng();
    ScheduleReceipt {
        external_id: format!("{}-{:08x}", platform.as_str(), rng.random::<u32>()),
    }
}
