//! Per-platform profile metrics collection.

use rand::Rng;
use rust_decimal::Decimal;
use serde::Deserialize;

use postline_core::Platform;

use crate::client::Publisher;
use crate::error::PublisherError;
use crate::types::MetricsSample;

/// Common shape the platform metrics endpoints are mapped onto.
#[derive(Debug, Deserialize)]
struct RemoteMetrics {
    followers: i64,
    growth_rate: Decimal,
    engagement_rate: Decimal,
}

impl Publisher {
    /// Fetch a metrics sample for a profile.
    ///
    /// Known platforms with a configured token hit the real API; everything
    /// else gets a synthesized sample.
    ///
    /// # Errors
    ///
    /// Returns [`PublisherError`] on HTTP or payload failures from a real
    /// API call. The synthetic path cannot fail.
    pub async fn fetch_metrics(
        &self,
        platform: &Platform,
        handle: &str,
    ) -> Result<MetricsSample, PublisherError> {
        let Some(token) = self.credentials.token_for(platform) else {
            tracing::debug!(platform = %platform, handle, "no credential; synthesizing metrics");
            return Ok(synthesize_metrics());
        };

        let url = match platform {
            Platform::Instagram => format!(
                "{}/v19.0/{handle}/insights",
                self.api_base("https://graph.instagram.com")
            ),
            Platform::TikTok => format!(
                "{}/v2/research/user/info?handle={handle}",
                self.api_base("https://open.tiktokapis.com")
            ),
            Platform::LinkedIn => format!(
                "{}/v2/organizationalEntityFollowerStatistics?entity={handle}",
                self.api_base("https://api.linkedin.com")
            ),
            Platform::X => format!(
                "{}/2/users/by/username/{handle}?user.fields=public_metrics",
                self.api_base("https://api.x.com")
            ),
            Platform::Pinterest => format!(
                "{}/v5/user_account/analytics?handle={handle}",
                self.api_base("https://api.pinterest.com")
            ),
            Platform::YouTube => format!(
                "{}/youtube/v3/channels?forHandle={handle}&part=statistics",
                self.api_base("https://www.googleapis.com")
            ),
            // `token_for` returns None for custom platforms.
            Platform::Other(_) => return Ok(synthesize_metrics()),
        };

        fetch_remote_metrics(self, platform, &url, token).await
    }
}

async fn fetch_remote_metrics(
    publisher: &Publisher,
    platform: &Platform,
    url: &str,
    token: &str,
) -> Result<MetricsSample, PublisherError> {
    let response = publisher
        .http
        .get(url)
        .bearer_auth(token)
        .send()
        .await?
        .error_for_status()?;

    let payload: RemoteMetrics =
        response
            .json()
            .await
            .map_err(|e| PublisherError::UnexpectedPayload {
                platform: platform.to_string(),
                reason: e.to_string(),
            })?;

    Ok(MetricsSample {
        follower_count: payload.followers,
        growth_rate: payload.growth_rate,
        engagement_rate: payload.engagement_rate,
    })
}

/// A plausible sample for dashboards running without platform accounts.
fn synthesize_metrics() -> MetricsSample {
    let mut rng = rand::rng();
    MetricsSample {
        follower_count: rng.random_range(500..250_000),
        // -2.50% .. +8.00%, two decimal places.
        growth_rate: Decimal::new(rng.random_range(-250..800), 2),
        // 0.50% .. 9.00%.
        engagement_rate: Decimal::new(rng.random_range(50..900), 2),
    }
}
