//! Background dispatch of due publish jobs.
//!
//! A cron job sweeps the queue, hands each due row to its platform
//! connector, and records the outcome. One row failing never stops the
//! sweep; it is marked failed and the loop moves on.

use std::sync::Arc;

use chrono::Utc;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use postline_cache::Store;
use postline_core::Platform;
use postline_publisher::{OutboundPost, Publisher};

const DISPATCH_BATCH_SIZE: i64 = 50;

/// Builds and starts the background job scheduler with the dispatch sweep
/// registered on `dispatch_cron` (six-field cron, seconds first).
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive for
/// the lifetime of the process. Dropping it shuts down all scheduled jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised or
/// started.
pub async fn build_scheduler(
    store: Arc<Store>,
    publisher: Publisher,
    dispatch_cron: &str,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(dispatch_cron, move |_uuid, _lock| {
        let store = Arc::clone(&store);
        let publisher = publisher.clone();
        Box::pin(async move {
            if let Err(e) = dispatch_due(&store, &publisher).await {
                tracing::error!(error = %e, "dispatch sweep failed");
            }
        })
    })?;
    scheduler.add(job).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// One sweep: list due pending rows and dispatch each.
async fn dispatch_due(store: &Store, publisher: &Publisher) -> Result<(), postline_db::DbError> {
    let due =
        postline_db::list_due_scheduled_posts(store.pool(), Utc::now(), DISPATCH_BATCH_SIZE).await?;
    if due.is_empty() {
        return Ok(());
    }
    tracing::info!(count = due.len(), "dispatching due scheduled posts");

    for row in due {
        let profile = match store.profile(row.profile_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                store
                    .mark_scheduled_post_failed(row.id, "profile no longer exists")
                    .await?;
                continue;
            }
            Err(e) => {
                tracing::error!(error = %e, scheduled_post_id = row.id, "profile lookup failed");
                continue;
            }
        };

        let platform = Platform::from(profile.platform.as_str());
        let outbound = OutboundPost {
            content: row.content.clone(),
            hashtags: row.hashtags.clone(),
            media_urls: row.media_urls.clone(),
            scheduled_for: row.scheduled_for,
        };

        let outcome = publisher
            .schedule_post(&platform, &profile.handle, &outbound)
            .await;
        let result = match outcome {
            Ok(receipt) => {
                tracing::info!(
                    scheduled_post_id = row.id,
                    external_id = %receipt.external_id,
                    "scheduled post dispatched"
                );
                store
                    .mark_scheduled_post_sent(row.id, &receipt.external_id)
                    .await
            }
            Err(e) => {
                tracing::warn!(error = %e, scheduled_post_id = row.id, "dispatch failed");
                store
                    .mark_scheduled_post_failed(row.id, &e.to_string())
                    .await
            }
        };

        // A lost race with a manual dispatch is fine; anything else is worth
        // a log line, but the sweep continues.
        if let Err(e) = result {
            tracing::warn!(error = %e, scheduled_post_id = row.id, "could not record outcome");
        }
    }

    Ok(())
}
