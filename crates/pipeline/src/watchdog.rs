//! Stall detection for claimed generation tasks.
//!
//! A run that stops heartbeating (worker crash, deploy, hung provider call)
//! would otherwise leave its job `processing` forever. Every
//! `watchdog_interval` the sweep fails any processing job whose task last
//! reported more than `stale_after` ago. Stale tasks are not resumed.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use reel_core::types::VideoId;

use crate::store::{StatusStore, StoreError};

/// Error text written to jobs failed by the sweep.
pub const STALL_MESSAGE: &str = "Generation stalled: no progress reported";

/// Fail every processing job whose task has been silent for `stale_after`.
pub async fn sweep(store: &dyn StatusStore, stale_after: Duration) -> Result<Vec<VideoId>, StoreError> {
    let cutoff = chrono::Duration::from_std(stale_after)
        .ok()
        .and_then(|age| Utc::now().checked_sub_signed(age));
    let Some(cutoff) = cutoff else {
        return Ok(Vec::new());
    };

    let failed = store.fail_stale(cutoff, STALL_MESSAGE).await?;
    for video_id in &failed {
        tracing::warn!(%video_id, "Stalled generation marked failed");
    }
    Ok(failed)
}

/// Run the sweep on `interval` until `cancel` is triggered.
pub async fn run(
    store: Arc<dyn StatusStore>,
    stale_after: Duration,
    interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(
        stale_after_secs = stale_after.as_secs(),
        interval_secs = interval.as_secs(),
        "Generation watchdog started"
    );

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Generation watchdog stopping");
                break;
            }
            _ = ticker.tick() => {
                match sweep(store.as_ref(), stale_after).await {
                    Ok(failed) if !failed.is_empty() => {
                        tracing::info!(failed = failed.len(), "Watchdog sweep failed stalled jobs");
                    }
                    Ok(_) => tracing::debug!("Watchdog sweep found nothing stale"),
                    Err(e) => tracing::error!(error = %e, "Watchdog sweep failed"),
                }
            }
        }
    }
}
