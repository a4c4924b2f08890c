//! Background task dispatcher.
//!
//! Polls the task queue every `dispatch_interval` and starts a pipeline run
//! for each claimed task, up to `max_concurrency` at once. Claiming uses
//! `FOR UPDATE SKIP LOCKED` in the store, so several workers can share one
//! queue without double-dispatch. While a run is in flight its task
//! heartbeats every `heartbeat_interval`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use reel_core::types::VideoId;
use reel_db::models::generation_task::GenerationTask;

use crate::config::PipelineConfig;
use crate::orchestrator::{Orchestrator, RunOutcome};
use crate::request::GenerationPayload;
use crate::store::{StatusStore, StoreError};

pub struct Dispatcher {
    orchestrator: Orchestrator,
    permits: Arc<Semaphore>,
    tracker: TaskTracker,
    poll_interval: Duration,
    heartbeat_interval: Duration,
}

impl Dispatcher {
    pub fn new(orchestrator: Orchestrator, config: &PipelineConfig) -> Self {
        Self {
            orchestrator,
            permits: Arc::new(Semaphore::new(config.max_concurrency.max(1))),
            tracker: TaskTracker::new(),
            poll_interval: config.dispatch_interval,
            heartbeat_interval: config.heartbeat_interval,
        }
    }

    /// Run the dispatch loop until `cancel` is triggered, then wait for
    /// in-flight runs to finish.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        tracing::info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            max_concurrency = self.permits.available_permits(),
            "Generation dispatcher started",
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(in_flight = self.tracker.len(), "Generation dispatcher shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.dispatch_ready().await {
                        tracing::error!(error = %e, "Dispatch cycle failed");
                    }
                }
            }
        }

        self.wait_idle().await;
    }

    /// Claim and start as many queued tasks as there are free slots.
    /// Returns how many runs were started.
    pub async fn dispatch_ready(&self) -> Result<usize, StoreError> {
        let mut started = 0;
        loop {
            let Ok(permit) = self.permits.clone().try_acquire_owned() else {
                break;
            };
            let Some(task) = self.orchestrator.store().claim_next().await? else {
                break;
            };
            tracing::info!(video_id = %task.video_id, "Generation task claimed");
            self.spawn_run(task, permit);
            started += 1;
        }
        Ok(started)
    }

    /// Wait until every started run has finished.
    pub async fn wait_idle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    fn spawn_run(&self, task: GenerationTask, permit: OwnedSemaphorePermit) {
        let orchestrator = self.orchestrator.clone();
        let heartbeat_interval = self.heartbeat_interval;

        self.tracker.spawn(async move {
            let _permit = permit;
            let video_id = task.video_id;
            let store = orchestrator.store().clone();

            let beating = CancellationToken::new();
            let heartbeat = tokio::spawn(heartbeat(
                store.clone(),
                video_id,
                heartbeat_interval,
                beating.clone(),
            ));

            match serde_json::from_value::<GenerationPayload>(task.payload) {
                Ok(payload) => match orchestrator.run(video_id, &payload).await {
                    RunOutcome::Completed { captioned, .. } => {
                        tracing::debug!(%video_id, captioned, "Run finished");
                    }
                    RunOutcome::Failed { error } => {
                        tracing::debug!(%video_id, error = %error, "Run failed");
                    }
                    RunOutcome::Abandoned => tracing::debug!(%video_id, "Run abandoned"),
                },
                Err(e) => {
                    tracing::error!(%video_id, error = %e, "Malformed task payload");
                    if let Err(e) = store.fail(video_id, &format!("Malformed task payload: {e}")).await {
                        tracing::error!(%video_id, error = %e, "Failed to record job failure");
                    }
                }
            }

            beating.cancel();
            let _ = heartbeat.await;
            if let Err(e) = store.finish_task(video_id).await {
                tracing::error!(%video_id, error = %e, "Failed to mark task finished");
            }
        });
    }
}

/// Touch the task's heartbeat every `every` until `stop` fires.
async fn heartbeat(
    store: Arc<dyn StatusStore>,
    video_id: VideoId,
    every: Duration,
    stop: CancellationToken,
) {
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + every, every);
    loop {
        tokio::select! {
            _ = stop.cancelled() => break,
            _ = ticker.tick() => {
                if let Err(e) = store.heartbeat(video_id).await {
                    tracing::warn!(%video_id, error = %e, "Heartbeat failed");
                }
            }
        }
    }
}
