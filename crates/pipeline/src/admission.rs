//! Admission gate: validate a request, take one credit, create the job.
//!
//! Runs synchronously on the request path. The credit check and debit are
//! a single conditional update inside the store, so concurrent submissions
//! from the same owner can never spend more credits than exist.

use reel_core::error::CoreError;
use reel_core::property::validate_request;
use reel_core::types::VideoId;
use reel_db::models::video::NewVideo;
use reel_db::repositories::AdmissionOutcome;

use crate::request::GenerationPayload;
use crate::store::{StatusStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum AdmissionError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("No video credits remaining")]
    InsufficientCredits,

    #[error("Job {0} already exists")]
    Duplicate(VideoId),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to encode task payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Admit `payload` as job `job_id`. On success the job is `processing` and
/// its task is queued; on any error nothing was written and no credit taken.
pub async fn admit(
    store: &dyn StatusStore,
    job_id: VideoId,
    payload: &GenerationPayload,
) -> Result<VideoId, AdmissionError> {
    validate_request(&payload.property, &payload.group_shapes()).map_err(|e| match e {
        CoreError::Validation(msg) => AdmissionError::Validation(msg),
        other => AdmissionError::Validation(other.to_string()),
    })?;

    // Cheap early exit; the authoritative check is the conditional debit.
    if store.credits(payload.owner_id).await? <= 0 {
        tracing::info!(owner_id = payload.owner_id, "Admission rejected: no credits");
        return Err(AdmissionError::InsufficientCredits);
    }

    let video = NewVideo {
        id: job_id,
        owner_id: payload.owner_id,
        title: payload.property.title.trim().to_string(),
    };
    let task_payload = serde_json::to_value(payload)?;

    match store.admit(&video, &task_payload).await? {
        AdmissionOutcome::Admitted => {
            tracing::info!(video_id = %job_id, owner_id = payload.owner_id, groups = payload.groups.len(), "Generation queued");
            Ok(job_id)
        }
        AdmissionOutcome::InsufficientCredits => Err(AdmissionError::InsufficientCredits),
        AdmissionOutcome::Duplicate => Err(AdmissionError::Duplicate(job_id)),
    }
}

impl From<AdmissionError> for CoreError {
    fn from(err: AdmissionError) -> Self {
        match err {
            AdmissionError::Validation(msg) => CoreError::Validation(msg),
            AdmissionError::InsufficientCredits => CoreError::InsufficientCredits,
            AdmissionError::Duplicate(id) => CoreError::Conflict(format!("Job {id} already exists")),
            other => CoreError::Internal(other.to_string()),
        }
    }
}
