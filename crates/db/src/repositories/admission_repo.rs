//! The admission transaction: debit one credit, create the job and its task.

use sqlx::PgPool;

use crate::models::video::NewVideo;
use crate::repositories::{CreditRepo, GenerationTaskRepo, VideoRepo};

/// Progress text shown while a job waits for a dispatcher.
pub const QUEUED_STATUS_TEXT: &str = "Queued";

/// Result of one admission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionOutcome {
    /// One credit taken; job and task created.
    Admitted,
    /// No credit remained; nothing was written.
    InsufficientCredits,
    /// A job with this id already exists; nothing was written.
    Duplicate,
}

pub struct AdmissionRepo;

impl AdmissionRepo {
    /// Run admission in a single transaction.
    ///
    /// The credit debit is a conditional update, so concurrent admissions
    /// for the same owner can never take more credits than exist. Any
    /// failure after the debit rolls the whole transaction back.
    pub async fn admit(
        pool: &PgPool,
        video: &NewVideo,
        payload: &serde_json::Value,
    ) -> Result<AdmissionOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        if VideoRepo::exists(&mut tx, video.id).await? {
            return Ok(AdmissionOutcome::Duplicate);
        }

        if !CreditRepo::try_debit(&mut tx, video.owner_id).await? {
            return Ok(AdmissionOutcome::InsufficientCredits);
        }

        match VideoRepo::create_processing(&mut tx, video, QUEUED_STATUS_TEXT).await {
            Ok(_) => {}
            // Lost a race with a concurrent insert of the same id.
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                return Ok(AdmissionOutcome::Duplicate);
            }
            Err(e) => return Err(e),
        }
        GenerationTaskRepo::create(&mut tx, video.id, payload).await?;

        tx.commit().await?;
        tracing::info!(video_id = %video.id, owner_id = video.owner_id, "Video job admitted");
        Ok(AdmissionOutcome::Admitted)
    }
}
