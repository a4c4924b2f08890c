//! Handlers for submitting generations and polling their status.

use std::collections::BTreeMap;

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use reel_core::error::CoreError;
use reel_core::property::{PhotoGroupMode, PropertyDetails};
use reel_core::types::{DbId, VideoId};
use reel_pipeline::admission::{admit, AdmissionError};
use reel_pipeline::request::{GenerationPayload, PhotoGroup};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::{AcceptedResponse, JobStatusResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Form parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GroupSpec {
    mode: PhotoGroupMode,
}

/// One image part, held in memory until the request is accepted.
#[derive(Debug)]
struct ImagePart {
    filename: String,
    content_type: String,
    bytes: Vec<u8>,
}

/// The multipart submission, before spooling.
#[derive(Debug, Default)]
struct SubmitForm {
    owner_id: Option<String>,
    job_id: Option<String>,
    property: Option<String>,
    groups: Option<String>,
    /// Keyed by `(group, image)` so iteration follows slot order.
    images: BTreeMap<(usize, usize), ImagePart>,
}

/// Parse `group_{n}_image_{m}` into `(n, m)`.
fn image_slot(name: &str) -> Option<(usize, usize)> {
    let rest = name.strip_prefix("group_")?;
    let (group, image) = rest.split_once("_image_")?;
    Some((group.parse().ok()?, image.parse().ok()?))
}

async fn read_form(multipart: &mut Multipart) -> AppResult<SubmitForm> {
    let mut form = SubmitForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if let Some(slot) = image_slot(&name) {
            let filename = field
                .file_name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("{name}.jpg"));
            let content_type = field.content_type().unwrap_or("image/jpeg").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read {name}: {e}")))?;
            form.images.insert(
                slot,
                ImagePart {
                    filename,
                    content_type,
                    bytes: bytes.to_vec(),
                },
            );
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read {name}: {e}")))?;
        match name.as_str() {
            "ownerId" => form.owner_id = Some(text),
            "jobId" => form.job_id = Some(text),
            "property" => form.property = Some(text),
            "groups" => form.groups = Some(text),
            other => tracing::debug!(field = other, "Ignoring unknown form field"),
        }
    }
    Ok(form)
}

fn required<'a>(value: &'a Option<String>, name: &str) -> AppResult<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("Missing field '{name}'")))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/videos
///
/// Validate, take one credit and queue the generation. Responds before any
/// generation work starts.
pub async fn create_video(
    auth: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<AcceptedResponse>)> {
    let form = read_form(&mut multipart).await?;

    let owner_id: DbId = required(&form.owner_id, "ownerId")?
        .parse()
        .map_err(|_| AppError::BadRequest("ownerId must be an integer".into()))?;
    if owner_id != auth.owner_id {
        return Err(CoreError::Forbidden("ownerId does not match the authenticated owner".into()).into());
    }

    let job_id: VideoId = required(&form.job_id, "jobId")?
        .parse()
        .map_err(|_| AppError::BadRequest("jobId must be a UUID".into()))?;
    let property: PropertyDetails = serde_json::from_str(required(&form.property, "property")?)
        .map_err(|e| AppError::BadRequest(format!("Invalid property JSON: {e}")))?;
    let specs: Vec<GroupSpec> = serde_json::from_str(required(&form.groups, "groups")?)
        .map_err(|e| AppError::BadRequest(format!("Invalid groups JSON: {e}")))?;

    if let Some((group, _)) = form.images.keys().find(|(g, _)| *g >= specs.len()) {
        return Err(AppError::BadRequest(format!(
            "Image for group {group} but only {} group(s) declared",
            specs.len()
        )));
    }

    // A duplicate id must not touch the existing job's spooled photos.
    if state.store.job(job_id).await?.is_some() {
        return Err(AdmissionError::Duplicate(job_id).into());
    }
    // Concurrent submissions of one id race here; only one gets the folder.
    match state.spool.reserve(job_id).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            return Err(AdmissionError::Duplicate(job_id).into());
        }
        Err(e) => return Err(AppError::InternalError(format!("Failed to spool upload: {e}"))),
    }

    let groups = match spool_groups(&state, job_id, &specs, form.images).await {
        Ok(groups) => groups,
        Err(e) => {
            state.spool.remove_job(job_id).await;
            return Err(e);
        }
    };
    let payload = GenerationPayload {
        owner_id,
        property,
        groups,
    };

    // The folder was created by this request, so it goes on any rejection.
    match admit(state.store.as_ref(), job_id, &payload).await {
        Ok(id) => Ok((StatusCode::ACCEPTED, Json(AcceptedResponse::new(id)))),
        Err(e) => {
            state.spool.remove_job(job_id).await;
            Err(e.into())
        }
    }
}

async fn spool_groups(
    state: &AppState,
    job_id: VideoId,
    specs: &[GroupSpec],
    images: BTreeMap<(usize, usize), ImagePart>,
) -> AppResult<Vec<PhotoGroup>> {
    let mut groups: Vec<PhotoGroup> = specs
        .iter()
        .map(|spec| PhotoGroup {
            mode: spec.mode,
            images: Vec::new(),
        })
        .collect();

    for ((group, image), part) in images {
        let spooled = state
            .spool
            .store(job_id, group, image, &part.filename, &part.content_type, &part.bytes)
            .await
            .map_err(|e| AppError::InternalError(format!("Failed to spool upload: {e}")))?;
        groups[group].images.push(spooled);
    }
    Ok(groups)
}

/// GET /api/v1/videos/{id}/status
pub async fn get_status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<VideoId>,
) -> AppResult<Json<JobStatusResponse>> {
    let video = state
        .store
        .job(id)
        .await?
        .filter(|v| v.owner_id == auth.owner_id)
        .ok_or_else(|| CoreError::not_found("Video", id))?;
    Ok(Json(video.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_slot_parses_part_names() {
        assert_eq!(image_slot("group_0_image_1"), Some((0, 1)));
        assert_eq!(image_slot("group_12_image_0"), Some((12, 0)));
        assert_eq!(image_slot("group_a_image_0"), None);
        assert_eq!(image_slot("property"), None);
    }
}
