//! Client for the image-to-video synthesis service.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use reel_core::capabilities::{ClipRequest, ProviderError, RemoteJob, VideoSynthesizer};

use crate::config::ProviderConfig;
use crate::http::{endpoint, parse_response, send};

/// Output aspect ratio for listing reels.
const ASPECT_RATIO: &str = "9:16";

#[derive(Clone)]
pub struct VideoSynthesisClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl VideoSynthesisClient {
    pub fn new(client: reqwest::Client, config: &ProviderConfig) -> Self {
        Self {
            client,
            base_url: config.video_synthesis_url.clone(),
            api_key: config.video_synthesis_key.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct GenerationStatus {
    state: String,
    #[serde(default)]
    failure_reason: Option<String>,
    #[serde(default)]
    assets: Option<GenerationAssets>,
}

#[derive(Debug, Deserialize)]
struct GenerationAssets {
    #[serde(default)]
    video: Option<String>,
}

/// Request body for one clip. Keyframe pairs send both frames.
fn generation_body(request: &ClipRequest) -> serde_json::Value {
    let mut keyframes = json!({
        "frame0": {"type": "image", "url": request.start_image_url},
    });
    if let Some(end) = &request.end_image_url {
        keyframes["frame1"] = json!({"type": "image", "url": end});
    }
    json!({
        "prompt": request.prompt,
        "keyframes": keyframes,
        "aspect_ratio": ASPECT_RATIO,
        "duration": format!("{}s", request.duration_seconds),
    })
}

impl GenerationStatus {
    fn into_remote_job(self) -> Result<RemoteJob<String>, ProviderError> {
        match self.state.as_str() {
            "completed" => self
                .assets
                .and_then(|a| a.video)
                .map(RemoteJob::Succeeded)
                .ok_or_else(|| ProviderError::Schema("completed generation has no video".into())),
            "failed" => Ok(RemoteJob::Failed(
                self.failure_reason
                    .unwrap_or_else(|| "no reason given".into()),
            )),
            _ => Ok(RemoteJob::Pending(Some(self.state))),
        }
    }
}

#[async_trait]
impl VideoSynthesizer for VideoSynthesisClient {
    async fn submit(&self, request: &ClipRequest) -> Result<String, ProviderError> {
        let response = send(
            self.client
                .post(endpoint(&self.base_url, "generations"))
                .bearer_auth(&self.api_key)
                .json(&generation_body(request)),
        )
        .await?;
        let submitted: SubmitResponse = parse_response(response).await?;
        tracing::debug!(job_id = %submitted.id, "Clip generation submitted");
        Ok(submitted.id)
    }

    async fn status(&self, job_id: &str) -> Result<RemoteJob<String>, ProviderError> {
        let response = send(
            self.client
                .get(endpoint(&self.base_url, &format!("generations/{job_id}")))
                .bearer_auth(&self.api_key),
        )
        .await?;
        let status: GenerationStatus = parse_response(response).await?;
        status.into_remote_job()
    }
}
