//! Client for the background-music generation service.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use reel_core::capabilities::{
    GeneratedTrack, MusicGenerator, MusicRequest, ProviderError, RemoteJob,
};

use crate::config::ProviderConfig;
use crate::http::{endpoint, parse_response, send};

#[derive(Clone)]
pub struct MusicClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl MusicClient {
    pub fn new(client: reqwest::Client, config: &ProviderConfig) -> Self {
        Self {
            client,
            base_url: config.music_url.clone(),
            api_key: config.music_key.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackStatus {
    status: String,
    #[serde(default)]
    audio_url: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    error_message: Option<String>,
}

impl TrackStatus {
    fn into_remote_job(self) -> Result<RemoteJob<GeneratedTrack>, ProviderError> {
        match self.status.to_ascii_lowercase().as_str() {
            "success" | "complete" | "completed" => {
                let url = self
                    .audio_url
                    .ok_or_else(|| ProviderError::Schema("finished track has no audio url".into()))?;
                Ok(RemoteJob::Succeeded(GeneratedTrack {
                    url,
                    duration_seconds: self.duration,
                }))
            }
            "failed" | "error" => Ok(RemoteJob::Failed(
                self.error_message.unwrap_or_else(|| "no reason given".into()),
            )),
            _ => Ok(RemoteJob::Pending(Some(self.status))),
        }
    }
}

#[async_trait]
impl MusicGenerator for MusicClient {
    async fn submit(&self, request: &MusicRequest) -> Result<String, ProviderError> {
        let body = json!({
            "prompt": request.prompt,
            "duration": request.duration_seconds,
            "instrumental": request.instrumental,
        });
        let response = send(
            self.client
                .post(endpoint(&self.base_url, "generate"))
                .bearer_auth(&self.api_key)
                .json(&body),
        )
        .await?;
        let submitted: SubmitResponse = parse_response(response).await?;
        Ok(submitted.id)
    }

    async fn status(&self, job_id: &str) -> Result<RemoteJob<GeneratedTrack>, ProviderError> {
        let response = send(
            self.client
                .get(endpoint(&self.base_url, &format!("generate/{job_id}")))
                .bearer_auth(&self.api_key),
        )
        .await?;
        let status: TrackStatus = parse_response(response).await?;
        status.into_remote_job()
    }
}
