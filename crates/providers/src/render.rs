//! Client for the remote render service that materializes compositions.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use reel_core::capabilities::{AssetRef, Compositor, ProviderError, RemoteJob};
use reel_core::composition::Composition;

use crate::config::ProviderConfig;
use crate::http::{endpoint, parse_response, send};

/// Header carrying the render service API key.
const API_KEY_HEADER: &str = "x-api-key";

#[derive(Clone)]
pub struct RenderClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RenderClient {
    pub fn new(client: reqwest::Client, config: &ProviderConfig) -> Self {
        Self {
            client,
            base_url: config.render_url.clone(),
            api_key: config.render_key.clone(),
        }
    }
}

/// Every response is wrapped in a `response` envelope.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    response: T,
}

#[derive(Debug, Deserialize)]
struct Queued {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RenderStatus {
    id: String,
    status: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl RenderStatus {
    fn into_remote_job(self) -> Result<RemoteJob<AssetRef>, ProviderError> {
        match self.status.as_str() {
            "done" => {
                let url = self
                    .url
                    .ok_or_else(|| ProviderError::Schema("finished render has no url".into()))?;
                Ok(RemoteJob::Succeeded(AssetRef { id: self.id, url }))
            }
            "failed" => Ok(RemoteJob::Failed(
                self.error.unwrap_or_else(|| "render failed".into()),
            )),
            _ => Ok(RemoteJob::Pending(Some(self.status))),
        }
    }
}

#[async_trait]
impl Compositor for RenderClient {
    async fn submit(&self, composition: &Composition) -> Result<String, ProviderError> {
        let response = send(
            self.client
                .post(endpoint(&self.base_url, "render"))
                .header(API_KEY_HEADER, &self.api_key)
                .json(&json!({ "composition": composition })),
        )
        .await?;
        let queued: Envelope<Queued> = parse_response(response).await?;
        tracing::debug!(
            render_id = %queued.response.id,
            duration = composition.duration(),
            "Composition submitted"
        );
        Ok(queued.response.id)
    }

    async fn status(&self, render_id: &str) -> Result<RemoteJob<AssetRef>, ProviderError> {
        let response = send(
            self.client
                .get(endpoint(&self.base_url, &format!("render/{render_id}")))
                .header(API_KEY_HEADER, &self.api_key),
        )
        .await?;
        let status: Envelope<RenderStatus> = parse_response(response).await?;
        status.response.into_remote_job()
    }
}
