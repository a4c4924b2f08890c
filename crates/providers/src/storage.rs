//! Signed uploads to the media storage service.
//!
//! Requests are authenticated with a SHA-256 signature over the sorted
//! upload parameters followed by the API secret.

use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use reel_core::capabilities::{
    AssetRef, MediaKind, MediaStorage, ProviderError, UploadOptions, UploadSource,
};

use crate::config::ProviderConfig;
use crate::http::{endpoint, parse_response, request_error, send};

#[derive(Clone)]
pub struct CloudStorage {
    client: reqwest::Client,
    upload_url: String,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
}

/// Storage resource class for a media kind. Audio is stored as video.
fn resource_type(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Image => "image",
        MediaKind::Video | MediaKind::Audio => "video",
    }
}

/// Hex SHA-256 of `key=value` pairs joined with `&` in key order, followed
/// by the secret.
pub fn sign_params(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    let hash = Sha256::digest(format!("{joined}{api_secret}").as_bytes());
    format!("{hash:x}")
}

impl CloudStorage {
    pub fn new(client: reqwest::Client, config: &ProviderConfig) -> Self {
        Self {
            client,
            upload_url: config.storage_upload_url.clone(),
            cloud_name: config.storage_cloud_name.clone(),
            api_key: config.storage_api_key.clone(),
            api_secret: config.storage_api_secret.clone(),
        }
    }

    /// Public delivery URL for a stored asset.
    pub fn delivery_url(&self, kind: MediaKind, public_id: &str, format: &str) -> String {
        format!(
            "https://res.cloudinary.com/{}/{}/upload/{public_id}.{format}",
            self.cloud_name,
            resource_type(kind)
        )
    }

    fn signed_form(&self, options: &UploadOptions) -> multipart::Form {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let mut params = vec![
            ("folder", options.folder.clone()),
            ("timestamp", timestamp),
        ];
        if let Some(public_id) = &options.public_id {
            params.push(("public_id", public_id.clone()));
        }
        let signature = sign_params(&params, &self.api_secret);

        let mut form = multipart::Form::new()
            .text("api_key", self.api_key.clone())
            .text("signature", signature);
        for (key, value) in params {
            form = form.text(key, value);
        }
        form
    }
}

#[async_trait]
impl MediaStorage for CloudStorage {
    async fn upload(
        &self,
        source: UploadSource,
        options: &UploadOptions,
    ) -> Result<AssetRef, ProviderError> {
        let form = self.signed_form(options);
        let form = match source {
            UploadSource::Bytes {
                data,
                filename,
                content_type,
            } => {
                let part = multipart::Part::bytes(data)
                    .file_name(filename)
                    .mime_str(&content_type)
                    .map_err(request_error)?;
                form.part("file", part)
            }
            UploadSource::Url(url) => form.text("file", url),
        };

        let url = endpoint(
            &self.upload_url,
            &format!("{}/{}/upload", self.cloud_name, resource_type(options.kind)),
        );
        let response = send(self.client.post(url).multipart(form)).await?;
        let uploaded: UploadResponse = parse_response(response).await?;
        tracing::debug!(public_id = %uploaded.public_id, folder = %options.folder, "Asset uploaded");

        Ok(AssetRef {
            id: uploaded.public_id,
            url: uploaded.secure_url,
        })
    }
}
