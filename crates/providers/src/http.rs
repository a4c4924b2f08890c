//! Response helpers shared by every provider client.

use reel_core::capabilities::ProviderError;
use serde::de::DeserializeOwned;

/// Map a transport error into the capability error type.
pub fn request_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout(err.to_string())
    } else if err.is_decode() {
        ProviderError::Schema(err.to_string())
    } else {
        ProviderError::Request(err.to_string())
    }
}

/// Send a prepared request, mapping transport failures.
pub async fn send(request: reqwest::RequestBuilder) -> Result<reqwest::Response, ProviderError> {
    request.send().await.map_err(request_error)
}

/// Ensure the response has a success status code. Returns the response
/// unchanged on success, or [`ProviderError::Api`] with the status and body.
pub async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(ProviderError::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

/// Parse a successful JSON response body into the expected type.
pub async fn parse_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ProviderError> {
    let response = ensure_success(response).await?;
    let bytes = response.bytes().await.map_err(request_error)?;
    serde_json::from_slice(&bytes).map_err(|e| ProviderError::Schema(e.to_string()))
}

/// Read a successful response body as raw bytes.
pub async fn read_bytes(response: reqwest::Response) -> Result<Vec<u8>, ProviderError> {
    let response = ensure_success(response).await?;
    let bytes = response.bytes().await.map_err(request_error)?;
    Ok(bytes.to_vec())
}

/// Read a successful response body as text.
pub async fn read_text(response: reqwest::Response) -> Result<String, ProviderError> {
    let response = ensure_success(response).await?;
    response.text().await.map_err(request_error)
}

/// Join a base URL and a path without doubling slashes.
pub fn endpoint(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
