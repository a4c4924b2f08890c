//! Provider endpoints and credentials.

/// Credentials and endpoints for every external provider.
///
/// Loaded once at startup; a missing key leaves the field empty and the
/// affected client fails its first request with an API error.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub openai_base_url: String,
    pub openai_api_key: String,
    pub vision_model: String,
    pub script_model: String,
    pub speech_model: String,
    pub transcription_model: String,
    /// `verbose_json` (segments with word timings) or `srt`.
    pub transcription_format: String,
    pub video_synthesis_url: String,
    pub video_synthesis_key: String,
    pub music_url: String,
    pub music_key: String,
    pub storage_upload_url: String,
    pub storage_cloud_name: String,
    pub storage_api_key: String,
    pub storage_api_secret: String,
    pub render_url: String,
    pub render_key: String,
    /// Timeout for any single provider HTTP request, in seconds.
    pub http_timeout_secs: u64,
}

impl ProviderConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                          |
    /// |----------------------------|----------------------------------|
    /// | `OPENAI_BASE_URL`          | `https://api.openai.com/v1`      |
    /// | `OPENAI_API_KEY`           | (empty)                          |
    /// | `OPENAI_VISION_MODEL`      | `gpt-4o`                         |
    /// | `OPENAI_SCRIPT_MODEL`      | `gpt-4o`                         |
    /// | `OPENAI_SPEECH_MODEL`      | `gpt-4o-mini-tts`                |
    /// | `OPENAI_TRANSCRIBE_MODEL`  | `whisper-1`                      |
    /// | `TRANSCRIPTION_FORMAT`     | `verbose_json`                   |
    /// | `VIDEO_SYNTHESIS_URL`      | `https://api.lumalabs.ai/dream-machine/v1` |
    /// | `VIDEO_SYNTHESIS_KEY`      | (empty)                          |
    /// | `MUSIC_API_URL`            | `https://api.sunoapi.org/api/v1` |
    /// | `MUSIC_API_KEY`            | (empty)                          |
    /// | `STORAGE_UPLOAD_URL`       | `https://api.cloudinary.com/v1_1`|
    /// | `STORAGE_CLOUD_NAME`       | (empty)                          |
    /// | `STORAGE_API_KEY`          | (empty)                          |
    /// | `STORAGE_API_SECRET`       | (empty)                          |
    /// | `RENDER_API_URL`           | `https://api.shotstack.io/v1`    |
    /// | `RENDER_API_KEY`           | (empty)                          |
    /// | `PROVIDER_HTTP_TIMEOUT_SECS` | `120`                          |
    pub fn from_env() -> Self {
        let var = |name: &str, default: &str| std::env::var(name).unwrap_or_else(|_| default.into());

        let http_timeout_secs: u64 = var("PROVIDER_HTTP_TIMEOUT_SECS", "120")
            .parse()
            .expect("PROVIDER_HTTP_TIMEOUT_SECS must be a valid u64");

        Self {
            openai_base_url: var("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            openai_api_key: var("OPENAI_API_KEY", ""),
            vision_model: var("OPENAI_VISION_MODEL", "gpt-4o"),
            script_model: var("OPENAI_SCRIPT_MODEL", "gpt-4o"),
            speech_model: var("OPENAI_SPEECH_MODEL", "gpt-4o-mini-tts"),
            transcription_model: var("OPENAI_TRANSCRIBE_MODEL", "whisper-1"),
            transcription_format: var("TRANSCRIPTION_FORMAT", "verbose_json"),
            video_synthesis_url: var(
                "VIDEO_SYNTHESIS_URL",
                "https://api.lumalabs.ai/dream-machine/v1",
            ),
            video_synthesis_key: var("VIDEO_SYNTHESIS_KEY", ""),
            music_url: var("MUSIC_API_URL", "https://api.sunoapi.org/api/v1"),
            music_key: var("MUSIC_API_KEY", ""),
            storage_upload_url: var("STORAGE_UPLOAD_URL", "https://api.cloudinary.com/v1_1"),
            storage_cloud_name: var("STORAGE_CLOUD_NAME", ""),
            storage_api_key: var("STORAGE_API_KEY", ""),
            storage_api_secret: var("STORAGE_API_SECRET", ""),
            render_url: var("RENDER_API_URL", "https://api.shotstack.io/v1"),
            render_key: var("RENDER_API_KEY", ""),
            http_timeout_secs,
        }
    }

    /// Shared HTTP client with the configured request timeout.
    pub fn http_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(self.http_timeout_secs))
            .build()
    }
}
