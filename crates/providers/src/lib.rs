//! HTTP clients for the external capabilities the pipeline depends on.
//!
//! Each client wraps a [`reqwest::Client`] and implements one or more of the
//! capability traits from `reel_core::capabilities`. Provider-specific
//! response shapes are resolved to the core's tagged types here, so nothing
//! downstream ever sees raw provider JSON.

pub mod config;
pub mod http;
pub mod music;
pub mod openai;
pub mod render;
pub mod storage;
pub mod video_synthesis;

pub use config::ProviderConfig;
pub use music::MusicClient;
pub use openai::OpenAiClient;
pub use render::RenderClient;
pub use storage::CloudStorage;
pub use video_synthesis::VideoSynthesisClient;
