use std::path::PathBuf;
use std::str::FromStr;

use crate::auth::jwt::JwtConfig;

/// Largest accepted submission body: 50 MiB, enough for a dozen photos.
const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Browser origins allowed to call the API.
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    /// How long in-flight requests may run after a shutdown signal.
    pub shutdown_timeout_secs: u64,
    pub jwt: JwtConfig,
    /// Where uploaded photos wait for the pipeline. Must be the directory
    /// the worker reads from.
    pub upload_spool_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                 |
    /// |-------------------------|-------------------------|
    /// | `HOST`                  | `0.0.0.0`               |
    /// | `PORT`                  | `3000`                  |
    /// | `CORS_ORIGINS`          | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`  | `60`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                    |
    /// | `UPLOAD_SPOOL_DIR`      | `data/spool`            |
    /// | `MAX_UPLOAD_BYTES`      | `52428800`              |
    ///
    /// JWT settings are documented on [`JwtConfig::from_env`].
    ///
    /// # Panics
    ///
    /// Panics when a numeric variable does not parse.
    pub fn from_env() -> Self {
        let cors_origins = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parsed("PORT", 3000),
            cors_origins,
            // Multipart uploads of several photos can be slow on mobile links.
            request_timeout_secs: parsed("REQUEST_TIMEOUT_SECS", 60),
            shutdown_timeout_secs: parsed("SHUTDOWN_TIMEOUT_SECS", 30),
            jwt: JwtConfig::from_env(),
            upload_spool_dir: std::env::var("UPLOAD_SPOOL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/spool")),
            max_upload_bytes: parsed("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
        }
    }
}

fn parsed<T: FromStr>(var: &str, default: T) -> T {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("{var} must be a valid number, got '{raw}'")),
        Err(_) => default,
    }
}
