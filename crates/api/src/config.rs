use std::path::PathBuf;
use std::time::Duration;

use vizgen_provider::placeholder::DEFAULT_PLACEHOLDER_DELAY;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Upper bound on waiting for in-flight jobs at shutdown (default: `30`).
    pub shutdown_timeout_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `30`                       |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
        }
    }
}

/// Which generation backend the server talks to.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderConfig {
    /// A ComfyUI instance with one workflow template file per content type.
    ComfyUI {
        api_url: String,
        image_workflow: Option<PathBuf>,
        video_workflow: Option<PathBuf>,
        poll_interval: Duration,
    },
    /// Fake provider for local development.
    Placeholder { base_url: String, delay: Duration },
}

impl ProviderConfig {
    /// Load the provider selection from environment variables.
    ///
    /// `COMFYUI_URL` selects ComfyUI; otherwise the placeholder is used.
    ///
    /// | Env Var                    | Default                          |
    /// |----------------------------|----------------------------------|
    /// | `COMFYUI_URL`              | unset                            |
    /// | `COMFYUI_IMAGE_WORKFLOW`   | unset                            |
    /// | `COMFYUI_VIDEO_WORKFLOW`   | unset                            |
    /// | `COMFYUI_POLL_INTERVAL_MS` | `2000`                           |
    /// | `PLACEHOLDER_BASE_URL`     | `http://localhost:3000/generated`|
    /// | `PLACEHOLDER_DELAY_MS`     | `1500`                           |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        match non_empty("COMFYUI_URL") {
            Some(api_url) => {
                let poll_ms: u64 = non_empty("COMFYUI_POLL_INTERVAL_MS")
                    .unwrap_or_else(|| "2000".into())
                    .parse()
                    .expect("COMFYUI_POLL_INTERVAL_MS must be a valid u64");
                Self::ComfyUI {
                    api_url,
                    image_workflow: non_empty("COMFYUI_IMAGE_WORKFLOW").map(PathBuf::from),
                    video_workflow: non_empty("COMFYUI_VIDEO_WORKFLOW").map(PathBuf::from),
                    poll_interval: Duration::from_millis(poll_ms),
                }
            }
            None => {
                let delay_ms: u64 = non_empty("PLACEHOLDER_DELAY_MS")
                    .map(|v| v.parse().expect("PLACEHOLDER_DELAY_MS must be a valid u64"))
                    .unwrap_or(DEFAULT_PLACEHOLDER_DELAY.as_millis() as u64);
                Self::Placeholder {
                    base_url: non_empty("PLACEHOLDER_BASE_URL")
                        .unwrap_or_else(|| "http://localhost:3000/generated".into()),
                    delay: Duration::from_millis(delay_ms),
                }
            }
        }
    }
}
