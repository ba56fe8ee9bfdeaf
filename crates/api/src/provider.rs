//! Build the generation provider selected by [`ProviderConfig`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use vizgen_provider::api::ComfyUIApi;
use vizgen_provider::comfyui::{ComfyUIProvider, WorkflowTemplates};
use vizgen_provider::placeholder::PlaceholderProvider;
use vizgen_provider::Provider;

use crate::config::ProviderConfig;

/// Errors raised while wiring up a provider at startup.
#[derive(Debug, thiserror::Error)]
pub enum ProviderSetupError {
    #[error("Failed to read workflow template {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Workflow template {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Instantiate the configured provider.
pub fn build_provider(config: &ProviderConfig) -> Result<Arc<dyn Provider>, ProviderSetupError> {
    match config {
        ProviderConfig::ComfyUI {
            api_url,
            image_workflow,
            video_workflow,
            poll_interval,
        } => {
            let templates = WorkflowTemplates {
                image: image_workflow.as_deref().map(load_workflow).transpose()?,
                video: video_workflow.as_deref().map(load_workflow).transpose()?,
            };
            if templates.image.is_none() && templates.video.is_none() {
                tracing::warn!(api_url = %api_url, "ComfyUI configured without any workflow template");
            }
            tracing::info!(api_url = %api_url, "Using ComfyUI provider");
            let provider = ComfyUIProvider::new(ComfyUIApi::new(api_url.clone()), templates)
                .with_poll_interval(*poll_interval);
            Ok(Arc::new(provider))
        }
        ProviderConfig::Placeholder { base_url, delay } => {
            tracing::info!(base_url = %base_url, delay_ms = delay.as_millis() as u64, "Using placeholder provider");
            Ok(Arc::new(PlaceholderProvider::new(base_url.clone(), *delay)))
        }
    }
}

/// Read and parse an API-format workflow JSON file.
pub fn load_workflow(path: &Path) -> Result<serde_json::Value, ProviderSetupError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ProviderSetupError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ProviderSetupError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
