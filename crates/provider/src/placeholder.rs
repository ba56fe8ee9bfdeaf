//! Provider that fakes generation with a delay and a synthetic URL.
//!
//! Used by the host when no ComfyUI instance is configured, so the whole
//! submit/poll flow can be exercised on a laptop.

use std::time::Duration;

use async_trait::async_trait;
use vizgen_core::content::ContentType;

use crate::provider::{GenerationError, GenerationOutcome, GenerationRequest, Provider};

/// Default simulated generation time.
pub const DEFAULT_PLACEHOLDER_DELAY: Duration = Duration::from_millis(1500);

/// Succeeds after `delay` with `{base_url}/{type}/{campaign}/{uuid}.{ext}`.
pub struct PlaceholderProvider {
    base_url: String,
    delay: Duration,
}

impl PlaceholderProvider {
    pub fn new(base_url: impl Into<String>, delay: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            delay,
        }
    }

    fn extension(content_type: ContentType) -> &'static str {
        match content_type {
            ContentType::Image => "png",
            ContentType::Video => "mp4",
        }
    }
}

#[async_trait]
impl Provider for PlaceholderProvider {
    fn name(&self) -> &str {
        "placeholder"
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutcome, GenerationError> {
        tokio::time::sleep(self.delay).await;

        let asset_id = uuid::Uuid::new_v4();
        Ok(GenerationOutcome {
            result_url: format!(
                "{}/{}/{}/{asset_id}.{}",
                self.base_url,
                request.content_type,
                request.campaign_id,
                Self::extension(request.content_type),
            ),
            provider_ref: Some(asset_id.to_string()),
        })
    }
}
