//! The narrow async contract between the engine and a synthesis backend.

use async_trait::async_trait;
use serde::Serialize;
use vizgen_core::content::ContentType;

/// Everything a provider needs to produce one asset.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    pub job_id: String,
    pub campaign_id: String,
    pub content_type: ContentType,
    pub prompt: String,
    /// Business context, objective and post snapshot.
    pub metadata: serde_json::Value,
}

/// A successfully generated asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationOutcome {
    /// Where the asset can be fetched from.
    pub result_url: String,
    /// Backend-side identifier (e.g. ComfyUI prompt id), for log correlation.
    pub provider_ref: Option<String>,
}

/// Why a generation attempt did not produce an asset.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GenerationError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("Provider request failed: {0}")]
    Request(String),

    /// The backend answered with a non-2xx status code.
    #[error("Provider API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The backend accepted the work but reported an execution error.
    #[error("Generation rejected by provider: {0}")]
    Rejected(String),

    /// The backend finished without any usable output.
    #[error("Provider returned no result URL")]
    EmptyResult,

    /// This provider cannot produce the requested kind of asset.
    #[error("Provider does not support {0} generation")]
    Unsupported(ContentType),

    /// The call exceeded its time budget.
    #[error("Generation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The provider call panicked.
    #[error("Provider panicked: {0}")]
    Panicked(String),
}

/// An external image/video synthesis backend.
///
/// Calls may take minutes and may fail; implementations must not retry on
/// their own. The engine owns timeouts and failure bookkeeping.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Generate one asset for `request`.
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutcome, GenerationError>;
}
