use vizgen_core::error::CoreError;
use vizgen_provider::GenerationError;

/// Errors surfaced by the engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A domain-level error (validation, not found, illegal transition).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The provider failed to produce an asset.
    #[error(transparent)]
    Generation(#[from] GenerationError),
}
