//! The [`GenerationEngine`] value and the state its workers share.
//!
//! Operations are split across modules by concern:
//!
//! - `submission`: [`GenerationEngine::submit`]
//! - `status`: job and campaign polling, cancellation, stats
//! - `lifecycle`: [`GenerationEngine::start_workers`] and
//!   [`GenerationEngine::stop_workers`]
//! - `worker`: the per-worker dequeue/process loop

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use tokio::sync::Mutex;
use vizgen_core::prompt::{PromptBuilder, TemplatePromptBuilder};
use vizgen_events::EventBus;
use vizgen_provider::Provider;

use crate::config::EngineConfig;
use crate::lifecycle::WorkerPool;
use crate::queue::JobQueue;
use crate::registry::JobRegistry;

/// State shared between the engine handle and every worker task.
pub(crate) struct EngineShared {
    pub(crate) config: EngineConfig,
    pub(crate) registry: JobRegistry,
    pub(crate) queue: JobQueue,
    pub(crate) provider: Arc<dyn Provider>,
    pub(crate) events: Arc<EventBus>,
    /// Jobs currently inside a provider call.
    pub(crate) in_flight: AtomicUsize,
}

/// Asynchronous visual-generation job engine.
///
/// Constructed once by the host process and shared as
/// `Arc<GenerationEngine>`. Submission and polling work whether or not
/// workers are running; queued jobs simply wait until they are.
pub struct GenerationEngine {
    pub(crate) shared: Arc<EngineShared>,
    pub(crate) prompt_builder: Arc<dyn PromptBuilder>,
    /// Held across a drain, so a restart waits for the old pool to exit.
    pub(crate) pool: Mutex<Option<WorkerPool>>,
    /// Size of the running pool; 0 while stopped or stopping.
    pub(crate) pool_size: AtomicUsize,
}

impl GenerationEngine {
    /// Create an engine with the default [`TemplatePromptBuilder`].
    pub fn new(config: EngineConfig, provider: Arc<dyn Provider>, events: Arc<EventBus>) -> Self {
        Self {
            shared: Arc::new(EngineShared {
                config,
                registry: JobRegistry::new(),
                queue: JobQueue::new(),
                provider,
                events,
                in_flight: AtomicUsize::new(0),
            }),
            prompt_builder: Arc::new(TemplatePromptBuilder),
            pool: Mutex::new(None),
            pool_size: AtomicUsize::new(0),
        }
    }

    /// Replace the prompt builder.
    pub fn with_prompt_builder(mut self, prompt_builder: Arc<dyn PromptBuilder>) -> Self {
        self.prompt_builder = prompt_builder;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }

    /// Event bus the engine publishes job events on.
    pub fn events(&self) -> &Arc<EventBus> {
        &self.shared.events
    }
}

impl Drop for GenerationEngine {
    fn drop(&mut self) {
        // Workers hold their own Arc to the shared state; make sure they
        // wind down if the host forgot to stop them.
        if let Some(pool) = self.pool.get_mut().take() {
            pool.signal_stop();
        }
    }
}
