//! Starting and stopping the worker pool.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use vizgen_core::error::CoreError;

use crate::engine::GenerationEngine;
use crate::error::EngineError;
use crate::worker::run_worker;

/// A running set of worker tasks sharing one stop signal.
pub(crate) struct WorkerPool {
    cancel: CancellationToken,
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl WorkerPool {
    pub(crate) fn size(&self) -> usize {
        self.handles.len()
    }

    /// Signal every worker to stop without waiting for them.
    pub(crate) fn signal_stop(&self) {
        self.cancel.cancel();
    }

    /// Signal stop and wait for every worker to exit.
    ///
    /// Workers finish the job they are processing first.
    async fn shutdown(self) {
        self.cancel.cancel();
        for (worker_id, handle) in self.handles.into_iter().enumerate() {
            if let Err(e) = handle.await {
                tracing::error!(worker_id, error = %e, "Generation worker exited abnormally");
            }
        }
    }
}

impl GenerationEngine {
    /// Spawn `worker_count` workers.
    ///
    /// A no-op if workers are already running. If a previous pool is still
    /// draining, waits for it to exit first. Requires a tokio runtime.
    pub async fn start_workers(&self, worker_count: usize) -> Result<(), EngineError> {
        if worker_count == 0 {
            return Err(CoreError::Validation("Worker count must be at least 1".to_string()).into());
        }

        let mut pool = self.pool.lock().await;
        if let Some(running) = pool.as_ref() {
            tracing::debug!(
                worker_count = running.size(),
                "Generation workers already running",
            );
            return Ok(());
        }

        let cancel = CancellationToken::new();
        let handles = (0..worker_count)
            .map(|worker_id| {
                tokio::spawn(run_worker(
                    worker_id,
                    Arc::clone(&self.shared),
                    cancel.child_token(),
                ))
            })
            .collect();

        *pool = Some(WorkerPool { cancel, handles });
        self.pool_size.store(worker_count, Ordering::SeqCst);
        tracing::info!(worker_count, "Generation workers started");
        Ok(())
    }

    /// Stop all workers and wait for them to exit.
    ///
    /// In-flight jobs run to completion; queued jobs stay queued and are
    /// picked up by the next [`start_workers`](Self::start_workers). A
    /// no-op if no workers are running.
    ///
    /// The pool lock stays held until every worker has exited, so the
    /// engine never has more than one pool's workers processing jobs.
    pub async fn stop_workers(&self) {
        let mut slot = self.pool.lock().await;
        let Some(pool) = slot.take() else {
            tracing::debug!("Generation workers already stopped");
            return;
        };
        self.pool_size.store(0, Ordering::SeqCst);

        let worker_count = pool.size();
        tracing::info!(worker_count, "Stopping generation workers");
        pool.shutdown().await;
        tracing::info!(worker_count, "Generation workers stopped");
    }

    /// Whether a worker pool is running and not stopping.
    ///
    /// Does not wait on a drain in progress.
    pub async fn is_running(&self) -> bool {
        self.pool_size.load(Ordering::SeqCst) > 0
    }

    /// Size of the running pool, 0 while stopped or stopping.
    pub(crate) fn worker_count(&self) -> usize {
        self.pool_size.load(Ordering::SeqCst)
    }
}
