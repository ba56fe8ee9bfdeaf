//! Unbounded FIFO of job ids shared by all workers.
//!
//! Submission never blocks and there is no backpressure; the worker count
//! is what bounds concurrent provider calls.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use vizgen_core::error::CoreError;
use vizgen_core::types::JobId;

pub struct JobQueue {
    sender: mpsc::UnboundedSender<JobId>,
    /// Workers take turns holding the receiver while they wait.
    receiver: Mutex<mpsc::UnboundedReceiver<JobId>>,
    depth: AtomicUsize,
}

impl JobQueue {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: Mutex::new(receiver),
            depth: AtomicUsize::new(0),
        }
    }

    /// Append a job id.
    pub fn push(&self, job_id: JobId) -> Result<(), CoreError> {
        self.depth.fetch_add(1, Ordering::SeqCst);
        self.sender.send(job_id).map_err(|e| {
            self.depth.fetch_sub(1, Ordering::SeqCst);
            CoreError::Internal(format!("Job queue is closed, dropped {}", e.0))
        })
    }

    /// Wait up to `wait` for the next job id.
    ///
    /// Returns `None` on timeout. Cancel-safe: dropping the future never
    /// loses an id.
    pub async fn pop(&self, wait: Duration) -> Option<JobId> {
        let next = tokio::time::timeout(wait, async {
            let mut receiver = self.receiver.lock().await;
            receiver.recv().await
        })
        .await
        .ok()
        .flatten();

        if next.is_some() {
            self.depth.fetch_sub(1, Ordering::SeqCst);
        }
        next
    }

    /// Number of ids waiting to be picked up.
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}
