//! Concurrency-limited request gate
//!
//! Bounds in-flight outbound catalog calls so bursty fan-out (many
//! simultaneous track resolutions) does not trip upstream rate
//! limits. Excess callers queue in FIFO order and are admitted as
//! running tasks complete, whether they succeeded or failed. The gate
//! provides no timeout or cancellation; callers needing bounded
//! latency wrap their own futures.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Default ceiling on concurrent gated calls
pub const DEFAULT_MAX_CONCURRENT: usize = 10;

/// FIFO gate over a fair semaphore, cheap to clone and share
#[derive(Debug, Clone)]
pub struct RequestGate {
    permits: Arc<Semaphore>,
}

impl RequestGate {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Run a task once a slot is free
    ///
    /// At most `max_concurrent` tasks execute at any instant; waiting
    /// callers are admitted in arrival order. A task's error is its
    /// caller's to handle and does not block other queued tasks.
    pub async fn run<F, T>(&self, task: F) -> T
    where
        F: Future<Output = T>,
    {
        // The semaphore is never closed, so acquire cannot fail
        let _permit = self
            .permits
            .acquire()
            .await
            .expect("request gate semaphore closed");
        task.await
    }
}

impl Default for RequestGate {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENT)
    }
}
