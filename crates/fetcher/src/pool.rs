//! Bounded pool of fetch workers.
//!
//! Jobs are admitted up to `workers + capacity`; at most `workers` of them
//! run at once, the rest wait for a running permit. Submission never
//! blocks: a saturated pool rejects the job and the caller decides what
//! to do with it.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Semaphore, TryAcquireError};

use crate::error::PoolError;

pub struct WorkerPool {
    admission: Arc<Semaphore>,
    running: Arc<Semaphore>,
}

impl WorkerPool {
    pub fn new(workers: usize, capacity: usize) -> Self {
        let workers = workers.max(1);
        Self {
            admission: Arc::new(Semaphore::new(workers + capacity)),
            running: Arc::new(Semaphore::new(workers)),
        }
    }

    /// Admit `job` without waiting.
    pub fn try_submit<F>(&self, job: F) -> Result<(), PoolError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let admitted = match self.admission.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(TryAcquireError::NoPermits) => return Err(PoolError::Full),
            Err(TryAcquireError::Closed) => return Err(PoolError::Stopped),
        };
        let running = self.running.clone();

        tokio::spawn(async move {
            let _admitted = admitted;
            // Closed while waiting: the pool was stopped before the job started.
            let Ok(_running) = running.acquire_owned().await else {
                return;
            };
            job.await;
        });
        Ok(())
    }

    /// Refuse new jobs and drop the ones still waiting. Jobs already
    /// running are left to finish.
    pub fn stop(&self) {
        self.admission.close();
        self.running.close();
    }

    pub fn is_stopped(&self) -> bool {
        self.admission.is_closed()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
