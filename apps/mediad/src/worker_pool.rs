//! Bounded, non-blocking-overflow task admission with drain-on-shutdown
//! (spec.md §4.8, SPEC_FULL.md's worker pool section).
//!
//! A [`Semaphore`] gates admission: a full pool's [`WorkerPool::try_submit`]
//! fails immediately instead of queuing, which is what §4.8 means by "the
//! pool does not queue beyond its capacity". Every admitted task is tracked
//! in a [`JoinSet`] so [`WorkerPool::drain`] can wait out every in-flight
//! task before the caller releases the server handle.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Returned by [`WorkerPool::try_submit`] when the pool is at capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("worker pool is at capacity")]
pub struct PoolFull;

pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    tasks: Mutex<JoinSet<()>>,
}

impl WorkerPool {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self { semaphore: Arc::new(Semaphore::new(capacity.max(1))), tasks: Mutex::new(JoinSet::new()) }
    }

    /// Admits `task` if a permit is free; otherwise returns [`PoolFull`]
    /// without ever blocking the caller (§4.8 "overflow").
    pub fn try_submit<F>(&self, task: F) -> Result<(), PoolFull>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let permit = Arc::clone(&self.semaphore).try_acquire_owned().map_err(|_| PoolFull)?;
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.spawn(async move {
            task.await;
            drop(permit);
        });
        Ok(())
    }

    /// Waits for every admitted task — queued or already running — to
    /// finish. Callers must stop calling `try_submit` themselves first;
    /// `drain` does not close the pool to new admissions.
    pub async fn drain(&self) {
        let mut tasks = {
            let mut guard = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *guard)
        };
        while tasks.join_next().await.is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn admits_up_to_capacity_then_rejects() {
        let pool = WorkerPool::new(2);
        let inflight = Arc::new(AtomicUsize::new(0));
        for _ in 0..2 {
            let inflight = Arc::clone(&inflight);
            pool.try_submit(async move {
                inflight.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(30)).await;
            })
            .unwrap();
        }

        assert_eq!(pool.try_submit(async {}), Err(PoolFull));

        pool.drain().await;
        assert_eq!(inflight.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn drain_waits_for_in_flight_work_to_finish() {
        let pool = WorkerPool::new(1);
        let done = Arc::new(AtomicUsize::new(0));
        let done_task = Arc::clone(&done);
        pool.try_submit(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            done_task.store(1, Ordering::SeqCst);
        })
        .unwrap();

        pool.drain().await;
        assert_eq!(done.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn a_released_permit_is_available_to_the_next_submission() {
        let pool = WorkerPool::new(1);
        pool.try_submit(async {}).unwrap();
        pool.drain().await;
        assert!(pool.try_submit(async {}).is_ok());
    }
}
