//! Paced permit pool shared by every family's launch loop.
//!
//! A counting semaphore bounds how many jobs run at once; a launch clock makes
//! sure successive launches are at least `launch_delay` apart, whether or not
//! permits are free.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{AcquireError, Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

use crate::policy::ConcurrencyPolicy;

#[derive(Debug)]
pub struct PacedPermitPool {
    permits: Arc<Semaphore>,
    capacity: usize,
    launch_delay: Duration,
    last_launch: Mutex<Option<Instant>>,
}

impl PacedPermitPool {
    /// Pool of `capacity` permits (at least 1) with the given launch spacing.
    pub fn new(capacity: usize, launch_delay: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
            launch_delay,
            last_launch: Mutex::new(None),
        }
    }

    /// Pool for a resolved policy. A disabled policy gets a single permit but
    /// keeps its launch delay.
    pub fn from_policy(policy: &ConcurrencyPolicy) -> Self {
        let capacity = if policy.enabled {
            policy.max_concurrency
        } else {
            1
        };
        Self::new(capacity, policy.launch_delay())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits not currently held.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    pub fn launch_delay(&self) -> Duration {
        self.launch_delay
    }

    /// Wait for a permit, then for the launch clock. The permit is released
    /// when the returned value is dropped.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, AcquireError> {
        let permit = Arc::clone(&self.permits).acquire_owned().await?;
        self.pace().await;
        Ok(permit)
    }

    async fn pace(&self) {
        let mut last = self.last_launch.lock().await;
        if let Some(prev) = *last {
            tokio::time::sleep_until(prev + self.launch_delay).await;
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pool_acquire_and_release() {
        let pool = PacedPermitPool::new(2, Duration::ZERO);
        assert_eq!(pool.available(), 2);
        let a = pool.acquire().await.unwrap();
        let b = pool.acquire().await.unwrap();
        assert_eq!(pool.available(), 0);
        drop(a);
        assert_eq!(pool.available(), 1);
        drop(b);
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn zero_capacity_becomes_one() {
        let pool = PacedPermitPool::new(0, Duration::ZERO);
        assert_eq!(pool.capacity(), 1);
    }

    #[test]
    fn disabled_policy_gets_one_permit() {
        let pool = PacedPermitPool::from_policy(&ConcurrencyPolicy::new(false, 8, 0.0));
        assert_eq!(pool.capacity(), 1);
        let pool = PacedPermitPool::from_policy(&ConcurrencyPolicy::new(true, 8, 0.25));
        assert_eq!(pool.capacity(), 8);
        assert_eq!(pool.launch_delay(), Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn launches_are_spaced_even_with_free_permits() {
        let pool = PacedPermitPool::new(10, Duration::from_secs(2));
        let mut stamps = Vec::new();
        for _ in 0..4 {
            let _permit = pool.acquire().await.unwrap();
            stamps.push(Instant::now());
        }
        for pair in stamps.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_secs(2));
        }
    }
}
