use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

/// Spaces calls to a rate-limited capability by a fixed minimum interval.
/// The first acquisition passes immediately; each later one waits until
/// `interval` has elapsed since the previous acquisition completed.
#[derive(Debug)]
pub struct FixedIntervalLimiter {
    interval: Duration,
    last_acquired: Mutex<Option<Instant>>,
}

impl FixedIntervalLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_acquired: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub async fn acquire(&self) {
        let mut last = self.last_acquired.lock().await;
        if let Some(previous) = *last {
            let ready_at = previous + self.interval;
            if ready_at > Instant::now() {
                sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
    }
}
