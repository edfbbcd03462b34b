//! Token-bucket pacing for search provider calls.

use scout_common::{Result, ScoutError};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

#[derive(Clone, Copy, Debug)]
struct BucketCfg {
    qps: f64,
    burst: f64,
}

#[derive(Debug)]
struct BucketState {
    cfg: BucketCfg,
    tokens: f64,
    last: Instant,
}

impl BucketState {
    fn new(cfg: BucketCfg) -> Self {
        Self {
            cfg,
            tokens: cfg.burst,
            last: Instant::now(),
        }
    }

    /// Returns wait time needed to have `need` tokens available (0 if ready).
    ///
    /// Tokens may go negative: a caller told to wait has already reserved
    /// its share, and the next caller queues behind that debt.
    fn needed_wait(&mut self, need: f64, now: Instant) -> Duration {
        if !self.cfg.qps.is_finite() || self.cfg.qps <= 0.0 {
            return Duration::ZERO;
        }

        let dt = now.duration_since(self.last).as_secs_f64();
        self.last = now;
        self.tokens = (self.tokens + dt * self.cfg.qps).min(self.cfg.burst);

        self.tokens -= need;
        if self.tokens >= 0.0 {
            Duration::ZERO
        } else {
            // A vanishing qps overflows Duration; wait "forever" instead.
            Duration::try_from_secs_f64(-self.tokens / self.cfg.qps).unwrap_or(Duration::MAX)
        }
    }
}

/// Gates search queries to `qps` with up to `burst` back-to-back calls.
#[derive(Debug)]
pub struct QueryPacer {
    bucket: Mutex<BucketState>,
}

impl QueryPacer {
    pub fn new(qps: f64, burst: u32) -> Self {
        let cfg = BucketCfg {
            qps,
            burst: burst.max(1) as f64,
        };
        Self {
            bucket: Mutex::new(BucketState::new(cfg)),
        }
    }

    /// Wait for one permit, or fail with [`ScoutError::Cancelled`].
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<()> {
        let wait = {
            let mut bucket = self
                .bucket
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            bucket.needed_wait(1.0, Instant::now())
        };
        if wait.is_zero() {
            return Ok(());
        }

        tracing::trace!(target: "rate", waited_ms = wait.as_millis() as u64, "pacer.wait");
        tokio::select! {
            _ = cancel.cancelled() => Err(ScoutError::Cancelled),
            _ = sleep(wait) => Ok(()),
        }
    }
}
