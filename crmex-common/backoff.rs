use backon::{BackoffBuilder, ExponentialBackoff, ExponentialBuilder};
use std::time::{Duration, Instant};

#[cfg(test)]
#[path = "./backoff.tests.rs"]
mod backoff_tests;

const MIN_DELAY: Duration = Duration::from_millis(800);
const MAX_DELAY: Duration = Duration::from_secs(30);
const RESET_AFTER: Duration = Duration::from_secs(120);

/// Exponential backoff that starts over when errors keep coming for too long.
pub struct ResettableBackoff {
    backoff: ExponentialBackoff,
    builder: ExponentialBuilder,
    started: Instant,
    reset_after: Duration,
}

impl Default for ResettableBackoff {
    /// Creates backoff policy tuned for the Kubernetes API.
    fn default() -> Self {
        Self::new(MIN_DELAY, MAX_DELAY, true)
    }
}

impl ResettableBackoff {
    /// Creates new [`ResettableBackoff`] instance growing from `min_delay` up to `max_delay`.
    pub fn new(min_delay: Duration, max_delay: Duration, jitter: bool) -> Self {
        let mut builder = ExponentialBuilder::default()
            .with_min_delay(min_delay)
            .with_max_delay(max_delay)
            .with_factor(2.0)
            .without_max_times();
        if jitter {
            builder = builder.with_jitter();
        }

        Self {
            backoff: builder.build(),
            builder,
            started: Instant::now(),
            reset_after: RESET_AFTER,
        }
    }

    /// Returns next backoff duration.
    pub fn next_backoff(&mut self) -> Option<Duration> {
        if self.started.elapsed() > self.reset_after {
            self.reset();
        }

        self.backoff.next()
    }

    /// Starts the backoff sequence from the beginning.
    pub fn reset(&mut self) {
        self.started = Instant::now();
        self.backoff = self.builder.build();
    }
}
