//! Message rate limiting.

use std::time::Duration;

use tracing::debug;

use crate::config::DeliveryConfig;

/// Fixed-ceiling throttle.
///
/// Every message attempt is recorded. Once `ceiling` attempts have been
/// recorded the throttle sleeps for `pause` and starts counting from zero.
#[derive(Debug, Clone)]
pub struct Throttle {
    count: u32,
    ceiling: u32,
    pause: Duration,
    pauses: u64,
}

impl Throttle {
    /// Create a throttle. A zero ceiling is treated as one.
    pub fn new(ceiling: u32, pause: Duration) -> Self {
        Self {
            count: 0,
            ceiling: ceiling.max(1),
            pause,
            pauses: 0,
        }
    }

    /// Create a throttle from the delivery configuration.
    pub fn from_config(config: &DeliveryConfig) -> Self {
        Self::new(config.ceiling, Duration::from_millis(config.pause_millis))
    }

    /// Record one message attempt, pausing if the ceiling is reached.
    ///
    /// Returns `true` if this call paused.
    pub async fn record(&mut self) -> bool {
        self.count += 1;
        if self.count < self.ceiling {
            return false;
        }

        debug!(
            "Reached {} message(s), pausing for {:?}",
            self.count, self.pause
        );
        tokio::time::sleep(self.pause).await;
        self.count = 0;
        self.pauses += 1;
        true
    }

    /// Attempts recorded since the last pause.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Configured ceiling.
    pub fn ceiling(&self) -> u32 {
        self.ceiling
    }

    /// Total number of pauses taken.
    pub fn pauses(&self) -> u64 {
        self.pauses
    }
}
