use std::sync::Mutex;
use std::time::Duration;

use bcast_core::{DelayPolicy, DelayScheduler, PacingScheduler};

/// Delegates to a seeded `PacingScheduler` and records every draw.
#[derive(Debug)]
pub struct CountingScheduler {
    inner: PacingScheduler,
    draws: Mutex<Vec<(DelayPolicy, Duration)>>,
}

impl Default for CountingScheduler {
    fn default() -> Self {
        Self {
            inner: PacingScheduler::seeded(7),
            draws: Mutex::new(Vec::new()),
        }
    }
}

impl CountingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.draws.lock().unwrap().len()
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.draws
            .lock()
            .unwrap()
            .iter()
            .map(|(_, delay)| *delay)
            .collect()
    }

    pub fn policies(&self) -> Vec<DelayPolicy> {
        self.draws
            .lock()
            .unwrap()
            .iter()
            .map(|(policy, _)| *policy)
            .collect()
    }
}

impl DelayScheduler for CountingScheduler {
    fn next_delay(&self, policy: &DelayPolicy) -> Duration {
        let delay = self.inner.next_delay(policy);
        self.draws.lock().unwrap().push((*policy, delay));
        delay
    }
}
