use std::sync::Mutex;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::validate::ValidationError;

/// Conservative gap used when no anti-detection pacing is requested.
pub const DEFAULT_FIXED_DELAY_MS: u64 = 350;

/// Pacing between consecutive sends of one job.
///
/// ```
/// use bcast_core::DelayPolicy;
///
/// let policy: DelayPolicy = serde_json::from_str(r#"{"mode":"random","min_ms":5000,"max_ms":10000}"#).unwrap();
/// assert_eq!(policy, DelayPolicy::ANTI_DETECTION_SHORT);
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DelayPolicy {
    Fixed { ms: u64 },
    Random { min_ms: u64, max_ms: u64 },
}

impl Default for DelayPolicy {
    fn default() -> Self {
        DelayPolicy::Fixed {
            ms: DEFAULT_FIXED_DELAY_MS,
        }
    }
}

impl DelayPolicy {
    pub const ANTI_DETECTION_SHORT: DelayPolicy = DelayPolicy::Random {
        min_ms: 5_000,
        max_ms: 10_000,
    };
    pub const ANTI_DETECTION_LONG: DelayPolicy = DelayPolicy::Random {
        min_ms: 10_000,
        max_ms: 20_000,
    };

    pub fn fixed(ms: u64) -> Self {
        DelayPolicy::Fixed { ms }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match *self {
            DelayPolicy::Random { min_ms, max_ms } if min_ms > max_ms => {
                Err(ValidationError::InvalidDelayBand { min_ms, max_ms })
            }
            _ => Ok(()),
        }
    }

    /// Longest wait this policy can produce.
    pub fn upper_bound(&self) -> Duration {
        match *self {
            DelayPolicy::Fixed { ms } => Duration::from_millis(ms),
            DelayPolicy::Random { max_ms, .. } => Duration::from_millis(max_ms),
        }
    }
}

/// Source of inter-send delays. Called once between each pair of sends.
pub trait DelayScheduler: Send + Sync {
    fn next_delay(&self, policy: &DelayPolicy) -> Duration;
}

/// Default scheduler: fixed gaps as-is, random gaps drawn uniformly from the
/// inclusive band on every call.
#[derive(Debug, Default)]
pub struct PacingScheduler {
    seeded: Option<Mutex<StdRng>>,
}

impl PacingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deterministic draws for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seeded: Some(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }

    fn draw(&self, min_ms: u64, max_ms: u64) -> u64 {
        if min_ms >= max_ms {
            return min_ms;
        }
        match &self.seeded {
            Some(rng) => {
                let mut rng = rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                rng.random_range(min_ms..=max_ms)
            }
            None => rand::rng().random_range(min_ms..=max_ms),
        }
    }
}

impl DelayScheduler for PacingScheduler {
    fn next_delay(&self, policy: &DelayPolicy) -> Duration {
        match *policy {
            DelayPolicy::Fixed { ms } => Duration::from_millis(ms),
            DelayPolicy::Random { min_ms, max_ms } => Duration::from_millis(self.draw(min_ms, max_ms)),
        }
    }
}
