//! Random service: host entropy, constant midpoint, or stepped counter.

use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Random behavior selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RandomMode {
    /// Delegate to the host's entropy source, uniform over the range.
    #[default]
    Real,
    /// Always the midpoint `bound / 2`.
    Const,
    /// A per-instance counter: 1, 2, 3, … independent of the bound.
    Step,
}

impl FromStr for RandomMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "real" => Ok(Self::Real),
            "const" => Ok(Self::Const),
            "step" => Ok(Self::Step),
            _ => Err(ConfigError::UnknownMode {
                service: "random",
                value: s.to_owned(),
                expected: "real, const, step",
            }),
        }
    }
}

enum Strategy {
    Real,
    Const,
    Step { counter: AtomicU64 },
}

/// Mode-configured random number source.
///
/// STEP wraparound policy: once the counter would exceed the requested
/// bound it wraps back to 1, so `random_to(2)` yields 1, 2, 1, 2, …
/// The counter is scoped to this instance, never process-global.
pub struct RandomService {
    mode: RandomMode,
    strategy: Strategy,
}

impl RandomService {
    /// Builds a random source with the given behavior.
    pub fn new(mode: RandomMode) -> Self {
        let strategy = match mode {
            RandomMode::Real => Strategy::Real,
            RandomMode::Const => Strategy::Const,
            RandomMode::Step => Strategy::Step {
                counter: AtomicU64::new(0),
            },
        };
        Self { mode, strategy }
    }

    /// The mode this source was built with.
    pub fn mode(&self) -> RandomMode {
        self.mode
    }

    /// A number in `[0, bound]` inclusive.
    pub fn random_to(&self, bound: u64) -> u64 {
        match &self.strategy {
            Strategy::Real => rand::thread_rng().gen_range(0..=bound),
            Strategy::Const => bound / 2,
            Strategy::Step { counter } => {
                let next = |previous: u64| if previous >= bound { 1 } else { previous + 1 };
                let previous = counter
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |p| Some(next(p)))
                    .unwrap_or(0);
                next(previous)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_const_returns_midpoint() {
        let random = RandomService::new(RandomMode::Const);
        for _ in 0..5 {
            assert_eq!(random.random_to(10), 5);
        }
        assert_eq!(random.random_to(11), 5);
        assert_eq!(random.random_to(0), 0);
    }

    #[test]
    fn test_step_counts_from_one() {
        let random = RandomService::new(RandomMode::Step);
        assert_eq!(random.random_to(10_000), 1);
        assert_eq!(random.random_to(10_000), 2);
        assert_eq!(random.random_to(10_000), 3);
    }

    #[test]
    fn test_step_counter_is_per_instance() {
        let first = RandomService::new(RandomMode::Step);
        let second = RandomService::new(RandomMode::Step);
        assert_eq!(first.random_to(100), 1);
        assert_eq!(first.random_to(100), 2);
        assert_eq!(second.random_to(100), 1);
    }

    #[test]
    fn test_step_wraps_to_one_past_the_bound() {
        let random = RandomService::new(RandomMode::Step);
        assert_eq!(random.random_to(2), 1);
        assert_eq!(random.random_to(2), 2);
        assert_eq!(random.random_to(2), 1);
        assert_eq!(random.random_to(2), 2);
    }

    #[test]
    fn test_real_stays_in_range() {
        let random = RandomService::new(RandomMode::Real);
        for _ in 0..1_000 {
            assert!(random.random_to(10) <= 10);
        }
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let err = "entropy".parse::<RandomMode>().expect_err("should reject");
        assert!(matches!(
            err,
            ConfigError::UnknownMode {
                service: "random",
                ..
            }
        ));
    }
}
