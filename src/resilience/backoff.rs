//! Backoff delay functions.
//!
//! Every variant is a mapping from attempt index (1-based: the attempt that
//! just failed) to the wait before the next one.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use crate::config::{BackoffStrategy, RetryConfig};

/// Wait schedule between attempts.
#[derive(Clone)]
pub enum Backoff {
    /// Same wait every time.
    Fixed(Duration),
    /// Doubling wait, capped at `max`.
    Exponential {
        base: Duration,
        max: Duration,
        jitter: bool,
    },
    /// Caller-supplied schedule.
    Custom(Arc<dyn Fn(u32) -> Duration + Send + Sync>),
}

impl Backoff {
    /// No waiting at all; for tests.
    pub fn none() -> Self {
        Backoff::Fixed(Duration::ZERO)
    }

    pub fn custom(f: impl Fn(u32) -> Duration + Send + Sync + 'static) -> Self {
        Backoff::Custom(Arc::new(f))
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        let base = Duration::from_millis(config.base_delay_ms);
        match config.strategy {
            BackoffStrategy::Fixed => Backoff::Fixed(base),
            BackoffStrategy::Exponential => Backoff::Exponential {
                base,
                max: Duration::from_millis(config.max_delay_ms),
                jitter: config.jitter,
            },
        }
    }

    /// Wait to apply after `attempt` failed.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self {
            Backoff::Fixed(d) => *d,
            Backoff::Exponential { base, max, jitter } => {
                calculate_backoff(attempt, base.as_millis() as u64, max.as_millis() as u64, *jitter)
            }
            Backoff::Custom(f) => f(attempt),
        }
    }
}

impl fmt::Debug for Backoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backoff::Fixed(d) => f.debug_tuple("Fixed").field(d).finish(),
            Backoff::Exponential { base, max, jitter } => f
                .debug_struct("Exponential")
                .field("base", base)
                .field("max", max)
                .field("jitter", jitter)
                .finish(),
            Backoff::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Calculate exponential backoff delay, optionally with jitter.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64, jitter: bool) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    // Jitter: 0 to 10% of the delay, never past the cap
    let jitter_range = capped_delay / 10;
    let jitter_ms = if jitter && jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay.saturating_add(jitter_ms).min(max_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_calculation() {
        assert_eq!(calculate_backoff(1, 100, 2000, false), Duration::from_millis(100));
        assert_eq!(calculate_backoff(2, 100, 2000, false), Duration::from_millis(200));
        assert_eq!(calculate_backoff(3, 100, 2000, false), Duration::from_millis(400));
        assert_eq!(calculate_backoff(10, 100, 1000, false), Duration::from_millis(1000));
    }

    #[test]
    fn test_jitter_stays_in_range() {
        for _ in 0..50 {
            let d = calculate_backoff(2, 100, 2000, true);
            assert!(d >= Duration::from_millis(200));
            assert!(d < Duration::from_millis(220));
        }
    }

    #[test]
    fn test_exponential_is_non_decreasing() {
        let backoff = Backoff::Exponential {
            base: Duration::from_millis(50),
            max: Duration::from_millis(700),
            jitter: false,
        };
        let delays: Vec<_> = (1..=8).map(|a| backoff.delay_for(a)).collect();
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*delays.last().unwrap(), Duration::from_millis(700));
    }

    #[test]
    fn test_jittered_exponential_is_non_decreasing_and_capped() {
        let backoff = Backoff::Exponential {
            base: Duration::from_millis(100),
            max: Duration::from_millis(400),
            jitter: true,
        };
        for _ in 0..200 {
            let delays: Vec<_> = (1..=6).map(|a| backoff.delay_for(a)).collect();
            assert!(delays.windows(2).all(|w| w[0] <= w[1]), "{:?}", delays);
            assert!(delays.iter().all(|d| *d <= Duration::from_millis(400)));
            assert_eq!(delays[5], Duration::from_millis(400));
        }
    }

    #[test]
    fn test_custom_and_none() {
        let backoff = Backoff::custom(|attempt| Duration::from_millis(attempt as u64 * 3));
        assert_eq!(backoff.delay_for(4), Duration::from_millis(12));
        assert_eq!(Backoff::none().delay_for(7), Duration::ZERO);
    }

    #[test]
    fn test_from_config() {
        let mut config = RetryConfig::default();
        config.strategy = BackoffStrategy::Fixed;
        config.base_delay_ms = 25;
        let backoff = Backoff::from_config(&config);
        assert_eq!(backoff.delay_for(1), Duration::from_millis(25));
        assert_eq!(backoff.delay_for(5), Duration::from_millis(25));
    }
}
