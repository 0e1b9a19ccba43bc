//! Caller-side retry strategies and predicates.
//!
//! [`execute`](crate::execute) never retries. A [`Client`](crate::Client) can
//! be configured to repeat calls whose [`ErrorResponse`] looks transient, with
//! a delay chosen by a [`RetryStrategy`]. Retrying is off by default.

use rand::Rng;
use std::time::Duration;

use crate::ErrorResponse;

/// Defines when and how to retry failed calls.
///
/// # Examples
///
/// ```
/// use vultr_rest::RetryStrategy;
/// use std::time::Duration;
///
/// // Exponential backoff: 100ms, 200ms, 400ms, 800ms...
/// let exponential = RetryStrategy::ExponentialBackoff {
///     initial_delay: Duration::from_millis(100),
///     max_delay: Duration::from_secs(30),
///     max_retries: 5,
///     jitter: true,
/// };
///
/// // Vultr allows 30 requests per second; a flat pause is often enough.
/// let linear = RetryStrategy::Linear {
///     delay: Duration::from_secs(1),
///     max_retries: 3,
/// };
/// assert_eq!(linear.delay_for_attempt(4), None);
/// ```
#[derive(Debug, Clone, Default)]
pub enum RetryStrategy {
    /// Do not retry.
    #[default]
    None,

    /// Retry with exponentially increasing delays.
    ///
    /// Each retry waits for `initial_delay * 2^(attempt - 1)`, capped at
    /// `max_delay`. Jitter scales the delay by a random factor in `0.5..=1.0`.
    ExponentialBackoff {
        /// The delay before the first retry.
        initial_delay: Duration,
        /// The maximum delay between retries.
        max_delay: Duration,
        /// The maximum number of retries.
        max_retries: usize,
        /// Whether to randomize delays.
        jitter: bool,
    },

    /// Retry with a fixed delay.
    Linear {
        /// The delay between attempts.
        delay: Duration,
        /// The maximum number of retries.
        max_retries: usize,
    },

    /// Custom delays: takes the retry number (1-indexed) and returns the delay
    /// before it, or `None` to stop.
    Custom {
        delay_fn: fn(attempt: usize) -> Option<Duration>,
    },
}

impl RetryStrategy {
    /// Returns the delay before the given retry, or `None` if retries are exhausted.
    ///
    /// `attempt` is 1-indexed: 1 is the first retry.
    pub fn delay_for_attempt(&self, attempt: usize) -> Option<Duration> {
        match self {
            RetryStrategy::None => None,
            RetryStrategy::ExponentialBackoff {
                initial_delay,
                max_delay,
                max_retries,
                jitter,
            } => {
                if attempt > *max_retries {
                    return None;
                }

                let exponent = u32::try_from(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
                let multiplier = 2u32.saturating_pow(exponent);
                let delay = initial_delay.saturating_mul(multiplier).min(*max_delay);

                if *jitter {
                    let jitter_factor = rand::thread_rng().gen_range(0.5..=1.0);
                    Some(delay.mul_f64(jitter_factor))
                } else {
                    Some(delay)
                }
            }
            RetryStrategy::Linear { delay, max_retries } => {
                if attempt > *max_retries {
                    None
                } else {
                    Some(*delay)
                }
            }
            RetryStrategy::Custom { delay_fn } => delay_fn(attempt),
        }
    }

    /// Returns the maximum number of retries, if bounded.
    pub fn max_retries(&self) -> Option<usize> {
        match self {
            RetryStrategy::None => Some(0),
            RetryStrategy::ExponentialBackoff { max_retries, .. } => Some(*max_retries),
            RetryStrategy::Linear { max_retries, .. } => Some(*max_retries),
            RetryStrategy::Custom { .. } => None,
        }
    }
}

/// Decides whether a failed call should be retried.
///
/// # Examples
///
/// ```
/// use vultr_rest::{ErrorResponse, RetryPredicate};
///
/// struct RetryOnLockedResource;
///
/// impl RetryPredicate for RetryOnLockedResource {
///     fn should_retry(&self, error: &ErrorResponse, _attempt: usize) -> bool {
///         error.status_code == 400 && error.error.contains("pending")
///     }
/// }
/// ```
pub trait RetryPredicate: Send + Sync {
    /// `attempt` is the number of the attempt that just failed (1-indexed).
    fn should_retry(&self, error: &ErrorResponse, attempt: usize) -> bool;
}

/// Retry whatever [`ErrorResponse::is_retryable`] accepts.
#[derive(Debug, Clone, Copy)]
pub struct RetryOnRetryable;

impl RetryPredicate for RetryOnRetryable {
    fn should_retry(&self, error: &ErrorResponse, _attempt: usize) -> bool {
        error.is_retryable()
    }
}

/// Retry only on 5xx responses.
#[derive(Debug, Clone, Copy)]
pub struct RetryOn5xx;

impl RetryPredicate for RetryOn5xx {
    fn should_retry(&self, error: &ErrorResponse, _attempt: usize) -> bool {
        error.is_server_error()
    }
}

/// Retry only on `429 Too Many Requests`.
#[derive(Debug, Clone, Copy)]
pub struct RetryOnRateLimit;

impl RetryPredicate for RetryOnRateLimit {
    fn should_retry(&self, error: &ErrorResponse, _attempt: usize) -> bool {
        error.status_code == 429
    }
}

/// Retry only on network-level failures (connection, timeout).
#[derive(Debug, Clone, Copy)]
pub struct RetryOnNetworkError;

impl RetryPredicate for RetryOnNetworkError {
    fn should_retry(&self, error: &ErrorResponse, _attempt: usize) -> bool {
        error.is_network_error()
    }
}

/// Retries if ANY of the predicates does.
///
/// # Examples
///
/// ```
/// use vultr_rest::retry::{OrPredicate, RetryOn5xx, RetryOnRateLimit};
///
/// let predicate = OrPredicate::new(vec![
///     Box::new(RetryOn5xx),
///     Box::new(RetryOnRateLimit),
/// ]);
/// ```
pub struct OrPredicate {
    predicates: Vec<Box<dyn RetryPredicate>>,
}

impl OrPredicate {
    pub fn new(predicates: Vec<Box<dyn RetryPredicate>>) -> Self {
        Self { predicates }
    }
}

impl RetryPredicate for OrPredicate {
    fn should_retry(&self, error: &ErrorResponse, attempt: usize) -> bool {
        self.predicates
            .iter()
            .any(|p| p.should_retry(error, attempt))
    }
}

/// Retries only if ALL of the predicates do.
pub struct AndPredicate {
    predicates: Vec<Box<dyn RetryPredicate>>,
}

impl AndPredicate {
    pub fn new(predicates: Vec<Box<dyn RetryPredicate>>) -> Self {
        Self { predicates }
    }
}

impl RetryPredicate for AndPredicate {
    fn should_retry(&self, error: &ErrorResponse, attempt: usize) -> bool {
        self.predicates
            .iter()
            .all(|p| p.should_retry(error, attempt))
    }
}
