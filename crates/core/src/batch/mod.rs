//! Batch limits and the retry schedule for partially-failed batch writes.

use std::time::Duration;

/// Maximum keys per batch read.
pub const BATCH_GET_LIMIT: usize = 100;

/// Maximum requests per batch write.
pub const BATCH_WRITE_LIMIT: usize = 25;

/// How partially-failed batch writes are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Number of retries allowed after the first attempt.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 9,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt`: `2^attempt * base * jitter`, capped at `max_delay`.
    ///
    /// `jitter` is clamped to `[0, 1]`.
    pub fn backoff_delay(&self, attempt: u32, jitter: f64) -> Duration {
        let jitter = if jitter.is_nan() {
            0.0
        } else {
            jitter.clamp(0.0, 1.0)
        };
        let factor = 2f64.powi(attempt.min(63) as i32);
        let delay = self.base_delay.as_nanos() as f64 * factor * jitter;
        let capped = delay.min(self.max_delay.as_nanos() as f64);
        Duration::from_nanos(capped as u64)
    }
}

/// Progress of one batch write through its retries.
///
/// `attempt` counts from zero; the write for attempt `n` is issued only while `n <= max_retries`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchWriteState {
    /// Ready to issue the write for `attempt`.
    Pending { attempt: u32 },
    /// The write for `attempt` left `unprocessed` requests behind.
    PartiallyFailed { attempt: u32, unprocessed: usize },
    /// Every request was written.
    Succeeded { attempts: u32 },
    /// Retries exhausted with requests still unprocessed.
    Aborted { attempts: u32 },
}

impl BatchWriteState {
    pub fn start() -> Self {
        BatchWriteState::Pending { attempt: 0 }
    }

    /// Records the store's answer to the pending write.
    pub fn on_response(self, unprocessed: usize) -> Self {
        match self {
            BatchWriteState::Pending { attempt } if unprocessed == 0 => {
                BatchWriteState::Succeeded {
                    attempts: attempt + 1,
                }
            }
            BatchWriteState::Pending { attempt } => BatchWriteState::PartiallyFailed {
                attempt,
                unprocessed,
            },
            other => other,
        }
    }

    /// Moves a partial failure on to the next attempt, or aborts once retries are exhausted.
    pub fn retry(self, policy: &RetryPolicy) -> Self {
        match self {
            BatchWriteState::PartiallyFailed { attempt, .. } if attempt + 1 > policy.max_retries => {
                BatchWriteState::Aborted {
                    attempts: attempt + 1,
                }
            }
            BatchWriteState::PartiallyFailed { attempt, .. } => BatchWriteState::Pending {
                attempt: attempt + 1,
            },
            other => other,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BatchWriteState::Succeeded { .. } | BatchWriteState::Aborted { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            ..RetryPolicy::default()
        }
    }

    /// Drives the state machine against a store that leaves requests unprocessed for the first
    /// `failing_rounds` writes. Returns the final state.
    fn simulate(failing_rounds: u32, max_retries: u32) -> BatchWriteState {
        let policy = policy(max_retries);
        let mut state = BatchWriteState::start();
        let mut writes = 0;
        while !state.is_terminal() {
            state = match state {
                BatchWriteState::Pending { .. } => {
                    writes += 1;
                    let unprocessed = if writes <= failing_rounds { 3 } else { 0 };
                    state.on_response(unprocessed)
                }
                partial => partial.retry(&policy),
            };
        }
        state
    }

    #[test]
    fn test_immediate_success() {
        assert_eq!(simulate(0, 3), BatchWriteState::Succeeded { attempts: 1 });
    }

    #[test]
    fn test_succeeds_after_k_plus_one_attempts() {
        assert_eq!(simulate(2, 3), BatchWriteState::Succeeded { attempts: 3 });
        assert_eq!(simulate(3, 3), BatchWriteState::Succeeded { attempts: 4 });
    }

    #[test]
    fn test_aborts_when_rounds_exceed_max_retries() {
        assert_eq!(simulate(4, 3), BatchWriteState::Aborted { attempts: 4 });
    }

    #[test]
    fn test_zero_retries_aborts_on_first_partial_failure() {
        assert_eq!(simulate(1, 0), BatchWriteState::Aborted { attempts: 1 });
    }

    #[test]
    fn test_terminal_states_ignore_transitions() {
        let done = BatchWriteState::Succeeded { attempts: 1 };
        assert_eq!(done.on_response(5), done);
        assert_eq!(done.retry(&policy(3)), done);
    }

    #[test]
    fn test_backoff_delay_grows_exponentially() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.backoff_delay(0, 1.0), Duration::from_millis(50));
        assert_eq!(policy.backoff_delay(1, 1.0), Duration::from_millis(100));
        assert_eq!(policy.backoff_delay(3, 0.5), Duration::from_millis(200));
    }

    #[test]
    fn test_backoff_delay_is_capped() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.backoff_delay(20, 1.0), Duration::from_secs(30));
        assert_eq!(policy.backoff_delay(u32::MAX, 1.0), Duration::from_secs(30));
    }

    #[test]
    fn test_backoff_delay_clamps_jitter() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.backoff_delay(2, 0.0), Duration::ZERO);
        assert_eq!(policy.backoff_delay(2, 7.0), Duration::from_millis(200));
        assert_eq!(policy.backoff_delay(2, f64::NAN), Duration::ZERO);
    }
}
