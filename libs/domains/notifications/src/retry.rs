//! Retry policy for provider sends.
//!
//! Attempts are sequential. Only transient failures are retried, with an
//! exponential backoff between attempts as the only suspension point.

use crate::error::{NotificationError, NotificationResult};
use crate::models::{AttemptOutcome, DeliveryAttempt};
use crate::providers::{EmailContent, EmailProvider, SentEmail};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_MULTIPLIER: u32 = 2;

/// Exponential backoff: `base * multiplier^retry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            multiplier: DEFAULT_MULTIPLIER,
        }
    }
}

/// Every attempt made, plus the final result.
#[derive(Debug)]
pub struct RetryRun {
    pub attempts: Vec<DeliveryAttempt>,
    pub result: NotificationResult<SentEmail>,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            multiplier: DEFAULT_MULTIPLIER,
        }
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before retry number `retry` (0-based).
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        self.base_delay
            .saturating_mul(self.multiplier.saturating_pow(retry))
    }

    /// Send through `provider`, retrying transient failures.
    pub async fn run(&self, provider: &dyn EmailProvider, email: &EmailContent) -> RetryRun {
        let name = provider.name();
        let mut attempts = Vec::with_capacity(self.max_attempts as usize);
        let mut attempt_number = 0;

        loop {
            attempt_number += 1;
            let result = provider.send(email).await;

            let outcome = match &result {
                Ok(_) => AttemptOutcome::Success,
                Err(e) if e.is_retryable() => AttemptOutcome::TransientFailure,
                Err(_) => AttemptOutcome::PermanentFailure,
            };
            attempts.push(DeliveryAttempt {
                provider: name,
                attempt_number,
                outcome,
            });

            let error = match result {
                Ok(sent) => {
                    return RetryRun {
                        attempts,
                        result: Ok(sent),
                    };
                }
                Err(e) => e,
            };

            if !error.is_retryable() || attempt_number >= self.max_attempts {
                return self.give_up(attempts, error);
            }

            let delay = self.backoff_delay(attempt_number - 1);
            warn!(
                provider = %name,
                attempt = attempt_number,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Transient delivery failure, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    fn give_up(&self, attempts: Vec<DeliveryAttempt>, error: NotificationError) -> RetryRun {
        debug!(
            attempts = attempts.len(),
            retryable = error.is_retryable(),
            "Giving up on delivery"
        );
        RetryRun {
            attempts,
            result: Err(error),
        }
    }
}
