//! Bounded retry with backoff.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;

use super::context::{EventKind, EventLevel, InvocationContext};
use super::middleware::{Middleware, Next};
use super::response::{ErrorKind, Failure, Response};

/// Wait schedule between attempts.
#[derive(Debug, Clone, PartialEq)]
pub enum Backoff {
    /// `base * multiplier^(attempt - 1)`, capped at `max`.
    Exponential {
        base: Duration,
        multiplier: u32,
        max: Duration,
    },
    /// Explicit per-attempt waits; the last entry repeats.
    Schedule(Vec<Duration>),
}

impl Backoff {
    /// Wait after the given 1-based attempt has failed.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let index = attempt.saturating_sub(1);
        match self {
            Self::Exponential {
                base,
                multiplier,
                max,
            } => multiplier
                .checked_pow(index)
                .map(|factor| base.saturating_mul(factor))
                .unwrap_or(*max)
                .min(*max),
            Self::Schedule(waits) => waits
                .get(index as usize)
                .or_else(|| waits.last())
                .copied()
                .unwrap_or_default(),
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Exponential {
            base: Duration::from_secs(1),
            multiplier: 2,
            max: Duration::from_secs(60),
        }
    }
}

/// Which failures are retried, how often, and how long to wait.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub retryable_kinds: BTreeSet<ErrorKind>,
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Whether a failure of `kind` at `attempt` gets another attempt.
    pub fn should_retry(&self, kind: ErrorKind, attempt: u32) -> bool {
        attempt < self.max_attempts && self.retryable_kinds.contains(&kind)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retryable_kinds: BTreeSet::from([ErrorKind::Connectivity, ErrorKind::Timeout]),
            backoff: Backoff::default(),
        }
    }
}

/// Re-runs the rest of the chain on retryable failures.
#[derive(Debug, Clone, Default)]
pub struct RetryMiddleware {
    policy: RetryPolicy,
}

impl RetryMiddleware {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl Middleware for RetryMiddleware {
    fn name(&self) -> &'static str {
        "retry"
    }

    async fn process(&self, ctx: &mut InvocationContext, next: Next<'_>) -> Response {
        loop {
            let response = next.clone().run(ctx).await;
            let kind = match &response {
                Response::Success(_) => return response,
                Response::Failure(failure) => failure.kind,
            };

            let attempt = ctx.request().attempt();
            if !self.policy.should_retry(kind, attempt) || ctx.interruption().is_some() {
                return response;
            }

            let wait = self.policy.backoff.delay_for(attempt);
            ctx.record(EventLevel::Info, EventKind::Retry { attempt, kind, wait });

            let interrupted = tokio::select! {
                biased;
                interruption = ctx.interrupted() => Some(interruption),
                _ = tokio::time::sleep(wait) => None,
            };
            if let Some(interruption) = interrupted {
                return Response::Failure(Failure::timeout(format!(
                    "{interruption} while waiting to retry {} after attempt {attempt}",
                    ctx.request().tool_name()
                )));
            }

            ctx.advance_attempt();
        }
    }
}
