// src/core/retry.rs

//! The pluggable reconnect backoff policy.

use crate::core::errors::ClientError;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// The input to a retry decision: the 1-based attempt count and the error
/// that ended the previous attempt. The attempt count resets to zero only
/// when a connection reaches `ready`.
#[derive(Debug, Clone)]
pub struct RetryContext {
    pub attempt: u32,
    pub last_error: Option<ClientError>,
}

type RetryFn = dyn Fn(&RetryContext) -> Option<Duration> + Send + Sync;

/// A pure policy function mapping a [`RetryContext`] to either the delay
/// before the next connection attempt or `None`, meaning give up and
/// transition to `end`.
///
/// `Some(Duration::ZERO)` is a valid delay (retry immediately); only `None`
/// stops. The state machine never invokes a strategy concurrently with
/// itself for the same client.
#[derive(Clone)]
pub struct RetryStrategy(Arc<RetryFn>);

impl RetryStrategy {
    pub fn new(f: impl Fn(&RetryContext) -> Option<Duration> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Evaluates the strategy, clamping the returned delay to `max_delay`.
    ///
    /// A panicking strategy is treated as "stop retrying": the panic is
    /// logged and never propagated into the connection driver.
    pub fn next_delay(&self, ctx: &RetryContext, max_delay: Duration) -> Option<Duration> {
        match catch_unwind(AssertUnwindSafe(|| (self.0)(ctx))) {
            Ok(delay) => delay.map(|d| d.min(max_delay)),
            Err(_) => {
                warn!(
                    attempt = ctx.attempt,
                    "Retry strategy panicked; treating as stop."
                );
                None
            }
        }
    }
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self::new(default_backoff)
    }
}

impl fmt::Debug for RetryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RetryStrategy(..)")
    }
}

/// The built-in backoff: `min(attempt * 50ms, 2s)`.
pub fn default_backoff(ctx: &RetryContext) -> Option<Duration> {
    let millis = (u64::from(ctx.attempt)).saturating_mul(50).min(2000);
    Some(Duration::from_millis(millis))
}
