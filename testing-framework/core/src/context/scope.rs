use std::{future::Future, time::Duration};

use thiserror::Error;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

/// Roughly 30 years.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Why a scope ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeEnd {
    Cancelled,
    DeadlineExceeded,
}

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ScopeError {
    #[error("operation cancelled")]
    Cancelled,
    #[error("operation exceeded its {timeout:?} deadline")]
    DeadlineExceeded { timeout: Duration },
}

/// A deadline plus an independent cancellation signal.
///
/// Cancelling a scope never affects sibling scopes. Every scope is a child of
/// its test context, so tearing the context down cancels all of them.
#[derive(Clone, Debug)]
pub struct TimeoutScope {
    token: CancellationToken,
    deadline: Instant,
    timeout: Duration,
}

impl TimeoutScope {
    pub(crate) fn new(parent: &CancellationToken, timeout: Duration) -> Self {
        Self {
            token: parent.child_token(),
            deadline: deadline_after(timeout),
            timeout,
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// True once the scope was cancelled or its deadline passed.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.is_cancelled() || self.is_expired()
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Token for handing the cancellation signal to spawned work.
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Resolves when the scope is cancelled or its deadline passes.
    pub async fn done(&self) -> ScopeEnd {
        tokio::select! {
            () = self.token.cancelled() => ScopeEnd::Cancelled,
            () = sleep_until(self.deadline) => ScopeEnd::DeadlineExceeded,
        }
    }

    /// Drive `future` until it completes or the scope ends.
    pub async fn run<F>(&self, future: F) -> Result<F::Output, ScopeError>
    where
        F: Future,
    {
        tokio::select! {
            biased;
            output = future => Ok(output),
            end = self.done() => Err(match end {
                ScopeEnd::Cancelled => ScopeError::Cancelled,
                ScopeEnd::DeadlineExceeded => ScopeError::DeadlineExceeded {
                    timeout: self.timeout,
                },
            }),
        }
    }
}

/// Deadline `timeout` from now, clamped to a far-future instant.
fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}
