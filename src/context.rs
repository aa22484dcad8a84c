//! Per-call cancellation and deadline control
//!
//! Every store call takes a [`CallContext`]. The context never adds a
//! timeout of its own: a background context waits as long as the store does.
//!
//! # Example
//!
//! ```rust
//! use domain_stats::context::CallContext;
//! use std::time::Duration;
//!
//! # async fn example() {
//! let ctx = CallContext::background().with_timeout(Duration::from_millis(250));
//! let value = ctx.run(async { Ok(42) }).await.unwrap();
//! assert_eq!(value, 42);
//! # }
//! ```

use crate::error::{Error, Result};

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation token and optional deadline for one logical request
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// A context that is never cancelled and has no deadline
    pub fn background() -> Self {
        Self::default()
    }

    /// Use the given token for cancellation
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Fail calls that are still running at `deadline`
    ///
    /// An earlier deadline already on the context wins.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// Fail calls that are still running after `timeout` from now
    ///
    /// A timeout beyond the clock's range leaves the context without a
    /// deadline.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// Derive a context that is cancelled together with this one
    ///
    /// Cancelling the child does not cancel the parent.
    pub fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
            deadline: self.deadline,
        }
    }

    /// The cancellation token of this context
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Deadline of this context, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancel this context and every child derived from it
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Fail fast if the context is already cancelled or expired
    pub fn check(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(Error::DeadlineExceeded);
            }
        }
        Ok(())
    }

    /// Await `fut` unless the context is cancelled or its deadline passes first
    pub async fn run<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check()?;

        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.cancel.cancelled() => Err(Error::Cancelled),
                    _ = tokio::time::sleep_until(deadline) => Err(Error::DeadlineExceeded),
                    result = fut => result,
                }
            },
            None => {
                tokio::select! {
                    _ = self.cancel.cancelled() => Err(Error::Cancelled),
                    result = fut => result,
                }
            },
        }
    }
}
