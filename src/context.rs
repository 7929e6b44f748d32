//! Per-request deadline context.
//!
//! Every [`Request`](crate::Request) carries a [`Context`]. By default it has
//! no deadline. The [`Timeout`](crate::middleware::Timeout) middleware derives
//! a bounded one and hands the narrowed request downstream. Nothing in apikit
//! interrupts a handler: the handler decides whether to watch the deadline.
//!
//! ```rust,no_run
//! use apikit::{Request, Response};
//!
//! async fn slow_report(req: Request) -> Response {
//!     let ctx = req.context();
//!     tokio::select! {
//!         report = build_report() => Response::ok(report),
//!         () = ctx.done() => Response::server_error("deadline exceeded"),
//!     }
//! }
//! # async fn build_report() -> String { String::new() }
//! ```

use std::time::Duration;

use tokio::time::Instant;

/// A cheap, copyable cancellation context bound to a deadline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Context {
    deadline: Option<Instant>,
}

impl Context {
    /// A context with no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derives a child context that expires `timeout` from now.
    ///
    /// A child can only tighten its parent: if the parent already expires
    /// sooner, the parent's deadline is kept. A timeout too large to
    /// represent leaves the parent unchanged.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        let Some(candidate) = Instant::now().checked_add(timeout) else {
            return self;
        };
        let deadline = match self.deadline {
            Some(existing) if existing <= candidate => existing,
            _ => candidate,
        };
        Self { deadline: Some(deadline) }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline. `None` when there is no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn is_done(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Resolves once the deadline passes. Never resolves without a deadline.
    pub async fn done(self) {
        match self.deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }
    }
}
