use std::time::Duration;

use super::{Middleware, Next};
use crate::handler::BoxFuture;
use crate::request::Request;

/// Bounds the request context by `duration` and forwards the narrowed
/// request.
///
/// This only sets a deadline. Handlers observe it through
/// [`Context::done`](crate::Context::done); one that ignores it keeps running.
#[derive(Clone, Copy, Debug)]
pub struct Timeout {
    duration: Duration,
}

impl Timeout {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl Middleware for Timeout {
    fn call<'a>(&'a self, req: Request, next: Next<'a>) -> BoxFuture<'a> {
        let ctx = req.context().with_timeout(self.duration);
        next.run(req.with_context(ctx))
    }
}
