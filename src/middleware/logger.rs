use tokio::time::Instant;
use tracing::info;

use super::{Middleware, Next};
use crate::handler::BoxFuture;
use crate::request::Request;

/// Access log: one `tracing` event per request, emitted after the inner
/// layers return.
///
/// Fields: `method`, `path`, `remote`, `status`, `elapsed`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Logger;

impl Logger {
    pub fn new() -> Self {
        Self
    }
}

impl Middleware for Logger {
    fn call<'a>(&'a self, req: Request, next: Next<'a>) -> BoxFuture<'a> {
        Box::pin(async move {
            let start = Instant::now();
            let method = req.method().clone();
            let path = req.path().to_owned();
            let remote = req
                .remote_addr()
                .map_or_else(|| "-".to_owned(), |addr| addr.to_string());

            let res = next.run(req).await;

            info!(
                method = %method,
                path = %path,
                remote = %remote,
                status = res.status_code().as_u16(),
                elapsed = ?start.elapsed(),
                "request served"
            );
            res
        })
    }
}
