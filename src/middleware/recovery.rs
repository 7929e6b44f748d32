use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use tracing::error;

use super::{Middleware, Next};
use crate::handler::BoxFuture;
use crate::request::Request;
use crate::response::Response;

/// Fault boundary: a panic anywhere further inward becomes a `500` instead of
/// a dropped connection.
///
/// Declare it first on a route so it wraps every other layer.
#[derive(Clone, Copy, Debug, Default)]
pub struct Recovery;

impl Middleware for Recovery {
    fn call<'a>(&'a self, req: Request, next: Next<'a>) -> BoxFuture<'a> {
        Box::pin(async move {
            let method = req.method().clone();
            let path = req.path().to_owned();

            match run_guarded(next, req).await {
                Ok(res) => res,
                Err(panic_message) => {
                    error!(method = %method, path = %path, panic_message = %panic_message, "handler panicked");
                    Response::server_error("Internal server error")
                }
            }
        })
    }
}

/// Drives the rest of the chain, converting an unwinding panic into an error
/// value carrying its message.
///
/// `next.run` is deferred into the guarded future because handlers that are
/// plain closures can panic while the future is being created.
async fn run_guarded(next: Next<'_>, req: Request) -> Result<Response, String> {
    AssertUnwindSafe(async move { next.run(req).await })
        .catch_unwind()
        .await
        .map_err(panic_message)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
