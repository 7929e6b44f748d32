//! # apikit
//!
//! A thin helper layer over hyper for JSON APIs. It does three things:
//!
//! - **Middleware pipelines** — ordered, short-circuiting layers around a
//!   handler: access logging, bearer / header auth, panic recovery,
//!   deadlines, CORS.
//! - **Route keys** — [`PathBuilder`] produces `"GET /users/42"`-style keys,
//!   and the [`Router`] dispatches on them.
//! - **Structured responses** — JSON, gzip-JSON and file downloads with one
//!   payload convention: nothing, one value, or an ordered array.
//!
//! Transport, TLS, JSON encoding and compression belong to hyper, your
//! proxy, serde_json and flate2 respectively. apikit only wires them together.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use apikit::middleware::{BearerAuth, Logger, Recovery, Timeout};
//! use apikit::{Json, PathBuilder, Request, Response, Route, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), apikit::Error> {
//!     let users = PathBuilder::new("users");
//!     let one_user = users.append(["{id}"]).methods();
//!
//!     let routes = [
//!         Route::to(users.methods().post, create_user)
//!             .with(Recovery)
//!             .with(Logger::new())
//!             .with(BearerAuth::new("s3cret")),
//!         Route::to(one_user.get, get_user)
//!             .with(Recovery)
//!             .with(Logger::new())
//!             .with(Timeout::new(Duration::from_secs(2))),
//!     ];
//!
//!     Server::new("0.0.0.0:3000", routes)?.serve().await
//! }
//!
//! #[derive(serde::Deserialize, serde::Serialize)]
//! struct User { name: String }
//!
//! async fn get_user(req: Request) -> Response {
//!     let id = req.param("id").unwrap_or("unknown");
//!     Response::ok(Json(serde_json::json!({ "id": id })))
//! }
//!
//! async fn create_user(req: Request) -> Response {
//!     match req.json::<User>() {
//!         Ok(user) => Response::created(Json(user)),
//!         Err(_) => Response::bad_request("malformed body"),
//!     }
//! }
//! ```

mod context;
mod error;
mod handler;
mod path;
mod payload;
mod request;
mod response;
mod route;
mod router;
mod server;
mod stream;

pub mod middleware;

pub use context::Context;
pub use error::Error;
pub use handler::{BoxFuture, Handler};
pub use path::{HttpMethods, PathBuilder};
pub use payload::{IntoPayload, Json, Payload};
pub use request::{Request, RequestBuilder, decode_json};
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use route::Route;
pub use router::Router;
pub use server::Server;
