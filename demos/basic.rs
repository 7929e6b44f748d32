//! Minimal apikit example — a small order API with auth, CORS, deadlines and
//! a gzip/download endpoint.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/api/orders/42
//!   curl -X POST http://localhost:3000/api/orders \
//!        -H 'authorization: Bearer demo-token' \
//!        -d '{"sku":"A-1","quantity":2}'
//!   curl --compressed http://localhost:3000/api/orders
//!   curl -OJ http://localhost:3000/api/orders/export
//!   curl -X OPTIONS -i http://localhost:3000/api/orders

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use apikit::middleware::{BearerAuth, Cors, Logger, Recovery, Timeout};
use apikit::{Json, PathBuilder, Request, Response, Route, Server};
use http::StatusCode;
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize)]
struct NewOrder {
    sku: String,
    quantity: u32,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let orders = PathBuilder::new("api/orders");
    let one = orders.append(["{id}"]).methods();
    let export = orders.append(["export"]).methods();
    let all = orders.methods();

    let routes = [
        Route::to(all.get, list_orders).with(Recovery).with(Logger::new()),
        Route::to(all.post, create_order)
            .with(Recovery)
            .with(Logger::new())
            .with(Cors::new("http://localhost:5173"))
            .with(BearerAuth::new("demo-token")),
        Route::to(format!("OPTIONS {orders}"), list_orders)
            .with(Logger::new())
            .with(Cors::new("http://localhost:5173")),
        Route::to(one.get, get_order)
            .with(Recovery)
            .with(Logger::new())
            .with(Timeout::new(Duration::from_millis(500))),
        Route::to(export.get, export_orders).with(Recovery).with(Logger::new()),
    ];

    let server = Server::new("0.0.0.0:3000", routes).expect("invalid route table");
    server.serve().await.expect("server error");
}

// GET /api/orders — gzip-compressed listing
async fn list_orders(_req: Request) -> Response {
    let orders = serde_json::json!([
        { "id": 1, "sku": "A-1", "quantity": 2 },
        { "id": 2, "sku": "B-7", "quantity": 1 },
    ]);
    Response::gzip(StatusCode::OK, orders)
}

// POST /api/orders — decoding errors are the handler's to answer
async fn create_order(req: Request) -> Response {
    match req.json::<NewOrder>() {
        Ok(order) => Response::created(Json(order)),
        Err(_) => Response::bad_request("malformed body"),
    }
}

// GET /api/orders/{id} — gives up when the 500 ms deadline passes
async fn get_order(req: Request) -> Response {
    let ctx = req.context();
    let id = req.param("id").unwrap_or_default().to_owned();

    tokio::select! {
        () = tokio::time::sleep(Duration::from_millis(50)) => {
            Response::ok(Json(serde_json::json!({ "id": id, "sku": "A-1" })))
        }
        () = ctx.done() => Response::server_error("deadline exceeded"),
    }
}

// GET /api/orders/export — writes a CSV into a scratch dir and streams it;
// the dir is removed once the download finishes, so each export gets its own
async fn export_orders(_req: Request) -> Response {
    static EXPORTS: AtomicU64 = AtomicU64::new(0);
    let n = EXPORTS.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!("orders-export-{}-{n}", std::process::id()));
    let path = dir.join("orders.csv");

    if write_export(&dir, &path).await.is_err() {
        return Response::server_error(());
    }
    Response::stream_file(StatusCode::OK, &path, "orders.csv").await
}

async fn write_export(dir: &Path, path: &Path) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(path, "id,sku,quantity\n1,A-1,2\n2,B-7,1\n").await
}
