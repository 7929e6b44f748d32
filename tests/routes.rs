//! End-to-end route behaviour through `Router::handle`, no sockets.

use std::io::Read;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use apikit::middleware::{BearerAuth, Cors, Logger, Recovery};
use apikit::{Error, Json, PathBuilder, Request, Response, Route, Router};
use flate2::read::GzDecoder;
use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, PartialEq)]
struct Order {
    id: u32,
    sku: String,
}

async fn create_order(req: Request) -> Response {
    match req.json::<Order>() {
        Ok(order) => Response::created(Json(order)),
        Err(_) => Response::bad_request("malformed body"),
    }
}

async fn export_orders(_req: Request) -> Response {
    let orders = vec![
        Order { id: 1, sku: "A-1".into() },
        Order { id: 2, sku: "B-2".into() },
    ];
    Response::gzip(StatusCode::OK, Json(orders))
}

async fn crash(_req: Request) -> Response {
    panic!("ledger out of balance");
}

fn router(hits: &Arc<AtomicUsize>) -> Router {
    let orders = PathBuilder::new("/api/").append(["orders"]);
    let export = orders.append(["export"]);

    let counter = Arc::clone(hits);
    let counted = move |req: Request| {
        counter.fetch_add(1, Ordering::SeqCst);
        create_order(req)
    };

    Router::from_routes([
        Route::to(orders.methods().post, counted)
            .with(Recovery)
            .with(Logger::new())
            .with(BearerAuth::new("abc")),
        Route::to(export.methods().get, export_orders).with(Logger::new()),
        Route::to("OPTIONS /api/orders", export_orders).with(Cors::new("https://shop.example")),
        Route::to("GET /api/crash", crash).with(Recovery).with(Logger::new()),
    ])
    .unwrap()
}

fn post_order(auth: Option<&str>, body: &'static str) -> Request {
    let mut req = Request::builder(Method::POST, "/api/orders").body(body);
    if let Some(auth) = auth {
        req = req.header("authorization", auth);
    }
    req.build()
}

#[tokio::test]
async fn authorized_order_is_created() {
    let hits = Arc::new(AtomicUsize::new(0));
    let router = router(&hits);

    let res = router
        .handle(post_order(Some("Bearer abc"), r#"{"id":9,"sku":"Z-9"}"#))
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);
    let order: Order = serde_json::from_slice(&res.into_bytes().await).unwrap();
    assert_eq!(order, Order { id: 9, sku: "Z-9".into() });
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn bad_credentials_never_reach_the_handler() {
    let hits = Arc::new(AtomicUsize::new(0));
    let router = router(&hits);

    for auth in [Some("Bearer xyz"), Some("abc"), None] {
        let res = router.handle(post_order(auth, r#"{"id":1,"sku":"A"}"#)).await;
        assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
    }
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn malformed_body_is_the_handlers_call() {
    let hits = Arc::new(AtomicUsize::new(0));
    let res = router(&hits).handle(post_order(Some("Bearer abc"), "{oops")).await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(&res.into_bytes().await[..], br#""malformed body""#);
}

#[tokio::test]
async fn gzip_export_decompresses_to_plain_json() {
    let hits = Arc::new(AtomicUsize::new(0));
    let res = router(&hits)
        .handle(Request::builder(Method::GET, "/api/orders/export").build())
        .await;
    assert_eq!(res.headers()["content-encoding"], "gzip");

    let mut json = String::new();
    GzDecoder::new(&res.into_bytes().await[..]).read_to_string(&mut json).unwrap();
    assert_eq!(json, r#"[{"id":1,"sku":"A-1"},{"id":2,"sku":"B-2"}]"#);
}

#[tokio::test]
async fn preflight_is_answered_by_cors() {
    let hits = Arc::new(AtomicUsize::new(0));
    let res = router(&hits)
        .handle(Request::builder(Method::OPTIONS, "/api/orders").build())
        .await;
    assert_eq!(res.status_code(), StatusCode::NO_CONTENT);
    assert_eq!(res.headers()["access-control-allow-origin"], "https://shop.example");
    assert!(res.headers().get("content-encoding").is_none());
    assert!(res.into_bytes().await.is_empty());
}

#[tokio::test]
async fn panicking_route_answers_500() {
    let hits = Arc::new(AtomicUsize::new(0));
    let res = router(&hits)
        .handle(Request::builder(Method::GET, "/api/crash").build())
        .await;
    assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(&res.into_bytes().await[..], br#""Internal server error""#);
}

#[test]
fn route_without_handler_fails_startup() {
    let result = apikit::Server::new(
        "127.0.0.1:0",
        [Route::new("GET /orphan").with(Logger::new())],
    );
    assert!(matches!(result, Err(Error::MissingHandler { route }) if route == "GET /orphan"));
}
