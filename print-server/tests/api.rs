//! HTTP surface tests
//!
//! Exercise the full router against a memory-transport dispatcher: auth,
//! success and error shapes, without touching hardware.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use pos_printer::{MemoryTransport, PrinterCandidate, PrinterMatcher, Transport, TransportKind};
use serde_json::{Value, json};
use tower::ServiceExt;

use print_server::printing::{PrintDispatcher, PrinterConfig};
use print_server::{Config, ServerState, api};

const API_KEY: &str = "test-secret";

fn test_config() -> Config {
    Config {
        http_port: 0,
        api_key: API_KEY.to_string(),
        matcher: PrinterMatcher::NameContains("thermal".into()),
        transports: vec![TransportKind::Usb],
        network_printer_addr: None,
        delivery_timeout: Duration::from_millis(500),
        paper_width: 48,
        timezone: chrono_tz::Europe::Madrid,
    }
}

fn app_with_transport(transport: Arc<MemoryTransport>) -> Router {
    let config = test_config();
    let transports: Vec<Arc<dyn Transport>> = vec![transport];
    let dispatcher = PrintDispatcher::new(
        PrinterConfig {
            matcher: config.matcher.clone(),
            delivery_timeout: config.delivery_timeout,
            paper_width: config.paper_width,
            timezone: config.timezone,
        },
        transports,
    );
    let state = ServerState::with_dispatcher(config, dispatcher);
    api::build_app(&state).with_state(state)
}

fn app() -> (Router, Arc<MemoryTransport>) {
    let transport = Arc::new(MemoryTransport::new(
        TransportKind::Usb,
        vec![PrinterCandidate::usb("Thermal Receipt", 0x0FE6, 0x811E)],
    ));
    (app_with_transport(transport.clone()), transport)
}

fn order_paid_body() -> Value {
    json!({
        "type": "order_paid",
        "businessId": "b-1",
        "orderId": "abc123456",
        "data": {
            "orderDetails": {
                "customerName": "Ana",
                "customerEmail": "a@x.com",
                "items": [{"name": "Beer", "quantity": 2, "unitPrice": 5.00}],
                "totalAmount": 10.00
            }
        }
    })
}

fn print_request(body: &Value, api_key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/print")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(key) = api_key {
        builder = builder.header("x-api-key", key);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let (app, _) = app();

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn status_lists_discovered_printers_without_auth() {
    let (app, _) = app();

    let response = app
        .oneshot(Request::get("/status").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["printers"][0]["name"], "Thermal Receipt");
    assert_eq!(body["printers"][0]["kind"], "usb");
}

#[tokio::test]
async fn print_without_api_key_is_rejected() {
    let (app, transport) = app();

    let response = app
        .oneshot(print_request(&order_paid_body(), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Unauthorized");
    assert!(transport.deliveries().await.is_empty());
}

#[tokio::test]
async fn print_with_wrong_api_key_is_rejected() {
    let (app, _) = app();

    let response = app
        .oneshot(print_request(&order_paid_body(), Some("wrong")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn print_order_receipt_succeeds() {
    let (app, transport) = app();

    let response = app
        .oneshot(print_request(&order_paid_body(), Some(API_KEY)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["printer"], "Thermal Receipt");

    let deliveries = transport.deliveries().await;
    assert_eq!(deliveries.len(), 1);
    assert_eq!(deliveries[0].0, "Thermal Receipt");
}

#[tokio::test]
async fn print_missing_payload_is_validation_error() {
    let (app, transport) = app();

    let body = json!({"type": "order_paid", "orderId": "abc123456", "data": {}});
    let response = app
        .oneshot(print_request(&body, Some(API_KEY)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "ValidationError");
    // Validation failed before any transport call
    assert!(transport.deliveries().await.is_empty());
}

#[tokio::test]
async fn print_with_no_matching_printer_is_bad_gateway() {
    let transport = Arc::new(MemoryTransport::new(
        TransportKind::Usb,
        vec![PrinterCandidate::usb("Other Device", 0x1111, 0x2222)],
    ));
    let app = app_with_transport(transport);

    let response = app
        .oneshot(print_request(&order_paid_body(), Some(API_KEY)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await;
    assert_eq!(body["error"], "NoPrinterFound");
}

#[tokio::test]
async fn backend_failure_surfaces_kind_and_details() {
    let transport = Arc::new(MemoryTransport::failing(
        TransportKind::Usb,
        vec![PrinterCandidate::usb("Thermal Receipt", 0x0FE6, 0x811E)],
        "cable unplugged",
    ));
    let app = app_with_transport(transport);

    let response = app
        .oneshot(print_request(&order_paid_body(), Some(API_KEY)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"], "PrinterNotConnectedError");
    assert_eq!(body["details"], "cable unplugged");
}

#[tokio::test]
async fn raw_test_print_succeeds() {
    let (app, transport) = app();

    let response = app
        .oneshot(print_request(&json!({"type": "raw_test"}), Some(API_KEY)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let deliveries = transport.deliveries().await;
    assert_eq!(deliveries.len(), 1);
}
