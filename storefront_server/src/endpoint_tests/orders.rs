use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use serde_json::json;
use storefront_engine::{
    db_types::{InvoiceId, OrderStatusType},
    CheckoutApi,
};

use super::{
    helpers::{order, send_request, test_config, INVOICE},
    mocks::MockStorefront,
};
use crate::routes::OrderStatusRoute;

fn configure(db: MockStorefront) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = CheckoutApi::new(db, test_config());
        cfg.app_data(web::Data::new(api)).service(OrderStatusRoute::<MockStorefront>::new());
    }
}

async fn get_order(db: MockStorefront, path: &str) -> (StatusCode, String) {
    send_request(TestRequest::get().uri(path), configure(db)).await.expect("Request failed")
}

#[actix_web::test]
async fn fetch_order_status() {
    let _ = env_logger::try_init().ok();
    let mut db = MockStorefront::new();
    db.expect_fetch_order_by_invoice_id()
        .withf(|id| *id == InvoiceId(INVOICE))
        .times(1)
        .returning(|_| Ok(Some(order(OrderStatusType::Success, "900.00"))));
    let (status, body) = get_order(db, "/order/31337").await;
    assert_eq!(status, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(
        body,
        json!({ "invoice_id": 31337, "status": "success", "amount": "900.00", "description": "Игра: Elden Ring" })
    );
}

#[actix_web::test]
async fn unknown_invoice_is_not_found() {
    let _ = env_logger::try_init().ok();
    let mut db = MockStorefront::new();
    db.expect_fetch_order_by_invoice_id().times(1).returning(|_| Ok(None));
    let (status, body) = get_order(db, "/order/404").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. No order for invoice 404"}"#);
}

#[actix_web::test]
async fn invoice_ids_must_be_numeric() {
    let _ = env_logger::try_init().ok();
    let mut db = MockStorefront::new();
    db.expect_fetch_order_by_invoice_id().never();
    let (status, _) = get_order(db, "/order/latest").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
