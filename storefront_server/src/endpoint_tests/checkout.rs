use std::sync::Arc;

use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use storefront_common::Money;
use storefront_engine::{
    db_types::{ActivationType, Console, Discount, Game, InvoiceId, PriceTier},
    traits::PaymentGatewayError,
    CheckoutApi,
};

use super::{
    helpers::{saved_order, send_request, test_config, FixedInvoiceId, INVOICE},
    mocks::MockStorefront,
};
use crate::{data_objects::CheckoutResponse, routes::CheckoutRoute, server::json_config};

/// Tier 1 is Elden Ring on PS5 at 1000.00 less 10%. Game 2 is unavailable and sold through tier 2.
fn catalog() -> MockStorefront {
    let mut db = MockStorefront::new();
    db.expect_fetch_price_tier().returning(|id| {
        let tier = PriceTier {
            id,
            game_id: id,
            console_id: 1,
            activation: ActivationType::WithActivation,
            price: Money::from_major(1000),
            is_active: true,
            discount: Some(Discount::Percent(Decimal::from(10))),
        };
        Ok((id == 1 || id == 2).then_some(tier))
    });
    db.expect_fetch_game().returning(|id| {
        let title = if id == 1 { "Elden Ring" } else { "Starfield" };
        Ok(Some(Game { id, title: title.into(), is_available: id == 1 }))
    });
    db.expect_fetch_console().returning(|id| Ok(Some(Console { id, name: "PS5".into() })));
    db
}

fn configure(db: MockStorefront) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = CheckoutApi::new(db, test_config()).with_invoice_ids(Arc::new(FixedInvoiceId(INVOICE)));
        cfg.app_data(web::Data::new(api))
            .app_data(json_config())
            .service(CheckoutRoute::<MockStorefront>::new());
    }
}

async fn post_cart(db: MockStorefront, body: Value) -> (StatusCode, String) {
    let req = TestRequest::post().uri("/checkout").set_json(body);
    send_request(req, configure(db)).await.expect("Request failed")
}

fn cart(items: Value) -> Value {
    json!({ "username": "alice", "email": "alice@example.com", "items": items })
}

#[actix_web::test]
async fn checkout_returns_signed_payment_url() {
    let _ = env_logger::try_init().ok();
    let mut db = catalog();
    db.expect_insert_order_with_items()
        .withf(|order| order.amount.to_string() == "1800.00" && order.items.len() == 1)
        .times(1)
        .returning(|order| Ok((saved_order(order), vec![])));
    let body = cart(json!([{ "product_type": "game", "price_id": 1, "quantity": 2 }, { "product_type": "dlc" }]));
    let (status, body) = post_cart(db, body).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let response: CheckoutResponse = serde_json::from_str(&body).unwrap();
    assert_eq!(response.invoice_id, InvoiceId(INVOICE));
    let url = response.payment_url;
    assert!(url.starts_with("https://auth.robokassa.ru/Merchant/Index.aspx?"), "{url}");
    for fragment in ["MerchantLogin=M", "OutSum=1800.00", "InvId=31337", "IsTest=1", "Shp_order_id=1"] {
        assert!(url.contains(fragment), "{url} does not contain {fragment}");
    }
}

#[actix_web::test]
async fn unknown_price_tier_is_not_found() {
    let _ = env_logger::try_init().ok();
    let mut db = catalog();
    db.expect_insert_order_with_items().never();
    let (status, body) = post_cart(db, cart(json!([{ "product_type": "game", "price_id": 99 }]))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"Price tier 99 does not exist"}"#);
}

#[actix_web::test]
async fn unavailable_game_is_a_conflict() {
    let _ = env_logger::try_init().ok();
    let mut db = catalog();
    db.expect_insert_order_with_items().never();
    let (status, body) = post_cart(db, cart(json!([{ "product_type": "game", "price_id": 2 }]))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, r#"{"error":"Game 'Starfield' is not available for purchase"}"#);
}

#[actix_web::test]
async fn carts_without_purchasable_items_are_rejected() {
    let _ = env_logger::try_init().ok();
    let mut db = catalog();
    db.expect_insert_order_with_items().never();
    let (status, body) = post_cart(db, cart(json!([{ "product_type": "gift_card", "price_id": 1 }]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"The cart does not contain any purchasable items"}"#);
}

#[actix_web::test]
async fn blank_username_is_rejected() {
    let _ = env_logger::try_init().ok();
    let mut db = MockStorefront::new();
    db.expect_fetch_price_tier().never();
    let body = json!({ "username": "  ", "items": [{ "product_type": "game", "price_id": 1 }] });
    let (status, _) = post_cart(db, body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn oversized_quantities_are_rejected() {
    let _ = env_logger::try_init().ok();
    let mut db = MockStorefront::new();
    db.expect_fetch_price_tier().never();
    db.expect_insert_order_with_items().never();
    let body = cart(json!([{ "product_type": "game", "price_id": 1, "quantity": 368934881474191_i64 }]));
    let (status, body) = post_cart(db, body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Quantity must be at most 1000"), "{body}");
}

#[actix_web::test]
async fn malformed_body_is_a_json_error() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post()
        .uri("/checkout")
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"username\": \"alice\", \"items\": ");
    let (status, body) = send_request(req, configure(MockStorefront::new())).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.starts_with(r#"{"error":"Could not read request body"#), "{body}");
}

#[actix_web::test]
async fn database_failures_are_not_leaked() {
    let _ = env_logger::try_init().ok();
    let mut db = catalog();
    db.expect_insert_order_with_items()
        .times(1)
        .returning(|_| Err(PaymentGatewayError::DatabaseError("disk I/O error at /var/lib/store.db".into())));
    let (status, body) = post_cart(db, cart(json!([{ "product_type": "game", "price_id": 1 }]))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body.contains("/var/lib"), "{body}");
}
