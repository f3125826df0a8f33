use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use rust_decimal::Decimal;
use storefront_engine::{
    db_types::{InvoiceId, OrderStatusType},
    events::EventProducers,
    robokassa::{callback_signature_base, md5_hex, PassthroughParams},
    traits::{EntitlementOrdering, PaymentGatewayError, ReconcileOutcome, ReconcileStatus},
    ReconcileApi,
};

use super::{
    helpers::{order, send_request, test_config, INVOICE},
    mocks::MockStorefront,
};
use crate::routes::{ResultCallbackFormRoute, ResultCallbackQueryRoute};

fn configure(db: MockStorefront) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = ReconcileApi::new(db, test_config(), EventProducers::default());
        cfg.app_data(web::Data::new(api)).service(
            web::scope("/robokassa")
                .service(ResultCallbackFormRoute::<MockStorefront>::new())
                .service(ResultCallbackQueryRoute::<MockStorefront>::new()),
        );
    }
}

fn callback_params(out_sum: &str, password2: &str) -> Vec<(String, String)> {
    let inv_id = INVOICE.to_string();
    let passthrough = PassthroughParams::for_order(1, "alice");
    let signature = md5_hex(&callback_signature_base(out_sum, &inv_id, password2, &passthrough));
    let mut params = vec![
        ("OutSum".to_string(), out_sum.to_string()),
        ("InvId".to_string(), inv_id),
        ("SignatureValue".to_string(), signature.to_uppercase()),
        ("IncCurrLabel".to_string(), "BankCard".to_string()),
    ];
    params.extend(passthrough.iter().map(|(k, v)| (k.to_string(), v.to_string())));
    params
}

fn paid(db: &mut MockStorefront) {
    db.expect_apply_payment_confirmation()
        .withf(|c| {
            c.order_id == 1 &&
                c.invoice_id == InvoiceId(INVOICE) &&
                c.reported_amount == Decimal::new(900, 0) &&
                c.ordering == EntitlementOrdering::AfterAmountCheck
        })
        .times(1)
        .returning(|_| {
            Ok(ReconcileOutcome {
                order: order(OrderStatusType::Success, "900.00"),
                status: ReconcileStatus::Accepted,
                replayed: false,
                entitlements: vec![],
            })
        });
}

async fn post_callback(db: MockStorefront, params: Vec<(String, String)>) -> (StatusCode, String) {
    let req = TestRequest::post().uri("/robokassa/result").set_form(params);
    send_request(req, configure(db)).await.expect("Request failed")
}

#[actix_web::test]
async fn form_callback_is_acknowledged() {
    let _ = env_logger::try_init().ok();
    let mut db = MockStorefront::new();
    paid(&mut db);
    let (status, body) = post_callback(db, callback_params("900.000000", "P2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK31337");
}

#[actix_web::test]
async fn query_callback_is_acknowledged() {
    let _ = env_logger::try_init().ok();
    let mut db = MockStorefront::new();
    paid(&mut db);
    let query = callback_params("900", "P2").into_iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>();
    let req = TestRequest::get().uri(&format!("/robokassa/result?{}", query.join("&")));
    let (status, body) = send_request(req, configure(db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK31337");
}

#[actix_web::test]
async fn forged_callback_never_reaches_the_database() {
    let _ = env_logger::try_init().ok();
    let mut db = MockStorefront::new();
    db.expect_apply_payment_confirmation().never();
    let (status, body) = post_callback(db, callback_params("900.00", "guessed")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("authentication failed"), "{body}");
    assert!(!body.starts_with("OK"));
}

#[actix_web::test]
async fn callback_without_signature_is_rejected() {
    let _ = env_logger::try_init().ok();
    let mut db = MockStorefront::new();
    db.expect_apply_payment_confirmation().never();
    let params = callback_params("900.00", "P2").into_iter().filter(|(k, _)| k != "SignatureValue").collect();
    let (status, body) = post_callback(db, params).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("SignatureValue"), "{body}");
}

#[actix_web::test]
async fn short_payment_is_declined() {
    let _ = env_logger::try_init().ok();
    let mut db = MockStorefront::new();
    db.expect_apply_payment_confirmation().times(1).returning(|_| {
        Ok(ReconcileOutcome {
            order: order(OrderStatusType::Failed, "900.00"),
            status: ReconcileStatus::Declined,
            replayed: false,
            entitlements: vec![],
        })
    });
    let (status, body) = post_callback(db, callback_params("1.00", "P2")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Invoice 31337 is for 900.00, but the gateway reported 1.00");
}

#[actix_web::test]
async fn callback_for_unknown_order_is_not_found() {
    let _ = env_logger::try_init().ok();
    let mut db = MockStorefront::new();
    db.expect_apply_payment_confirmation()
        .times(1)
        .returning(|c| Err(PaymentGatewayError::OrderIdNotFound(c.order_id)));
    let (status, _) = post_callback(db, callback_params("900.00", "P2")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn database_failure_asks_the_gateway_to_retry() {
    let _ = env_logger::try_init().ok();
    let mut db = MockStorefront::new();
    db.expect_apply_payment_confirmation()
        .times(1)
        .returning(|_| Err(PaymentGatewayError::DatabaseError("database is locked".into())));
    let (status, body) = post_callback(db, callback_params("900.00", "P2")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body.starts_with("OK"));
    assert!(!body.contains("locked"), "{body}");
}
