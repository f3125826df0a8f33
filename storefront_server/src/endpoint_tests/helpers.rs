use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use chrono::Utc;
use log::debug;
use sqlx::types::Json;
use storefront_common::Secret;
use storefront_engine::{
    db_types::{CartSnapshot, InvoiceId, NewOrder, Order, OrderStatusType},
    helpers::InvoiceIdGenerator,
    robokassa::RobokassaConfig,
};

pub const INVOICE: i64 = 31337;

pub async fn send_request<F>(req: TestRequest, configure: F) -> Result<(StatusCode, String), String>
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let (_, res) = test::try_call_service(&service, req.to_request()).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}

/// Test-mode gateway credentials. DO NOT re-use these anywhere.
pub fn test_config() -> RobokassaConfig {
    RobokassaConfig {
        merchant_login: "M".into(),
        test_password1: Secret::new("P1".into()),
        test_password2: Secret::new("P2".into()),
        result_url: "https://shop.example/robokassa/result".into(),
        success_url: "https://shop.example/success".into(),
        fail_url: "https://shop.example/fail".into(),
        ..Default::default()
    }
}

/// Always hands out the same invoice id.
pub struct FixedInvoiceId(pub i64);

impl InvoiceIdGenerator for FixedInvoiceId {
    fn next_invoice_id(&self) -> InvoiceId {
        InvoiceId(self.0)
    }
}

/// What the database would return after storing `order` as the first order.
pub fn saved_order(order: NewOrder) -> Order {
    Order {
        id: 1,
        invoice_id: order.invoice_id,
        username: order.username,
        email: order.email,
        amount: order.amount,
        description: order.description,
        status: OrderStatusType::Pending,
        snapshot: Json(order.snapshot),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn order(status: OrderStatusType, amount: &str) -> Order {
    Order {
        id: 1,
        invoice_id: InvoiceId(INVOICE),
        username: "alice".into(),
        email: Some("alice@example.com".into()),
        amount: amount.parse().unwrap(),
        description: "Игра: Elden Ring".into(),
        status,
        snapshot: Json(CartSnapshot::default()),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}
