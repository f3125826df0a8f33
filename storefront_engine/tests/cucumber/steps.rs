use cucumber::{gherkin::Step, then, when};
use storefront_common::Money;
use storefront_engine::{
    cart_objects::{Buyer, CartItem, CheckoutRequest},
    db_types::OrderStatusType,
    robokassa::{callback_signature_base, md5_hex, GatewayCallback},
    sqlite::db::catalog,
    CheckoutError,
    OrderManagement,
    ReconcileError,
};

use crate::cucumber::StoreWorld;

fn cart_from_step(step: &Step) -> Vec<CartItem> {
    let json = step.docstring.as_ref().expect("The cart must be given as a JSON docstring");
    serde_json::from_str(json).expect("Invalid cart JSON")
}

async fn checkout(world: &mut StoreWorld, buyer: Buyer, items: Vec<CartItem>) {
    let request = CheckoutRequest { buyer, items };
    let result = world.system().checkout_api.checkout(request).await;
    world.checkout = Some(result);
}

#[when(expr = "{word} checks out the cart")]
async fn checkout_without_email(world: &mut StoreWorld, step: &Step, username: String) {
    checkout(world, Buyer::new(username), cart_from_step(step)).await;
}

#[when(expr = "{word} with email {string} checks out the cart")]
async fn checkout_with_email(world: &mut StoreWorld, step: &Step, username: String, email: String) {
    checkout(world, Buyer::new(username).with_email(email), cart_from_step(step)).await;
}

#[when(expr = "the price of tier {int} changes to {word}")]
async fn reprice_tier(world: &mut StoreWorld, tier_id: i64, price: String) {
    let price = price.parse::<Money>().expect("Invalid price");
    let mut conn = world.system().db.pool().acquire().await.expect("No connection");
    catalog::set_price_tier_price(tier_id, price, &mut conn).await.expect("Error repricing tier");
}

#[then(expr = "the checkout succeeds with an amount of {word}")]
async fn checkout_succeeds(world: &mut StoreWorld, amount: String) {
    let result = world.checkout_result();
    assert_eq!(result.order.amount.to_string(), amount);
    assert_eq!(result.order.status, OrderStatusType::Pending);
    assert_eq!(result.payment_request.out_sum.to_string(), amount);
}

#[then(expr = "the checkout fails with {word}")]
async fn checkout_fails(world: &mut StoreWorld, kind: String) {
    let err = match world.checkout.as_ref().expect("No checkout has happened") {
        Ok(result) => panic!("Checkout should have failed, but created order #{}", result.order.id),
        Err(e) => e,
    };
    let matched = match kind.as_str() {
        "ValidationError" => matches!(err, CheckoutError::ValidationError(_)),
        "NotFound" => matches!(err, CheckoutError::NotFound(_)),
        "Unavailable" => matches!(err, CheckoutError::Unavailable(_)),
        "InvalidLevel" => matches!(err, CheckoutError::InvalidLevel { .. }),
        "NoValidItems" => matches!(err, CheckoutError::NoValidItems),
        "Internal" => matches!(err, CheckoutError::Internal(_)),
        _ => panic!("Unknown checkout error kind {kind}"),
    };
    assert!(matched, "Expected {kind}, got {err:?}");
}

#[then(expr = "the order description is {string}")]
async fn order_description(world: &mut StoreWorld, description: String) {
    assert_eq!(world.order().description, description);
}

#[then(expr = "the order has {int} line items")]
async fn order_line_items(world: &mut StoreWorld, count: usize) {
    let order_id = world.order().id;
    let items = world.system().db.fetch_line_items(order_id).await.expect("Error fetching line items");
    assert_eq!(items.len(), count);
    let total = items.iter().map(|i| i.line_total().expect("Line total overflows")).sum::<Money>();
    assert_eq!(total, world.order().amount);
}

#[then(expr = "the payment URL contains {string}")]
async fn payment_url_contains(world: &mut StoreWorld, fragment: String) {
    let url = &world.checkout_result().payment_url;
    assert!(url.contains(&fragment), "{url} does not contain {fragment}");
}

#[then(expr = "the payment URL does not contain {string}")]
async fn payment_url_does_not_contain(world: &mut StoreWorld, fragment: String) {
    let url = &world.checkout_result().payment_url;
    assert!(!url.contains(&fragment), "{url} contains {fragment}");
}

async fn send_callback(world: &mut StoreWorld, out_sum: &str, password2: &str) {
    let inv_id = world.order().invoice_id.to_string();
    let passthrough = world.passthrough().clone();
    let signature = md5_hex(&callback_signature_base(out_sum, &inv_id, password2, &passthrough));
    let mut params = vec![
        ("OutSum".to_string(), out_sum.to_string()),
        ("InvId".to_string(), inv_id),
        ("SignatureValue".to_string(), signature.to_uppercase()),
    ];
    params.extend(passthrough.iter().map(|(k, v)| (k.to_string(), v.to_string())));
    let callback = GatewayCallback::from_params(params).expect("Callback is missing fields");
    let result = world.system().reconcile_api.process_callback(&callback).await;
    world.callback = Some(result);
}

#[when("the gateway confirms the payment")]
async fn gateway_confirms(world: &mut StoreWorld) {
    let amount = world.order().amount.to_string();
    send_callback(world, &amount, "P2").await;
}

#[when(expr = "the gateway reports a payment of {word}")]
async fn gateway_reports(world: &mut StoreWorld, amount: String) {
    send_callback(world, &amount, "P2").await;
}

#[when(expr = "a forged callback reports a payment of {word}")]
async fn forged_callback(world: &mut StoreWorld, amount: String) {
    send_callback(world, &amount, "not-the-password").await;
}

#[then("the callback is accepted")]
async fn callback_accepted(world: &mut StoreWorld) {
    match world.callback.as_ref().expect("No callback has been sent") {
        Ok(outcome) => assert!(outcome.is_accepted()),
        Err(e) => panic!("Callback was rejected: {e}"),
    }
}

#[then("the callback was a replay")]
async fn callback_replayed(world: &mut StoreWorld) {
    let outcome = world.callback.as_ref().expect("No callback has been sent").as_ref().expect("Callback was rejected");
    assert!(outcome.replayed, "Callback was applied again");
    assert!(outcome.entitlements.is_empty());
}

#[then(expr = "the callback is rejected as {word}")]
async fn callback_rejected(world: &mut StoreWorld, kind: String) {
    let err = match world.callback.as_ref().expect("No callback has been sent") {
        Ok(outcome) => panic!("Callback should have been rejected, but order is {}", outcome.order.status),
        Err(e) => e,
    };
    let matched = match kind.as_str() {
        "InvalidSignature" => matches!(err, ReconcileError::InvalidSignature(_)),
        "AmountMismatch" => matches!(err, ReconcileError::AmountMismatch { .. }),
        "OrderNotFound" => matches!(err, ReconcileError::OrderNotFound(_)),
        "ValidationError" => matches!(err, ReconcileError::ValidationError(_)),
        _ => panic!("Unknown callback error kind {kind}"),
    };
    assert!(matched, "Expected {kind}, got {err:?}");
}

#[then(expr = "the order status is {word}")]
async fn order_status(world: &mut StoreWorld, status: String) {
    let expected = status.parse::<OrderStatusType>().expect("Invalid status");
    let order_id = world.order().id;
    let order = world
        .system()
        .db
        .fetch_order(order_id)
        .await
        .expect("Error fetching order")
        .expect("Order does not exist");
    assert_eq!(order.status, expected);
}

#[then(expr = "the order amount is still {word}")]
async fn order_amount(world: &mut StoreWorld, amount: String) {
    let invoice_id = world.order().invoice_id;
    let order = world
        .system()
        .db
        .fetch_order_by_invoice_id(invoice_id)
        .await
        .expect("Error fetching order")
        .expect("Order does not exist");
    assert_eq!(order.amount.to_string(), amount);
}

#[then(expr = "{string} has an {word} subscription to service {int}")]
async fn has_subscription(world: &mut StoreWorld, email: String, state: String, service_id: i64) {
    let active = match state.as_str() {
        "active" => true,
        "inactive" => false,
        _ => panic!("Subscriptions are active or inactive, not {state}"),
    };
    let subscriptions =
        world.system().db.fetch_subscriptions_for_email(&email).await.expect("Error fetching subscriptions");
    let subscription = subscriptions
        .iter()
        .find(|s| s.service_id == service_id)
        .unwrap_or_else(|| panic!("{email} has no subscription to service {service_id}"));
    assert_eq!(subscription.is_active, active);
}

#[then(expr = "{string} has {int} subscriptions")]
async fn subscription_count(world: &mut StoreWorld, email: String, count: usize) {
    let subscriptions =
        world.system().db.fetch_subscriptions_for_email(&email).await.expect("Error fetching subscriptions");
    assert_eq!(subscriptions.len(), count);
}
