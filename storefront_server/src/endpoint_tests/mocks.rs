use mockall::mock;
use storefront_engine::{
    db_types::{
        Console,
        Game,
        InvoiceId,
        NewOrder,
        Order,
        OrderLineItem,
        PriceTier,
        Subscription,
        SubscriptionPeriod,
        SubscriptionService,
    },
    traits::{
        CatalogError,
        CatalogManagement,
        OrderManagement,
        PaymentConfirmation,
        PaymentGatewayDatabase,
        PaymentGatewayError,
        ReconcileOutcome,
    },
};

mock! {
    pub Storefront {}
    impl Clone for Storefront {
        fn clone(&self) -> Self;
    }
    impl OrderManagement for Storefront {
        async fn fetch_order(&self, id: i64) -> Result<Option<Order>, PaymentGatewayError>;
        async fn fetch_order_by_invoice_id(&self, invoice_id: InvoiceId) -> Result<Option<Order>, PaymentGatewayError>;
        async fn fetch_line_items(&self, order_id: i64) -> Result<Vec<OrderLineItem>, PaymentGatewayError>;
        async fn fetch_subscriptions_for_email(&self, email: &str) -> Result<Vec<Subscription>, PaymentGatewayError>;
    }
    impl PaymentGatewayDatabase for Storefront {
        fn url(&self) -> &str;
        async fn insert_order_with_items(&self, order: NewOrder) -> Result<(Order, Vec<OrderLineItem>), PaymentGatewayError>;
        async fn apply_payment_confirmation(&self, confirmation: PaymentConfirmation) -> Result<ReconcileOutcome, PaymentGatewayError>;
    }
    impl CatalogManagement for Storefront {
        async fn fetch_price_tier(&self, id: i64) -> Result<Option<PriceTier>, CatalogError>;
        async fn fetch_game(&self, id: i64) -> Result<Option<Game>, CatalogError>;
        async fn fetch_console(&self, id: i64) -> Result<Option<Console>, CatalogError>;
        async fn fetch_subscription_service(&self, id: i64) -> Result<Option<SubscriptionService>, CatalogError>;
        async fn fetch_subscription_period(&self, id: i64) -> Result<Option<SubscriptionPeriod>, CatalogError>;
    }
}
