use std::time::Duration;

use actix_web::{
    dev::{Server, Service},
    http::KeepAlive,
    middleware::Logger,
    web,
    App,
    HttpServer,
};
use futures::{future::ok, FutureExt};
use log::*;
use storefront_engine::{events::EventProducers, CheckoutApi, ReconcileApi, SqliteDatabase};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    helpers::{get_remote_ip, is_whitelisted},
    integrations::order_log::create_order_log_handlers,
    routes::{health, CheckoutRoute, OrderStatusRoute, ResultCallbackFormRoute, ResultCallbackQueryRoute},
};

const MAX_DB_CONNECTIONS: u32 = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = if config.database_url.is_empty() {
        SqliteDatabase::new(MAX_DB_CONNECTIONS).await
    } else {
        SqliteDatabase::new_with_url(&config.database_url, MAX_DB_CONNECTIONS).await
    }
    .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.run_migrations {
        db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Database migrations failed. {e}")))?;
    } else {
        info!("🚀️ STORE_RUN_MIGRATIONS is off. Assuming the database schema is up to date.");
    }
    let handlers = create_order_log_handlers();
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Malformed JSON bodies are reported in the same `{"error": ...}` shape as every other API error.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| ServerError::InvalidRequestBody(err.to_string()).into())
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let checkout_api = CheckoutApi::new(db.clone(), config.robokassa.clone())
            .with_invoice_ids(config.invoice_id_strategy.generator());
        let reconcile_api = ReconcileApi::new(db.clone(), config.robokassa.clone(), producers.clone())
            .with_ordering(config.entitlement_ordering);
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("store::access_log"))
            .app_data(web::Data::new(checkout_api))
            .app_data(web::Data::new(reconcile_api));
        let api_scope = web::scope("/api")
            .app_data(json_config())
            .service(CheckoutRoute::<SqliteDatabase>::new())
            .service(OrderStatusRoute::<SqliteDatabase>::new());
        let use_x_forwarded_for = config.use_x_forwarded_for;
        let use_forwarded = config.use_forwarded;
        let robokassa_whitelist = config.robokassa_whitelist.clone();
        let robokassa_scope = web::scope("/robokassa")
            .wrap_fn(move |req, srv| {
                let peer_ip = get_remote_ip(req.request(), use_x_forwarded_for, use_forwarded);
                let whitelisted = is_whitelisted(peer_ip, robokassa_whitelist.as_deref());
                if whitelisted {
                    srv.call(req)
                } else {
                    ok(req.error_response(ServerError::ForbiddenPeer)).boxed_local()
                }
            })
            .service(ResultCallbackFormRoute::<SqliteDatabase>::new())
            .service(ResultCallbackQueryRoute::<SqliteDatabase>::new());
        app.service(health).service(api_scope).service(robokassa_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
