//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every database call in the engine is async, so handlers simply
//! `.await` them and the worker carries on with other requests in the meantime.
use actix_web::{get, http::header::ContentType, web, HttpResponse, Responder};
use log::*;
use storefront_engine::{
    cart_objects::CheckoutRequest,
    db_types::InvoiceId,
    robokassa::GatewayCallback,
    traits::{PaymentGatewayDatabase, StorefrontBackend},
    CheckoutApi,
    ReconcileApi,
    ReconcileError,
};

use crate::{data_objects::CheckoutResponse, errors::ServerError};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Checkout  ----------------------------------------------------
route!(checkout => Post "/checkout" impl StorefrontBackend);
/// Route handler for the checkout endpoint
///
/// The storefront posts the buyer and the contents of their cart:
/// ```json
/// {
///   "username": "alice",
///   "email": "alice@example.com",
///   "items": [
///     { "product_type": "game", "price_id": 1, "quantity": 1 },
///     { "product_type": "subscription_service", "service_id": 1, "period_id": 1, "console_id": 1, "level": "Extra" }
///   ]
/// }
/// ```
/// Every item is priced from the catalog. Client-side prices are never trusted. If at least one item resolves, a
/// pending order is created and the response carries the signed payment page URL that the buyer must be sent to.
pub async fn checkout<B: StorefrontBackend>(
    body: web::Json<CheckoutRequest>,
    api: web::Data<CheckoutApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    debug!("💻️ POST checkout for {} with {} cart items", request.buyer.username, request.items.len());
    let result = api.checkout(request).await.map_err(|e| {
        debug!("💻️ Checkout failed. {e}");
        e
    })?;
    info!("💻️ Invoice {} created for {} ({})", result.invoice_id(), result.order.username, result.order.amount);
    Ok(HttpResponse::Ok().json(CheckoutResponse::from(result)))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(order_status => Get "/order/{invoice_id}" impl StorefrontBackend);
/// Route handler for the order status endpoint
///
/// Returns the public view of the order with the given gateway invoice id, so that the storefront can tell the buyer
/// whether their payment went through.
pub async fn order_status<B: StorefrontBackend>(
    path: web::Path<String>,
    api: web::Data<CheckoutApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let invoice_id =
        path.into_inner().parse::<InvoiceId>().map_err(|e| ServerError::InvalidRequestPath(e.to_string()))?;
    debug!("💻️ GET order status for invoice {invoice_id}");
    let summary = api
        .order_summary(invoice_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("No order for invoice {invoice_id}")))?;
    Ok(HttpResponse::Ok().json(summary))
}

//----------------------------------------------   Robokassa  ----------------------------------------------------
route!(result_callback_form => Post "/result" impl PaymentGatewayDatabase);
/// Route handler for the result URL when the gateway is configured to POST its notifications.
pub async fn result_callback_form<B: PaymentGatewayDatabase>(
    form: web::Form<Vec<(String, String)>>,
    api: web::Data<ReconcileApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received POST result callback");
    handle_result_callback(form.into_inner(), api.as_ref()).await
}

route!(result_callback_query => Get "/result" impl PaymentGatewayDatabase);
/// Route handler for the result URL when the gateway is configured to send its notifications with GET.
pub async fn result_callback_query<B: PaymentGatewayDatabase>(
    query: web::Query<Vec<(String, String)>>,
    api: web::Data<ReconcileApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received GET result callback");
    handle_result_callback(query.into_inner(), api.as_ref()).await
}

/// The gateway only considers a notification delivered when the response body is `OK{InvId}`. Anything else makes it
/// retry, which is harmless since applied callbacks are never applied twice.
async fn handle_result_callback<B: PaymentGatewayDatabase>(
    params: Vec<(String, String)>,
    api: &ReconcileApi<B>,
) -> Result<HttpResponse, ServerError> {
    let callback = GatewayCallback::from_params(params).map_err(ReconcileError::from)?;
    debug!("💻️ Result callback for invoice {} reports {}", callback.inv_id, callback.out_sum);
    let outcome = api.process_callback(&callback).await.map_err(|e| {
        warn!("💻️ Result callback for invoice {} was rejected. {e}", callback.inv_id);
        e
    })?;
    trace!("💻️ Invoice {} is {}. Acknowledging the callback.", callback.inv_id, outcome.order.status);
    Ok(HttpResponse::Ok().insert_header(ContentType::plaintext()).body(callback.acknowledgement()))
}
