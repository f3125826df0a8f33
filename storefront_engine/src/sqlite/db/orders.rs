use log::{debug, trace};
use sqlx::{sqlite::SqliteRow, types::Json, FromRow, Row, SqliteConnection};

use super::decode_error;
use crate::{
    db_types::{
        InvoiceId,
        NewLineItem,
        NewOrder,
        Order,
        OrderLineItem,
        OrderStatusType,
        ProductKind,
        ProductRef,
        SubscriptionLevel,
    },
    traits::PaymentGatewayError,
};

/// Inserts a new order into the database using the given connection. This is not atomic. You can embed this call
/// inside a transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
///
/// The line items in `order.items` are **not** inserted. See [`insert_line_item`].
///
/// A clash on the invoice id is reported as [`PaymentGatewayError::InvoiceIdAlreadyExists`].
pub async fn insert_order(order: &NewOrder, conn: &mut SqliteConnection) -> Result<Order, PaymentGatewayError> {
    let result = sqlx::query_as(
        r#"
            INSERT INTO orders (
                invoice_id,
                username,
                email,
                amount,
                description,
                snapshot
            ) VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(order.invoice_id)
    .bind(order.username.as_str())
    .bind(order.email.as_deref())
    .bind(order.amount)
    .bind(order.description.as_str())
    .bind(Json(order.snapshot.clone()))
    .fetch_one(conn)
    .await;
    match result {
        Ok(order) => Ok(order),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            debug!("📝️ Invoice id {} is already taken", order.invoice_id);
            Err(PaymentGatewayError::InvoiceIdAlreadyExists(order.invoice_id))
        },
        Err(e) => Err(e.into()),
    }
}

/// Inserts a single line item for the order with internal id `order_id`.
pub async fn insert_line_item(
    order_id: i64,
    item: &NewLineItem,
    conn: &mut SqliteConnection,
) -> Result<OrderLineItem, PaymentGatewayError> {
    let columns = ProductColumns::from(&item.product);
    let line_item = sqlx::query_as(
        r#"
            INSERT INTO order_items (
                order_id,
                kind,
                game_id,
                price_tier_id,
                service_id,
                period_id,
                console_id,
                level,
                unit_price,
                quantity
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(columns.kind.to_string())
    .bind(columns.game_id)
    .bind(columns.price_tier_id)
    .bind(columns.service_id)
    .bind(columns.period_id)
    .bind(columns.console_id)
    .bind(columns.level)
    .bind(item.unit_price)
    .bind(item.quantity)
    .fetch_one(conn)
    .await?;
    trace!("📝️ Line item {line_item:?} added to order #{order_id}");
    Ok(line_item)
}

pub async fn fetch_order_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_by_invoice_id(
    invoice_id: InvoiceId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE invoice_id = $1").bind(invoice_id).fetch_optional(conn).await?;
    Ok(order)
}

/// Returns the line items for the order, in insertion order.
pub async fn fetch_line_items(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderLineItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

/// Takes the database write lock inside the current transaction and reports whether the order exists.
///
/// This must be the first statement of a transaction that reads an order and then updates it. SQLite cannot upgrade
/// a read transaction to a write transaction while another connection is writing, so a transaction that reads first
/// fails with `SQLITE_BUSY` under concurrent writers instead of waiting for the lock.
pub(crate) async fn lock_order(id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE orders SET updated_at = updated_at WHERE id = $1").bind(id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}

/// Moves a `pending` order to `status`. Orders that have already left `pending` cannot be changed, and
/// [`PaymentGatewayError::OrderModificationForbidden`] is returned for them.
pub(crate) async fn update_order_status(
    id: i64,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Order, PaymentGatewayError> {
    let result: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND status = 'pending'
            RETURNING *
        "#,
    )
    .bind(status)
    .bind(id)
    .fetch_optional(conn)
    .await?;
    result.ok_or(PaymentGatewayError::OrderModificationForbidden)
}

/// The flattened column form of a [`ProductRef`].
struct ProductColumns {
    kind: ProductKind,
    game_id: Option<i64>,
    price_tier_id: Option<i64>,
    service_id: Option<i64>,
    period_id: Option<i64>,
    console_id: i64,
    level: Option<String>,
}

impl From<&ProductRef> for ProductColumns {
    fn from(product: &ProductRef) -> Self {
        match product {
            ProductRef::Game { game_id, price_tier_id, console_id } => Self {
                kind: ProductKind::Game,
                game_id: Some(*game_id),
                price_tier_id: Some(*price_tier_id),
                service_id: None,
                period_id: None,
                console_id: *console_id,
                level: None,
            },
            ProductRef::SubscriptionService { service_id, period_id, console_id, level } => Self {
                kind: ProductKind::SubscriptionService,
                game_id: None,
                price_tier_id: None,
                service_id: Some(*service_id),
                period_id: Some(*period_id),
                console_id: *console_id,
                level: level.map(|l| l.to_string()),
            },
        }
    }
}

fn required(column: &str, value: Option<i64>) -> Result<i64, sqlx::Error> {
    value.ok_or_else(|| decode_error(column, format!("{column} is required for this kind of line item")))
}

impl FromRow<'_, SqliteRow> for OrderLineItem {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let kind: String = row.try_get("kind")?;
        let kind = kind.parse::<ProductKind>().map_err(|e| decode_error("kind", e))?;
        let console_id: i64 = row.try_get("console_id")?;
        let product = match kind {
            ProductKind::Game => ProductRef::Game {
                game_id: required("game_id", row.try_get("game_id")?)?,
                price_tier_id: required("price_tier_id", row.try_get("price_tier_id")?)?,
                console_id,
            },
            ProductKind::SubscriptionService => {
                let level: Option<String> = row.try_get("level")?;
                let level = level
                    .map(|l| l.parse::<SubscriptionLevel>())
                    .transpose()
                    .map_err(|e| decode_error("level", e))?;
                ProductRef::SubscriptionService {
                    service_id: required("service_id", row.try_get("service_id")?)?,
                    period_id: required("period_id", row.try_get("period_id")?)?,
                    console_id,
                    level,
                }
            },
        };
        Ok(OrderLineItem {
            id: row.try_get("id")?,
            order_id: row.try_get("order_id")?,
            product,
            unit_price: row.try_get("unit_price")?,
            quantity: row.try_get("quantity")?,
            created_at: row.try_get("created_at")?,
        })
    }
}
