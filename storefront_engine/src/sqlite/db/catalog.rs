//! Catalog queries. The engine only reads the catalog; the insert functions exist to seed test databases and for
//! operator tooling.
use std::str::FromStr;

use log::trace;
use rust_decimal::Decimal;
use sqlx::{sqlite::SqliteRow, FromRow, Row, SqliteConnection};
use storefront_common::Money;

use super::decode_error;
use crate::db_types::{
    ActivationType,
    Console,
    Discount,
    Game,
    PriceTier,
    SubscriptionLevel,
    SubscriptionPeriod,
    SubscriptionService,
};

impl FromRow<'_, SqliteRow> for PriceTier {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let sale_unit: Option<String> = row.try_get("sale_unit")?;
        let sale_amount: Option<String> = row.try_get("sale_amount")?;
        let discount = match (sale_unit.as_deref(), sale_amount) {
            (None, _) | (_, None) => None,
            (Some("percent"), Some(amount)) => {
                let pct = Decimal::from_str(amount.trim()).map_err(|e| decode_error("sale_amount", e))?;
                Some(Discount::Percent(pct))
            },
            (Some("flat"), Some(amount)) => {
                let flat = Money::from_str(&amount).map_err(|e| decode_error("sale_amount", e))?;
                Some(Discount::Flat(flat))
            },
            (Some(unit), Some(_)) => return Err(decode_error("sale_unit", format!("Unknown sale unit '{unit}'"))),
        };
        Ok(PriceTier {
            id: row.try_get("id")?,
            game_id: row.try_get("game_id")?,
            console_id: row.try_get("console_id")?,
            activation: row.try_get("activation")?,
            price: row.try_get("price")?,
            is_active: row.try_get("is_active")?,
            discount,
        })
    }
}

fn discount_columns(discount: Option<Discount>) -> (Option<&'static str>, Option<String>) {
    match discount {
        None => (None, None),
        Some(Discount::Percent(pct)) => (Some("percent"), Some(pct.to_string())),
        Some(Discount::Flat(amount)) => (Some("flat"), Some(amount.to_string())),
    }
}

pub async fn fetch_price_tier(id: i64, conn: &mut SqliteConnection) -> Result<Option<PriceTier>, sqlx::Error> {
    let tier = sqlx::query_as("SELECT * FROM price_tiers WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(tier)
}

pub async fn fetch_game(id: i64, conn: &mut SqliteConnection) -> Result<Option<Game>, sqlx::Error> {
    let game = sqlx::query_as("SELECT * FROM games WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(game)
}

pub async fn fetch_console(id: i64, conn: &mut SqliteConnection) -> Result<Option<Console>, sqlx::Error> {
    let console = sqlx::query_as("SELECT * FROM consoles WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(console)
}

pub async fn fetch_subscription_service(
    id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<SubscriptionService>, sqlx::Error> {
    let service =
        sqlx::query_as("SELECT * FROM subscription_services WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(service)
}

pub async fn fetch_subscription_period(
    id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<SubscriptionPeriod>, sqlx::Error> {
    let period =
        sqlx::query_as("SELECT * FROM subscription_periods WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(period)
}

pub async fn insert_console(name: &str, conn: &mut SqliteConnection) -> Result<Console, sqlx::Error> {
    let console =
        sqlx::query_as("INSERT INTO consoles (name) VALUES ($1) RETURNING *").bind(name).fetch_one(conn).await?;
    trace!("📦️ Console {console:?} added to the catalog");
    Ok(console)
}

pub async fn insert_game(title: &str, is_available: bool, conn: &mut SqliteConnection) -> Result<Game, sqlx::Error> {
    let game = sqlx::query_as("INSERT INTO games (title, is_available) VALUES ($1, $2) RETURNING *")
        .bind(title)
        .bind(is_available)
        .fetch_one(conn)
        .await?;
    trace!("📦️ Game {game:?} added to the catalog");
    Ok(game)
}

pub async fn insert_price_tier(
    game_id: i64,
    console_id: i64,
    activation: ActivationType,
    price: Money,
    discount: Option<Discount>,
    conn: &mut SqliteConnection,
) -> Result<PriceTier, sqlx::Error> {
    let (sale_unit, sale_amount) = discount_columns(discount);
    let tier = sqlx::query_as(
        r#"
            INSERT INTO price_tiers (game_id, console_id, activation, price, sale_unit, sale_amount)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(game_id)
    .bind(console_id)
    .bind(activation)
    .bind(price)
    .bind(sale_unit)
    .bind(sale_amount)
    .fetch_one(conn)
    .await?;
    trace!("📦️ Price tier {tier:?} added to the catalog");
    Ok(tier)
}

/// Flags a price tier as (in)active. Inactive tiers cannot be bought.
pub async fn set_price_tier_active(id: i64, is_active: bool, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE price_tiers SET is_active = $1 WHERE id = $2").bind(is_active).bind(id).execute(conn).await?;
    Ok(())
}

/// Reprices a tier. Orders that were created before the change keep their locked amounts.
pub async fn set_price_tier_price(id: i64, price: Money, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE price_tiers SET price = $1 WHERE id = $2").bind(price).bind(id).execute(conn).await?;
    trace!("📦️ Price tier #{id} now costs {price}");
    Ok(())
}

pub async fn insert_subscription_service(
    title: &str,
    level: Option<SubscriptionLevel>,
    is_available: bool,
    conn: &mut SqliteConnection,
) -> Result<SubscriptionService, sqlx::Error> {
    let service = sqlx::query_as(
        "INSERT INTO subscription_services (title, level, is_available) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(title)
    .bind(level)
    .bind(is_available)
    .fetch_one(conn)
    .await?;
    trace!("📦️ Subscription service {service:?} added to the catalog");
    Ok(service)
}

pub async fn insert_subscription_period(
    service_id: i64,
    months: i64,
    price: Money,
    conn: &mut SqliteConnection,
) -> Result<SubscriptionPeriod, sqlx::Error> {
    let period = sqlx::query_as(
        "INSERT INTO subscription_periods (service_id, months, price) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(service_id)
    .bind(months)
    .bind(price)
    .fetch_one(conn)
    .await?;
    trace!("📦️ Subscription period {period:?} added to the catalog");
    Ok(period)
}
