use log::trace;
use sqlx::SqliteConnection;

use crate::db_types::{Subscription, SubscriptionGrant};

/// Grants the subscription in `grant` to `email`.
///
/// If the buyer has no entitlement to the service yet, one is created, active or not according to `active`.
/// An existing entitlement is always activated and moved to the granted period. The `(email, service_id)` unique
/// index turns concurrent grants for the same buyer into a single row.
pub async fn grant_subscription(
    email: &str,
    grant: SubscriptionGrant,
    active: bool,
    conn: &mut SqliteConnection,
) -> Result<Subscription, sqlx::Error> {
    let subscription: Subscription = sqlx::query_as(
        r#"
            INSERT INTO subscriptions (service_id, period_id, email, is_active)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email, service_id) DO UPDATE SET
                is_active = 1,
                period_id = excluded.period_id,
                updated_at = CURRENT_TIMESTAMP
            RETURNING *;
        "#,
    )
    .bind(grant.service_id)
    .bind(grant.period_id)
    .bind(email)
    .bind(active)
    .fetch_one(conn)
    .await?;
    trace!(
        "🎟️ Subscription #{} to service {} for {email} is {}",
        subscription.id,
        subscription.service_id,
        if subscription.is_active { "active" } else { "inactive" }
    );
    Ok(subscription)
}

pub async fn fetch_subscriptions_for_email(
    email: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<Subscription>, sqlx::Error> {
    let subscriptions = sqlx::query_as("SELECT * FROM subscriptions WHERE email = $1 ORDER BY id ASC")
        .bind(email)
        .fetch_all(conn)
        .await?;
    Ok(subscriptions)
}
