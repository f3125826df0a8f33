//! Catalog fixtures.
//!
//! [`seed_catalog`] inserts a small catalog that the integration tests refer to by the ids stored in [`Catalog`].
use rust_decimal::Decimal;
use storefront_common::Money;

use crate::{
    db_types::{
        ActivationType,
        Console,
        Discount,
        Game,
        PriceTier,
        SubscriptionLevel,
        SubscriptionPeriod,
        SubscriptionService,
    },
    sqlite::db::catalog,
    SqliteDatabase,
};

#[derive(Debug, Clone)]
pub struct Catalog {
    pub ps5: Console,
    pub ps4: Console,
    /// Available, sold with and without activation on the PS5
    pub elden_ring: Game,
    /// 1000.00 with a 10% discount, so 900.00
    pub elden_ring_activated: PriceTier,
    /// 800.00 with 150.00 off, so 650.00
    pub elden_ring_plain: PriceTier,
    /// Not for sale
    pub starfield: Game,
    pub starfield_tier: PriceTier,
    /// Sold in levels
    pub ps_plus: SubscriptionService,
    /// 3 months for 1500.00
    pub ps_plus_3m: SubscriptionPeriod,
    /// No levels
    pub ea_play: SubscriptionService,
    /// 1 month for 400.00
    pub ea_play_1m: SubscriptionPeriod,
    /// Not for sale
    pub retired_service: SubscriptionService,
    pub retired_period: SubscriptionPeriod,
}

pub async fn seed_catalog(db: &SqliteDatabase) -> Result<Catalog, sqlx::Error> {
    let mut conn = db.pool().acquire().await?;
    let ps5 = catalog::insert_console("PS5", &mut conn).await?;
    let ps4 = catalog::insert_console("PS4", &mut conn).await?;
    let elden_ring = catalog::insert_game("Elden Ring", true, &mut conn).await?;
    let elden_ring_activated = catalog::insert_price_tier(
        elden_ring.id,
        ps5.id,
        ActivationType::WithActivation,
        Money::from_major(1000),
        Some(Discount::Percent(Decimal::from(10))),
        &mut conn,
    )
    .await?;
    let elden_ring_plain = catalog::insert_price_tier(
        elden_ring.id,
        ps5.id,
        ActivationType::WithoutActivation,
        Money::from_major(800),
        Some(Discount::Flat(Money::from_major(150))),
        &mut conn,
    )
    .await?;
    let starfield = catalog::insert_game("Starfield", false, &mut conn).await?;
    let starfield_tier = catalog::insert_price_tier(
        starfield.id,
        ps5.id,
        ActivationType::WithActivation,
        Money::from_major(500),
        None,
        &mut conn,
    )
    .await?;
    let ps_plus =
        catalog::insert_subscription_service("PS Plus", Some(SubscriptionLevel::Extra), true, &mut conn).await?;
    let ps_plus_3m = catalog::insert_subscription_period(ps_plus.id, 3, Money::from_major(1500), &mut conn).await?;
    let ea_play = catalog::insert_subscription_service("EA Play", None, true, &mut conn).await?;
    let ea_play_1m = catalog::insert_subscription_period(ea_play.id, 1, Money::from_major(400), &mut conn).await?;
    let retired_service = catalog::insert_subscription_service("Ubisoft+", None, false, &mut conn).await?;
    let retired_period =
        catalog::insert_subscription_period(retired_service.id, 1, Money::from_major(300), &mut conn).await?;
    Ok(Catalog {
        ps5,
        ps4,
        elden_ring,
        elden_ring_activated,
        elden_ring_plain,
        starfield,
        starfield_tier,
        ps_plus,
        ps_plus_3m,
        ea_play,
        ea_play_1m,
        retired_service,
        retired_period,
    })
}
