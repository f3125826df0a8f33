use thiserror::Error;

use crate::db_types::{Console, Game, PriceTier, SubscriptionPeriod, SubscriptionService};

#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Catalog record is corrupt: {0}")]
    CorruptRecord(String),
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::ColumnDecode { index, source } => {
                CatalogError::CorruptRecord(format!("column {index}: {source}"))
            },
            sqlx::Error::Decode(source) => CatalogError::CorruptRecord(source.to_string()),
            e => CatalogError::DatabaseError(e.to_string()),
        }
    }
}

/// Read-only access to the product catalog.
///
/// Absence of a record is not an error at this level; every method returns `Ok(None)` when the id is unknown. It is
/// up to the caller to decide how to report a missing product.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    async fn fetch_price_tier(&self, id: i64) -> Result<Option<PriceTier>, CatalogError>;

    async fn fetch_game(&self, id: i64) -> Result<Option<Game>, CatalogError>;

    async fn fetch_console(&self, id: i64) -> Result<Option<Console>, CatalogError>;

    async fn fetch_subscription_service(&self, id: i64) -> Result<Option<SubscriptionService>, CatalogError>;

    async fn fetch_subscription_period(&self, id: i64) -> Result<Option<SubscriptionPeriod>, CatalogError>;
}
