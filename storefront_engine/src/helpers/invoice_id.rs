//! # Invoice id generation
//!
//! The gateway identifies a payment by a numeric `InvId`, which must be unique per merchant. Two schemes are
//! available:
//!
//! * [`RandomInvoiceIds`] (the default) draws uniformly from `1..=2_147_483_647`, the range the gateway accepts.
//!   Collisions are rare, and the unique index on `orders.invoice_id` catches the ones that do happen so that the
//!   checkout can retry with a fresh id.
//! * [`EpochModuloInvoiceIds`] reproduces the legacy scheme of `unix time mod 100000`. Any two checkouts that land on
//!   the same second (or exactly 100000 seconds apart) produce the same id, so it must only be used where
//!   compatibility with existing invoice numbering is needed.
use std::{fmt::Display, str::FromStr, sync::Arc};

use chrono::Utc;
use rand::Rng;

use crate::db_types::{ConversionError, InvoiceId};

pub const MAX_INVOICE_ID: i64 = 2_147_483_647;
pub const LEGACY_INVOICE_MODULUS: i64 = 100_000;

pub trait InvoiceIdGenerator: Send + Sync {
    fn next_invoice_id(&self) -> InvoiceId;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RandomInvoiceIds;

impl InvoiceIdGenerator for RandomInvoiceIds {
    fn next_invoice_id(&self) -> InvoiceId {
        InvoiceId(rand::thread_rng().gen_range(1..=MAX_INVOICE_ID))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EpochModuloInvoiceIds;

impl EpochModuloInvoiceIds {
    /// The invoice id that this scheme hands out at `timestamp` (unix seconds).
    pub fn invoice_id_at(timestamp: i64) -> InvoiceId {
        InvoiceId(timestamp.rem_euclid(LEGACY_INVOICE_MODULUS))
    }
}

impl InvoiceIdGenerator for EpochModuloInvoiceIds {
    fn next_invoice_id(&self) -> InvoiceId {
        Self::invoice_id_at(Utc::now().timestamp())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InvoiceIdStrategy {
    #[default]
    Random,
    EpochModulo,
}

impl InvoiceIdStrategy {
    pub fn generator(&self) -> Arc<dyn InvoiceIdGenerator> {
        match self {
            InvoiceIdStrategy::Random => Arc::new(RandomInvoiceIds),
            InvoiceIdStrategy::EpochModulo => Arc::new(EpochModuloInvoiceIds),
        }
    }
}

impl FromStr for InvoiceIdStrategy {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(Self::Random),
            "epoch" | "epoch_modulo" => Ok(Self::EpochModulo),
            _ => Err(ConversionError::new(format!("Invalid invoice id strategy: {s}"))),
        }
    }
}

impl Display for InvoiceIdStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvoiceIdStrategy::Random => write!(f, "random"),
            InvoiceIdStrategy::EpochModulo => write!(f, "epoch"),
        }
    }
}
