mod invoice_id;

pub use invoice_id::{
    EpochModuloInvoiceIds,
    InvoiceIdGenerator,
    InvoiceIdStrategy,
    RandomInvoiceIds,
    LEGACY_INVOICE_MODULUS,
    MAX_INVOICE_ID,
};
