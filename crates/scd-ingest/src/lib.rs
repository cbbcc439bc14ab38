//! scd-ingest
//!
//! Turns raw order-store records into canonical [`scd_schemas::Order`] values
//! and raw address blobs into [`scd_schemas::NormalizedAddress`].
//!
//! Pure, deterministic conversion. No IO, no store calls, no async.
//! Callers fetch raw records (see `scd-store`) and hand them to [`adapt_all`].

pub mod adapter;
pub mod address;
pub mod money;

pub use adapter::{
    adapt, adapt_all, adapt_stripe, adapt_woo, AdaptOutcome, AdapterError, RawBilling,
    RawLineItem, RawOrderRecord, RawStripeOrder, RawWooOrder,
};
pub use address::normalize_address;
pub use money::{amount_from_value, amount_or_zero};
