//! scd-reconcile
//!
//! Shipping cost reconciliation engine.
//!
//! For every order with a shipping address:
//! - match the address to one zone (or "Unknown Zone")
//! - resolve the rate that should have applied and free-shipping eligibility
//! - compare what was charged against what the carrier billed
//!
//! Then filter, search, sort (newest first), paginate and aggregate.
//!
//! Rules:
//! - Orders without a shipping address never appear in any output.
//! - Orders without a carrier cost are listed but never count toward losses.
//! - Loss stats are over the filtered set; the regional bucket and
//!   free-shipping stats are over the full, unfiltered set.
//!
//! Deterministic, pure logic. No IO. Nothing in here returns an error.

mod engine;
mod filter;
mod stats;
mod types;

pub use engine::{reconcile, reconcile_order};
pub use filter::{apply_filters, matches_search};
pub use stats::compute_stats;
pub use types::*;
