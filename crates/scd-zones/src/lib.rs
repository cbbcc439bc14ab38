//! scd-zones
//!
//! Zone resolution for a normalized address:
//! - [`match_zone`]: first enabled zone (in configured order) with any
//!   matching rule, else the "Unknown Zone" sentinel.
//! - [`resolve_rate`]: canonical rate + free-shipping eligibility for a match.
//!
//! Deterministic, pure logic. Settings arrive as an explicit
//! [`ShippingConfig`] value; nothing here reads global state.

mod matcher;
mod rates;

pub use matcher::{match_zone, match_zone_name, rule_matches, zone_matches, ZoneMatch};
pub use rates::{resolve_rate, RateResolution};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Immutable shipping settings passed into rate resolution.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingConfig {
    /// Threshold used when a matched zone's canonical rate has none.
    /// `None` keeps such zones ineligible for free shipping.
    #[serde(default)]
    pub free_threshold_fallback: Option<Decimal>,
}
