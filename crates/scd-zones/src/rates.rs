use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{ShippingConfig, ZoneMatch};

/// Rate that should have applied to an order, and whether the order's
/// subtotal qualified for free shipping.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateResolution {
    pub original_rate: Decimal,
    pub free_threshold: Option<Decimal>,
    pub meets_threshold: bool,
}

impl RateResolution {
    fn none() -> Self {
        Self {
            original_rate: Decimal::ZERO,
            free_threshold: None,
            meets_threshold: false,
        }
    }
}

/// Resolve the canonical rate for a match.
///
/// Only `rates[0]` is consulted. The sentinel zone has no rate and is never
/// eligible for free shipping.
pub fn resolve_rate(m: ZoneMatch<'_>, subtotal: Decimal, cfg: &ShippingConfig) -> RateResolution {
    let Some(zone) = m.zone() else {
        return RateResolution::none();
    };

    let (original_rate, zone_threshold) = match zone.canonical_rate() {
        Some(rate) => (rate.rate_amount, rate.free_threshold),
        None => (Decimal::ZERO, None),
    };
    let free_threshold = zone_threshold.or(cfg.free_threshold_fallback);
    let meets_threshold = free_threshold.map(|t| subtotal >= t).unwrap_or(false);

    RateResolution {
        original_rate,
        free_threshold,
        meets_threshold,
    }
}
