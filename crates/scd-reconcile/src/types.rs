use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use scd_schemas::Order;
use scd_zones::ShippingConfig;

/// Per-order reconciliation outcome. Computed on demand, never stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub order: Order,
    pub matched_zone_name: String,
    /// Carrier cost, or 0 when none is recorded.
    pub actual_cost: Decimal,
    pub charged: Decimal,
    /// `actual_cost - charged`. Positive = the store lost money.
    pub difference: Decimal,
    pub has_carrier_cost: bool,
    pub was_free_shipping: bool,
    pub meets_threshold: bool,
    pub discount_applied: Decimal,
    pub original_rate: Decimal,
}

impl ReconciliationResult {
    /// Counts toward loss aggregates.
    pub fn is_loss(&self) -> bool {
        self.has_carrier_cost && self.difference > Decimal::ZERO
    }
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Sign filter on `difference`. Unrecognised input means `All`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossFilter {
    #[default]
    All,
    Loss,
    Gain,
}

impl LossFilter {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "loss" => LossFilter::Loss,
            "gain" => LossFilter::Gain,
            _ => LossFilter::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LossFilter::All => "all",
            LossFilter::Loss => "loss",
            LossFilter::Gain => "gain",
        }
    }

    pub fn keeps(&self, difference: Decimal) -> bool {
        match self {
            LossFilter::All => true,
            LossFilter::Loss => difference > Decimal::ZERO,
            LossFilter::Gain => difference < Decimal::ZERO,
        }
    }
}

/// Equality filter on matched zone name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneFilter {
    #[default]
    All,
    Named(String),
}

impl ZoneFilter {
    /// Empty input or `all` (any case) means no zone filtering.
    pub fn parse(s: &str) -> Self {
        let t = s.trim();
        if t.is_empty() || t.eq_ignore_ascii_case("all") {
            ZoneFilter::All
        } else {
            ZoneFilter::Named(t.to_string())
        }
    }

    pub fn keeps(&self, zone_name: &str) -> bool {
        match self {
            ZoneFilter::All => true,
            ZoneFilter::Named(n) => n == zone_name,
        }
    }
}

/// 1-based page of the sorted, filtered list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub number: usize,
    pub size: usize,
}

impl Page {
    pub fn new(number: usize, size: usize) -> Self {
        Self {
            number: number.max(1),
            size: size.max(1),
        }
    }

    pub fn offset(&self) -> usize {
        (self.number.max(1) - 1).saturating_mul(self.size.max(1))
    }
}

/// Caller-supplied query filters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileFilters {
    pub zone: ZoneFilter,
    pub loss: LossFilter,
    /// Case-insensitive substring over order number, email and name.
    pub search: String,
    pub page: Option<Page>,
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Zones whose name contains any keyword form the regional reporting bucket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionalBucket {
    pub label: String,
    pub keywords: Vec<String>,
}

impl Default for RegionalBucket {
    fn default() -> Self {
        Self {
            label: "Toronto/GTA".to_string(),
            keywords: vec!["toronto".to_string(), "gta".to_string()],
        }
    }
}

impl RegionalBucket {
    pub fn contains_zone(&self, zone_name: &str) -> bool {
        let name = zone_name.to_lowercase();
        self.keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .any(|k| name.contains(&k))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileSettings {
    pub shipping: ShippingConfig,
    pub regional_bucket: RegionalBucket,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileStats {
    pub total_loss: Decimal,
    pub orders_with_loss: u64,
    pub average_loss: Decimal,
    pub biggest_loss: Decimal,
    pub toronto_gta_loss: Decimal,
    pub toronto_gta_orders: u64,
    pub total_discounts_given: Decimal,
    pub free_shipping_orders: u64,
    pub avg_discount: Decimal,
}

/// Full report for one query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// Filtered, sorted newest first, and sliced to `page` when one is set.
    pub orders: Vec<ReconciliationResult>,
    /// Filtered count before pagination.
    pub total_orders: usize,
    pub page: Option<Page>,
    pub stats: ReconcileStats,
}
