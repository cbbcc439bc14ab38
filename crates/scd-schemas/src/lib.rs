//! scd-schemas
//!
//! Canonical shipping data model shared by every ShipCost Desk crate.
//!
//! - Zone configuration (`ShippingZone` + rules + rates) is read-only input.
//! - `Order` is the single canonical order shape; it is rebuilt from the raw
//!   source records on every query and never persisted in this form.
//! - `NormalizedAddress` is a computed view used only for zone matching.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Zone name reported when no enabled zone matches an address.
pub const UNKNOWN_ZONE: &str = "Unknown Zone";

// ---------------------------------------------------------------------------
// Zone configuration
// ---------------------------------------------------------------------------

/// Address field a [`ZoneRule`] is tested against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleField {
    Country,
    Region,
    City,
    PostalCode,
}

impl RuleField {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleField::Country => "country",
            RuleField::Region => "region",
            RuleField::City => "city",
            RuleField::PostalCode => "postal_code",
        }
    }
}

/// How a rule's `match_value` is compared with the address field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// Field equals the value.
    Exact,
    /// Field contains the value as a substring.
    Contains,
    /// Value is a comma-separated prefix list; field starts with any of them.
    PrefixSet,
}

/// A single field/value/match-type predicate belonging to a zone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneRule {
    pub field: RuleField,
    pub match_value: String,
    pub match_type: MatchType,
}

impl ZoneRule {
    pub fn new(field: RuleField, match_value: impl Into<String>, match_type: MatchType) -> Self {
        Self {
            field,
            match_value: match_value.into(),
            match_type,
        }
    }

    pub fn city_contains(value: impl Into<String>) -> Self {
        Self::new(RuleField::City, value, MatchType::Contains)
    }

    pub fn country_exact(value: impl Into<String>) -> Self {
        Self::new(RuleField::Country, value, MatchType::Exact)
    }
}

/// A configured rate for a zone. `free_threshold == None` means the zone
/// never waives shipping.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneRate {
    pub rate_amount: Decimal,
    #[serde(default)]
    pub free_threshold: Option<Decimal>,
}

impl ZoneRate {
    pub fn new(rate_amount: Decimal, free_threshold: Option<Decimal>) -> Self {
        Self {
            rate_amount,
            free_threshold,
        }
    }
}

/// A named geographic shipping bucket.
///
/// A zone matches an address when **any** of its rules matches (logical OR).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingZone {
    #[serde(deserialize_with = "id_string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// Configured priority; lower sorts first. Stores order zones by this.
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub rules: Vec<ZoneRule>,
    #[serde(default)]
    pub rates: Vec<ZoneRate>,
}

impl ShippingZone {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            enabled: true,
            position: 0,
            rules: Vec::new(),
            rates: Vec::new(),
        }
    }

    pub fn with_rule(mut self, rule: ZoneRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_rate(mut self, rate: ZoneRate) -> Self {
        self.rates.push(rate);
        self
    }

    pub fn with_position(mut self, position: i32) -> Self {
        self.position = position;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// The rate treated as canonical for the zone. Only the first configured
    /// rate is ever consulted; tier selection is not defined.
    pub fn canonical_rate(&self) -> Option<&ZoneRate> {
        self.rates.first()
    }
}

/// Zone ids arrive as strings from some stores and integers from others.
fn id_string_or_number<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(d)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "zone id must be a string or number, got {other}"
        ))),
    }
}

fn enabled_by_default() -> bool {
    true
}

/// Sort zones into configured order: `position` ascending, then `id`.
/// The sort is stable so equal keys keep their store order.
pub fn sort_zones_by_position(zones: &mut [ShippingZone]) {
    zones.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id)));
}

// ---------------------------------------------------------------------------
// Addresses
// ---------------------------------------------------------------------------

/// Canonical four-field address. All fields are trimmed and lower-cased;
/// an absent field is `""`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NormalizedAddress {
    pub country: String,
    pub region: String,
    pub city: String,
    pub postal_code: String,
}

impl NormalizedAddress {
    pub fn field(&self, field: RuleField) -> &str {
        match field {
            RuleField::Country => &self.country,
            RuleField::Region => &self.region,
            RuleField::City => &self.city,
            RuleField::PostalCode => &self.postal_code,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.country.is_empty()
            && self.region.is_empty()
            && self.city.is_empty()
            && self.postal_code.is_empty()
    }
}

/// Source key aliases for each address field, in lookup order.
pub mod address_keys {
    pub const COUNTRY: &[&str] = &["country", "country_code"];
    pub const REGION: &[&str] = &["state", "province", "region"];
    pub const CITY: &[&str] = &["city", "town"];
    pub const POSTAL_CODE: &[&str] = &["postal_code", "postcode", "zip"];
    /// Street lines. Never matched against, but they make an address real.
    pub const STREET: &[&str] = &["line1", "line2", "address_1", "address_2"];

    pub const ALL: &[&[&str]] = &[COUNTRY, REGION, CITY, POSTAL_CODE, STREET];
}

/// The address object inside a raw shipping blob. Stripe-style blobs nest it
/// under `address`.
pub fn address_object(raw: &Value) -> Option<&serde_json::Map<String, Value>> {
    let map = raw.as_object()?;
    match map.get("address") {
        Some(Value::Object(inner)) => Some(inner),
        _ => Some(map),
    }
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// Which order store a record came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSource {
    Stripe,
    WooCommerce,
}

impl OrderSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSource::Stripe => "stripe",
            OrderSource::WooCommerce => "woocommerce",
        }
    }
}

/// Canonical order, built per query from one of the two source stores.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub source: OrderSource,
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub created_at: DateTime<Utc>,
    /// Raw, source-shaped address blob. `Value::Null` when absent.
    pub shipping_address: Value,
    pub subtotal: Decimal,
    /// Shipping amount charged to the customer.
    pub charged: Decimal,
    /// Amount billed by the carrier. `None` = not yet recorded; `Some(0)` is
    /// a real recorded cost.
    pub actual_carrier_cost: Option<Decimal>,
    pub fulfillment_status: String,
}

impl Order {
    /// `true` when at least one address field (see [`address_keys`]) is
    /// non-blank. Recipient name, phone or company alone is not an address.
    pub fn has_shipping_address(&self) -> bool {
        let Some(map) = address_object(&self.shipping_address) else {
            return false;
        };
        address_keys::ALL
            .iter()
            .flat_map(|keys| keys.iter())
            .filter_map(|k| map.get(*k))
            .any(scalar_is_present)
    }
}

fn scalar_is_present(v: &Value) -> bool {
    match v {
        Value::String(s) => !s.trim().is_empty(),
        Value::Number(_) => true,
        _ => false,
    }
}

/// Inclusive query window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Whole calendar days: `start` 00:00:00 through `end` 23:59:59.999999 UTC.
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Self {
        let end_of_day = NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999).unwrap_or(NaiveTime::MIN);
        Self {
            start: start.and_time(NaiveTime::MIN).and_utc(),
            end: end.and_time(end_of_day).and_utc(),
        }
    }

    /// Parse `YYYY-MM-DD` bounds. Rejects `start` after `end`.
    pub fn parse_days(start: &str, end: &str) -> Result<Self, DateRangeError> {
        let s = parse_day(start)?;
        let e = parse_day(end)?;
        if s > e {
            return Err(DateRangeError::Inverted {
                start: s.to_string(),
                end: e.to_string(),
            });
        }
        Ok(Self::from_dates(s, e))
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts <= self.end
    }
}

fn parse_day(raw: &str) -> Result<NaiveDate, DateRangeError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| DateRangeError::BadDate(raw.to_string()))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DateRangeError {
    BadDate(String),
    Inverted { start: String, end: String },
}

impl std::fmt::Display for DateRangeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateRangeError::BadDate(raw) => write!(f, "invalid date '{raw}': expected YYYY-MM-DD"),
            DateRangeError::Inverted { start, end } => {
                write!(f, "invalid date range: start {start} is after end {end}")
            }
        }
    }
}

impl std::error::Error for DateRangeError {}
