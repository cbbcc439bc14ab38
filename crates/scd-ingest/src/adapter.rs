//! OrderSourceAdapter: raw source records -> canonical [`Order`].
//!
//! # Sources
//! The two order stores disagree on shape:
//! - **Stripe** records carry explicit `customer_name` / `customer_email`
//!   columns and a first-class `shipping_cost` column.
//! - **WooCommerce** records nest identity under `billing` and encode the
//!   shipping charge as a line item (or shipping line) whose name contains
//!   "shipping".
//!
//! Each source has its own `Raw*` struct and adapter function; callers hold a
//! [`RawOrderRecord`] and never branch on shape themselves.
//!
//! # Contract
//! - A record without a usable shipping address is dropped (`Ok(None)`).
//! - `actual_shipping_cost` stays `None` when absent; zero is a real cost.
//! - The only error is a timestamp that cannot be read, which means the store
//!   handed back something that is not an order.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use scd_schemas::{Order, OrderSource};

use crate::money::{amount_from_value, amount_or_zero};

const UNKNOWN_CUSTOMER: &str = "Unknown";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// The record's creation timestamp is not a recognised date/time.
    InvalidTimestamp {
        source: OrderSource,
        order_id: String,
        raw: String,
    },
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTimestamp {
                source,
                order_id,
                raw,
            } => write!(
                f,
                "{} order '{order_id}' has unreadable timestamp '{raw}'",
                source.as_str()
            ),
        }
    }
}

impl std::error::Error for AdapterError {}

// ---------------------------------------------------------------------------
// Raw wire-level structs
// ---------------------------------------------------------------------------

/// Nested billing identity. Both sources may carry one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBilling {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// A line item or shipping line. WooCommerce shipping lines use
/// `method_title` where line items use `name`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLineItem {
    #[serde(default, alias = "method_title")]
    pub name: Option<String>,
    #[serde(default)]
    pub total: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawStripeOrder {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub billing: Option<RawBilling>,
    pub created_at: String,
    #[serde(default)]
    pub shipping_address: Value,
    #[serde(default)]
    pub subtotal: Value,
    #[serde(default)]
    pub shipping_cost: Value,
    #[serde(default)]
    pub line_items: Vec<RawLineItem>,
    #[serde(default)]
    pub actual_shipping_cost: Value,
    #[serde(default)]
    pub fulfillment_status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawWooOrder {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub number: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub billing: Option<RawBilling>,
    pub date_created: String,
    #[serde(default)]
    pub shipping: Value,
    #[serde(default)]
    pub subtotal: Value,
    #[serde(default)]
    pub shipping_total: Value,
    #[serde(default)]
    pub line_items: Vec<RawLineItem>,
    #[serde(default)]
    pub shipping_lines: Vec<RawLineItem>,
    #[serde(default)]
    pub actual_shipping_cost: Value,
    #[serde(default)]
    pub status: Option<String>,
}

/// One raw record tagged with the store it came from.
#[derive(Debug, Clone)]
pub enum RawOrderRecord {
    Stripe(RawStripeOrder),
    WooCommerce(RawWooOrder),
}

fn string_or_number<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(d)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

fn opt_string_or_number<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(d)? {
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        _ => Ok(None),
    }
}

// ---------------------------------------------------------------------------
// Shared resolution helpers
// ---------------------------------------------------------------------------

fn non_blank(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|t| !t.is_empty()).map(str::to_string)
}

/// explicit field -> billing `name` -> billing first + last -> "Unknown".
fn resolve_customer_name(explicit: Option<&str>, billing: Option<&RawBilling>) -> String {
    if let Some(n) = non_blank(explicit) {
        return n;
    }
    if let Some(b) = billing {
        if let Some(n) = non_blank(b.name.as_deref()) {
            return n;
        }
        let joined = format!(
            "{} {}",
            b.first_name.as_deref().unwrap_or("").trim(),
            b.last_name.as_deref().unwrap_or("").trim()
        );
        if let Some(n) = non_blank(Some(&joined)) {
            return n;
        }
    }
    UNKNOWN_CUSTOMER.to_string()
}

fn resolve_customer_email(explicit: Option<&str>, billing: Option<&RawBilling>) -> String {
    non_blank(explicit)
        .or_else(|| billing.and_then(|b| non_blank(b.email.as_deref())))
        .unwrap_or_else(|| UNKNOWN_CUSTOMER.to_string())
}

/// First item whose name contains "shipping" (case-insensitive).
fn shipping_line_total(items: &[RawLineItem]) -> Option<Decimal> {
    items
        .iter()
        .find(|li| {
            li.name
                .as_deref()
                .map(|n| n.to_lowercase().contains("shipping"))
                .unwrap_or(false)
        })
        .map(|li| amount_or_zero(&li.total))
}

/// direct column -> "shipping" line item -> 0.
fn resolve_charged(direct: &Value, item_lists: &[&[RawLineItem]]) -> Decimal {
    if let Some(v) = amount_from_value(direct) {
        return v;
    }
    item_lists
        .iter()
        .find_map(|items| shipping_line_total(items))
        .unwrap_or(Decimal::ZERO)
}

fn parse_timestamp(
    source: OrderSource,
    order_id: &str,
    raw: &str,
) -> Result<DateTime<Utc>, AdapterError> {
    let t = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(t) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(t, fmt) {
            return Ok(naive.and_utc());
        }
    }
    if let Some(naive) = NaiveDate::parse_from_str(t, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(naive.and_utc());
    }
    Err(AdapterError::InvalidTimestamp {
        source,
        order_id: order_id.to_string(),
        raw: raw.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Adapters
// ---------------------------------------------------------------------------

pub fn adapt_stripe(raw: RawStripeOrder) -> Result<Option<Order>, AdapterError> {
    let created_at = parse_timestamp(OrderSource::Stripe, &raw.id, &raw.created_at)?;
    let order = Order {
        order_number: non_blank(raw.order_number.as_deref()).unwrap_or_else(|| raw.id.clone()),
        customer_name: resolve_customer_name(raw.customer_name.as_deref(), raw.billing.as_ref()),
        customer_email: resolve_customer_email(raw.customer_email.as_deref(), raw.billing.as_ref()),
        created_at,
        subtotal: amount_or_zero(&raw.subtotal),
        charged: resolve_charged(&raw.shipping_cost, &[&raw.line_items]),
        actual_carrier_cost: amount_from_value(&raw.actual_shipping_cost),
        fulfillment_status: raw.fulfillment_status.unwrap_or_default(),
        shipping_address: raw.shipping_address,
        source: OrderSource::Stripe,
        id: raw.id,
    };
    Ok(order.has_shipping_address().then_some(order))
}

pub fn adapt_woo(raw: RawWooOrder) -> Result<Option<Order>, AdapterError> {
    let created_at = parse_timestamp(OrderSource::WooCommerce, &raw.id, &raw.date_created)?;
    let order = Order {
        order_number: non_blank(raw.number.as_deref()).unwrap_or_else(|| raw.id.clone()),
        customer_name: resolve_customer_name(raw.customer_name.as_deref(), raw.billing.as_ref()),
        customer_email: resolve_customer_email(raw.customer_email.as_deref(), raw.billing.as_ref()),
        created_at,
        subtotal: amount_or_zero(&raw.subtotal),
        charged: resolve_charged(&raw.shipping_total, &[&raw.line_items, &raw.shipping_lines]),
        actual_carrier_cost: amount_from_value(&raw.actual_shipping_cost),
        fulfillment_status: raw.status.unwrap_or_default(),
        shipping_address: raw.shipping,
        source: OrderSource::WooCommerce,
        id: raw.id,
    };
    Ok(order.has_shipping_address().then_some(order))
}

impl RawOrderRecord {
    pub fn source(&self) -> OrderSource {
        match self {
            RawOrderRecord::Stripe(_) => OrderSource::Stripe,
            RawOrderRecord::WooCommerce(_) => OrderSource::WooCommerce,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            RawOrderRecord::Stripe(r) => &r.id,
            RawOrderRecord::WooCommerce(r) => &r.id,
        }
    }

    /// Parsed creation timestamp, read the same way the adapter reads it.
    pub fn created_at(&self) -> Result<DateTime<Utc>, AdapterError> {
        match self {
            RawOrderRecord::Stripe(r) => parse_timestamp(OrderSource::Stripe, &r.id, &r.created_at),
            RawOrderRecord::WooCommerce(r) => {
                parse_timestamp(OrderSource::WooCommerce, &r.id, &r.date_created)
            }
        }
    }
}

pub fn adapt(record: RawOrderRecord) -> Result<Option<Order>, AdapterError> {
    match record {
        RawOrderRecord::Stripe(r) => adapt_stripe(r),
        RawOrderRecord::WooCommerce(r) => adapt_woo(r),
    }
}

/// Result of adapting a whole batch.
#[derive(Debug, Clone, Default)]
pub struct AdaptOutcome {
    pub orders: Vec<Order>,
    /// Records dropped because they had no shipping address.
    pub dropped_without_address: usize,
}

/// Adapt a batch in input order. Stops at the first unreadable record.
pub fn adapt_all<I>(records: I) -> Result<AdaptOutcome, AdapterError>
where
    I: IntoIterator<Item = RawOrderRecord>,
{
    let mut out = AdaptOutcome::default();
    for rec in records {
        match adapt(rec)? {
            Some(order) => out.orders.push(order),
            None => out.dropped_without_address += 1,
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn woo(v: Value) -> RawWooOrder {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn name_falls_back_to_billing_then_unknown() {
        let billing = RawBilling {
            first_name: Some("Ada".into()),
            last_name: Some(" Lovelace ".into()),
            ..Default::default()
        };
        assert_eq!(resolve_customer_name(Some("  "), Some(&billing)), "Ada Lovelace");
        assert_eq!(resolve_customer_name(Some("Grace"), Some(&billing)), "Grace");
        assert_eq!(resolve_customer_name(None, None), "Unknown");
        assert_eq!(
            resolve_customer_name(None, Some(&RawBilling::default())),
            "Unknown"
        );
    }

    #[test]
    fn email_falls_back_to_billing() {
        let billing = RawBilling {
            email: Some("ada@example.com".into()),
            ..Default::default()
        };
        assert_eq!(resolve_customer_email(None, Some(&billing)), "ada@example.com");
        assert_eq!(resolve_customer_email(None, None), "Unknown");
    }

    #[test]
    fn woo_charged_comes_from_shipping_line_item() {
        let o = adapt_woo(woo(json!({
            "id": 42,
            "number": "1042",
            "date_created": "2026-03-01T10:00:00",
            "shipping": {"city": "Toronto"},
            "subtotal": "40.00",
            "line_items": [
                {"name": "Mug", "total": "20.00"},
                {"name": "Standard Shipping", "total": "7.50"}
            ]
        })))
        .unwrap()
        .unwrap();
        assert_eq!(o.id, "42");
        assert_eq!(o.order_number, "1042");
        assert_eq!(o.charged, Decimal::new(750, 2));
        assert_eq!(o.actual_carrier_cost, None);
        assert_eq!(o.source, OrderSource::WooCommerce);
    }

    #[test]
    fn woo_charged_defaults_to_zero_without_shipping_item() {
        let o = adapt_woo(woo(json!({
            "id": "7",
            "date_created": "2026-03-01",
            "shipping": {"city": "Ottawa"},
            "line_items": [{"name": "Mug", "total": "20.00"}]
        })))
        .unwrap()
        .unwrap();
        assert_eq!(o.charged, Decimal::ZERO);
        assert_eq!(o.order_number, "7");
    }

    #[test]
    fn direct_column_wins_over_line_items() {
        let o = adapt_woo(woo(json!({
            "id": "8",
            "date_created": "2026-03-01T00:00:00Z",
            "shipping": {"city": "Ottawa"},
            "shipping_total": "0.00",
            "line_items": [{"name": "shipping", "total": "9.00"}]
        })))
        .unwrap()
        .unwrap();
        assert_eq!(o.charged, Decimal::ZERO);
    }

    #[test]
    fn zero_carrier_cost_is_kept_distinct_from_missing() {
        let o = adapt_woo(woo(json!({
            "id": "9",
            "date_created": "2026-03-01T00:00:00Z",
            "shipping": {"city": "Ottawa"},
            "actual_shipping_cost": 0
        })))
        .unwrap()
        .unwrap();
        assert_eq!(o.actual_carrier_cost, Some(Decimal::ZERO));
    }

    #[test]
    fn missing_address_is_dropped_not_an_error() {
        let r = adapt_woo(woo(json!({
            "id": "10",
            "date_created": "2026-03-01T00:00:00Z"
        })))
        .unwrap();
        assert!(r.is_none());
    }

    #[test]
    fn recipient_without_address_is_dropped() {
        let r = adapt_woo(woo(json!({
            "id": "11",
            "date_created": "2026-03-01T00:00:00Z",
            "shipping": {"first_name": "Ada", "last_name": "L", "city": "", "postcode": ""},
            "actual_shipping_cost": "4.00"
        })))
        .unwrap();
        assert!(r.is_none());
    }

    #[test]
    fn unreadable_timestamp_is_an_error() {
        let err = adapt_woo(woo(json!({
            "id": "11",
            "date_created": "yesterday",
            "shipping": {"city": "Ottawa"}
        })))
        .unwrap_err();
        assert!(matches!(err, AdapterError::InvalidTimestamp { .. }));
        assert!(err.to_string().contains("woocommerce order '11'"));
    }
}
