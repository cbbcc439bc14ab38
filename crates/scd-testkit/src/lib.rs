//! Fixtures and in-process stores for scenario tests.
//!
//! Not for production wiring: binaries build their stores from config via
//! `scd-runtime`.

use std::path::PathBuf;
use std::time::Duration;

use rust_decimal::Decimal;
use serde_json::{json, Value};

use scd_ingest::RawOrderRecord;
use scd_schemas::{
    DateRange, MatchType, OrderSource, RuleField, ShippingZone, ZoneRate, ZoneRule,
};
use scd_store::{OrderStore, StoreError, ZoneStore};

// ---------------------------------------------------------------------------
// Zone fixtures
// ---------------------------------------------------------------------------

pub fn dec(s: &str) -> Decimal {
    s.parse().unwrap_or_else(|e| panic!("bad decimal fixture {s:?}: {e}"))
}

/// Three-tier Canadian setup used across scenarios:
///
/// | position | zone | rule | rate | free over |
/// |---|---|---|---|---|
/// | 1 | Toronto/GTA | city contains `toronto` or postal prefix `M` | 9.99 | 99 |
/// | 2 | Ontario | region exact `ON` | 14.99 | 149 |
/// | 3 | Canada | country exact `CA` | 19.99 | none |
pub fn canadian_zones() -> Vec<ShippingZone> {
    vec![
        ShippingZone::new("zone-gta", "Toronto/GTA")
            .with_position(1)
            .with_rule(ZoneRule::city_contains("toronto"))
            .with_rule(ZoneRule::new(RuleField::PostalCode, "M", MatchType::PrefixSet))
            .with_rate(ZoneRate::new(dec("9.99"), Some(dec("99")))),
        ShippingZone::new("zone-on", "Ontario")
            .with_position(2)
            .with_rule(ZoneRule::new(RuleField::Region, "ON", MatchType::Exact))
            .with_rate(ZoneRate::new(dec("14.99"), Some(dec("149")))),
        ShippingZone::new("zone-ca", "Canada")
            .with_position(3)
            .with_rule(ZoneRule::country_exact("CA"))
            .with_rate(ZoneRate::new(dec("19.99"), None)),
    ]
}

// ---------------------------------------------------------------------------
// Raw order row fixtures
// ---------------------------------------------------------------------------

/// Stripe row shaped like the upstream table.
pub fn stripe_row(
    id: &str,
    created_at: &str,
    address: Value,
    subtotal: &str,
    charged: &str,
    carrier: Option<&str>,
) -> Value {
    json!({
        "id": id,
        "order_number": format!("S-{id}"),
        "customer_name": format!("Customer {id}"),
        "customer_email": format!("{id}@example.test"),
        "created_at": created_at,
        "shipping_address": address,
        "subtotal": subtotal,
        "shipping_cost": charged,
        "actual_shipping_cost": carrier,
        "fulfillment_status": "fulfilled",
    })
}

/// WooCommerce row shaped like the upstream table.
pub fn woo_row(
    id: u64,
    date_created: &str,
    shipping: Value,
    subtotal: &str,
    charged: &str,
    carrier: Option<&str>,
) -> Value {
    json!({
        "id": id,
        "number": id.to_string(),
        "billing": {
            "first_name": "Woo",
            "last_name": format!("Buyer{id}"),
            "email": format!("woo{id}@example.test"),
        },
        "date_created": date_created,
        "shipping": shipping,
        "subtotal": subtotal,
        "shipping_total": charged,
        "actual_shipping_cost": carrier,
        "status": "completed",
    })
}

pub fn toronto() -> Value {
    json!({ "city": "Toronto", "province": "ON", "postal_code": "M5V 2T6", "country": "CA" })
}

pub fn ottawa() -> Value {
    json!({ "city": "Ottawa", "state": "ON", "postcode": "K1P 1J1", "country": "CA" })
}

pub fn calgary() -> Value {
    json!({ "city": "Calgary", "state": "AB", "postcode": "T2P 1J9", "country": "CA" })
}

pub fn decode_rows(source: OrderSource, rows: Vec<Value>) -> Vec<RawOrderRecord> {
    rows.into_iter()
        .map(|row| match source {
            OrderSource::Stripe => RawOrderRecord::Stripe(
                serde_json::from_value(row).unwrap_or_else(|e| panic!("bad stripe fixture: {e}")),
            ),
            OrderSource::WooCommerce => RawOrderRecord::WooCommerce(
                serde_json::from_value(row).unwrap_or_else(|e| panic!("bad woo fixture: {e}")),
            ),
        })
        .collect()
}

/// Write `value` as `<dir>/<file_name>` and return the path.
pub fn write_json(dir: &tempfile::TempDir, file_name: &str, value: &Value) -> PathBuf {
    let path = dir.path().join(file_name);
    let text = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| panic!("serialize fixture {file_name}: {e}"));
    std::fs::write(&path, text).unwrap_or_else(|e| panic!("write fixture {file_name}: {e}"));
    path
}

// ---------------------------------------------------------------------------
// In-process stores
// ---------------------------------------------------------------------------

/// Zone store over a fixed list. Honors the enabled filter and ordering
/// contract like the real stores.
pub struct InMemoryZoneStore {
    zones: Vec<ShippingZone>,
}

impl InMemoryZoneStore {
    pub fn new(zones: Vec<ShippingZone>) -> Self {
        Self { zones }
    }
}

#[async_trait::async_trait]
impl ZoneStore for InMemoryZoneStore {
    fn name(&self) -> &str {
        "memory_zones"
    }

    async fn fetch_enabled_zones(&self) -> Result<Vec<ShippingZone>, StoreError> {
        let mut zones: Vec<ShippingZone> =
            self.zones.iter().filter(|z| z.enabled).cloned().collect();
        scd_schemas::sort_zones_by_position(&mut zones);
        Ok(zones)
    }
}

/// Order store over fixed raw rows; applies the date window.
pub struct InMemoryOrderStore {
    source: OrderSource,
    records: Vec<RawOrderRecord>,
}

impl InMemoryOrderStore {
    pub fn new(source: OrderSource, rows: Vec<Value>) -> Self {
        Self {
            source,
            records: decode_rows(source, rows),
        }
    }

    pub fn empty(source: OrderSource) -> Self {
        Self {
            source,
            records: Vec::new(),
        }
    }
}

#[async_trait::async_trait]
impl OrderStore for InMemoryOrderStore {
    fn name(&self) -> &str {
        match self.source {
            OrderSource::Stripe => "memory_stripe",
            OrderSource::WooCommerce => "memory_woocommerce",
        }
    }

    fn source(&self) -> OrderSource {
        self.source
    }

    async fn fetch_orders(&self, window: DateRange) -> Result<Vec<RawOrderRecord>, StoreError> {
        let mut out = Vec::new();
        for rec in &self.records {
            let ts = rec
                .created_at()
                .map_err(|e| StoreError::decode(self.name(), e.to_string()))?;
            if window.contains(ts) {
                out.push(rec.clone());
            }
        }
        Ok(out)
    }
}

/// Store that always fails with the given error.
pub struct FailingStore {
    error: StoreError,
    source: OrderSource,
}

impl FailingStore {
    pub fn new(error: StoreError) -> Self {
        Self {
            error,
            source: OrderSource::Stripe,
        }
    }

    pub fn for_source(mut self, source: OrderSource) -> Self {
        self.source = source;
        self
    }
}

#[async_trait::async_trait]
impl ZoneStore for FailingStore {
    fn name(&self) -> &str {
        self.error.store()
    }

    async fn fetch_enabled_zones(&self) -> Result<Vec<ShippingZone>, StoreError> {
        Err(self.error.clone())
    }
}

#[async_trait::async_trait]
impl OrderStore for FailingStore {
    fn name(&self) -> &str {
        self.error.store()
    }

    fn source(&self) -> OrderSource {
        self.source
    }

    async fn fetch_orders(&self, _window: DateRange) -> Result<Vec<RawOrderRecord>, StoreError> {
        Err(self.error.clone())
    }
}

/// Wraps a store and sleeps before every fetch.
pub struct SlowStore<S> {
    inner: S,
    delay: Duration,
}

impl<S> SlowStore<S> {
    pub fn new(inner: S, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait::async_trait]
impl<S: ZoneStore> ZoneStore for SlowStore<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn fetch_enabled_zones(&self) -> Result<Vec<ShippingZone>, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.fetch_enabled_zones().await
    }
}

#[async_trait::async_trait]
impl<S: OrderStore> OrderStore for SlowStore<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn source(&self) -> OrderSource {
        self.inner.source()
    }

    async fn fetch_orders(&self, window: DateRange) -> Result<Vec<RawOrderRecord>, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.fetch_orders(window).await
    }
}
