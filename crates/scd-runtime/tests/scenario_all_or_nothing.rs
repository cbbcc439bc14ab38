//! Upstream failure handling.
//!
//! GREEN when:
//! - any one failing store fails the invocation with that store named
//! - a store slower than the bound fails with Timeout, not a partial result
//! - an unreadable record timestamp fails as a decode error for its store

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde_json::json;

use scd_reconcile::{ReconcileFilters, ReconcileSettings};
use scd_runtime::{run_match_zone, run_reconcile, ReconcileQuery, Stores};
use scd_schemas::{DateRange, OrderSource};
use scd_store::StoreError;
use scd_testkit::*;
use scd_zones::ShippingConfig;

fn query() -> ReconcileQuery {
    ReconcileQuery {
        range: DateRange::from_dates(
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
        ),
        filters: ReconcileFilters::default(),
    }
}

fn healthy_stripe() -> InMemoryOrderStore {
    InMemoryOrderStore::new(
        OrderSource::Stripe,
        vec![stripe_row("s1", "2026-03-05T10:00:00Z", toronto(), "50", "9.99", Some("12.49"))],
    )
}

async fn run(stores: Stores, timeout: Duration) -> Result<scd_reconcile::ReconcileReport, StoreError> {
    run_reconcile(&stores, &query(), &ReconcileSettings::default(), timeout).await
}

#[tokio::test]
async fn healthy_stores_produce_a_report() {
    let stores = Stores::new(
        Arc::new(InMemoryZoneStore::new(canadian_zones())),
        Arc::new(healthy_stripe()),
        Arc::new(InMemoryOrderStore::empty(OrderSource::WooCommerce)),
    );
    let report = run(stores, Duration::from_secs(5)).await.unwrap();
    assert_eq!(report.total_orders, 1);
}

#[tokio::test]
async fn failing_order_store_fails_the_invocation() {
    let err = StoreError::Api {
        store: "woocommerce_orders".to_string(),
        status: 500,
        message: "boom".to_string(),
    };
    let stores = Stores::new(
        Arc::new(InMemoryZoneStore::new(canadian_zones())),
        Arc::new(healthy_stripe()),
        Arc::new(FailingStore::new(err.clone()).for_source(OrderSource::WooCommerce)),
    );
    let got = run(stores, Duration::from_secs(5)).await.unwrap_err();
    assert_eq!(got, err);
}

#[tokio::test]
async fn failing_zone_store_fails_the_invocation() {
    let stores = Stores::new(
        Arc::new(FailingStore::new(StoreError::transport("shipping_zones", "refused"))),
        Arc::new(healthy_stripe()),
        Arc::new(InMemoryOrderStore::empty(OrderSource::WooCommerce)),
    );
    let got = run(stores, Duration::from_secs(5)).await.unwrap_err();
    assert_eq!(got.store(), "shipping_zones");
}

#[tokio::test(start_paused = true)]
async fn slow_store_times_out() {
    let stores = Stores::new(
        Arc::new(InMemoryZoneStore::new(canadian_zones())),
        Arc::new(SlowStore::new(healthy_stripe(), Duration::from_secs(60))),
        Arc::new(InMemoryOrderStore::empty(OrderSource::WooCommerce)),
    );
    let got = run(stores, Duration::from_secs(15)).await.unwrap_err();
    assert_eq!(
        got,
        StoreError::Timeout {
            store: "memory_stripe".to_string(),
            after_secs: 15,
        }
    );
}

#[tokio::test]
async fn unreadable_timestamp_fails_as_decode() {
    let stores = Stores::new(
        Arc::new(InMemoryZoneStore::new(canadian_zones())),
        Arc::new(healthy_stripe()),
        Arc::new(InMemoryOrderStore::new(
            OrderSource::WooCommerce,
            vec![woo_row(1, "soon", calgary(), "10", "5", None)],
        )),
    );
    let got = run(stores, Duration::from_secs(5)).await.unwrap_err();
    assert!(matches!(got, StoreError::Decode { .. }), "{got:?}");
    assert_eq!(got.store(), "memory_woocommerce");
}

#[tokio::test]
async fn match_zone_normalizes_raw_address() {
    let zones = InMemoryZoneStore::new(canadian_zones());
    let lookup = run_match_zone(
        &zones,
        &json!({ "address": { "town": "  NORTH YORK ", "postcode": "m2n 6k1", "country": "CA" } }),
        &ShippingConfig::default(),
        Duration::from_secs(5),
    )
    .await
    .unwrap();
    assert_eq!(lookup.zone_name, "Toronto/GTA");
    assert_eq!(lookup.zone_id.as_deref(), Some("zone-gta"));
    assert_eq!(lookup.rate_amount, dec("9.99"));
}
