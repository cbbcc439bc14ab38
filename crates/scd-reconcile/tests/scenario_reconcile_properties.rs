//! Reconciliation scenarios and laws: loss computation, free-shipping
//! threshold, exclusion of address-less orders, missing carrier cost,
//! filter partition, search, sort order and pagination.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use scd_reconcile::*;
use scd_schemas::*;
use serde_json::{json, Value};

fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap()
}

fn order(id: &str, city: &str, charged: &str, carrier: Option<&str>) -> Order {
    Order {
        id: id.to_string(),
        source: OrderSource::Stripe,
        order_number: id.to_string(),
        customer_name: format!("Customer {id}"),
        customer_email: format!("{}@example.com", id.to_lowercase()),
        created_at: at(1),
        shipping_address: json!({"city": city, "country": "CA"}),
        subtotal: d("20"),
        charged: d(charged),
        actual_carrier_cost: carrier.map(d),
        fulfillment_status: "fulfilled".to_string(),
    }
}

fn zones() -> Vec<ShippingZone> {
    vec![
        ShippingZone::new("z-to", "Toronto")
            .with_rule(ZoneRule::city_contains("toronto"))
            .with_rate(ZoneRate::new(d("3.99"), None)),
        ShippingZone::new("z-gta", "GTA")
            .with_rule(ZoneRule::city_contains("mississauga"))
            .with_rule(ZoneRule::city_contains("brampton"))
            .with_rate(ZoneRate::new(d("15"), Some(d("50")))),
        ShippingZone::new("z-ott", "Ottawa")
            .with_rule(ZoneRule::city_contains("ottawa"))
            .with_rate(ZoneRate::new(d("12"), Some(d("100")))),
    ]
}

fn run(orders: &[Order], filters: &ReconcileFilters) -> ReconcileReport {
    reconcile(orders, &zones(), filters, &ReconcileSettings::default())
}

#[test]
fn toronto_order_undercharged_is_a_loss() {
    let report = run(
        &[order("SS-1", "Toronto", "3.99", Some("5.20"))],
        &ReconcileFilters::default(),
    );
    let r = &report.orders[0];
    assert_eq!(r.matched_zone_name, "Toronto");
    assert_eq!(r.difference, d("1.21"));
    assert!(r.has_carrier_cost);
    assert_eq!(report.stats.orders_with_loss, 1);
    assert_eq!(report.stats.total_loss, d("1.21"));
    assert_eq!(report.stats.toronto_gta_orders, 1);
    assert_eq!(report.stats.toronto_gta_loss, d("1.21"));
}

#[test]
fn free_shipping_over_threshold_records_the_waived_rate() {
    let mut o = order("SS-2", "Mississauga", "0", Some("11.00"));
    o.subtotal = d("75");
    let report = run(&[o], &ReconcileFilters::default());
    let r = &report.orders[0];
    assert_eq!(r.matched_zone_name, "GTA");
    assert!(r.meets_threshold);
    assert!(r.was_free_shipping);
    assert_eq!(r.discount_applied, d("15"));
    assert_eq!(r.original_rate, d("15"));
    assert_eq!(report.stats.free_shipping_orders, 1);
    assert_eq!(report.stats.total_discounts_given, d("15"));
    assert_eq!(report.stats.avg_discount, d("15"));
}

#[test]
fn threshold_law_holds_in_both_directions() {
    let mut cases = Vec::new();
    for (i, (subtotal, charged)) in [("75", "0"), ("75", "4"), ("49.99", "0"), ("50", "0")]
        .iter()
        .enumerate()
    {
        let mut o = order(&format!("T-{i}"), "Brampton", charged, Some("10"));
        o.subtotal = d(subtotal);
        cases.push(o);
    }
    let report = run(&cases, &ReconcileFilters::default());
    for r in &report.orders {
        let expected = r.charged == Decimal::ZERO && r.order.subtotal >= d("50");
        assert_eq!(r.was_free_shipping, expected, "order {}", r.order.id);
    }
    assert_eq!(report.stats.free_shipping_orders, 2);
}

#[test]
fn orders_without_address_are_invisible() {
    let with = order("SS-3", "Toronto", "3.99", Some("9.99"));
    let mut without = order("SS-4", "Toronto", "0", Some("50"));
    without.shipping_address = Value::Null;
    let mut blank = order("SS-5", "Toronto", "0", Some("50"));
    blank.shipping_address = json!({"city": ""});
    let mut stripe_recipient_only = order("SS-8", "Toronto", "0", Some("4"));
    stripe_recipient_only.shipping_address =
        json!({"name": "Ada", "address": {"city": "", "postal_code": null}});
    let mut woo_recipient_only = order("SS-9", "Toronto", "0", Some("4"));
    woo_recipient_only.shipping_address =
        json!({"first_name": "Ada", "last_name": "L", "city": "", "postcode": ""});

    let base = run(std::slice::from_ref(&with), &ReconcileFilters::default());
    let mixed = run(
        &[with, without, blank, stripe_recipient_only, woo_recipient_only],
        &ReconcileFilters::default(),
    );

    assert_eq!(mixed.orders.len(), 1);
    assert_eq!(mixed.total_orders, 1);
    assert_eq!(mixed.stats, base.stats);
}

#[test]
fn missing_carrier_cost_is_listed_but_not_a_loss() {
    let report = run(
        &[
            order("SS-6", "Toronto", "3.99", None),
            order("SS-7", "Ottawa", "-5", None),
        ],
        &ReconcileFilters::default(),
    );
    assert_eq!(report.orders.len(), 2);
    assert!(report.orders.iter().all(|r| !r.has_carrier_cost));
    assert!(report.orders.iter().all(|r| r.actual_cost == Decimal::ZERO));
    assert_eq!(report.stats.orders_with_loss, 0);
    assert_eq!(report.stats.total_loss, Decimal::ZERO);
    assert_eq!(report.stats.biggest_loss, Decimal::ZERO);
    assert_eq!(report.stats.average_loss, Decimal::ZERO);
}

fn abc() -> Vec<Order> {
    vec![
        order("A", "Toronto", "3", Some("5")),
        order("B", "Ottawa", "8", Some("5")),
        order("C", "Ottawa", "5", Some("5")),
    ]
}

#[test]
fn gain_filter_returns_only_the_overcharged_order() {
    let filters = ReconcileFilters {
        loss: LossFilter::Gain,
        ..Default::default()
    };
    let ids: Vec<String> = run(&abc(), &filters)
        .orders
        .into_iter()
        .map(|r| r.order.id)
        .collect();
    assert_eq!(ids, vec!["B".to_string()]);
}

#[test]
fn loss_and_gain_partition_the_base_set() {
    let orders = abc();
    let count = |loss| {
        let f = ReconcileFilters {
            loss,
            ..Default::default()
        };
        run(&orders, &f)
            .orders
            .into_iter()
            .map(|r| r.order.id)
            .collect::<Vec<_>>()
    };
    let loss = count(LossFilter::Loss);
    let gain = count(LossFilter::Gain);
    let all = count(LossFilter::All);
    let zero: Vec<_> = all
        .iter()
        .filter(|id| !loss.contains(id) && !gain.contains(id))
        .cloned()
        .collect();

    assert_eq!(loss, vec!["A".to_string()]);
    assert!(loss.iter().all(|id| !gain.contains(id)));
    assert_eq!(loss.len() + gain.len() + zero.len(), all.len());
    assert_eq!(zero, vec!["C".to_string()]);
}

#[test]
fn loss_sum_law_and_biggest_loss() {
    let orders = vec![
        order("L1", "Ottawa", "1", Some("3.50")),
        order("L2", "Ottawa", "1", Some("1.25")),
        order("G1", "Ottawa", "9", Some("1")),
    ];
    let s = run(&orders, &ReconcileFilters::default()).stats;
    assert_eq!(s.orders_with_loss, 2);
    assert_eq!(s.total_loss, d("2.75"));
    assert_eq!(s.biggest_loss, d("2.5"));
    assert_eq!(s.average_loss, d("1.375"));
}

#[test]
fn regional_bucket_ignores_active_filters() {
    let orders = vec![
        order("T1", "Toronto", "3", Some("5")),
        order("T2", "Brampton", "10", Some("5")),
        order("O1", "Ottawa", "3", Some("9")),
    ];
    let filters = ReconcileFilters {
        zone: ZoneFilter::parse("Ottawa"),
        loss: LossFilter::Loss,
        ..Default::default()
    };
    let report = run(&orders, &filters);
    assert_eq!(report.orders.len(), 1);
    assert_eq!(report.stats.total_loss, d("6"));
    assert_eq!(report.stats.toronto_gta_orders, 2);
    assert_eq!(report.stats.toronto_gta_loss, d("2"));
}

#[test]
fn search_is_a_case_insensitive_substring() {
    let mut a = order("x1", "Toronto", "3", Some("5"));
    a.order_number = "SS-1001".into();
    let mut b = order("x2", "Toronto", "3", Some("5"));
    b.order_number = "SS-10010".into();
    let mut c = order("x3", "Toronto", "3", Some("5"));
    c.order_number = "SS-2002".into();
    let mut e = order("x4", "Toronto", "3", Some("5"));
    e.order_number = "WC-9".into();
    e.customer_email = "ss-1001-fan@example.com".into();

    let filters = ReconcileFilters {
        search: "ss-1001".into(),
        ..Default::default()
    };
    let mut ids: Vec<String> = run(&[a, b, c, e], &filters)
        .orders
        .into_iter()
        .map(|r| r.order.id)
        .collect();
    ids.sort();
    assert_eq!(ids, vec!["x1", "x2", "x4"]);
}

#[test]
fn newest_first_with_stable_ties_and_pages() {
    let mut orders = Vec::new();
    for (id, day) in [("o1", 1), ("o2", 3), ("o3", 2), ("o4", 3)] {
        let mut o = order(id, "Toronto", "3", Some("4"));
        o.created_at = at(day);
        orders.push(o);
    }

    let report = run(&orders, &ReconcileFilters::default());
    let ids: Vec<&str> = report.orders.iter().map(|r| r.order.id.as_str()).collect();
    assert_eq!(ids, vec!["o2", "o4", "o3", "o1"]);

    let filters = ReconcileFilters {
        page: Some(Page::new(2, 3)),
        ..Default::default()
    };
    let paged = run(&orders, &filters);
    assert_eq!(paged.total_orders, 4);
    assert_eq!(paged.orders.len(), 1);
    assert_eq!(paged.orders[0].order.id, "o1");
    assert_eq!(paged.stats, report.stats);
}

#[test]
fn unmatched_address_uses_unknown_zone_with_zero_rate() {
    let mut o = order("U1", "Halifax", "0", Some("7"));
    o.subtotal = d("500");
    let r = &run(&[o], &ReconcileFilters::default()).orders[0];
    assert_eq!(r.matched_zone_name, UNKNOWN_ZONE);
    assert_eq!(r.original_rate, Decimal::ZERO);
    assert!(!r.meets_threshold);
    assert!(!r.was_free_shipping);
}
