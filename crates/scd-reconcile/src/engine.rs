use rust_decimal::Decimal;

use scd_ingest::normalize_address;
use scd_schemas::{Order, ShippingZone};
use scd_zones::{match_zone, resolve_rate, ShippingConfig};

use crate::{
    apply_filters, compute_stats, ReconcileFilters, ReconcileReport, ReconcileSettings,
    ReconciliationResult,
};

/// Reconcile one order. `None` when the order has no shipping address.
pub fn reconcile_order(
    order: &Order,
    zones: &[ShippingZone],
    cfg: &ShippingConfig,
) -> Option<ReconciliationResult> {
    // Final gate: the adapter already drops these.
    if !order.has_shipping_address() {
        return None;
    }

    let addr = normalize_address(&order.shipping_address);
    let matched = match_zone(&addr, zones);
    let rate = resolve_rate(matched, order.subtotal, cfg);

    let actual_cost = order.actual_carrier_cost.unwrap_or(Decimal::ZERO);
    let difference = actual_cost - order.charged;
    let was_free_shipping = order.charged == Decimal::ZERO && rate.meets_threshold;
    let discount_applied = if was_free_shipping {
        rate.original_rate
    } else {
        Decimal::ZERO
    };

    Some(ReconciliationResult {
        order: order.clone(),
        matched_zone_name: matched.name().to_string(),
        actual_cost,
        charged: order.charged,
        difference,
        has_carrier_cost: order.actual_carrier_cost.is_some(),
        was_free_shipping,
        meets_threshold: rate.meets_threshold,
        discount_applied,
        original_rate: rate.original_rate,
    })
}

/// Reconcile a snapshot of orders against the configured zones.
///
/// Order of operations: per-order computation, filters, sort by
/// `created_at` descending (stable, so ties keep input order), stats,
/// then pagination.
pub fn reconcile(
    orders: &[Order],
    zones: &[ShippingZone],
    filters: &ReconcileFilters,
    settings: &ReconcileSettings,
) -> ReconcileReport {
    let all: Vec<ReconciliationResult> = orders
        .iter()
        .filter_map(|o| reconcile_order(o, zones, &settings.shipping))
        .collect();

    let mut filtered = apply_filters(&all, filters);
    filtered.sort_by(|a, b| b.order.created_at.cmp(&a.order.created_at));

    let stats = compute_stats(&all, &filtered, &settings.regional_bucket);
    let total_orders = filtered.len();

    let orders = match filters.page {
        Some(page) => filtered
            .into_iter()
            .skip(page.offset())
            .take(page.size)
            .collect(),
        None => filtered,
    };

    ReconcileReport {
        orders,
        total_orders,
        page: filters.page,
        stats,
    }
}
