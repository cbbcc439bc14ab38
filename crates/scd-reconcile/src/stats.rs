use rust_decimal::Decimal;

use crate::{ReconcileStats, ReconciliationResult, RegionalBucket};

fn mean(total: Decimal, count: u64) -> Decimal {
    if count == 0 {
        Decimal::ZERO
    } else {
        total / Decimal::from(count)
    }
}

/// Aggregate statistics.
///
/// - loss figures come from `filtered`
/// - the regional bucket and free-shipping figures come from `all`, so they
///   do not move when the caller changes zone or loss filters
pub fn compute_stats(
    all: &[ReconciliationResult],
    filtered: &[ReconciliationResult],
    bucket: &RegionalBucket,
) -> ReconcileStats {
    let mut s = ReconcileStats::default();

    for r in filtered.iter().filter(|r| r.is_loss()) {
        s.orders_with_loss += 1;
        s.total_loss += r.difference;
        if r.difference > s.biggest_loss {
            s.biggest_loss = r.difference;
        }
    }
    s.average_loss = mean(s.total_loss, s.orders_with_loss);

    for r in all.iter().filter(|r| bucket.contains_zone(&r.matched_zone_name)) {
        s.toronto_gta_orders += 1;
        if r.is_loss() {
            s.toronto_gta_loss += r.difference;
        }
    }

    for r in all.iter().filter(|r| r.was_free_shipping) {
        s.free_shipping_orders += 1;
        s.total_discounts_given += r.discount_applied;
    }
    s.avg_discount = mean(s.total_discounts_given, s.free_shipping_orders);

    s
}
