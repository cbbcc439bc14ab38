use crate::{ReconcileFilters, ReconciliationResult};

/// Case-insensitive substring match on order number, customer email or
/// customer name. A blank query matches everything.
pub fn matches_search(r: &ReconciliationResult, query: &str) -> bool {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return true;
    }
    [
        &r.order.order_number,
        &r.order.customer_email,
        &r.order.customer_name,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&q))
}

/// Apply zone, loss and search filters. Input order is preserved.
pub fn apply_filters(
    results: &[ReconciliationResult],
    filters: &ReconcileFilters,
) -> Vec<ReconciliationResult> {
    results
        .iter()
        .filter(|r| filters.zone.keeps(&r.matched_zone_name))
        .filter(|r| filters.loss.keeps(r.difference))
        .filter(|r| matches_search(r, &filters.search))
        .cloned()
        .collect()
}
