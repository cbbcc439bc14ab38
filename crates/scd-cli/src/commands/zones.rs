use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::json;

use scd_runtime::run_match_zone;
use scd_store::JsonFileZoneStore;
use scd_zones::ShippingConfig;

use super::{money, text};

const LOCAL_READ_TIMEOUT: Duration = Duration::from_secs(15);

/// Resolve one address against a zones file and print the match.
pub async fn match_zone(
    zones_path: &str,
    country: &str,
    region: &str,
    city: &str,
    postal_code: &str,
) -> Result<()> {
    let store = JsonFileZoneStore::new(zones_path);
    let raw = json!({
        "country": country,
        "region": region,
        "city": city,
        "postal_code": postal_code,
    });
    let lookup = run_match_zone(&store, &raw, &ShippingConfig::default(), LOCAL_READ_TIMEOUT)
        .await
        .with_context(|| format!("match-zone against {zones_path}"))?;

    println!("zone={}", text(&lookup.zone_name));
    println!("zone_id={}", lookup.zone_id.as_deref().unwrap_or("-"));
    println!("rate_amount={}", money(lookup.rate_amount));
    match lookup.free_threshold {
        Some(t) => println!("free_threshold={}", money(t)),
        None => println!("free_threshold=-"),
    }
    Ok(())
}
