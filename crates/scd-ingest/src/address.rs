//! AddressNormalizer: raw, source-shaped address blob -> [`NormalizedAddress`].
//!
//! Field names vary by source (`postal_code` vs `postcode`, `state` vs
//! `province`). Every canonical field is trimmed and lower-cased; a field
//! that is absent, `null` or not a scalar becomes `""`. The function is
//! total: garbage in yields an address that simply matches no zone.

use scd_schemas::{address_keys, address_object, NormalizedAddress};
use serde_json::{Map, Value};

/// Normalize a raw address blob.
///
/// Stripe-style blobs that nest the address under `address` are unwrapped
/// first.
pub fn normalize_address(raw: &Value) -> NormalizedAddress {
    let Some(map) = address_object(raw) else {
        return NormalizedAddress::default();
    };

    NormalizedAddress {
        country: first_present(map, address_keys::COUNTRY),
        region: first_present(map, address_keys::REGION),
        city: first_present(map, address_keys::CITY),
        postal_code: first_present(map, address_keys::POSTAL_CODE),
    }
}

fn first_present(map: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|k| map.get(*k))
        .map(fold)
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

fn fold(v: &Value) -> String {
    match v {
        Value::String(s) => s.trim().to_lowercase(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn woo_shape_with_postcode() {
        let a = normalize_address(&json!({
            "first_name": "Ada",
            "city": "  North York ",
            "state": "ON",
            "postcode": "M2N 6K1",
            "country": "CA"
        }));
        assert_eq!(a.city, "north york");
        assert_eq!(a.region, "on");
        assert_eq!(a.postal_code, "m2n 6k1");
        assert_eq!(a.country, "ca");
    }

    #[test]
    fn stripe_shape_nested_under_address() {
        let a = normalize_address(&json!({
            "name": "Ada",
            "address": {
                "line1": "1 King St",
                "city": "Toronto",
                "state": "ON",
                "postal_code": "M5H 1A1",
                "country": "CA"
            }
        }));
        assert_eq!(a.city, "toronto");
        assert_eq!(a.postal_code, "m5h 1a1");
    }

    #[test]
    fn absent_fields_become_empty() {
        let a = normalize_address(&json!({"city": null, "zip": 90210}));
        assert_eq!(a.city, "");
        assert_eq!(a.country, "");
        assert_eq!(a.postal_code, "90210");
    }

    #[test]
    fn non_object_is_blank() {
        assert!(normalize_address(&Value::Null).is_blank());
        assert!(normalize_address(&json!("1 King St, Toronto")).is_blank());
        assert!(normalize_address(&json!([1, 2])).is_blank());
    }

    #[test]
    fn first_non_empty_alias_wins() {
        let a = normalize_address(&json!({"state": "", "province": "Ontario"}));
        assert_eq!(a.region, "ontario");
    }
}
