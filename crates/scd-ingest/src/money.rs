//! Lenient money parsing for raw store values.
//!
//! Order stores disagree on how totals are encoded: Stripe-side tables hold
//! JSON numbers, WooCommerce serialises every total as a decimal string.
//! Both land here and come out as exact [`Decimal`] values. Nothing in this
//! module uses floating point; JSON numbers are re-parsed from their textual
//! form.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;

/// Parse a raw JSON value as a monetary amount.
///
/// Returns `None` for `null`, empty strings, non-numeric strings, booleans,
/// arrays and objects. A leading `$` and thousands separators are tolerated
/// in strings (`"$1,299.00"`).
pub fn amount_from_value(v: &Value) -> Option<Decimal> {
    match v {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .trim_start_matches('$')
                .chars()
                .filter(|c| *c != ',')
                .collect();
            if cleaned.is_empty() {
                return None;
            }
            parse_decimal(&cleaned)
        }
        _ => None,
    }
}

/// Like [`amount_from_value`] but absent / unparseable values become zero.
pub fn amount_or_zero(v: &Value) -> Decimal {
    amount_from_value(v).unwrap_or(Decimal::ZERO)
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn numbers_and_strings_parse_exactly() {
        assert_eq!(amount_from_value(&json!(3.99)), Some(d("3.99")));
        assert_eq!(amount_from_value(&json!(15)), Some(d("15")));
        assert_eq!(amount_from_value(&json!("5.20")), Some(d("5.20")));
        assert_eq!(amount_from_value(&json!(" $1,299.50 ")), Some(d("1299.50")));
        assert_eq!(amount_from_value(&json!("-2.5")), Some(d("-2.5")));
    }

    #[test]
    fn absent_values_are_none() {
        assert_eq!(amount_from_value(&Value::Null), None);
        assert_eq!(amount_from_value(&json!("")), None);
        assert_eq!(amount_from_value(&json!("   ")), None);
        assert_eq!(amount_from_value(&json!("n/a")), None);
        assert_eq!(amount_from_value(&json!(true)), None);
        assert_eq!(amount_from_value(&json!({"amount": 1})), None);
    }

    #[test]
    fn zero_is_a_real_amount() {
        assert_eq!(amount_from_value(&json!(0)), Some(Decimal::ZERO));
        assert_eq!(amount_from_value(&json!("0.00")), Some(Decimal::ZERO));
        assert_eq!(amount_or_zero(&Value::Null), Decimal::ZERO);
    }
}
