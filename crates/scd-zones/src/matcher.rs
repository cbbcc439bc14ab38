use scd_schemas::{MatchType, NormalizedAddress, RuleField, ShippingZone, ZoneRule, UNKNOWN_ZONE};

/// Outcome of matching one address: exactly one zone, or the sentinel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoneMatch<'a> {
    Zone(&'a ShippingZone),
    Unknown,
}

impl<'a> ZoneMatch<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            ZoneMatch::Zone(z) => z.name.as_str(),
            ZoneMatch::Unknown => UNKNOWN_ZONE,
        }
    }

    pub fn zone(&self) -> Option<&'a ShippingZone> {
        match self {
            ZoneMatch::Zone(z) => Some(z),
            ZoneMatch::Unknown => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, ZoneMatch::Unknown)
    }
}

fn fold(s: &str) -> String {
    s.trim().to_lowercase()
}

fn squash(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Test a single rule against an address. Case-insensitive.
///
/// An empty rule value or an empty address field never matches, so a
/// half-filled rule cannot swallow every address.
pub fn rule_matches(rule: &ZoneRule, addr: &NormalizedAddress) -> bool {
    let value = fold(&rule.match_value);
    let field = fold(addr.field(rule.field));
    if value.is_empty() || field.is_empty() {
        return false;
    }

    match rule.match_type {
        MatchType::Exact => field == value,
        MatchType::Contains => field.contains(&value),
        MatchType::PrefixSet => {
            // "M5V 2T6" and "m5v2t6" are the same postal code.
            let field = if rule.field == RuleField::PostalCode {
                squash(&field)
            } else {
                field
            };
            value
                .split(',')
                .map(|p| {
                    if rule.field == RuleField::PostalCode {
                        squash(p)
                    } else {
                        p.trim().to_string()
                    }
                })
                .filter(|p| !p.is_empty())
                .any(|p| field.starts_with(&p))
        }
    }
}

/// A zone matches when any of its rules matches.
pub fn zone_matches(zone: &ShippingZone, addr: &NormalizedAddress) -> bool {
    zone.rules.iter().any(|r| rule_matches(r, addr))
}

/// Select the single best zone for `addr`.
///
/// Zones are tried in slice order (the configured priority order); disabled
/// zones are skipped. The first zone with a matching rule wins, regardless of
/// whether a later zone has a more specific rule.
pub fn match_zone<'a>(addr: &NormalizedAddress, zones: &'a [ShippingZone]) -> ZoneMatch<'a> {
    zones
        .iter()
        .filter(|z| z.enabled)
        .find(|z| zone_matches(z, addr))
        .map(ZoneMatch::Zone)
        .unwrap_or(ZoneMatch::Unknown)
}

pub fn match_zone_name(addr: &NormalizedAddress, zones: &[ShippingZone]) -> String {
    match_zone(addr, zones).name().to_string()
}
