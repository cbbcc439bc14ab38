//! JSON-file backed stores.
//!
//! Zones file: a JSON array of zone objects with nested `rules` and `rates`.
//! Orders file: a JSON array of raw rows for one source.

use std::path::{Path, PathBuf};

use scd_ingest::RawOrderRecord;
use scd_schemas::{DateRange, OrderSource, ShippingZone};
use serde_json::Value;

use crate::{decode_order_rows, finalize_zones, OrderStore, StoreError, ZoneStore};

async fn read_json(store: &str, path: &Path) -> Result<Value, StoreError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| StoreError::transport(store, format!("read {}: {e}", path.display())))?;
    serde_json::from_str(&text)
        .map_err(|e| StoreError::decode(store, format!("parse {}: {e}", path.display())))
}

fn expect_array(store: &str, path: &Path, v: Value) -> Result<Vec<Value>, StoreError> {
    match v {
        Value::Array(rows) => Ok(rows),
        other => Err(StoreError::decode(
            store,
            format!(
                "{} must hold a JSON array, found {}",
                path.display(),
                json_kind(&other)
            ),
        )),
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Zones
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct JsonFileZoneStore {
    path: PathBuf,
}

impl JsonFileZoneStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl ZoneStore for JsonFileZoneStore {
    fn name(&self) -> &str {
        "zones_file"
    }

    async fn fetch_enabled_zones(&self) -> Result<Vec<ShippingZone>, StoreError> {
        let rows = expect_array(
            self.name(),
            &self.path,
            read_json(self.name(), &self.path).await?,
        )?;
        let zones = rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                serde_json::from_value::<ShippingZone>(row)
                    .map_err(|e| StoreError::decode(self.name(), format!("zone {i}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let zones = finalize_zones(zones);
        tracing::debug!(path = %self.path.display(), zones = zones.len(), "loaded zones");
        Ok(zones)
    }
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct JsonFileOrderStore {
    path: PathBuf,
    source: OrderSource,
    name: String,
}

impl JsonFileOrderStore {
    pub fn new(path: impl Into<PathBuf>, source: OrderSource) -> Self {
        Self {
            path: path.into(),
            source,
            name: format!("{}_orders_file", source.as_str()),
        }
    }
}

#[async_trait::async_trait]
impl OrderStore for JsonFileOrderStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn source(&self) -> OrderSource {
        self.source
    }

    async fn fetch_orders(&self, window: DateRange) -> Result<Vec<RawOrderRecord>, StoreError> {
        let rows = expect_array(
            self.name(),
            &self.path,
            read_json(self.name(), &self.path).await?,
        )?;
        let total = rows.len();

        let mut out = Vec::with_capacity(total);
        for rec in decode_order_rows(self.name(), self.source, rows)? {
            let ts = rec
                .created_at()
                .map_err(|e| StoreError::decode(self.name(), e.to_string()))?;
            if window.contains(ts) {
                out.push(rec);
            }
        }
        tracing::debug!(
            path = %self.path.display(),
            total,
            in_window = out.len(),
            "loaded order rows"
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;

    fn write_tmp(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    fn march() -> DateRange {
        DateRange::from_dates(
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
        )
    }

    #[tokio::test]
    async fn zones_file_drops_disabled_and_sorts() {
        let f = write_tmp(
            r#"[
              {"id": "z2", "name": "Canada", "position": 5,
               "rules": [{"field": "country", "match_value": "CA", "match_type": "exact"}],
               "rates": [{"rate_amount": 15}]},
              {"id": "z1", "name": "Toronto", "position": 1,
               "rules": [{"field": "city", "match_value": "toronto", "match_type": "contains"}],
               "rates": [{"rate_amount": "8.00", "free_threshold": "100"}]},
              {"id": "z0", "name": "Retired", "enabled": false, "position": 0}
            ]"#,
        );
        let zones = JsonFileZoneStore::new(f.path())
            .fetch_enabled_zones()
            .await
            .unwrap();
        let ids: Vec<&str> = zones.iter().map(|z| z.id.as_str()).collect();
        assert_eq!(ids, vec!["z1", "z2"]);
    }

    #[tokio::test]
    async fn orders_file_keeps_only_rows_in_window() {
        let f = write_tmp(
            r#"[
              {"id": "s1", "created_at": "2026-02-28T23:59:59Z"},
              {"id": "s2", "created_at": "2026-03-01T00:00:00Z"},
              {"id": "s3", "created_at": "2026-03-31T23:00:00Z"},
              {"id": "s4", "created_at": "2026-04-01T00:00:00Z"}
            ]"#,
        );
        let store = JsonFileOrderStore::new(f.path(), OrderSource::Stripe);
        let recs = store.fetch_orders(march()).await.unwrap();
        let ids: Vec<&str> = recs.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["s2", "s3"]);
        assert_eq!(store.name(), "stripe_orders_file");
    }

    #[tokio::test]
    async fn unreadable_timestamp_is_a_decode_failure() {
        let f = write_tmp(r#"[{"id": 9, "date_created": "last tuesday"}]"#);
        let err = JsonFileOrderStore::new(f.path(), OrderSource::WooCommerce)
            .fetch_orders(march())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Decode { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn missing_file_is_a_transport_failure() {
        let err = JsonFileZoneStore::new("/nonexistent/zones.json")
            .fetch_enabled_zones()
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Transport { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn non_array_document_is_rejected() {
        let f = write_tmp(r#"{"zones": []}"#);
        let err = JsonFileZoneStore::new(f.path())
            .fetch_enabled_zones()
            .await
            .unwrap_err();
        match err {
            StoreError::Decode { message, .. } => assert!(message.contains("found object")),
            other => panic!("expected decode error, got {other:?}"),
        }
    }
}
