//! PostgREST-style HTTP stores.
//!
//! Tables:
//! - `shipping_zones` with embedded `shipping_zone_rules` / `shipping_zone_rates`
//! - `stripe_orders` filtered on `created_at`
//! - `woocommerce_orders` filtered on `date_created`
//!
//! The service key is resolved by the caller (see `scd-config` secrets) and
//! passed in; it is sent as both `apikey` and bearer token and never logged.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use scd_ingest::RawOrderRecord;
use scd_schemas::{DateRange, OrderSource, ShippingZone};
use serde_json::Value;

use crate::{decode_order_rows, finalize_zones, OrderStore, StoreError, ZoneStore};

const ZONES_TABLE: &str = "shipping_zones";
const ZONES_SELECT: &str = "*,rules:shipping_zone_rules(*),rates:shipping_zone_rates(*)";
/// Upstream error bodies are cut to this many chars in error messages.
const ERROR_BODY_MAX: usize = 200;

/// Shared HTTP client for every REST store built from one config.
#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<REDACTED>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl RestClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::config("rest", format!("http client build failed: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.base_url, table)
    }

    /// GET `table` with PostgREST query params and decode a JSON array body.
    async fn get_rows(
        &self,
        store: &str,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<Value>, StoreError> {
        let resp = self
            .http
            .get(self.table_url(table))
            .query(query)
            .header("apikey", self.api_key.as_str())
            .bearer_auth(self.api_key.as_str())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.map_send_error(store, e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                store: store.to_string(),
                status: status.as_u16(),
                message: truncate(body.trim(), ERROR_BODY_MAX),
            });
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| StoreError::decode(store, format!("response json decode failed: {e}")))?;
        match body {
            Value::Array(rows) => {
                tracing::debug!(store, table, rows = rows.len(), "rest rows fetched");
                Ok(rows)
            }
            _ => Err(StoreError::decode(store, "expected a JSON array body")),
        }
    }

    fn map_send_error(&self, store: &str, e: reqwest::Error) -> StoreError {
        if e.is_timeout() {
            StoreError::Timeout {
                store: store.to_string(),
                after_secs: self.timeout.as_secs(),
            }
        } else {
            StoreError::transport(store, format!("request failed: {e}"))
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

/// PostgREST timestamp literal, UTC with `Z`.
pub fn rest_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

// ---------------------------------------------------------------------------
// Zones
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RestZoneStore {
    client: Arc<RestClient>,
}

impl RestZoneStore {
    pub fn new(client: Arc<RestClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl ZoneStore for RestZoneStore {
    fn name(&self) -> &str {
        ZONES_TABLE
    }

    async fn fetch_enabled_zones(&self) -> Result<Vec<ShippingZone>, StoreError> {
        let query = [
            ("enabled", "eq.true".to_string()),
            ("select", ZONES_SELECT.to_string()),
            ("order", "position.asc".to_string()),
            // Embedded rows come back unordered otherwise; rates[0] must be stable.
            ("rules.order", "id.asc".to_string()),
            ("rates.order", "id.asc".to_string()),
        ];
        let rows = self.client.get_rows(self.name(), ZONES_TABLE, &query).await?;
        let zones = rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                serde_json::from_value::<ShippingZone>(row)
                    .map_err(|e| StoreError::decode(ZONES_TABLE, format!("zone {i}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(finalize_zones(zones))
    }
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RestOrderStore {
    client: Arc<RestClient>,
    source: OrderSource,
}

impl RestOrderStore {
    pub fn new(client: Arc<RestClient>, source: OrderSource) -> Self {
        Self { client, source }
    }

    fn table(&self) -> &'static str {
        match self.source {
            OrderSource::Stripe => "stripe_orders",
            OrderSource::WooCommerce => "woocommerce_orders",
        }
    }

    fn timestamp_column(&self) -> &'static str {
        match self.source {
            OrderSource::Stripe => "created_at",
            OrderSource::WooCommerce => "date_created",
        }
    }
}

#[async_trait::async_trait]
impl OrderStore for RestOrderStore {
    fn name(&self) -> &str {
        self.table()
    }

    fn source(&self) -> OrderSource {
        self.source
    }

    async fn fetch_orders(&self, window: DateRange) -> Result<Vec<RawOrderRecord>, StoreError> {
        let col = self.timestamp_column();
        let query = [
            ("select", "*".to_string()),
            (col, format!("gte.{}", rest_timestamp(window.start))),
            (col, format!("lte.{}", rest_timestamp(window.end))),
            ("order", format!("{col}.desc")),
        ];
        let rows = self.client.get_rows(self.name(), self.table(), &query).await?;
        decode_order_rows(self.name(), self.source, rows)
    }
}
