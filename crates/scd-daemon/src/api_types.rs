//! Request and response types for scd-daemon HTTP endpoints.
//!
//! No business logic lives here.

use serde::{Deserialize, Serialize};

use scd_reconcile::ReconcileReport;

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: String,
    pub version: String,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Body for 400 (bad query) and 502 (upstream store failure).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Failing store, for upstream errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,
}

// ---------------------------------------------------------------------------
// /v1/shipping/reconcile
// ---------------------------------------------------------------------------

/// Query string. Everything is taken as text and validated in the handler so
/// every rejection carries an [`ErrorResponse`] body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconcileParams {
    pub start: Option<String>,
    pub end: Option<String>,
    pub zone: Option<String>,
    pub loss: Option<String>,
    pub q: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileResponse {
    pub start: String,
    pub end: String,
    #[serde(flatten)]
    pub report: ReconcileReport,
}

// ---------------------------------------------------------------------------
// /v1/shipping/zones/match
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchZoneParams {
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postal_code: String,
}
