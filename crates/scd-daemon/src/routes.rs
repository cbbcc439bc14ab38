//! Axum router and HTTP handlers for scd-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers so tests can use the bare router.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use scd_reconcile::{LossFilter, Page, ReconcileFilters, ZoneFilter};
use scd_runtime::{run_match_zone, run_reconcile, ReconcileQuery};
use scd_schemas::DateRange;
use scd_store::StoreError;

use crate::{
    api_types::{
        ErrorResponse, HealthResponse, MatchZoneParams, ReconcileParams, ReconcileResponse,
    },
    state::AppState,
};

/// Default page size when only `page` is given.
const DEFAULT_PAGE_SIZE: usize = 50;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/shipping/reconcile", get(reconcile))
        .route("/v1/shipping/zones/match", get(match_zone))
        .with_state(state)
}

fn bad_request(msg: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: msg.into(),
            store: None,
        }),
    )
        .into_response()
}

fn upstream_failure(err: StoreError) -> Response {
    (
        StatusCode::BAD_GATEWAY,
        Json(ErrorResponse {
            store: Some(err.store().to_string()),
            error: err.to_string(),
        }),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service.to_string(),
            version: st.build.version.to_string(),
        }),
    )
}

// ---------------------------------------------------------------------------
// GET /v1/shipping/reconcile
// ---------------------------------------------------------------------------

fn parse_count(name: &str, raw: Option<&str>) -> Result<Option<usize>, String> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s
            .parse::<usize>()
            .map(Some)
            .map_err(|_| format!("{name} must be a positive integer, got '{s}'")),
    }
}

fn reconcile_query(p: &ReconcileParams) -> Result<ReconcileQuery, String> {
    let (Some(start), Some(end)) = (p.start.as_deref(), p.end.as_deref()) else {
        return Err("start and end are required (YYYY-MM-DD)".to_string());
    };
    let range = DateRange::parse_days(start, end).map_err(|e| e.to_string())?;

    let page = match (
        parse_count("page", p.page.as_deref())?,
        parse_count("page_size", p.page_size.as_deref())?,
    ) {
        (None, None) => None,
        (n, size) => Some(Page::new(
            n.unwrap_or(1),
            size.unwrap_or(DEFAULT_PAGE_SIZE),
        )),
    };

    Ok(ReconcileQuery {
        range,
        filters: ReconcileFilters {
            zone: ZoneFilter::parse(p.zone.as_deref().unwrap_or("")),
            loss: LossFilter::parse(p.loss.as_deref().unwrap_or("")),
            search: p.q.as_deref().unwrap_or("").trim().to_string(),
            page,
        },
    })
}

pub(crate) async fn reconcile(
    State(st): State<Arc<AppState>>,
    Query(params): Query<ReconcileParams>,
) -> Response {
    let query = match reconcile_query(&params) {
        Ok(q) => q,
        Err(msg) => return bad_request(msg),
    };

    match run_reconcile(&st.stores, &query, &st.settings, st.fetch_timeout).await {
        Ok(report) => (
            StatusCode::OK,
            Json(ReconcileResponse {
                start: query.range.start.date_naive().to_string(),
                end: query.range.end.date_naive().to_string(),
                report,
            }),
        )
            .into_response(),
        Err(e) => upstream_failure(e),
    }
}

// ---------------------------------------------------------------------------
// GET /v1/shipping/zones/match
// ---------------------------------------------------------------------------

pub(crate) async fn match_zone(
    State(st): State<Arc<AppState>>,
    Query(p): Query<MatchZoneParams>,
) -> Response {
    let raw = json!({
        "country": p.country,
        "region": p.region,
        "city": p.city,
        "postal_code": p.postal_code,
    });
    match run_match_zone(
        st.stores.zones.as_ref(),
        &raw,
        &st.settings.shipping,
        st.fetch_timeout,
    )
    .await
    {
        Ok(lookup) => (StatusCode::OK, Json(lookup)).into_response(),
        Err(e) => upstream_failure(e),
    }
}
