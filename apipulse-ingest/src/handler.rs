//! The ingestion handler: one invocation per inbound batch submission.
//!
//! Per-request pipeline: parse, auth check, rate-limit check, framework
//! check, per-event admission loop, batched insert. Batch-level problems
//! abort before any storage write; event-level problems drop the event and
//! continue.

use crate::geoip::CountryResolver;
use crate::privacy;
use crate::ratelimit::RateLimiter;
use apipulse_core::validate::{
    MAX_FIELD_CHARS, truncate_chars, valid_hostname, valid_path, valid_user_agent, valid_user_id,
};
use apipulse_core::{Framework, IngestError, IngestPayload, Method, PrivacyLevel, RequestData, StoredRow};
use apipulse_storage::EventStore;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Shared state for the ingestion handlers. Built once at startup and passed
/// by reference into every request; nothing here is module-global.
pub struct AppState {
    pub limiter: Arc<RateLimiter>,
    pub resolver: Arc<dyn CountryResolver>,
    pub store: Arc<dyn EventStore>,
    pub max_rows_per_batch: usize,
}

/// Why an individual event was refused. A drop never fails the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    UnknownMethod,
    InvalidUserAgent,
    InvalidUserId,
    InvalidHostname,
    InvalidPath,
}

/// Per-event admission outcome. `Dropped` hands the event back so the caller
/// can keep diagnostic context without cloning on the happy path.
pub enum Admission {
    Accepted(StoredRow),
    Dropped(DropReason, RequestData),
}

/// What the admission loop decided for a whole batch.
pub struct ScreenReport {
    /// Admitted rows, in original relative order, capped at the ceiling.
    pub rows: Vec<StoredRow>,
    pub dropped: Vec<DropReason>,
    /// User agents of dropped events, kept for diagnostic logging only.
    pub rejected_user_agents: Vec<String>,
    pub total: usize,
}

/// Screen one event: validate, redact, translate to its stored projection.
///
/// Field truncation happens before validation; redaction happens last, so
/// the original IP is read for inference exactly once and never survives
/// past this function for P2/P3.
pub fn screen_event(
    mut event: RequestData,
    api_key: &str,
    privacy_level: PrivacyLevel,
    framework: Framework,
    resolver: &dyn CountryResolver,
) -> Admission {
    let Some(method) = Method::from_name(&event.method) else {
        return Admission::Dropped(DropReason::UnknownMethod, event);
    };

    truncate_chars(&mut event.user_agent, MAX_FIELD_CHARS);
    if !valid_user_agent(&event.user_agent) {
        return Admission::Dropped(DropReason::InvalidUserAgent, event);
    }

    truncate_chars(&mut event.user_id, MAX_FIELD_CHARS);
    if !valid_user_id(&event.user_id) {
        return Admission::Dropped(DropReason::InvalidUserId, event);
    }

    truncate_chars(&mut event.hostname, MAX_FIELD_CHARS);
    if !valid_hostname(&event.hostname) {
        return Admission::Dropped(DropReason::InvalidHostname, event);
    }

    truncate_chars(&mut event.path, MAX_FIELD_CHARS);
    if !valid_path(&event.path) {
        return Admission::Dropped(DropReason::InvalidPath, event);
    }

    let location = privacy::redact(&mut event, privacy_level, resolver);

    Admission::Accepted(StoredRow {
        api_key: api_key.to_owned(),
        path: event.path,
        hostname: event.hostname,
        ip_address: event.ip_address,
        user_agent: event.user_agent,
        status: event.status,
        response_time: event.response_time,
        method: method.code(),
        framework: framework.code(),
        location,
        user_id: event.user_id,
        created_at: event.created_at,
    })
}

/// Run the admission loop over a batch. Events past the ceiling are silently
/// excluded: not validated, not queued for retry.
pub fn screen_events(
    payload: IngestPayload,
    framework: Framework,
    resolver: &dyn CountryResolver,
    max_rows: usize,
) -> ScreenReport {
    let IngestPayload {
        api_key,
        requests,
        privacy_level,
        ..
    } = payload;

    let mut report = ScreenReport {
        rows: Vec::new(),
        dropped: Vec::new(),
        rejected_user_agents: Vec::new(),
        total: requests.len(),
    };

    for event in requests {
        if report.rows.len() >= max_rows {
            break;
        }

        match screen_event(event, &api_key, privacy_level, framework, resolver) {
            Admission::Accepted(row) => report.rows.push(row),
            Admission::Dropped(reason, event) => {
                if reason == DropReason::InvalidUserAgent {
                    report.rejected_user_agents.push(event.user_agent);
                }
                report.dropped.push(reason);
            }
        }
    }

    report
}

/// `POST /api/log-request` (and its `/api/requests` alias).
pub async fn log_request(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<IngestPayload>, JsonRejection>,
) -> Response {
    let Ok(Json(payload)) = payload else {
        info!("Rejected unparseable ingest payload");
        return reject(&state, IngestError::InvalidPayload);
    };

    if payload.api_key.is_empty() {
        return reject(&state, IngestError::MissingApiKey);
    }

    // Shed load before spending any per-event work.
    if !state.limiter.admit(&payload.api_key) {
        info!(api_key = %payload.api_key, "Rate limit exceeded");
        return reject(&state, IngestError::RateLimited);
    }

    if payload.requests.is_empty() {
        return reject(&state, IngestError::EmptyBatch);
    }

    let Some(framework) = Framework::from_name(&payload.framework) else {
        info!(api_key = %payload.api_key, framework = %payload.framework, "Unsupported framework");
        return reject(&state, IngestError::UnknownFramework);
    };

    let api_key = payload.api_key.clone();
    let report = screen_events(
        payload,
        framework,
        state.resolver.as_ref(),
        state.max_rows_per_batch,
    );

    info!(
        api_key = %api_key,
        admitted = report.rows.len(),
        total = report.total,
        "Screened ingest batch"
    );
    if !report.rejected_user_agents.is_empty() {
        warn!(
            api_key = %api_key,
            user_agents = ?report.rejected_user_agents,
            "Dropped events with rejected user agents"
        );
    }

    if report.rows.is_empty() {
        return reject(&state, IngestError::NoValidRequests);
    }

    match state.store.insert_batch(&report.rows).await {
        Ok(inserted) => {
            info!(api_key = %api_key, inserted, "Stored ingest batch");
            created()
        }
        Err(e) => {
            error!(api_key = %api_key, error = %e, "Batch insert failed");
            reject(&state, IngestError::Storage(e.to_string()))
        }
    }
}

fn created() -> Response {
    (
        StatusCode::CREATED,
        Json(json!({
            "status": 201,
            "message": "API requests logged successfully."
        })),
    )
        .into_response()
}

fn reject(state: &AppState, err: IngestError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::BAD_REQUEST);
    let body = Json(json!({
        "status": err.status_code(),
        "message": err.to_string()
    }));

    if matches!(err, IngestError::RateLimited) {
        let retry_after = state.limiter.window().as_secs().to_string();
        return (status, [(header::RETRY_AFTER, retry_after)], body).into_response();
    }

    (status, body).into_response()
}
