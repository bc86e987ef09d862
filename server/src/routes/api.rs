use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

use crate::config::{DATASET_CACHE_CONTROL, GROUPS_CACHE_CONTROL};
use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "areas": state.area_count,
        "groups": state.groups.len(),
        "borders": state.border_count,
        "started_at": state.started_at.to_rfc3339(),
    }))
}

/// Serve the pre-serialized dataset, honouring `If-None-Match`.
pub async fn get_dataset(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if if_none_match_matches(&headers, &state.dataset_etag) {
        return not_modified_response(DATASET_CACHE_CONTROL, Some(&*state.dataset_etag));
    }

    json_bytes_response(
        (*state.dataset_json).clone(),
        DATASET_CACHE_CONTROL,
        Some(&*state.dataset_etag),
    )
}

pub async fn get_groups(State(state): State<AppState>) -> Response {
    json_bytes_response((*state.groups_json).clone(), GROUPS_CACHE_CONTROL, None)
}

fn json_bytes_response(body: Bytes, cache_control: &'static str, etag: Option<&str>) -> Response {
    let mut response = Response::new(Body::from(body));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(cache_control),
    );
    if let Some(etag) = etag
        && let Ok(etag_header) = HeaderValue::from_str(etag)
    {
        headers.insert(header::ETAG, etag_header);
    }
    response
}

fn not_modified_response(cache_control: &'static str, etag: Option<&str>) -> Response {
    let mut response = StatusCode::NOT_MODIFIED.into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(cache_control),
    );
    if let Some(etag) = etag
        && let Ok(etag_header) = HeaderValue::from_str(etag)
    {
        headers.insert(header::ETAG, etag_header);
    }
    response
}

fn normalize_etag(candidate: &str) -> &str {
    candidate.strip_prefix("W/").unwrap_or(candidate).trim()
}

fn if_none_match_matches(headers: &HeaderMap, etag: &str) -> bool {
    let Some(value) = headers.get(header::IF_NONE_MATCH) else {
        return false;
    };
    let Ok(raw) = value.to_str() else {
        return false;
    };

    raw.split(',').any(|candidate| {
        let candidate = candidate.trim();
        candidate == "*" || normalize_etag(candidate) == normalize_etag(etag)
    })
}
