//! The catalog HTTP server (spec.md §4.2, §6): `GET /{catalog}/api/v1/all`
//! and `GET /{catalog}/api/v1/query`, mounted under a caller-chosen root.

use crate::store::Storage;
use axum::error_handling::HandleErrorLayer;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{BoxError, Router};
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tower::timeout::TimeoutLayer;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

/// The overall budget a request is allowed, start to finish (spec.md §5).
const WRITE_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// The budget for acquiring this catalog's read lock and stat'ing its
/// content, before any body bytes are produced (spec.md §5).
const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// The fixed bucket boundaries for `catalogd_http_request_duration_seconds`
/// (spec.md §6). The binary's Prometheus exporter setup matches these
/// against the metric name; this crate only records values.
pub const DURATION_BUCKETS: &[f64] = &[
    0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0, 1.2, 1.6, 2.0, 2.4, 2.8, 3.2, 3.6, 4.0, 10.0,
];

pub fn router(storage: Arc<Storage>) -> Router {
    metrics::describe_histogram!(
        "catalogd_http_request_duration_seconds",
        "Duration of catalog HTTP server requests, labeled by status code."
    );
    Router::new()
        .route("/:catalog/api/v1/all", get(all))
        .route("/:catalog/api/v1/query", get(query))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(record_duration))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout))
                .layer(TimeoutLayer::new(WRITE_TIMEOUT)),
        )
        .with_state(storage)
}

async fn handle_timeout(err: BoxError) -> Response {
    if err.is::<tower::timeout::error::Elapsed>() {
        (StatusCode::GATEWAY_TIMEOUT, "request exceeded its time budget").into_response()
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
    }
}

async fn record_duration(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let start = Instant::now();
    let response = next.run(req).await;
    let elapsed = start.elapsed().as_secs_f64();
    let code = response.status().as_u16().to_string();
    metrics::histogram!("catalogd_http_request_duration_seconds", "code" => code).record(elapsed);
    response
}

#[derive(Debug, Deserialize, Default)]
pub struct QueryParams {
    pub schema: Option<String>,
    pub package: Option<String>,
    pub name: Option<String>,
}

/// `GET /{catalog}/api/v1/all` (spec.md §6): the whole JSONL file,
/// gzip-negotiated, with a `Last-Modified` header for conditional GET.
async fn all(
    State(storage): State<Arc<Storage>>,
    Path(catalog): Path<String>,
    headers: HeaderMap,
) -> Response {
    let path = storage.jsonl_path(&catalog);
    // The read lock is acquired and held across the whole response,
    // including the body copy below, so a concurrent Store/Delete can't
    // observe a torn file (spec.md §5) — only its acquisition is bounded
    // by READ_TIMEOUT.
    let (_read_guard, metadata) = match tokio::time::timeout(READ_TIMEOUT, async {
        let guard = storage.read_guard(&catalog).await;
        let metadata = tokio::fs::metadata(&path).await;
        (guard, metadata)
    })
    .await
    {
        Ok((guard, metadata)) => (guard, metadata),
        Err(_) => return (StatusCode::GATEWAY_TIMEOUT, "timed out acquiring catalog lock").into_response(),
    };

    let metadata = match metadata {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return (StatusCode::NOT_FOUND, format!("catalog {catalog:?} not found")).into_response();
        }
        Err(err) => return internal_error(err),
    };

    if let Some(not_modified) = not_modified_response(&metadata, &headers) {
        return not_modified;
    }

    match tokio::fs::read(&path).await {
        Ok(bytes) => jsonl_response(bytes, &metadata),
        Err(err) => internal_error(err),
    }
}

/// `GET /{catalog}/api/v1/query` (spec.md §6): index-backed filtering by
/// schema/package/name. Preserves the upstream's existing quirk
/// (SPEC_FULL.md §5, Open Question 2) of returning 500, not 404, when the
/// JSONL file exists but its index does not.
async fn query(
    State(storage): State<Arc<Storage>>,
    Path(catalog): Path<String>,
    Query(params): Query<QueryParams>,
    headers: HeaderMap,
) -> Response {
    let jsonl_path = storage.jsonl_path(&catalog);
    let (_read_guard, metadata) = match tokio::time::timeout(READ_TIMEOUT, async {
        let guard = storage.read_guard(&catalog).await;
        let metadata = tokio::fs::metadata(&jsonl_path).await;
        (guard, metadata)
    })
    .await
    {
        Ok((guard, metadata)) => (guard, metadata),
        Err(_) => return (StatusCode::GATEWAY_TIMEOUT, "timed out acquiring catalog lock").into_response(),
    };

    let metadata = match metadata {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return (StatusCode::NOT_FOUND, format!("catalog {catalog:?} not found")).into_response();
        }
        Err(err) => return internal_error(err),
    };

    if let Some(not_modified) = not_modified_response(&metadata, &headers) {
        return not_modified;
    }

    let index = match storage.load_index(&catalog) {
        Ok(Some(index)) => index,
        Ok(None) => {
            return internal_error(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no query index for catalog {catalog:?}"),
            ))
        }
        Err(err) => return internal_error(err),
    };

    let ranges = index.get(
        metadata.len(),
        params.schema.as_deref(),
        params.package.as_deref(),
        params.name.as_deref(),
    );

    let contents = match tokio::fs::read(&jsonl_path).await {
        Ok(bytes) => bytes,
        Err(err) => return internal_error(err),
    };

    let mut body = Vec::new();
    for range in ranges {
        let start = range.offset as usize;
        let end = start + range.length as usize;
        if let Some(slice) = contents.get(start..end) {
            body.extend_from_slice(slice);
        }
    }

    jsonl_response(body, &metadata)
}

fn jsonl_response(body: Vec<u8>, metadata: &std::fs::Metadata) -> Response {
    let mut response = body.into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/jsonl"));
    if let Some(value) = last_modified_header(metadata) {
        response.headers_mut().insert(header::LAST_MODIFIED, value);
    }
    response
}

fn not_modified_response(metadata: &std::fs::Metadata, headers: &HeaderMap) -> Option<Response> {
    let since = headers.get(header::IF_MODIFIED_SINCE)?.to_str().ok()?;
    let mtime = last_modified_header(metadata)?;
    if mtime.to_str().ok()? == since {
        Some(StatusCode::NOT_MODIFIED.into_response())
    } else {
        None
    }
}

fn last_modified_header(metadata: &std::fs::Metadata) -> Option<HeaderValue> {
    let modified = metadata.modified().ok()?;
    let secs = modified.duration_since(UNIX_EPOCH).ok()?.as_secs();
    let formatted = httpdate(secs);
    HeaderValue::from_str(&formatted).ok()
}

/// Minimal RFC 7231 `IMF-fixdate` formatter, avoiding a dependency solely
/// for one `Last-Modified` header (chrono is already in the stack for the
/// reconciler's timestamps, but its HTTP-date formatting is no simpler).
fn httpdate(unix_secs: u64) -> String {
    use chrono::{DateTime, Utc};
    let dt = DateTime::<Utc>::from(SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(unix_secs));
    dt.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn internal_error(err: impl std::fmt::Display) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
}
