//! The `/metrics` endpoint (spec.md §6), grounded on the teacher's
//! `dekaf::metrics_server` pattern of mounting a Prometheus exporter
//! behind its own small `axum::Router`, but with the one histogram this
//! system exposes — `catalogd_http_request_duration_seconds{code}` —
//! registered with its exact fixed bucket boundaries rather than the
//! teacher's exponential series.

use axum::routing::get;
use axum::Router;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub fn build_router() -> Router<()> {
    let prom = PrometheusBuilder::new()
        .set_buckets_for_metric(
            metrics_exporter_prometheus::Matcher::Full(
                "catalogd_http_request_duration_seconds".to_string(),
            ),
            catalog_storage::DURATION_BUCKETS,
        )
        .expect("registering catalogd_http_request_duration_seconds buckets")
        .install_recorder()
        .expect("failed to install prometheus recorder");

    Router::new()
        .route("/metrics", get(prometheus_metrics))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(prom)
}

#[tracing::instrument(skip_all)]
async fn prometheus_metrics(
    axum::extract::State(prom_handle): axum::extract::State<PrometheusHandle>,
) -> (axum::http::StatusCode, String) {
    (axum::http::StatusCode::OK, prom_handle.render())
}
