//! `catalogd`: the binary that wires the storage engine, the per-Catalog
//! reconciler, the garbage collector, and the catalog content HTTP server
//! together (spec.md §1-§2). The Kubernetes watch/work-queue harness
//! itself comes from `kube::runtime::Controller` — treated, per spec.md
//! §1, as an external collaborator whose contract this binary drives.

mod cli;
mod controller;
mod gc_loop;
mod logging;
mod metrics_server;
mod resolve_handler;
mod unpacker_stub;

use anyhow::Context;
use catalog_reconciler::{GarbageCollector, Reconciler};
use catalog_storage::Storage;
use clap::Parser;
use resolver::UpgradeMode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::install();

    let cli = cli::Cli::parse();
    let feature_gates = cli::FeatureGates::from(cli.feature_gates);

    tracing::info!(
        storage_root = %cli.storage_root.display(),
        http_bind = %cli.http_bind,
        ?feature_gates,
        "starting catalogd"
    );

    let storage = Arc::new(Storage::new(
        &cli.storage_root,
        &cli.base_url,
        feature_gates.api_v1_query_handler,
    ));

    let client = kube::Client::try_default()
        .await
        .context("building Kubernetes client")?;

    let reconciler = Arc::new(Reconciler::new(
        Arc::new(unpacker_stub::UnimplementedUnpacker),
        storage.clone(),
    ));

    let gc = GarbageCollector::new(
        Arc::new(gc_loop::KubeCatalogLister::new(client.clone())),
        &cli.storage_root,
        cli.gc_dry_run,
    );

    let upgrade_mode = if feature_gates.force_semver_upgrade_constraints {
        UpgradeMode::StrictSemver
    } else {
        UpgradeMode::Legacy
    };
    let resolve_state = Arc::new(resolve_handler::ResolveState {
        storage: storage.clone(),
        upgrade_mode,
    });

    let http_router = catalog_storage::router(storage.clone()).merge(resolve_handler::router(resolve_state));
    let http_listener = tokio::net::TcpListener::bind(cli.http_bind)
        .await
        .context("binding catalog content HTTP server")?;
    let metrics_listener = tokio::net::TcpListener::bind(cli.metrics_bind)
        .await
        .context("binding metrics server")?;

    let shutdown = CancellationToken::new();

    tokio::spawn(async move {
        if let Err(err) = axum::serve(http_listener, http_router).await {
            tracing::error!(error = %err, "catalog content HTTP server exited");
        }
    });

    tokio::spawn(async move {
        if let Err(err) = axum::serve(metrics_listener, metrics_server::build_router()).await {
            tracing::error!(error = %err, "metrics server exited");
        }
    });

    tokio::spawn(gc_loop::run(gc, cli.gc_interval, shutdown.clone()));

    controller::run(client, reconciler).await;

    shutdown.cancel();
    Ok(())
}
