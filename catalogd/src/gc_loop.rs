//! Wires `catalog_reconciler::GarbageCollector` (spec.md §4.4) to a real
//! Kubernetes `Catalog` listing and drives it on an interval plus once at
//! process start.

use catalog_reconciler::{ClusterCatalogLister, GarbageCollector};
use catalogd_types::CatalogCrd;
use kube::api::{Api, ListParams};
use kube::ResourceExt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Lists live `Catalog` names via the Kubernetes API (spec.md §4.4). The
/// watch/list machinery itself belongs to `kube`; this struct is only the
/// thin adapter satisfying `ClusterCatalogLister`.
pub struct KubeCatalogLister {
    api: Api<CatalogCrd>,
}

impl KubeCatalogLister {
    pub fn new(client: kube::Client) -> Self {
        KubeCatalogLister {
            api: Api::all(client),
        }
    }
}

#[async_trait::async_trait]
impl ClusterCatalogLister for KubeCatalogLister {
    async fn list_catalog_names(&self) -> Result<Vec<String>, String> {
        self.api
            .list(&ListParams::default())
            .await
            .map(|list| list.items.iter().map(|c| c.name_any()).collect())
            .map_err(|err| err.to_string())
    }
}

/// Runs `gc.sweep()` once immediately, then every `interval`, until
/// `shutdown` is cancelled. Sweep errors are already logged inside
/// `sweep()` itself (spec.md §4.4: "Errors during one sweep are logged
/// and do not terminate the loop."); a cancelled sweep is logged the
/// same way rather than treated as a loop-ending failure.
pub async fn run(gc: GarbageCollector, interval: Duration, shutdown: CancellationToken) {
    loop {
        match gc.sweep(&shutdown).await {
            Ok(report) => {
                tracing::info!(
                    removed = report.removed.len(),
                    errors = report.errors.len(),
                    "garbage collection sweep complete"
                );
            }
            Err(err) => tracing::warn!(error = %err, "garbage collection sweep failed"),
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.cancelled() => {
                tracing::info!("garbage collector shutting down");
                return;
            }
        }
    }
}
