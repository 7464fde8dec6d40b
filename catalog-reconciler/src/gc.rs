use std::path::Path;
use tokio_util::sync::CancellationToken;

#[derive(Debug, thiserror::Error)]
pub enum GcError {
    #[error("listing live catalogs: {0}")]
    ListCatalogs(String),
    #[error("reading storage root {0:?}: {1}")]
    ReadRoot(std::path::PathBuf, std::io::Error),
    #[error("removing {0:?}: {1}")]
    Remove(std::path::PathBuf, std::io::Error),
    #[error("sweep cancelled")]
    Cancelled,
}

/// Listing live Catalog names is a Kubernetes API call, out of scope for
/// this crate (spec.md §1) — only its contract matters here.
#[async_trait::async_trait]
pub trait ClusterCatalogLister: Send + Sync {
    async fn list_catalog_names(&self) -> Result<Vec<String>, String>;
}

#[derive(Debug, Default, Clone)]
pub struct SweepReport {
    pub removed: Vec<String>,
    pub errors: Vec<String>,
}

/// Runs on an interval and at process start (spec.md §4.4): removes any
/// on-disk catalog file/directory whose stem is not a currently-live
/// Catalog. Errors during one sweep are logged, not fatal to the loop.
pub struct GarbageCollector {
    lister: std::sync::Arc<dyn ClusterCatalogLister>,
    root: std::path::PathBuf,
    dry_run: bool,
}

impl GarbageCollector {
    pub fn new(lister: std::sync::Arc<dyn ClusterCatalogLister>, root: impl Into<std::path::PathBuf>, dry_run: bool) -> Self {
        GarbageCollector {
            lister,
            root: root.into(),
            dry_run,
        }
    }

    pub async fn sweep(&self, cancel: &CancellationToken) -> Result<SweepReport, GcError> {
        let live: std::collections::HashSet<String> = self
            .lister
            .list_catalog_names()
            .await
            .map_err(GcError::ListCatalogs)?
            .into_iter()
            .collect();

        let root = self.root.clone();
        let dry_run = self.dry_run;
        let live_clone = live.clone();
        let cancel_clone = cancel.clone();
        let report = tokio::task::spawn_blocking(move || sweep_dir(&root, &live_clone, dry_run, &cancel_clone))
            .await
            .expect("gc sweep task panicked")?;

        for err in &report.errors {
            tracing::warn!(error = %err, "garbage collection sweep error");
        }
        for name in &report.removed {
            tracing::info!(catalog = %name, dry_run, "removed orphaned catalog content");
        }
        Ok(report)
    }
}

fn sweep_dir(
    root: &Path,
    live: &std::collections::HashSet<String>,
    dry_run: bool,
    cancel: &CancellationToken,
) -> Result<SweepReport, GcError> {
    let mut report = SweepReport::default();
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(report),
        Err(err) => return Err(GcError::ReadRoot(root.to_path_buf(), err)),
    };

    for entry in entries {
        // Checked at each directory entry (spec.md §5): a cancelled sweep
        // exits at the next entry rather than running to completion.
        if cancel.is_cancelled() {
            return Err(GcError::Cancelled);
        }
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                report.errors.push(err.to_string());
                continue;
            }
        };
        let path = entry.path();
        let stem = match path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) => stem.to_string(),
            None => continue,
        };
        if live.contains(&stem) {
            continue;
        }
        if dry_run {
            report.removed.push(stem);
            continue;
        }
        let result = if path.is_dir() {
            std::fs::remove_dir_all(&path)
        } else {
            std::fs::remove_file(&path)
        };
        match result {
            Ok(()) => report.removed.push(stem),
            Err(err) => report.errors.push(GcError::Remove(path, err).to_string()),
        }
    }
    Ok(report)
}
