use crate::requeue::{unpack_backoff, Requeue};
use crate::unpacker::{UnpackError, Unpacker};
use catalog_storage::{Storage, StorageError};
use catalogd_types::{
    set_condition, Catalog, Condition, ConditionStatus, ConditionType, ImageSource, Source,
    SourceValidationError,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("validating catalog spec: {0}")]
    Validation(#[from] SourceValidationError),
    #[error(transparent)]
    Unpack(#[from] UnpackError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// The outcome of one `reconcile` call: a scheduling decision plus,
/// optionally, the error that produced it. Mirrors the "retryable error
/// carries its own backoff" idiom (spec.md §4.1's failure semantics) —
/// the caller always gets a concrete next action even when something
/// failed, rather than having to derive one from the error variant.
#[derive(Debug)]
pub struct ReconcileOutcome {
    pub requeue: Requeue,
    pub error: Option<ReconcileError>,
}

impl ReconcileOutcome {
    fn ok(requeue: Requeue) -> Self {
        ReconcileOutcome { requeue, error: None }
    }

    fn failed(requeue: Requeue, error: ReconcileError) -> Self {
        ReconcileOutcome {
            requeue,
            error: Some(error),
        }
    }
}

/// Per-Catalog lifecycle (spec.md §4.1): unpack, store, publish status;
/// on deletion, remove stored content.
pub struct Reconciler {
    unpacker: Arc<dyn Unpacker>,
    storage: Arc<Storage>,
    failures: Mutex<HashMap<String, u32>>,
}

impl Reconciler {
    pub fn new(unpacker: Arc<dyn Unpacker>, storage: Arc<Storage>) -> Self {
        Reconciler {
            unpacker,
            storage,
            failures: Mutex::new(HashMap::new()),
        }
    }

    fn bump_failures(&self, catalog: &str) -> u32 {
        let mut failures = self.failures.lock().expect("failures map poisoned");
        let count = failures.entry(catalog.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    fn reset_failures(&self, catalog: &str) {
        self.failures.lock().expect("failures map poisoned").remove(catalog);
    }

    /// If `spec.source` changed or the catalog was never unpacked, invokes
    /// the `Unpacker` and stores the result; otherwise just recomputes the
    /// poll schedule. Terminal validation failures return
    /// `Requeue::None` with the error populated — a harness should not
    /// retry those until the spec itself changes.
    pub async fn reconcile(&self, catalog: &mut Catalog) -> ReconcileOutcome {
        let Source::Image(image) = &catalog.spec.source;

        if let Err(err) = catalog.spec.validate() {
            set_condition(
                &mut catalog.status.conditions,
                Condition::new(
                    ConditionType::Progressing,
                    ConditionStatus::False,
                    "InvalidSpec",
                    err.to_string(),
                    catalog.generation,
                ),
            );
            return ReconcileOutcome::failed(Requeue::None, ReconcileError::Validation(err));
        }

        let already_unpacked = catalog
            .status
            .resolved_source
            .image
            .as_ref()
            .is_some_and(|resolved| image.is_digest_based() && resolved.reference == image.reference);

        if !already_unpacked {
            match self.unpack_and_store(catalog, image).await {
                Ok(()) => self.reset_failures(&catalog.name),
                Err(ReconcileError::Unpack(err)) => {
                    set_condition(
                        &mut catalog.status.conditions,
                        Condition::new(
                            ConditionType::Unpacked,
                            ConditionStatus::False,
                            "UnpackFailed",
                            err.to_string(),
                            catalog.generation,
                        ),
                    );
                    let attempt = self.bump_failures(&catalog.name);
                    return ReconcileOutcome::failed(unpack_backoff(attempt), ReconcileError::Unpack(err));
                }
                Err(ReconcileError::Storage(err)) => {
                    // Prior served content is untouched; Serving is left
                    // alone and we only flag that we're still working on
                    // it (spec.md §4.1).
                    set_condition(
                        &mut catalog.status.conditions,
                        Condition::new(
                            ConditionType::Progressing,
                            ConditionStatus::True,
                            "StorageError",
                            err.to_string(),
                            catalog.generation,
                        ),
                    );
                    let attempt = self.bump_failures(&catalog.name);
                    return ReconcileOutcome::failed(unpack_backoff(attempt), ReconcileError::Storage(err));
                }
                Err(err @ ReconcileError::Validation(_)) => unreachable!("validated above: {err}"),
            }
        }

        let requeue = match image.poll_interval() {
            Some(duration) => Requeue::After(duration),
            None => Requeue::None,
        };
        ReconcileOutcome::ok(requeue)
    }

    async fn unpack_and_store(&self, catalog: &mut Catalog, image: &ImageSource) -> Result<(), ReconcileError> {
        let unpacked = self.unpacker.unpack(image).await?;
        self.storage.store(&catalog.name, &unpacked.content_dir).await?;

        catalog.status.resolved_source.image = Some(ImageSource {
            reference: unpacked.resolved_ref,
            poll_interval_minutes: image.poll_interval_minutes,
        });
        catalog.status.urls.base = Some(self.storage.base_url(&catalog.name));
        catalog.status.observed_generation = catalog.generation;

        for (type_, reason, message) in [
            (ConditionType::Unpacked, "Unpacked", "catalog content unpacked"),
            (ConditionType::Serving, "Serving", "catalog content is being served"),
            (ConditionType::Progressing, "Reconciled", "steady state reached"),
        ] {
            let status = if type_ == ConditionType::Progressing {
                ConditionStatus::False
            } else {
                ConditionStatus::True
            };
            set_condition(
                &mut catalog.status.conditions,
                Condition::new(type_, status, reason, message, catalog.generation),
            );
        }
        Ok(())
    }

    /// `finalize(catalog)` (spec.md §4.1): removes stored content before
    /// the object itself is allowed to be removed.
    pub async fn finalize(&self, catalog: &Catalog) -> Result<(), ReconcileError> {
        self.storage.delete(&catalog.name).await?;
        self.reset_failures(&catalog.name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalogd_types::{CatalogSpec, CatalogStatus};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FlakyUnpacker {
        attempts: AtomicUsize,
        fail_first_n: usize,
        content_dir: PathBuf,
    }

    #[async_trait::async_trait]
    impl Unpacker for FlakyUnpacker {
        async fn unpack(&self, source: &ImageSource) -> Result<crate::unpacker::UnpackResult, UnpackError> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.fail_first_n {
                return Err(UnpackError {
                    reference: source.reference.clone(),
                    message: "transient pull failure".to_string(),
                });
            }
            Ok(crate::unpacker::UnpackResult {
                resolved_ref: format!("{}@sha256:{}", source.reference, "a".repeat(64)),
                content_dir: self.content_dir.clone(),
            })
        }
    }

    fn image_catalog(name: &str, reference: &str) -> Catalog {
        Catalog::new(
            name,
            CatalogSpec {
                source: Source::Image(ImageSource {
                    reference: reference.to_string(),
                    poll_interval_minutes: None,
                }),
            },
        )
    }

    #[tokio::test]
    async fn successful_reconcile_sets_conditions_and_urls() {
        let content = tempfile::tempdir().unwrap();
        std::fs::write(content.path().join("catalog.json"), r#"{"schema":"olm.package"}"#).unwrap();
        let storage_root = tempfile::tempdir().unwrap();
        let storage = Arc::new(Storage::new(storage_root.path(), "http://localhost/catalogs", true));
        let unpacker = Arc::new(FlakyUnpacker {
            attempts: AtomicUsize::new(0),
            fail_first_n: 0,
            content_dir: content.path().to_path_buf(),
        });
        let reconciler = Reconciler::new(unpacker, storage);

        let mut catalog = image_catalog("my-catalog", "docker.io/test-image:latest");
        let outcome = reconciler.reconcile(&mut catalog).await;
        assert!(outcome.error.is_none());
        assert_eq!(outcome.requeue, Requeue::None);
        assert_eq!(
            catalog.status.urls.base.as_deref(),
            Some("http://localhost/catalogs/my-catalog")
        );
        assert!(catalog
            .status
            .resolved_source
            .image
            .as_ref()
            .unwrap()
            .reference
            .contains("@sha256:"));
    }

    #[tokio::test]
    async fn unpack_failure_sets_unpacked_false_and_backs_off() {
        let content = tempfile::tempdir().unwrap();
        std::fs::write(content.path().join("catalog.json"), r#"{"schema":"olm.package"}"#).unwrap();
        let storage_root = tempfile::tempdir().unwrap();
        let storage = Arc::new(Storage::new(storage_root.path(), "http://localhost/catalogs", true));
        let unpacker = Arc::new(FlakyUnpacker {
            attempts: AtomicUsize::new(0),
            fail_first_n: 3,
            content_dir: content.path().to_path_buf(),
        });
        let reconciler = Reconciler::new(unpacker, storage);

        let mut catalog = image_catalog("my-catalog", "docker.io/test-image:latest");
        let outcome = reconciler.reconcile(&mut catalog).await;
        assert!(outcome.error.is_some());
        assert!(matches!(outcome.requeue, Requeue::After(_)));
        let unpacked = catalogd_types::find_condition(&catalog.status.conditions, ConditionType::Unpacked).unwrap();
        assert_eq!(unpacked.status, ConditionStatus::False);
    }

    #[tokio::test]
    async fn digest_ref_already_resolved_skips_reunpack() {
        let content = tempfile::tempdir().unwrap();
        std::fs::write(content.path().join("catalog.json"), r#"{"schema":"olm.package"}"#).unwrap();
        let storage_root = tempfile::tempdir().unwrap();
        let storage = Arc::new(Storage::new(storage_root.path(), "http://localhost/catalogs", true));
        let unpacker = Arc::new(FlakyUnpacker {
            attempts: AtomicUsize::new(0),
            fail_first_n: 0,
            content_dir: content.path().to_path_buf(),
        });
        let digest = format!("docker.io/test-image@sha256:{}", "b".repeat(64));
        let reconciler = Reconciler::new(unpacker.clone(), storage);

        let mut catalog = image_catalog("my-catalog", &digest);
        catalog.status = CatalogStatus {
            resolved_source: catalogd_types::ResolvedSource {
                image: Some(ImageSource {
                    reference: digest.clone(),
                    poll_interval_minutes: None,
                }),
            },
            ..Default::default()
        };

        reconciler.reconcile(&mut catalog).await;
        assert_eq!(unpacker.attempts.load(Ordering::SeqCst), 0);
    }
}
