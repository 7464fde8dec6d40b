//! Drives `catalog_reconciler::Reconciler` from real `Catalog` watch
//! events. The watcher/work-queue machinery itself — spec.md §1's
//! "Kubernetes reconciliation harness (watchers, work queues, leader
//! election)" — is `kube::runtime::Controller`, used here as the external
//! collaborator the spec says to treat as an interface; grounded on the
//! `Controller::new(...).run(reconcile, error_policy, ctx)` shape from
//! the pack's `neon-storage-controller` reference.

use catalog_reconciler::{ReconcileError, Reconciler, Requeue};
use catalogd_types::{Catalog, CatalogCrd, CatalogSpec, CatalogStatus};
use futures::StreamExt;
use kube::api::{Api, Patch, PatchParams};
use kube::runtime::controller::Action;
use kube::runtime::finalizer::{finalizer, Event as FinalizerEvent};
use kube::runtime::watcher::Config as WatcherConfig;
use kube::runtime::Controller;
use kube::{Client, Resource, ResourceExt};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const FINALIZER: &str = "olm.operatorframework.io/delete-catalog";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
    #[error(transparent)]
    Finalizer(#[from] kube::runtime::finalizer::Error<ReconcileError>),
    #[error(transparent)]
    Kube(#[from] kube::Error),
}

pub struct Context {
    pub reconciler: Arc<Reconciler>,
    pub client: Client,
}

/// Converts the wire `CatalogCrd` into the plain `Catalog` the core
/// reconciler operates on (spec.md §9: the arena/plain-struct design
/// keeps `catalog-reconciler` free of `kube` entirely).
fn to_core_catalog(crd: &CatalogCrd) -> Catalog {
    Catalog {
        name: crd.name_any(),
        generation: crd.meta().generation.unwrap_or(0),
        spec: CatalogSpec {
            source: crd.spec.source.clone(),
        },
        status: crd.status.clone().unwrap_or_default(),
    }
}

async fn apply_status(api: &Api<CatalogCrd>, name: &str, status: &CatalogStatus) -> kube::Result<()> {
    let patch = Patch::Merge(json!({ "status": status }));
    api.patch_status(name, &PatchParams::apply("catalogd").force(), &patch)
        .await?;
    Ok(())
}

fn to_action(requeue: Requeue) -> Action {
    match requeue {
        Requeue::None => Action::await_change(),
        Requeue::After(duration) => Action::requeue(duration),
    }
}

async fn reconcile_one(crd: Arc<CatalogCrd>, ctx: Arc<Context>) -> Result<Action, Error> {
    let api: Api<CatalogCrd> = Api::all(ctx.client.clone());

    let action = finalizer(&api, FINALIZER, crd.clone(), |event| async {
        match event {
            FinalizerEvent::Apply(crd) => {
                let mut catalog = to_core_catalog(&crd);
                let outcome = ctx.reconciler.reconcile(&mut catalog).await;
                apply_status(&api, &catalog.name, &catalog.status)
                    .await
                    .map_err(status_patch_failed)?;
                if let Some(err) = outcome.error {
                    return Err(err);
                }
                Ok(to_action(outcome.requeue))
            }
            FinalizerEvent::Cleanup(crd) => {
                let catalog = to_core_catalog(&crd);
                ctx.reconciler.finalize(&catalog).await?;
                Ok(Action::await_change())
            }
        }
    })
    .await?;

    Ok(action)
}

fn error_policy(crd: Arc<CatalogCrd>, err: &Error, _ctx: Arc<Context>) -> Action {
    tracing::warn!(catalog = %crd.name_any(), error = %err, "reconcile failed");
    Action::requeue(Duration::from_secs(30))
}

/// Wraps a failed status patch as a `ReconcileError::Storage` so the
/// `finalizer` closure's single error type can carry it — the
/// `StorageError` variant already exists for "wrote the content but
/// couldn't publish", and a failed status patch is the same shape of
/// problem from the harness's point of view.
fn status_patch_failed(err: kube::Error) -> ReconcileError {
    ReconcileError::Storage(catalog_storage::StorageError::Root(
        std::path::PathBuf::new(),
        std::io::Error::new(std::io::ErrorKind::Other, err.to_string()),
    ))
}

/// Runs the controller until the process is signaled to stop. The CRD
/// must already be installed (RBAC/CRD installation is out of scope,
/// spec.md §1).
pub async fn run(client: Client, reconciler: Arc<Reconciler>) {
    let catalogs: Api<CatalogCrd> = Api::all(client.clone());
    let ctx = Arc::new(Context { reconciler, client });

    Controller::new(catalogs, WatcherConfig::default())
        .shutdown_on_signal()
        .run(reconcile_one, error_policy, ctx)
        .for_each(|result| async move {
            if let Err(err) = result {
                tracing::warn!(error = %err, "controller stream error");
            }
        })
        .await;
}
