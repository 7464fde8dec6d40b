//! `POST /api/v1/resolve` (spec.md §1, §4.6): runs the dependency-resolution
//! core's variable-building front-end over the catalogs `Storage` has
//! published, under the upgrade mode `ForceSemverUpgradeConstraints`
//! selects.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use catalog_storage::Storage;
use resolver::{CatalogSet, ClusterExtension, InstalledBundle, ResolveError, UpgradeMode};
use serde::Deserialize;
use std::sync::Arc;

pub struct ResolveState {
    pub storage: Arc<Storage>,
    pub upgrade_mode: UpgradeMode,
}

pub fn router(state: Arc<ResolveState>) -> Router {
    Router::new()
        .route("/api/v1/resolve", post(resolve))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct ResolveRequest {
    #[serde(default, rename = "clusterExtensions")]
    cluster_extensions: Vec<ClusterExtension>,
    #[serde(default, rename = "installedBundles")]
    installed_bundles: Vec<InstalledBundle>,
}

#[derive(Debug, thiserror::Error)]
enum LoadCatalogsError {
    #[error("listing published catalogs: {0}")]
    List(#[source] std::io::Error),
    #[error("reading catalog {0:?}: {1}")]
    Read(String, #[source] std::io::Error),
    #[error("parsing catalog {0:?}: {1}")]
    Parse(String, #[source] serde_json::Error),
    #[error("loading catalog {0:?}: {1}")]
    Load(String, #[source] fbc::LoadError),
}

async fn resolve(State(state): State<Arc<ResolveState>>, Json(req): Json<ResolveRequest>) -> Response {
    let catalogs = match load_catalogs(&state.storage).await {
        Ok(catalogs) => catalogs,
        Err(err) => return (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
    };

    match resolver::resolve(
        &catalogs,
        &req.cluster_extensions,
        &req.installed_bundles,
        state.upgrade_mode,
    ) {
        Ok(variables) => Json(variables).into_response(),
        Err(err) => resolve_error_response(err),
    }
}

fn resolve_error_response(err: ResolveError) -> Response {
    let status = match &err {
        ResolveError::NotFound(_)
        | ResolveError::InstalledBundleNotFound { .. }
        | ResolveError::DependencyResolutionFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        ResolveError::InvalidRange { .. }
        | ResolveError::InvalidInstalledVersion { .. }
        | ResolveError::MalformedRequiredPackages { .. } => StatusCode::BAD_REQUEST,
    };
    (status, err.to_string()).into_response()
}

/// Loads every published catalog's content into a [`CatalogSet`], the same
/// JSONL files `Storage` serves over `/{catalog}/api/v1/all` (spec.md §4.2).
async fn load_catalogs(storage: &Storage) -> Result<CatalogSet, LoadCatalogsError> {
    let names = storage.list_catalogs().map_err(LoadCatalogsError::List)?;
    let mut set = CatalogSet::new();
    for name in names {
        let contents = tokio::fs::read_to_string(storage.jsonl_path(&name))
            .await
            .map_err(|err| LoadCatalogsError::Read(name.clone(), err))?;
        let metas: Vec<fbc::meta::RawMeta> = contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(fbc::load::parse_line)
            .collect::<Result<_, _>>()
            .map_err(|err| LoadCatalogsError::Parse(name.clone(), err))?;
        let catalog = fbc::load::build(&name, metas).map_err(|err| LoadCatalogsError::Load(name.clone(), err))?;
        set.insert(name, catalog);
    }
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    async fn test_state() -> (Arc<ResolveState>, tempfile::TempDir) {
        let root = tempfile::tempdir().unwrap();
        let content = tempfile::tempdir().unwrap();
        std::fs::write(
            content.path().join("catalog.json"),
            r#"[
                {"schema":"olm.package","name":"pkg","defaultChannel":"stable"},
                {"schema":"olm.channel","package":"pkg","name":"stable","entries":[{"name":"pkg.v1.0.0"}]},
                {"schema":"olm.bundle","package":"pkg","name":"pkg.v1.0.0","image":"pkg@sha256:aaaa","properties":[
                    {"type":"olm.package","value":{"packageName":"pkg","version":"1.0.0"}}
                ]}
            ]"#,
        )
        .unwrap();
        let storage = Arc::new(Storage::new(root.path(), "http://localhost/catalogs", true));
        storage.store("my-catalog", content.path()).await.unwrap();
        let state = Arc::new(ResolveState {
            storage,
            upgrade_mode: UpgradeMode::Legacy,
        });
        (state, root)
    }

    #[tokio::test]
    async fn resolves_a_required_package() {
        let (state, _root) = test_state().await;
        let app = router(state);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/resolve")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::json!({"clusterExtensions": [{"package": "pkg"}]}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let variables: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();
        assert!(!variables.is_empty());
    }

    #[tokio::test]
    async fn unresolvable_package_is_unprocessable() {
        let (state, _root) = test_state().await;
        let app = router(state);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/resolve")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::json!({"clusterExtensions": [{"package": "missing"}]}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
