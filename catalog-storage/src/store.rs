//! The storage engine's atomic write/delete contract (spec.md §4.2).

use crate::blobs;
use crate::errors::{DeleteErrors, StorageError};
use crate::registry::LockRegistry;
use catalog_index::{Index, IndexBuilder};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub blob_count: usize,
    pub bytes_written: u64,
}

pub struct Storage {
    root: PathBuf,
    base_url_prefix: String,
    /// `APIV1QueryHandler` (spec.md §6): gates both writing and deleting
    /// the index file (SPEC_FULL.md §5, Open Question 1).
    query_index_enabled: bool,
    locks: LockRegistry,
}

impl Storage {
    pub fn new(root: impl Into<PathBuf>, base_url_prefix: impl Into<String>, query_index_enabled: bool) -> Self {
        Storage {
            root: root.into(),
            base_url_prefix: base_url_prefix.into(),
            query_index_enabled,
            locks: LockRegistry::new(),
        }
    }

    pub fn base_url(&self, catalog: &str) -> String {
        format!("{}/{}", self.base_url_prefix.trim_end_matches('/'), catalog)
    }

    pub fn jsonl_path(&self, catalog: &str) -> PathBuf {
        self.root.join(format!("{catalog}.jsonl"))
    }

    pub fn index_path(&self, catalog: &str) -> PathBuf {
        self.root.join(format!("{catalog}.index.json"))
    }

    pub fn query_index_enabled(&self) -> bool {
        self.query_index_enabled
    }

    /// Ensures `<root>` exists with mode 0700, walks `content_dir` for
    /// every FBC meta blob, and atomically publishes the JSONL file (and,
    /// when enabled, the query index) via temp-file + rename (spec.md
    /// §4.2).
    pub async fn store(&self, catalog: &str, content_dir: &Path) -> Result<StoreStats, StorageError> {
        ensure_root(&self.root)
            .await
            .map_err(|err| StorageError::Root(self.root.clone(), err))?;

        let content_dir = content_dir.to_path_buf();
        let blobs = tokio::task::spawn_blocking(move || blobs::walk(&content_dir))
            .await
            .expect("blob walk task panicked")?;

        // Held for the whole write, per spec.md §5: "write-held by
        // Store/Delete".
        let lock = self.locks.get(catalog);
        let _write_guard = lock.write().await;

        let root = self.root.clone();
        let catalog_owned = catalog.to_string();
        let query_index_enabled = self.query_index_enabled;
        let stats = tokio::task::spawn_blocking(move || {
            write_and_publish(&root, &catalog_owned, blobs, query_index_enabled)
        })
        .await
        .expect("store task panicked")?;

        tracing::info!(
            catalog,
            blob_count = stats.blob_count,
            bytes_written = stats.bytes_written,
            "published catalog content"
        );
        Ok(stats)
    }

    /// Best-effort removal of both files; errors are joined, not
    /// short-circuited, so one failing file doesn't block the other
    /// (spec.md §7).
    pub async fn delete(&self, catalog: &str) -> Result<(), StorageError> {
        let lock = self.locks.get(catalog);
        let _write_guard = lock.write().await;

        let mut errors = Vec::new();
        for path in [self.jsonl_path(catalog), self.index_path(catalog)] {
            if let Err(err) = tokio::fs::remove_file(&path).await {
                if err.kind() != std::io::ErrorKind::NotFound {
                    errors.push(err);
                }
            }
        }

        if errors.is_empty() {
            tracing::info!(catalog, "deleted catalog content");
            Ok(())
        } else {
            Err(StorageError::Delete(DeleteErrors {
                catalog: catalog.to_string(),
                errors,
            }))
        }
    }

    /// Acquires the read side of this catalog's lock, for the duration of
    /// an HTTP response body copy (spec.md §5).
    pub async fn read_guard(&self, catalog: &str) -> tokio::sync::OwnedRwLockReadGuard<()> {
        self.locks.get(catalog).read_owned().await
    }

    /// Names of every catalog with published content under `root`,
    /// derived from the `.jsonl` files `store` has written there.
    pub fn list_catalogs(&self) -> std::io::Result<Vec<String>> {
        let mut catalogs = Vec::new();
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(catalogs),
            Err(err) => return Err(err),
        };
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some("jsonl") {
                if let Some(name) = path.file_stem().and_then(|s| s.to_str()) {
                    catalogs.push(name.to_string());
                }
            }
        }
        catalogs.sort();
        Ok(catalogs)
    }

    pub fn load_index(&self, catalog: &str) -> std::io::Result<Option<Index>> {
        match std::fs::read_to_string(self.index_path(catalog)) {
            Ok(contents) => Ok(Some(
                Index::from_json(&contents).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?,
            )),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }
}

async fn ensure_root(root: &Path) -> std::io::Result<()> {
    tokio::fs::create_dir_all(root).await?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(root, std::fs::Permissions::from_mode(0o700)).await?;
    }
    Ok(())
}

fn write_and_publish(
    root: &Path,
    catalog: &str,
    blobs: Vec<serde_json::Value>,
    query_index_enabled: bool,
) -> Result<StoreStats, StorageError> {
    let mut jsonl_temp = tempfile::Builder::new()
        .prefix(&format!(".{catalog}-"))
        .suffix(".jsonl")
        .tempfile_in(root)
        .map_err(|err| StorageError::WriteTemp {
            catalog: catalog.to_string(),
            source: err,
        })?;

    let mut index_builder = IndexBuilder::new();
    let mut offset: u64 = 0;
    for (i, blob) in blobs.iter().enumerate() {
        let schema = blob
            .get("schema")
            .and_then(|v| v.as_str())
            .ok_or(StorageError::MissingField {
                index: i,
                field: "schema",
            })?;
        let package = blob.get("package").and_then(|v| v.as_str());
        let name = blob.get("name").and_then(|v| v.as_str());

        let mut line = serde_json::to_vec(blob)?;
        line.push(b'\n');
        jsonl_temp
            .write_all(&line)
            .map_err(|err| StorageError::WriteTemp {
                catalog: catalog.to_string(),
                source: err,
            })?;

        index_builder.record(schema, package, name, offset, line.len() as u64);
        offset += line.len() as u64;
    }
    jsonl_temp.as_file().sync_all().ok();

    let index_temp = if query_index_enabled {
        let mut temp = tempfile::Builder::new()
            .prefix(&format!(".{catalog}-"))
            .suffix(".index.json")
            .tempfile_in(root)
            .map_err(|err| StorageError::WriteTemp {
                catalog: catalog.to_string(),
                source: err,
            })?;
        let json = index_builder.finish().to_json()?;
        temp.write_all(json.as_bytes())
            .map_err(|err| StorageError::WriteTemp {
                catalog: catalog.to_string(),
                source: err,
            })?;
        temp.as_file().sync_all().ok();
        Some(temp)
    } else {
        None
    };

    jsonl_temp
        .persist(root.join(format!("{catalog}.jsonl")))
        .map_err(|err| StorageError::Rename {
            catalog: catalog.to_string(),
            source: err.error,
        })?;
    if let Some(index_temp) = index_temp {
        index_temp
            .persist(root.join(format!("{catalog}.index.json")))
            .map_err(|err| StorageError::Rename {
                catalog: catalog.to_string(),
                source: err.error,
            })?;
    }

    Ok(StoreStats {
        blob_count: blobs.len(),
        bytes_written: offset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_content(dir: &Path) {
        std::fs::write(dir.join("catalog.json"), r#"{"schema":"olm.package","name":"pkg"}"#).unwrap();
    }

    #[tokio::test]
    async fn store_then_delete_is_idempotent_and_atomic() {
        let root = tempfile::tempdir().unwrap();
        let content = tempfile::tempdir().unwrap();
        write_content(content.path());

        let storage = Storage::new(root.path(), "http://localhost/catalogs", true);
        let stats = storage.store("my-catalog", content.path()).await.unwrap();
        assert_eq!(stats.blob_count, 1);
        assert!(storage.jsonl_path("my-catalog").exists());
        assert!(storage.index_path("my-catalog").exists());

        let first_contents = std::fs::read_to_string(storage.jsonl_path("my-catalog")).unwrap();

        storage.delete("my-catalog").await.unwrap();
        assert!(!storage.jsonl_path("my-catalog").exists());
        assert!(!storage.index_path("my-catalog").exists());

        // Deleting again is a no-op, not an error (NotFound is swallowed).
        storage.delete("my-catalog").await.unwrap();

        storage.store("my-catalog", content.path()).await.unwrap();
        let second_contents = std::fs::read_to_string(storage.jsonl_path("my-catalog")).unwrap();
        assert_eq!(first_contents, second_contents);
    }

    #[tokio::test]
    async fn index_file_absent_when_feature_disabled() {
        let root = tempfile::tempdir().unwrap();
        let content = tempfile::tempdir().unwrap();
        write_content(content.path());

        let storage = Storage::new(root.path(), "http://localhost/catalogs", false);
        storage.store("my-catalog", content.path()).await.unwrap();
        assert!(storage.jsonl_path("my-catalog").exists());
        assert!(!storage.index_path("my-catalog").exists());
    }

    #[tokio::test]
    async fn list_catalogs_reflects_published_content() {
        let root = tempfile::tempdir().unwrap();
        let content = tempfile::tempdir().unwrap();
        write_content(content.path());

        let storage = Storage::new(root.path(), "http://localhost/catalogs", true);
        assert_eq!(storage.list_catalogs().unwrap(), Vec::<String>::new());

        storage.store("b-catalog", content.path()).await.unwrap();
        storage.store("a-catalog", content.path()).await.unwrap();
        assert_eq!(storage.list_catalogs().unwrap(), vec!["a-catalog", "b-catalog"]);

        storage.delete("a-catalog").await.unwrap();
        assert_eq!(storage.list_catalogs().unwrap(), vec!["b-catalog"]);
    }

    #[tokio::test]
    async fn missing_schema_field_is_rejected() {
        let root = tempfile::tempdir().unwrap();
        let content = tempfile::tempdir().unwrap();
        std::fs::write(content.path().join("bad.json"), r#"{"name":"pkg"}"#).unwrap();

        let storage = Storage::new(root.path(), "http://localhost/catalogs", true);
        let err = storage.store("my-catalog", content.path()).await.unwrap_err();
        assert!(matches!(err, StorageError::MissingField { field: "schema", .. }));
        // Nothing was published.
        assert!(!storage.jsonl_path("my-catalog").exists());
    }
}
