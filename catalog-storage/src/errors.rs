#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("walking unpacked content: {0}")]
    Walk(#[from] crate::blobs::BlobWalkError),
    #[error("blob at index {index} is missing required field {field:?}")]
    MissingField { index: usize, field: &'static str },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("storage root {0:?}: {1}")]
    Root(std::path::PathBuf, std::io::Error),
    #[error("writing temp file for {catalog:?}: {source}")]
    WriteTemp {
        catalog: String,
        #[source]
        source: std::io::Error,
    },
    #[error("publishing content for {catalog:?}: {source}")]
    Rename {
        catalog: String,
        #[source]
        source: std::io::Error,
    },
    /// `Delete`'s errors are joined, not short-circuited (spec.md §7): a
    /// failure removing one of the two files still attempts the other.
    #[error(transparent)]
    Delete(#[from] DeleteErrors),
}

/// The errors accumulated by one `Delete` call. Never empty when
/// constructed — `Storage::delete` only returns this variant if at least
/// one removal failed.
#[derive(Debug)]
pub struct DeleteErrors {
    pub catalog: String,
    pub errors: Vec<std::io::Error>,
}

impl std::fmt::Display for DeleteErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
        write!(
            f,
            "deleting catalog {:?} had {} error(s): {}",
            self.catalog,
            self.errors.len(),
            messages.join("; ")
        )
    }
}

impl std::error::Error for DeleteErrors {}
