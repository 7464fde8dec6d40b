use catalogd_types::ImageSource;
use std::path::PathBuf;

/// The result of a successful unpack: the digest-resolved reference that
/// was actually pulled, and a filesystem tree holding the FBC content.
#[derive(Debug, Clone)]
pub struct UnpackResult {
    pub resolved_ref: String,
    pub content_dir: PathBuf,
}

#[derive(Debug, thiserror::Error)]
#[error("unpacking {reference}: {message}")]
pub struct UnpackError {
    pub reference: String,
    pub message: String,
}

/// Image pulling and unpacking is an external collaborator (spec.md §1):
/// this crate only needs the shape of its result.
#[async_trait::async_trait]
pub trait Unpacker: Send + Sync {
    async fn unpack(&self, source: &ImageSource) -> Result<UnpackResult, UnpackError>;
}
