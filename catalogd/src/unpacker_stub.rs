//! Image pulling and unpacking is explicitly out of scope for this system
//! (spec.md §1): "image pulling/unpacking (an opaque `Unpacker` that
//! yields a filesystem tree)" is treated as an external collaborator,
//! interface only. This stub satisfies `catalog_reconciler::Unpacker` so
//! the binary links and the reconcile loop is exercisable end-to-end in
//! tests and local runs; a real deployment substitutes an `Unpacker` that
//! actually pulls and extracts an OCI image (e.g. backed by `oci-client`
//! or containerd's unpack API).

use catalogd_types::ImageSource;
use catalog_reconciler::{UnpackError, UnpackResult, Unpacker};

pub struct UnimplementedUnpacker;

#[async_trait::async_trait]
impl Unpacker for UnimplementedUnpacker {
    async fn unpack(&self, source: &ImageSource) -> Result<UnpackResult, UnpackError> {
        Err(UnpackError {
            reference: source.reference.clone(),
            message: "no Unpacker configured; image pulling is out of scope for this build"
                .to_string(),
        })
    }
}
