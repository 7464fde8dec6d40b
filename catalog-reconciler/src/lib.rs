//! Per-Catalog lifecycle management and garbage collection (spec.md
//! §4.1, §4.4). The Kubernetes watch/work-queue harness itself is out of
//! scope — this crate is the pure state-transition logic a harness would
//! drive.

mod gc;
mod reconciler;
mod requeue;
mod unpacker;

pub use gc::{ClusterCatalogLister, GarbageCollector, GcError, SweepReport};
pub use reconciler::{ReconcileError, ReconcileOutcome, Reconciler};
pub use requeue::{unpack_backoff, Requeue};
pub use unpacker::{UnpackError, UnpackResult, Unpacker};
