//! Atomic catalog content storage and the HTTP server that exposes it
//! (spec.md §4.2: "Storage Engine").

mod blobs;
mod errors;
mod http;
mod registry;
mod store;

pub use errors::{DeleteErrors, StorageError};
pub use http::{router, QueryParams, DURATION_BUCKETS};
pub use store::{Storage, StoreStats};
