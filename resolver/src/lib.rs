//! The dependency-resolution core's variable-building front-end (spec.md
//! §4.6): turns catalog content plus a set of requests into the
//! `Variable`/constraint contract an external SAT solver consumes.

pub mod catalogs;
mod errors;
mod successors;
mod variables;

pub use catalogs::{BundleRef, CatalogSet};
pub use errors::ResolveError;
pub use successors::UpgradeMode;
pub use variables::{
    expand_bundle_variables, installed_package_variable, required_package_variable, resolve, ClusterExtension,
    InstalledBundle,
};
