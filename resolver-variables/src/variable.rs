//! The four variable kinds the resolver front-end produces (spec.md §3,
//! "Variables"). This module only defines their shape; building them from
//! catalog content is `resolver`'s job.

use serde::{Deserialize, Serialize};

/// A bundle's solver key: `"<catalog>-<package>-<channel>-<bundleName>"`
/// when channel-scoped, else `"<catalog>-<package>-<bundleName>"`
/// (spec.md §3).
pub type BundleId = String;

pub fn bundle_id(catalog: &str, package: &str, channel: Option<&str>, bundle_name: &str) -> BundleId {
    match channel {
        Some(channel) => format!("{catalog}-{package}-{channel}-{bundle_name}"),
        None => format!("{catalog}-{package}-{bundle_name}"),
    }
}

/// Mandatory: depends on one of a sorted candidate list for `package`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredPackageVariable {
    pub package: String,
    /// Candidate bundle ids, already sorted `ByVersion` descending.
    pub candidates: Vec<BundleId>,
}

/// Mandatory: depends on the installed bundle plus its permitted
/// successors, for `package`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledPackageVariable {
    pub package: String,
    /// Permitted successors including the installed bundle itself,
    /// sorted `ByVersion` descending.
    pub candidates: Vec<BundleId>,
}

/// A bundle participating in the problem, carrying the OR-sets of
/// alternatives that satisfy each of its declared required packages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleVariable {
    pub id: BundleId,
    /// One entry per declared required package; each entry is the sorted
    /// list of candidate bundle ids that can satisfy it.
    pub dependencies: Vec<Vec<BundleId>>,
}

/// At most one of `bundle_ids` (all bundles of `package` appearing in the
/// problem) may be chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleUniquenessVariable {
    pub package: String,
    pub bundle_ids: Vec<BundleId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Variable {
    RequiredPackage(RequiredPackageVariable),
    InstalledPackage(InstalledPackageVariable),
    Bundle(BundleVariable),
    BundleUniqueness(BundleUniquenessVariable),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundle_id_formats_with_and_without_channel() {
        assert_eq!(
            bundle_id("cat", "pkg", Some("stable"), "pkg.v1.0.0"),
            "cat-pkg-stable-pkg.v1.0.0"
        );
        assert_eq!(bundle_id("cat", "pkg", None, "pkg.v1.0.0"), "cat-pkg-pkg.v1.0.0");
    }
}
