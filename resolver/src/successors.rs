//! The two installed-package successor rules (spec.md §4.6): legacy
//! channel-graph edges, and the strict-semver `ForceSemverUpgradeConstraints`
//! alternative.

use crate::catalogs::{BundleRef, CatalogSet};
use crate::errors::ResolveError;
use resolver_variables::filter::{filter, not};
use resolver_variables::version::{Range, Version};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeMode {
    Legacy,
    StrictSemver,
}

pub fn successors_of<'a>(
    catalogs: &'a CatalogSet,
    installed: BundleRef<'a>,
    mode: UpgradeMode,
) -> Result<Vec<BundleRef<'a>>, ResolveError> {
    match mode {
        UpgradeMode::Legacy => Ok(legacy_successors(catalogs, installed)),
        UpgradeMode::StrictSemver => strict_semver_successors(catalogs, installed),
    }
}

/// A candidate `C` is a successor of `B` iff some channel entry in `B`'s
/// package names `C` via `replaces`, `skips`, or a matching `skipRange`.
/// `B` itself is always included.
fn legacy_successors<'a>(catalogs: &'a CatalogSet, installed: BundleRef<'a>) -> Vec<BundleRef<'a>> {
    let Some(fbc) = catalogs.get(installed.catalog) else {
        return vec![installed];
    };
    let version = installed.bundle.version().ok();

    let mut seen = std::collections::HashSet::new();
    let mut result = vec![installed];
    seen.insert(installed.bundle.name.clone());

    for channel in fbc.channels_of_package(&installed.bundle.package) {
        for entry in channel.successors_of(&installed.bundle.name, version) {
            if seen.contains(&entry.name) {
                continue;
            }
            if let Some(bundle) = fbc.bundle(&installed.bundle.package, &entry.name) {
                seen.insert(entry.name.clone());
                result.push(BundleRef {
                    catalog: installed.catalog,
                    bundle,
                    channel: None,
                });
            }
        }
    }
    result
}

/// `^B.version, != B.version` when `major >= 1`; patch-only updates
/// within the same minor when `major = 0, minor >= 1`; no successors at
/// all when `major = 0, minor = 0`. `B` itself is always included.
fn strict_semver_successors<'a>(
    catalogs: &'a CatalogSet,
    installed: BundleRef<'a>,
) -> Result<Vec<BundleRef<'a>>, ResolveError> {
    let version = installed
        .bundle
        .version()
        .map_err(|source| ResolveError::InvalidInstalledVersion {
            bundle: installed.bundle.name.clone(),
            source: source.clone(),
        })?
        .clone();

    let mut result = vec![installed];
    let Some(range) = strict_semver_range(&version) else {
        return Ok(result);
    };

    let Some(fbc) = catalogs.get(installed.catalog) else {
        return Ok(result);
    };

    let installed_name = installed.bundle.name.clone();
    let not_installed = not(move |bundle: &&fbc::Bundle| bundle.name == installed_name);
    let package_bundles: Vec<&fbc::Bundle> = fbc.bundles_of_package(&installed.bundle.package).collect();
    for bundle in filter(package_bundles, Some(not_installed)) {
        if let Ok(candidate_version) = bundle.version() {
            if candidate_version != &version && range.satisfies(candidate_version) {
                result.push(BundleRef {
                    catalog: installed.catalog,
                    bundle,
                    channel: None,
                });
            }
        }
    }
    Ok(result)
}

fn strict_semver_range(version: &Version) -> Option<Range> {
    if version.major() >= 1 {
        Range::parse(&format!("^{version}")).ok()
    } else if version.minor() >= 1 {
        Range::parse(&format!(
            ">=0.{minor}.0 <0.{next_minor}.0",
            minor = version.minor(),
            next_minor = version.minor() + 1
        ))
        .ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle_meta(package: &str, name: &str, version: &str) -> serde_json::Value {
        serde_json::json!({
            "schema": "olm.bundle",
            "package": package,
            "name": name,
            "image": format!("{name}@sha256:aaaa"),
            "properties": [
                {"type": "olm.package", "value": {"packageName": package, "version": version}}
            ],
        })
    }

    fn catalog_with(bundles: &[(&str, &str, &str)]) -> CatalogSet {
        let metas: Vec<fbc::meta::RawMeta> = bundles
            .iter()
            .map(|(package, name, version)| serde_json::from_value(bundle_meta(package, name, version)).unwrap())
            .collect();
        let fbc = fbc::load::build("cat", metas).unwrap();
        let mut set = CatalogSet::new();
        set.insert("cat", fbc);
        set
    }

    #[test]
    fn strict_semver_major_gate() {
        let set = catalog_with(&[
            ("pkg", "pkg.v1.0.0", "1.0.0"),
            ("pkg", "pkg.v1.5.0", "1.5.0"),
            ("pkg", "pkg.v2.0.0", "2.0.0"),
        ]);
        let fbc = set.get("cat").unwrap();
        let installed = BundleRef {
            catalog: "cat",
            bundle: fbc.bundle("pkg", "pkg.v1.0.0").unwrap(),
            channel: None,
        };
        let successors = strict_semver_successors(&set, installed).unwrap();
        let names: Vec<&str> = successors.iter().map(|b| b.bundle.name.as_str()).collect();
        assert!(names.contains(&"pkg.v1.0.0"));
        assert!(names.contains(&"pkg.v1.5.0"));
        assert!(!names.contains(&"pkg.v2.0.0"));
    }

    #[test]
    fn strict_semver_zero_zero_has_no_successors() {
        let set = catalog_with(&[("pkg", "pkg.v0.0.1", "0.0.1"), ("pkg", "pkg.v0.0.2", "0.0.2")]);
        let fbc = set.get("cat").unwrap();
        let installed = BundleRef {
            catalog: "cat",
            bundle: fbc.bundle("pkg", "pkg.v0.0.1").unwrap(),
            channel: None,
        };
        let successors = strict_semver_successors(&set, installed).unwrap();
        assert_eq!(successors.len(), 1);
    }
}
