//! Building the four variable kinds from catalog content (spec.md §4.6).
//! This is the resolver front-end's core: everything here is pure — no
//! I/O, no knowledge of how the SAT solver itself works.

use crate::catalogs::{BundleRef, CatalogSet};
use crate::errors::{not_found_message, ResolveError};
use crate::successors::{successors_of, UpgradeMode};
use resolver_variables::filter::{and, filter};
use resolver_variables::sort::by_version_desc;
use resolver_variables::variable::{
    BundleUniquenessVariable, BundleVariable, InstalledPackageVariable, RequiredPackageVariable, Variable,
};
use resolver_variables::version::Range;
use serde::Deserialize;
use std::collections::{HashMap, HashSet, VecDeque};

/// A user's request to install package `package`, optionally constrained
/// to a channel and/or a version range.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterExtension {
    pub package: String,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub version_range: Option<String>,
}

/// A currently-installed bundle, identified by its digest-pinned image —
/// the only stable handle once a bundle has actually been deployed.
#[derive(Debug, Clone, Deserialize)]
pub struct InstalledBundle {
    pub image: String,
    pub deployment_name: String,
}

fn sort_candidates<'a>(candidates: &mut [BundleRef<'a>]) {
    by_version_desc(candidates, |c| c.bundle.version().ok());
}

/// Steps 1-5 of the required-package variable (spec.md §4.6). Channel and
/// range filters are combined via the `And` combinator (spec.md §9) rather
/// than chained ad hoc, so an absent filter costs nothing beyond the
/// `filter` function's own no-op identity path.
pub fn required_package_variable<'a>(
    catalogs: &'a CatalogSet,
    ext: &ClusterExtension,
) -> Result<(RequiredPackageVariable, Vec<BundleRef<'a>>), ResolveError> {
    let all_candidates: Vec<BundleRef<'a>> = catalogs.bundles_of_package(&ext.package).collect();

    let range = match &ext.version_range {
        Some(raw) => Some(Range::parse(raw).map_err(|source| ResolveError::InvalidRange {
            package: ext.package.clone(),
            source,
        })?),
        None => None,
    };

    let mut predicate: Option<Box<dyn Fn(&BundleRef<'a>) -> bool + 'a>> = None;
    if let Some(channel) = ext.channel.clone() {
        let in_channel = move |c: &BundleRef<'a>| c.bundle.channels.iter().any(|ch| ch == &channel);
        predicate = Some(match predicate {
            Some(p) => and(p, in_channel),
            None => Box::new(in_channel),
        });
    }
    if let Some(range) = range.clone() {
        let in_range = move |c: &BundleRef<'a>| c.bundle.version().map(|v| range.satisfies(v)).unwrap_or(false);
        predicate = Some(match predicate {
            Some(p) => and(p, in_range),
            None => Box::new(in_range),
        });
    }
    let mut candidates = filter(all_candidates, predicate);

    // Tag each surviving candidate with the channel that admitted it, so
    // its solver key takes the channel-scoped form (spec.md §3:
    // "<catalog>-<package>-<channel>-<bundleName>").
    if let Some(channel) = &ext.channel {
        for candidate in candidates.iter_mut() {
            if let Some(matched) = candidate.bundle.channels.iter().find(|ch| *ch == channel) {
                candidate.channel = Some(matched.as_str());
            }
        }
    }

    sort_candidates(&mut candidates);

    if candidates.is_empty() {
        return Err(ResolveError::NotFound(not_found_message(
            &ext.package,
            ext.channel.as_deref(),
            ext.version_range.as_deref(),
        )));
    }

    let ids = candidates.iter().map(BundleRef::id).collect();
    Ok((
        RequiredPackageVariable {
            package: ext.package.clone(),
            candidates: ids,
        },
        candidates,
    ))
}

/// The installed-package variable: `B` plus its permitted successors,
/// under the configured upgrade mode (spec.md §4.6).
pub fn installed_package_variable<'a>(
    catalogs: &'a CatalogSet,
    installed: &InstalledBundle,
    mode: UpgradeMode,
) -> Result<(InstalledPackageVariable, Vec<BundleRef<'a>>), ResolveError> {
    let found = catalogs
        .find_by_image(&installed.image)
        .ok_or_else(|| ResolveError::InstalledBundleNotFound {
            image: installed.image.clone(),
            deployment_name: installed.deployment_name.clone(),
        })?;

    let mut candidates = successors_of(catalogs, found, mode)?;
    sort_candidates(&mut candidates);

    let ids = candidates.iter().map(BundleRef::id).collect();
    Ok((
        InstalledPackageVariable {
            package: found.bundle.package.clone(),
            candidates: ids,
        },
        candidates,
    ))
}

/// Breadth-first expansion of bundle and bundle-uniqueness variables
/// (spec.md §4.6), seeded from every required-package and
/// installed-package candidate.
pub fn expand_bundle_variables<'a>(
    catalogs: &'a CatalogSet,
    seeds: Vec<BundleRef<'a>>,
) -> Result<(Vec<BundleVariable>, Vec<BundleUniquenessVariable>), ResolveError> {
    let mut visited: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<BundleRef<'a>> = seeds.into_iter().collect();
    let mut bundle_variables = Vec::new();
    let mut package_order: Vec<String> = Vec::new();
    let mut package_bundle_ids: HashMap<String, Vec<String>> = HashMap::new();

    while let Some(bundle_ref) = queue.pop_front() {
        let id = bundle_ref.id();
        if visited.contains(&id) {
            continue;
        }
        visited.insert(id.clone());

        let package = bundle_ref.bundle.package.clone();
        package_order_entry(&mut package_order, &package);
        package_bundle_ids.entry(package).or_default().push(id.clone());

        let required = bundle_ref
            .bundle
            .required_packages()
            .map_err(|source| ResolveError::MalformedRequiredPackages {
                bundle: bundle_ref.bundle.name.clone(),
                reason: source.to_string(),
            })?;

        let mut dependencies = Vec::with_capacity(required.len());
        for req in required {
            let range = req.range().map_err(|source| ResolveError::InvalidRange {
                package: req.package.clone(),
                source,
            })?;

            let mut candidates: Vec<BundleRef<'a>> = catalogs
                .bundles_of_package(&req.package)
                .filter(|c| c.bundle.version().map(|v| range.satisfies(v)).unwrap_or(false))
                .collect();
            if candidates.is_empty() {
                return Err(ResolveError::DependencyResolutionFailed {
                    package: req.package.clone(),
                    range: req.version_range.clone(),
                });
            }
            sort_candidates(&mut candidates);

            let dep_ids: Vec<String> = candidates.iter().map(BundleRef::id).collect();
            for candidate in candidates {
                if !visited.contains(&candidate.id()) {
                    queue.push_back(candidate);
                }
            }
            dependencies.push(dep_ids);
        }

        bundle_variables.push(BundleVariable { id, dependencies });
    }

    let uniqueness = package_order
        .into_iter()
        .map(|package| {
            let bundle_ids = package_bundle_ids.remove(&package).unwrap_or_default();
            BundleUniquenessVariable { package, bundle_ids }
        })
        .collect();

    Ok((bundle_variables, uniqueness))
}

fn package_order_entry(order: &mut Vec<String>, package: &str) {
    if !order.iter().any(|p| p == package) {
        order.push(package.to_string());
    }
}

/// Runs the whole resolver front-end: required-package and
/// installed-package variables seed a breadth-first expansion into
/// bundle and bundle-uniqueness variables, all concatenated in the order
/// spec.md §4.6 describes.
pub fn resolve(
    catalogs: &CatalogSet,
    extensions: &[ClusterExtension],
    installed: &[InstalledBundle],
    mode: UpgradeMode,
) -> Result<Vec<Variable>, ResolveError> {
    let mut variables = Vec::new();
    let mut seeds = Vec::new();

    for ext in extensions {
        let (variable, candidates) = required_package_variable(catalogs, ext)?;
        seeds.extend(candidates);
        variables.push(Variable::RequiredPackage(variable));
    }
    for inst in installed {
        let (variable, candidates) = installed_package_variable(catalogs, inst, mode)?;
        seeds.extend(candidates);
        variables.push(Variable::InstalledPackage(variable));
    }

    let (bundle_variables, uniqueness_variables) = expand_bundle_variables(catalogs, seeds)?;
    variables.extend(bundle_variables.into_iter().map(Variable::Bundle));
    variables.extend(uniqueness_variables.into_iter().map(Variable::BundleUniqueness));

    tracing::debug!(variable_count = variables.len(), "built resolver variables");
    Ok(variables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogs::CatalogSet;

    fn bundle_meta(package: &str, name: &str, version: &str, requires: &[(&str, &str)]) -> serde_json::Value {
        let mut properties = vec![serde_json::json!({
            "type": "olm.package",
            "value": {"packageName": package, "version": version},
        })];
        for (dep_package, range) in requires {
            properties.push(serde_json::json!({
                "type": "olm.package.required",
                "value": {"packageName": dep_package, "versionRange": range},
            }));
        }
        serde_json::json!({
            "schema": "olm.bundle",
            "package": package,
            "name": name,
            "image": format!("{name}@sha256:aaaa"),
            "properties": properties,
        })
    }

    fn package_meta(name: &str) -> serde_json::Value {
        serde_json::json!({"schema": "olm.package", "name": name})
    }

    fn build_set(metas: Vec<serde_json::Value>) -> CatalogSet {
        let raw: Vec<fbc::meta::RawMeta> = metas.into_iter().map(|m| serde_json::from_value(m).unwrap()).collect();
        let fbc = fbc::load::build("cat", raw).unwrap();
        let mut set = CatalogSet::new();
        set.insert("cat", fbc);
        set
    }

    #[test]
    fn required_package_variable_sorts_descending() {
        let set = build_set(vec![
            package_meta("pkg"),
            bundle_meta("pkg", "pkg.v1.0.0", "1.0.0", &[]),
            bundle_meta("pkg", "pkg.v2.0.0", "2.0.0", &[]),
        ]);
        let ext = ClusterExtension {
            package: "pkg".to_string(),
            channel: None,
            version_range: None,
        };
        let (variable, _) = required_package_variable(&set, &ext).unwrap();
        assert!(variable.candidates[0].contains("pkg.v2.0.0"));
        assert!(variable.candidates[1].contains("pkg.v1.0.0"));
    }

    #[test]
    fn required_package_variable_not_found_message_includes_range() {
        let set = build_set(vec![package_meta("pkg"), bundle_meta("pkg", "pkg.v1.0.0", "1.0.0", &[])]);
        let ext = ClusterExtension {
            package: "pkg".to_string(),
            channel: None,
            version_range: Some(">=9.0.0".to_string()),
        };
        let err = required_package_variable(&set, &ext).unwrap_err();
        assert!(matches!(err, ResolveError::NotFound(ref msg) if msg.contains(">=9.0.0")));
    }

    #[test]
    fn bundle_variable_expansion_follows_dependencies() {
        let set = build_set(vec![
            package_meta("a"),
            package_meta("b"),
            bundle_meta("a", "a.v1.0.0", "1.0.0", &[("b", ">=1.0.0 <2.0.0")]),
            bundle_meta("b", "b.v1.0.0", "1.0.0", &[]),
        ]);
        let ext = ClusterExtension {
            package: "a".to_string(),
            channel: None,
            version_range: None,
        };
        let (_, seeds) = required_package_variable(&set, &ext).unwrap();
        let (bundle_vars, uniqueness) = expand_bundle_variables(&set, seeds).unwrap();
        assert_eq!(bundle_vars.len(), 2);
        assert_eq!(uniqueness.len(), 2);
        let a_var = bundle_vars.iter().find(|v| v.id.contains("a.v1.0.0")).unwrap();
        assert_eq!(a_var.dependencies.len(), 1);
        assert!(a_var.dependencies[0][0].contains("b.v1.0.0"));
    }

    #[test]
    fn missing_dependency_is_a_fatal_error() {
        let set = build_set(vec![
            package_meta("a"),
            bundle_meta("a", "a.v1.0.0", "1.0.0", &[("missing", ">=1.0.0")]),
        ]);
        let ext = ClusterExtension {
            package: "a".to_string(),
            channel: None,
            version_range: None,
        };
        let (_, seeds) = required_package_variable(&set, &ext).unwrap();
        let err = expand_bundle_variables(&set, seeds).unwrap_err();
        assert!(matches!(err, ResolveError::DependencyResolutionFailed { package, .. } if package == "missing"));
    }
}
