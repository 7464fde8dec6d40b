use crate::bundle::Bundle;
use crate::catalog::FbcCatalog;
use crate::channel::{Channel, ChannelEntry};
use crate::deprecation::{self, Deprecation};
use crate::meta::{
    RawBundle, RawChannel, RawDeprecations, RawMeta, RawPackage, SCHEMA_BUNDLE, SCHEMA_CHANNEL,
    SCHEMA_DEPRECATIONS, SCHEMA_PACKAGE,
};
use crate::package::Package;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("{schema} blob (package={package:?}, name={name:?}) failed to parse: {source}")]
    Malformed {
        schema: String,
        package: Option<String>,
        name: Option<String>,
        #[source]
        source: serde_json::Error,
    },
    #[error("{schema} blob is missing required field {field:?}")]
    MissingField { schema: String, field: &'static str },
}

/// Parses one line of a catalog's JSONL file into its schema-discriminated
/// envelope. Lines of an unrecognized schema are preserved as `None` by
/// the caller rather than failing the whole load — this system family
/// treats forward-compatible schema additions as inert, not fatal.
pub fn parse_line(line: &str) -> Result<RawMeta, serde_json::Error> {
    serde_json::from_str(line)
}

/// Builds an [`FbcCatalog`] from an ordered sequence of raw meta blobs
/// (spec.md §3, file order is preserved throughout).
pub fn build(catalog: &str, metas: impl IntoIterator<Item = RawMeta>) -> Result<FbcCatalog, LoadError> {
    let mut out = FbcCatalog::default();

    // Two passes: first packages/channels/deprecations (cheap, and
    // channels must exist before we can populate `Bundle::channels`),
    // then bundles.
    let metas: Vec<RawMeta> = metas.into_iter().collect();

    for meta in &metas {
        match meta.schema.as_str() {
            s if s == SCHEMA_PACKAGE => {
                let name = meta
                    .name
                    .clone()
                    .ok_or(LoadError::MissingField {
                        schema: SCHEMA_PACKAGE.to_string(),
                        field: "name",
                    })?;
                let raw: RawPackage =
                    serde_json::from_value(meta.rest.clone()).map_err(|source| LoadError::Malformed {
                        schema: SCHEMA_PACKAGE.to_string(),
                        package: meta.package.clone(),
                        name: meta.name.clone(),
                        source,
                    })?;
                let idx = out.packages.len();
                out.packages.push(Package {
                    name: name.clone(),
                    default_channel: raw.default_channel,
                    description: raw.description,
                    deprecation_message: None,
                });
                out.index_package(idx, name);
            }
            s if s == SCHEMA_CHANNEL => {
                let package = meta
                    .package
                    .clone()
                    .ok_or(LoadError::MissingField {
                        schema: SCHEMA_CHANNEL.to_string(),
                        field: "package",
                    })?;
                let name = meta
                    .name
                    .clone()
                    .ok_or(LoadError::MissingField {
                        schema: SCHEMA_CHANNEL.to_string(),
                        field: "name",
                    })?;
                let raw: RawChannel =
                    serde_json::from_value(meta.rest.clone()).map_err(|source| LoadError::Malformed {
                        schema: SCHEMA_CHANNEL.to_string(),
                        package: meta.package.clone(),
                        name: meta.name.clone(),
                        source,
                    })?;
                let entries = raw
                    .entries
                    .into_iter()
                    .map(|e| ChannelEntry {
                        name: e.name,
                        replaces: e.replaces,
                        skips: e.skips,
                        skip_range: e.skip_range,
                    })
                    .collect();
                let idx = out.channels.len();
                out.channels.push(Channel {
                    package: package.clone(),
                    name: name.clone(),
                    entries,
                });
                out.index_channel(idx, package, name);
            }
            s if s == SCHEMA_DEPRECATIONS => {
                let package = meta
                    .package
                    .clone()
                    .ok_or(LoadError::MissingField {
                        schema: SCHEMA_DEPRECATIONS.to_string(),
                        field: "package",
                    })?;
                let raw: RawDeprecations =
                    serde_json::from_value(meta.rest.clone()).map_err(|source| LoadError::Malformed {
                        schema: SCHEMA_DEPRECATIONS.to_string(),
                        package: meta.package.clone(),
                        name: meta.name.clone(),
                        source,
                    })?;
                for entry in raw.entries {
                    let Some(scope) = deprecation::scope_from_schema(
                        &entry.reference.schema,
                        entry.reference.name.as_deref(),
                    ) else {
                        continue;
                    };
                    out.deprecations.push(Deprecation {
                        package: package.clone(),
                        scope,
                        message: entry.message,
                    });
                }
            }
            _ => {}
        }
    }

    for meta in &metas {
        if meta.schema != SCHEMA_BUNDLE {
            continue;
        }
        let package = meta
            .package
            .clone()
            .ok_or(LoadError::MissingField {
                schema: SCHEMA_BUNDLE.to_string(),
                field: "package",
            })?;
        let name = meta
            .name
            .clone()
            .ok_or(LoadError::MissingField {
                schema: SCHEMA_BUNDLE.to_string(),
                field: "name",
            })?;
        let raw: RawBundle =
            serde_json::from_value(meta.rest.clone()).map_err(|source| LoadError::Malformed {
                schema: SCHEMA_BUNDLE.to_string(),
                package: meta.package.clone(),
                name: meta.name.clone(),
                source,
            })?;

        let mut bundle = Bundle::new(catalog, package.clone(), name.clone(), raw.image, raw.properties);
        bundle.channels = out
            .channels_of_package(&package)
            .filter(|c| c.entry(&name).is_some())
            .map(|c| c.name.clone())
            .collect();

        let idx = out.bundles.len();
        out.bundles.push(bundle);
        out.index_bundle(idx, package, name);
    }

    // Wire up `isDeprecated`/message on bundles and packages now that both
    // arenas are fully populated.
    for dep in out.deprecations.clone() {
        match &dep.scope {
            crate::deprecation::DeprecationScope::Package => {
                if let Some(idx) = out
                    .packages
                    .iter()
                    .position(|p| p.name == dep.package)
                {
                    out.packages[idx].deprecation_message = Some(dep.message.clone());
                }
            }
            crate::deprecation::DeprecationScope::Bundle(bundle_name) => {
                if let Some(idx) = out.bundles.iter().position(|b| {
                    b.package == dep.package && &b.name == bundle_name
                }) {
                    out.bundles[idx].is_deprecated = true;
                    out.bundles[idx].deprecation_message = Some(dep.message.clone());
                }
            }
            crate::deprecation::DeprecationScope::Channel(_) => {
                // Channel-scoped deprecations don't affect `Bundle::is_deprecated`
                // (spec.md §3: "true iff a *bundle-scoped* deprecation entry
                // names it"); they're retained in `deprecations` for callers
                // that want channel-level messaging.
            }
        }
    }

    // SPEC_FULL.md §3's supplemented validation pass: warn on any
    // `replaces`/`skips` edge naming a bundle entry absent from its own
    // channel. Load never fails on this — it's a signal for the catalog
    // author, not a reason to refuse the catalog.
    for channel in &out.channels {
        for dangling in channel.dangling_references() {
            tracing::warn!(
                package = %channel.package,
                channel = %channel.name,
                entry = %dangling,
                "channel references a bundle entry absent from the channel"
            );
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(json: serde_json::Value) -> RawMeta {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn builds_package_channel_and_bundle() {
        let metas = vec![
            meta(serde_json::json!({
                "schema": "olm.package",
                "name": "webhook_operator_test",
                "defaultChannel": "preview_test",
            })),
            meta(serde_json::json!({
                "schema": "olm.channel",
                "package": "webhook_operator_test",
                "name": "preview_test",
                "entries": [{"name": "webhook_operator.v1.0.0"}],
            })),
            meta(serde_json::json!({
                "schema": "olm.bundle",
                "package": "webhook_operator_test",
                "name": "webhook_operator.v1.0.0",
                "image": "example.com/webhook@sha256:aaaa",
                "properties": [
                    {"type": "olm.package", "value": {"packageName": "webhook_operator_test", "version": "1.0.0"}}
                ],
            })),
        ];

        let catalog = build("test-catalog", metas).unwrap();
        assert_eq!(catalog.packages.len(), 1);
        assert_eq!(catalog.channels.len(), 1);
        assert_eq!(catalog.bundles.len(), 1);

        let bundle = catalog.bundle("webhook_operator_test", "webhook_operator.v1.0.0").unwrap();
        assert_eq!(bundle.channels, vec!["preview_test".to_string()]);
        assert_eq!(bundle.version().unwrap().to_string(), "1.0.0");
    }

    #[test]
    fn bundle_scoped_deprecation_marks_bundle_only() {
        let metas = vec![
            meta(serde_json::json!({
                "schema": "olm.package",
                "name": "pkg",
            })),
            meta(serde_json::json!({
                "schema": "olm.bundle",
                "package": "pkg",
                "name": "pkg.v1.0.0",
                "image": "img",
                "properties": [],
            })),
            meta(serde_json::json!({
                "schema": "olm.deprecations",
                "package": "pkg",
                "entries": [{
                    "reference": {"schema": "olm.bundle", "name": "pkg.v1.0.0"},
                    "message": "use v2 instead",
                }],
            })),
        ];

        let catalog = build("test-catalog", metas).unwrap();
        let bundle = catalog.bundle("pkg", "pkg.v1.0.0").unwrap();
        assert!(bundle.is_deprecated);
        assert_eq!(bundle.deprecation_message.as_deref(), Some("use v2 instead"));
        assert!(!catalog.package("pkg").unwrap().is_deprecated());
    }
}
