//! The `Bundle` entity and its lazily-derived, memoized fields
//! (spec.md §3, §4.5; design note in spec.md §9).
//!
//! The upstream system's module-level caches behind per-object locks are
//! re-expressed here as plain `OnceLock` fields: the parsed form is a
//! pure function of the immutable `properties` the bundle was built with,
//! so memoizing it behind a lock-free, write-once cell is both simpler
//! and exactly as safe for concurrent callers — `OnceLock::get_or_init`
//! guarantees only one successful initialization is ever observed.

use crate::meta::RawProperty;
use crate::property::{self, Gvk, PropertyParseError};
use resolver_variables::version::{parse_version, Range, RangeParseError, Version, VersionParseError};
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredPackage {
    pub package: String,
    pub version_range: String,
}

impl RequiredPackage {
    pub fn range(&self) -> Result<Range, RangeParseError> {
        Range::parse(&self.version_range)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum MediaTypeError {
    #[error("bundle declares conflicting media types: {0:?} and {1:?}")]
    Conflicting(String, String),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum RequiredPackagesError {
    #[error(transparent)]
    Property(#[from] PropertyParseError),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum GvksError {
    #[error(transparent)]
    Property(#[from] PropertyParseError),
}

/// The media type assumed when a bundle declares none, matching the
/// upstream default for registry-style bundles.
pub const DEFAULT_MEDIA_TYPE: &str = "registry+v1";

pub struct Bundle {
    pub catalog: String,
    pub package: String,
    pub name: String,
    pub image: String,
    /// Channel names this bundle belongs to, populated at load time from
    /// the channel arena (spec.md §3).
    pub channels: Vec<String>,
    pub properties: Vec<RawProperty>,
    pub is_deprecated: bool,
    pub deprecation_message: Option<String>,

    version: OnceLock<Result<Version, VersionParseError>>,
    required_packages: OnceLock<Result<Vec<RequiredPackage>, RequiredPackagesError>>,
    provided_gvks: OnceLock<Result<Vec<Gvk>, GvksError>>,
    required_gvks: OnceLock<Result<Vec<Gvk>, GvksError>>,
    media_type: OnceLock<Result<String, MediaTypeError>>,
}

impl Bundle {
    pub fn new(
        catalog: impl Into<String>,
        package: impl Into<String>,
        name: impl Into<String>,
        image: impl Into<String>,
        properties: Vec<RawProperty>,
    ) -> Self {
        Bundle {
            catalog: catalog.into(),
            package: package.into(),
            name: name.into(),
            image: image.into(),
            channels: Vec::new(),
            properties,
            is_deprecated: false,
            deprecation_message: None,
            version: OnceLock::new(),
            required_packages: OnceLock::new(),
            provided_gvks: OnceLock::new(),
            required_gvks: OnceLock::new(),
            media_type: OnceLock::new(),
        }
    }

    fn properties_of_type<'a>(&'a self, type_: &str) -> impl Iterator<Item = &'a RawProperty> {
        self.properties.iter().filter(move |p| p.type_ == type_)
    }

    /// This bundle's own version, parsed from its `olm.package` property.
    pub fn version(&self) -> Result<&Version, &VersionParseError> {
        self.version
            .get_or_init(|| {
                let raw = self
                    .properties_of_type(property::TYPE_PACKAGE)
                    .next()
                    .and_then(|p| property::parse_package_version(p).ok())
                    .unwrap_or_default();
                parse_version(&raw)
            })
            .as_ref()
    }

    /// Declared `olm.package.required` dependencies.
    pub fn required_packages(&self) -> Result<&[RequiredPackage], &RequiredPackagesError> {
        self.required_packages
            .get_or_init(|| {
                self.properties_of_type(property::TYPE_PACKAGE_REQUIRED)
                    .map(|p| {
                        property::parse_package_required(p)
                            .map(|(package, version_range)| RequiredPackage {
                                package,
                                version_range,
                            })
                            .map_err(RequiredPackagesError::from)
                    })
                    .collect()
            })
            .as_deref()
    }

    /// Declared `olm.gvk` provided APIs.
    pub fn provided_gvks(&self) -> Result<&[Gvk], &GvksError> {
        self.provided_gvks
            .get_or_init(|| {
                self.properties_of_type(property::TYPE_GVK)
                    .map(|p| property::parse_gvk(p).map_err(GvksError::from))
                    .collect()
            })
            .as_deref()
    }

    /// Declared `olm.gvk.required` APIs this bundle depends on.
    pub fn required_gvks(&self) -> Result<&[Gvk], &GvksError> {
        self.required_gvks
            .get_or_init(|| {
                self.properties_of_type(property::TYPE_GVK_REQUIRED)
                    .map(|p| property::parse_required_gvk(p).map_err(GvksError::from))
                    .collect()
            })
            .as_deref()
    }

    /// Declared `olm.bundle.mediatype`, defaulting to
    /// [`DEFAULT_MEDIA_TYPE`] when absent.
    pub fn media_type(&self) -> Result<&str, &MediaTypeError> {
        self.media_type
            .get_or_init(|| {
                let mut media_types = self
                    .properties_of_type(property::TYPE_MEDIATYPE)
                    .filter_map(|p| property::parse_media_type(p).ok());
                let first = media_types.next();
                match (first, media_types.next()) {
                    (None, _) => Ok(DEFAULT_MEDIA_TYPE.to_string()),
                    (Some(only), None) => Ok(only),
                    (Some(a), Some(b)) => Err(MediaTypeError::Conflicting(a, b)),
                }
            })
            .as_deref()
    }

    pub fn solver_key(&self, channel: Option<&str>) -> resolver_variables::variable::BundleId {
        resolver_variables::variable::bundle_id(&self.catalog, &self.package, channel, &self.name)
    }
}

impl std::fmt::Debug for Bundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bundle")
            .field("catalog", &self.catalog)
            .field("package", &self.package)
            .field("name", &self.name)
            .field("image", &self.image)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn property(type_: &str, value: serde_json::Value) -> RawProperty {
        RawProperty {
            type_: type_.to_string(),
            value,
        }
    }

    #[test]
    fn version_is_memoized_and_correct() {
        let bundle = Bundle::new(
            "cat",
            "pkg",
            "pkg.v1.2.3",
            "example.com/pkg@sha256:aaaa",
            vec![property(
                property::TYPE_PACKAGE,
                json!({"packageName": "pkg", "version": "1.2.3"}),
            )],
        );
        assert_eq!(bundle.version().unwrap().to_string(), "1.2.3");
        // Second call hits the cache; same value either way.
        assert_eq!(bundle.version().unwrap().to_string(), "1.2.3");
    }

    #[test]
    fn media_type_defaults_when_absent() {
        let bundle = Bundle::new("cat", "pkg", "pkg.v1.0.0", "img", vec![]);
        assert_eq!(bundle.media_type().unwrap(), DEFAULT_MEDIA_TYPE);
    }

    #[test]
    fn conflicting_media_types_is_a_typed_error() {
        let bundle = Bundle::new(
            "cat",
            "pkg",
            "pkg.v1.0.0",
            "img",
            vec![
                property(property::TYPE_MEDIATYPE, json!("registry+v1")),
                property(property::TYPE_MEDIATYPE, json!("plain+v0")),
            ],
        );
        assert!(bundle.media_type().is_err());
    }

    #[test]
    fn required_packages_parse() {
        let bundle = Bundle::new(
            "cat",
            "pkg",
            "pkg.v1.0.0",
            "img",
            vec![property(
                property::TYPE_PACKAGE_REQUIRED,
                json!({"packageName": "dep", "versionRange": ">=1.0.0 <2.0.0"}),
            )],
        );
        let required = bundle.required_packages().unwrap();
        assert_eq!(required.len(), 1);
        assert_eq!(required[0].package, "dep");
        assert!(required[0].range().unwrap().satisfies(&parse_version("1.5.0").unwrap()));
    }

    #[test]
    fn required_gvks_parse() {
        let bundle = Bundle::new(
            "cat",
            "pkg",
            "pkg.v1.0.0",
            "img",
            vec![property(
                property::TYPE_GVK_REQUIRED,
                json!({"group": "example.com", "version": "v1", "kind": "Widget"}),
            )],
        );
        let required = bundle.required_gvks().unwrap();
        assert_eq!(required.len(), 1);
        assert_eq!(required[0].kind, "Widget");
    }
}
