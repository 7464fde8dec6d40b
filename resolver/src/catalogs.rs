//! A view over every loaded catalog a resolution can draw candidates
//! from. `fbc::FbcCatalog` only knows about one catalog's own arena; this
//! is the multi-catalog join the resolver front-end needs (spec.md §4.6
//! operates "across catalogs" implicitly, since a ClusterExtension names
//! a package, not a catalog).

use fbc::{Bundle, FbcCatalog};
use resolver_variables::variable::{bundle_id, BundleId};

/// A candidate bundle together with the catalog it came from and, when
/// the context is channel-scoped, the channel that makes it a
/// candidate — both feed into [`bundle_id`].
#[derive(Debug, Clone, Copy)]
pub struct BundleRef<'a> {
    pub catalog: &'a str,
    pub bundle: &'a Bundle,
    pub channel: Option<&'a str>,
}

impl<'a> BundleRef<'a> {
    pub fn id(&self) -> BundleId {
        bundle_id(self.catalog, &self.bundle.package, self.channel, &self.bundle.name)
    }
}

#[derive(Default)]
pub struct CatalogSet {
    catalogs: Vec<(String, FbcCatalog)>,
}

impl CatalogSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, catalog: FbcCatalog) {
        self.catalogs.push((name.into(), catalog));
    }

    pub fn get(&self, catalog: &str) -> Option<&FbcCatalog> {
        self.catalogs.iter().find(|(name, _)| name == catalog).map(|(_, c)| c)
    }

    /// Every bundle of `package` across all loaded catalogs. `package`
    /// is copied up front so the returned iterator isn't tied to
    /// whatever short-lived reference the caller passed in — only to
    /// `self`.
    pub fn bundles_of_package<'a>(&'a self, package: &str) -> impl Iterator<Item = BundleRef<'a>> + 'a {
        let package = package.to_string();
        self.catalogs.iter().flat_map(move |(name, fbc)| {
            let package = package.clone();
            fbc.bundles
                .iter()
                .filter(move |b| b.package == package)
                .map(move |bundle| BundleRef {
                    catalog: name.as_str(),
                    bundle,
                    channel: None,
                })
        })
    }

    /// Locates the installed bundle by its (digest-pinned) image
    /// reference, across every loaded catalog.
    pub fn find_by_image<'a>(&'a self, image: &str) -> Option<BundleRef<'a>> {
        self.catalogs.iter().find_map(|(name, fbc)| {
            fbc.bundles
                .iter()
                .find(|b| b.image == image)
                .map(|bundle| BundleRef {
                    catalog: name,
                    bundle,
                    channel: None,
                })
        })
    }
}
