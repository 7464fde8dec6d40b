//! The arena holding a catalog's parsed FBC content (spec.md §9, "Cyclic
//! references between Bundle and Channel"): bundles and channels live in
//! two flat `Vec`s; cross-references are by index, never by pointer.

use crate::bundle::Bundle;
use crate::channel::Channel;
use crate::deprecation::Deprecation;
use crate::package::Package;
use std::collections::HashMap;

pub type BundleIdx = usize;
pub type ChannelIdx = usize;

#[derive(Default)]
pub struct FbcCatalog {
    pub packages: Vec<Package>,
    pub channels: Vec<Channel>,
    pub bundles: Vec<Bundle>,
    pub deprecations: Vec<Deprecation>,

    package_by_name: HashMap<String, usize>,
    channel_by_package_and_name: HashMap<(String, String), ChannelIdx>,
    bundle_by_package_and_name: HashMap<(String, String), BundleIdx>,
}

impl FbcCatalog {
    pub fn package(&self, name: &str) -> Option<&Package> {
        self.package_by_name.get(name).map(|&i| &self.packages[i])
    }

    pub fn channel(&self, package: &str, name: &str) -> Option<&Channel> {
        self.channel_by_package_and_name
            .get(&(package.to_string(), name.to_string()))
            .map(|&i| &self.channels[i])
    }

    pub fn bundle(&self, package: &str, name: &str) -> Option<&Bundle> {
        self.bundle_by_package_and_name
            .get(&(package.to_string(), name.to_string()))
            .map(|&i| &self.bundles[i])
    }

    pub fn bundles_of_package<'a>(&'a self, package: &'a str) -> impl Iterator<Item = &'a Bundle> {
        self.bundles.iter().filter(move |b| b.package == package)
    }

    pub fn channels_of_package<'a>(&'a self, package: &'a str) -> impl Iterator<Item = &'a Channel> {
        self.channels.iter().filter(move |c| c.package == package)
    }

    pub(crate) fn index_package(&mut self, idx: usize, name: String) {
        self.package_by_name.insert(name, idx);
    }

    pub(crate) fn index_channel(&mut self, idx: ChannelIdx, package: String, name: String) {
        self.channel_by_package_and_name.insert((package, name), idx);
    }

    pub(crate) fn index_bundle(&mut self, idx: BundleIdx, package: String, name: String) {
        self.bundle_by_package_and_name.insert((package, name), idx);
    }
}
