//! `ByVersion`/`ByDeprecated` specialized to `&Bundle` (spec.md §4.5).

use crate::bundle::Bundle;
use resolver_variables::version::Version;

pub fn by_version_desc(bundles: &mut [&Bundle]) {
    resolver_variables::sort::by_version_desc(bundles, |b| version_of(b));
}

pub fn by_deprecated_last(bundles: &mut [&Bundle]) {
    resolver_variables::sort::by_deprecated_last(bundles, |b| b.is_deprecated);
}

fn version_of<'a>(bundle: &&'a Bundle) -> Option<&'a Version> {
    bundle.version().ok()
}
