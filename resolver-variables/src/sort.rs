//! `ByVersion` and `ByDeprecated` orders (spec.md §4.5). Both are stable
//! and generic over the item type: the caller supplies a key extractor so
//! `fbc::Bundle` never needs to live in this crate.

use crate::version::Version;

/// Descending by version; items with no parseable version sort last.
/// Stable: ties (including the all-unparseable case) preserve input
/// order.
pub fn by_version_desc<T>(items: &mut [T], version_of: impl Fn(&T) -> Option<&Version>) {
    items.sort_by(|a, b| match (version_of(a), version_of(b)) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

/// Non-deprecated items first; within each group, input order is
/// preserved.
pub fn by_deprecated_last<T>(items: &mut [T], is_deprecated: impl Fn(&T) -> bool) {
    items.sort_by_key(|item| is_deprecated(item));
}
