//! The persisted query index over a catalog's JSONL file (spec.md §4.3):
//! a mapping from `(schema, package, name)` to the byte ranges of the
//! matching meta blobs, dense (one entry per blob) and immutable for the
//! lifetime of its JSONL file.
//!
//! This crate is pure bookkeeping — no filesystem access. `catalog-storage`
//! streams the JSONL file while feeding [`IndexBuilder`] and owns turning
//! [`Index::get`]'s byte ranges into an actual response body.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteRange {
    pub offset: u64,
    pub length: u64,
}

type Section = Vec<ByteRange>;

/// The on-disk form: `byPackage`/`bySchema`/`byName` map to ranges,
/// emitted in ascending file offset so query results preserve catalog
/// order (spec.md §4.3).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    #[serde(rename = "byPackage", default)]
    by_package: BTreeMap<String, Section>,
    #[serde(rename = "bySchema", default)]
    by_schema: BTreeMap<String, Section>,
    #[serde(rename = "byName", default)]
    by_name: BTreeMap<String, Section>,
}

impl Index {
    /// `Get(file, schema, pkg, name)` (spec.md §4.3): the byte ranges, in
    /// ascending offset, of blobs matching every filter that is present.
    /// With no filters, the single range spanning the whole file.
    /// Empty output is valid — it just means no blob matched.
    pub fn get(
        &self,
        total_len: u64,
        schema: Option<&str>,
        package: Option<&str>,
        name: Option<&str>,
    ) -> Vec<ByteRange> {
        let sections: Vec<&[ByteRange]> = [
            schema.map(|s| self.by_schema.get(s)),
            package.map(|p| self.by_package.get(p)),
            name.map(|n| self.by_name.get(n)),
        ]
        .into_iter()
        .flatten()
        .map(|section| section.map(Vec::as_slice).unwrap_or(&[]))
        .collect();

        match sections.split_first() {
            None => vec![ByteRange {
                offset: 0,
                length: total_len,
            }],
            Some((first, rest)) => {
                let mut result = first.to_vec();
                for section in rest {
                    result = intersect(&result, section);
                    if result.is_empty() {
                        break;
                    }
                }
                result
            }
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(s: &str) -> serde_json::Result<Index> {
        serde_json::from_str(s)
    }
}

/// Set-intersection of two ascending-by-offset range lists. Each range is
/// one blob's exact byte span, so "intersect" means matching entries by
/// offset, not interval overlap.
fn intersect(a: &[ByteRange], b: &[ByteRange]) -> Vec<ByteRange> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].offset.cmp(&b[j].offset) {
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
        }
    }
    out
}

/// Streams blobs in file order, accumulating their byte ranges into the
/// three sections. One [`record`](IndexBuilder::record) call per blob.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    index: Index,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        schema: &str,
        package: Option<&str>,
        name: Option<&str>,
        offset: u64,
        length: u64,
    ) {
        let range = ByteRange { offset, length };
        self.index
            .by_schema
            .entry(schema.to_string())
            .or_default()
            .push(range);
        if let Some(package) = package {
            self.index
                .by_package
                .entry(package.to_string())
                .or_default()
                .push(range);
        }
        if let Some(name) = name {
            self.index
                .by_name
                .entry(name.to_string())
                .or_default()
                .push(range);
        }
    }

    pub fn finish(self) -> Index {
        self.index
    }
}
