use resolver_variables::filter::{filter_ref, or};
use resolver_variables::version::{parse_version, Version};

/// One entry in a channel's upgrade graph (spec.md §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEntry {
    pub name: String,
    pub replaces: Option<String>,
    pub skips: Vec<String>,
    pub skip_range: Option<String>,
}

impl ChannelEntry {
    /// True iff `bundle_version` falls within this entry's `skipRange`,
    /// when one is present and parses.
    pub fn skip_range_matches(&self, bundle_version: &Version) -> bool {
        let Some(range) = &self.skip_range else {
            return false;
        };
        match resolver_variables::version::Range::parse(range) {
            Ok(range) => range.satisfies(bundle_version),
            Err(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub package: String,
    pub name: String,
    pub entries: Vec<ChannelEntry>,
}

impl Channel {
    pub fn entry(&self, bundle_name: &str) -> Option<&ChannelEntry> {
        self.entries.iter().find(|e| e.name == bundle_name)
    }

    /// Entries naming `bundle_name` as an upgrade predecessor, via
    /// `replaces`, `skips`, or a matching `skipRange` (spec.md §4.6,
    /// "Legacy mode").
    pub fn successors_of<'a>(
        &'a self,
        bundle_name: &str,
        bundle_version: Option<&Version>,
    ) -> Vec<&'a ChannelEntry> {
        let replaces_bundle = move |entry: &ChannelEntry| entry.replaces.as_deref() == Some(bundle_name);
        let skips_bundle = move |entry: &ChannelEntry| entry.skips.iter().any(|s| s == bundle_name);
        let skip_range_matches =
            move |entry: &ChannelEntry| bundle_version.map(|v| entry.skip_range_matches(v)).unwrap_or(false);
        let is_successor = or(or(replaces_bundle, skips_bundle), skip_range_matches);
        filter_ref(&self.entries, move |entry| is_successor(entry))
    }

    /// Dangling-edge validation (SPEC_FULL.md §3): every `replaces`/`skips`
    /// reference should name a bundle entry that exists in this channel.
    pub fn dangling_references(&self) -> Vec<String> {
        let known: std::collections::HashSet<&str> =
            self.entries.iter().map(|e| e.name.as_str()).collect();
        let mut dangling = Vec::new();
        for entry in &self.entries {
            if let Some(replaces) = &entry.replaces {
                if !known.contains(replaces.as_str()) {
                    dangling.push(replaces.clone());
                }
            }
            for skip in &entry.skips {
                if !known.contains(skip.as_str()) {
                    dangling.push(skip.clone());
                }
            }
        }
        dangling
    }
}

/// Parses a `ChannelEntry`'s version from its own name, best-effort (entry
/// names are bundle names, which are not required to embed a semver —
/// used only by `skip_range_matches` callers that already have the
/// bundle's real parsed version available).
pub fn entry_version_hint(entry_name: &str) -> Option<Version> {
    parse_version(entry_name).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, replaces: Option<&str>, skips: &[&str], skip_range: Option<&str>) -> ChannelEntry {
        ChannelEntry {
            name: name.to_string(),
            replaces: replaces.map(str::to_string),
            skips: skips.iter().map(|s| s.to_string()).collect(),
            skip_range: skip_range.map(str::to_string),
        }
    }

    #[test]
    fn legacy_successor_scenarios() {
        let channel = Channel {
            package: "pkg".to_string(),
            name: "stable".to_string(),
            entries: vec![
                entry("v2.0.0", None, &[], None),
                entry("v2.1.0", Some("v2.0.0"), &[], None),
                entry("v2.2.0", Some("v2.1.0"), &[], None),
                entry("v2.3.0", Some("v2.2.0"), &["v2.2.1"], None),
                entry("v2.4.0", None, &[], Some(">=2.3.0 <2.4.0")),
            ],
        };

        let successors: Vec<&str> = channel
            .successors_of("v2.0.0", Some(&parse_version("2.0.0").unwrap()))
            .into_iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(successors, vec!["v2.1.0"]);

        let successors: Vec<&str> = channel
            .successors_of("v2.2.1", Some(&parse_version("2.2.1").unwrap()))
            .into_iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(successors, vec!["v2.3.0"]);

        let successors: Vec<&str> = channel
            .successors_of("v2.3.0", Some(&parse_version("2.3.0").unwrap()))
            .into_iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(successors, vec!["v2.4.0"]);
    }

    #[test]
    fn dangling_reference_is_reported() {
        let channel = Channel {
            package: "pkg".to_string(),
            name: "stable".to_string(),
            entries: vec![entry("v1.0.0", Some("v0.9.0"), &[], None)],
        };
        assert_eq!(channel.dangling_references(), vec!["v0.9.0".to_string()]);
    }
}
