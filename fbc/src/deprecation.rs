use crate::meta::SCHEMA_BUNDLE;

/// A flattened view of one `olm.deprecations` entry, scoped to either the
/// owning package, one of its channels, or a specific bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeprecationScope {
    Package,
    Channel(String),
    Bundle(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deprecation {
    pub package: String,
    pub scope: DeprecationScope,
    pub message: String,
}

impl Deprecation {
    pub fn bundle_name(&self) -> Option<&str> {
        match &self.scope {
            DeprecationScope::Bundle(name) => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn channel_name(&self) -> Option<&str> {
        match &self.scope {
            DeprecationScope::Channel(name) => Some(name.as_str()),
            _ => None,
        }
    }
}

pub(crate) fn scope_from_schema(schema: &str, name: Option<&str>) -> Option<DeprecationScope> {
    match schema {
        "olm.package" => Some(DeprecationScope::Package),
        "olm.channel" => name.map(|n| DeprecationScope::Channel(n.to_string())),
        s if s == SCHEMA_BUNDLE => name.map(|n| DeprecationScope::Bundle(n.to_string())),
        _ => None,
    }
}
