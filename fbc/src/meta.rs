//! Deserialization of raw FBC meta blobs (spec.md §3, "Catalog Content on
//! disk"): each line of a catalog's JSONL file is one of `olm.package`,
//! `olm.channel`, `olm.bundle`, or `olm.deprecations`.

use serde::{Deserialize, Serialize};

pub const SCHEMA_PACKAGE: &str = "olm.package";
pub const SCHEMA_CHANNEL: &str = "olm.channel";
pub const SCHEMA_BUNDLE: &str = "olm.bundle";
pub const SCHEMA_DEPRECATIONS: &str = "olm.deprecations";

/// The envelope every meta blob shares, kept untyped beyond `schema` so a
/// blob of an unrecognized schema can still be skipped rather than
/// failing the whole load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMeta {
    pub schema: String,
    #[serde(default)]
    pub package: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub rest: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawChannelEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replaces: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skips: Vec<String>,
    #[serde(default, rename = "skipRange", skip_serializing_if = "Option::is_none")]
    pub skip_range: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawChannel {
    pub entries: Vec<RawChannelEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPackage {
    #[serde(default, rename = "defaultChannel")]
    pub default_channel: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawProperty {
    #[serde(rename = "type")]
    pub type_: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawBundle {
    pub image: String,
    #[serde(default)]
    pub properties: Vec<RawProperty>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDeprecationEntry {
    pub reference: RawDeprecationReference,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDeprecationReference {
    pub schema: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDeprecations {
    pub entries: Vec<RawDeprecationEntry>,
}
