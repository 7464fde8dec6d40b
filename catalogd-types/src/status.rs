use crate::condition::Condition;
use crate::source::ImageSource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// `status.resolvedSource`: the digest-pinned image actually unpacked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ResolvedSource {
    pub image: Option<ImageSource>,
}

/// `status.urls`: where the catalog's content is being served.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Urls {
    pub base: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CatalogStatus {
    #[serde(default, rename = "resolvedSource")]
    pub resolved_source: ResolvedSource,
    #[serde(default)]
    pub urls: Urls,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default, rename = "observedGeneration")]
    pub observed_generation: i64,
}
