//! The `Catalog` custom resource and the validation rules that apply to it.
//!
//! This crate owns only the API object: its shape, its field-level
//! validation, and the label-defaulting the mutating webhook applies. It
//! has no opinion about how a `Catalog` gets unpacked or served — those are
//! [`catalog-reconciler`] and [`catalog-storage`] concerns.

mod condition;
mod defaulting;
mod ref_validation;
mod source;
mod status;

pub use condition::{Condition, ConditionStatus, ConditionType};
pub use defaulting::{default_metadata_name_label, METADATA_NAME_LABEL};
pub use ref_validation::{validate_base_url, validate_image_ref, RefValidationError};
pub use source::{ImageSource, Source, SourceValidationError};
pub use status::{CatalogStatus, ResolvedSource, Urls};

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// `spec` of a `Catalog` object.
///
/// Today the only source variant is `Image`; `CatalogSpec` models the
/// variant as a tagged sum (see [`Source`]) so that adding `Git`, `HTTP`,
/// etc. later does not require reflective dispatch at any call site.
#[derive(CustomResource, Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "olm.operatorframework.io",
    version = "v1",
    kind = "Catalog",
    struct = "CatalogCrd",
    status = "CatalogStatus",
    printcolumn = r#"{"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
pub struct CatalogSpec {
    pub source: Source,
}

impl CatalogSpec {
    /// Field-level validation applied at the API boundary. Never reaches
    /// the reconciler or storage engine — see spec.md §7, kind
    /// *Validation*.
    pub fn validate(&self) -> Result<(), SourceValidationError> {
        self.source.validate()
    }
}

/// A fully assembled `Catalog` object, for use in tests and in code that
/// does not need to go through the Kubernetes API machinery `kube`
/// provides via [`CatalogCrd`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub name: String,
    pub generation: i64,
    pub spec: CatalogSpec,
    pub status: CatalogStatus,
}

impl Catalog {
    pub fn new(name: impl Into<String>, spec: CatalogSpec) -> Self {
        Catalog {
            name: name.into(),
            generation: 1,
            spec,
            status: CatalogStatus::default(),
        }
    }
}
