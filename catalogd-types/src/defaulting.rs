use std::collections::BTreeMap;

/// The label the mutating admission webhook defaults on every
/// create/update of a `Catalog` (spec.md §6, "Webhook"). Kept as a pure
/// function rather than a webhook server: the webhook's TLS/admission
/// plumbing is an external collaborator (spec.md §1), but the rule it
/// enforces is part of this crate's contract and is exercised directly by
/// tests.
pub const METADATA_NAME_LABEL: &str = "olm.operatorframework.io/metadata.name";

/// Overwrites (never merges around) `METADATA_NAME_LABEL` with
/// `catalog_name`, as the real admission webhook always does.
pub fn default_metadata_name_label(labels: &mut BTreeMap<String, String>, catalog_name: &str) {
    labels.insert(METADATA_NAME_LABEL.to_string(), catalog_name.to_string());
}
