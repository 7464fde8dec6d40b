//! The closed set of typed bundle properties (spec.md §4.5).

use crate::meta::RawProperty;

pub const TYPE_PACKAGE: &str = "olm.package";
pub const TYPE_PACKAGE_REQUIRED: &str = "olm.package.required";
pub const TYPE_GVK: &str = "olm.gvk";
pub const TYPE_GVK_REQUIRED: &str = "olm.gvk.required";
pub const TYPE_MEDIATYPE: &str = "olm.bundle.mediatype";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gvk {
    pub group: String,
    pub version: String,
    pub kind: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PropertyParseError {
    #[error("property {0:?} value is not a JSON object")]
    NotAnObject(String),
    #[error("property {0:?} is missing field {1:?}")]
    MissingField(String, &'static str),
}

fn field<'a>(
    property_type: &str,
    value: &'a serde_json::Value,
    field_name: &'static str,
) -> Result<&'a str, PropertyParseError> {
    value
        .as_object()
        .ok_or_else(|| PropertyParseError::NotAnObject(property_type.to_string()))?
        .get(field_name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| PropertyParseError::MissingField(property_type.to_string(), field_name))
}

pub fn parse_gvk(raw: &RawProperty) -> Result<Gvk, PropertyParseError> {
    Ok(Gvk {
        group: field(&raw.type_, &raw.value, "group")?.to_string(),
        version: field(&raw.type_, &raw.value, "version")?.to_string(),
        kind: field(&raw.type_, &raw.value, "kind")?.to_string(),
    })
}

pub fn parse_required_gvk(raw: &RawProperty) -> Result<Gvk, PropertyParseError> {
    Ok(Gvk {
        group: field(&raw.type_, &raw.value, "group")?.to_string(),
        version: field(&raw.type_, &raw.value, "version")?.to_string(),
        kind: field(&raw.type_, &raw.value, "kind")?.to_string(),
    })
}

pub fn parse_package_version(raw: &RawProperty) -> Result<String, PropertyParseError> {
    Ok(field(&raw.type_, &raw.value, "version")?.to_string())
}

pub fn parse_package_required(raw: &RawProperty) -> Result<(String, String), PropertyParseError> {
    Ok((
        field(&raw.type_, &raw.value, "packageName")?.to_string(),
        field(&raw.type_, &raw.value, "versionRange")?.to_string(),
    ))
}

pub fn parse_media_type(raw: &RawProperty) -> Result<String, PropertyParseError> {
    raw.value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| PropertyParseError::NotAnObject(raw.type_.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_gvk() {
        let raw = RawProperty {
            type_: TYPE_GVK.to_string(),
            value: json!({"group": "example.com", "version": "v1", "kind": "Widget"}),
        };
        assert_eq!(
            parse_gvk(&raw).unwrap(),
            Gvk {
                group: "example.com".to_string(),
                version: "v1".to_string(),
                kind: "Widget".to_string(),
            }
        );
    }

    #[test]
    fn parses_required_gvk() {
        let raw = RawProperty {
            type_: TYPE_GVK_REQUIRED.to_string(),
            value: json!({"group": "example.com", "version": "v1", "kind": "Widget"}),
        };
        assert_eq!(
            parse_required_gvk(&raw).unwrap(),
            Gvk {
                group: "example.com".to_string(),
                version: "v1".to_string(),
                kind: "Widget".to_string(),
            }
        );
    }

    #[test]
    fn missing_field_is_a_typed_error() {
        let raw = RawProperty {
            type_: TYPE_GVK.to_string(),
            value: json!({"group": "example.com"}),
        };
        assert_eq!(
            parse_gvk(&raw),
            Err(PropertyParseError::MissingField(
                TYPE_GVK.to_string(),
                "version"
            ))
        );
    }
}
