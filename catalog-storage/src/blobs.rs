//! Walks a filesystem tree handed back by the (external) Unpacker and
//! yields every FBC meta blob it contains, in a stable order (spec.md
//! §4.2 step 3).
//!
//! Each `.json`/`.yaml`/`.yml` file under the tree may itself hold a
//! single object, a JSON array of objects, or newline-delimited objects
//! — all three are legal renderings of an FBC declarative config on
//! disk, and this walker normalizes them into one [`serde_json::Value`]
//! per blob.

use serde::Deserialize;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum BlobWalkError {
    #[error("walking {0}: {1}")]
    Walk(String, walkdir::Error),
    #[error("reading {0}: {1}")]
    Read(String, std::io::Error),
    #[error("parsing {0}: {1}")]
    Parse(String, serde_json::Error),
    #[error("parsing {0}: {1}")]
    ParseYaml(String, serde_yaml::Error),
}

pub fn walk(root: &Path) -> Result<Vec<serde_json::Value>, BlobWalkError> {
    let mut paths = Vec::new();
    for entry in walkdir::WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|err| BlobWalkError::Walk(root.display().to_string(), err))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_fbc_file = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| matches!(ext, "json" | "yaml" | "yml"))
            .unwrap_or(false);
        if is_fbc_file {
            paths.push(entry.path().to_path_buf());
        }
    }

    let mut blobs = Vec::new();
    for path in paths {
        let contents = std::fs::read_to_string(&path)
            .map_err(|err| BlobWalkError::Read(path.display().to_string(), err))?;
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| matches!(ext, "yaml" | "yml"))
            .unwrap_or(false);
        if is_yaml {
            blobs.extend(parse_yaml_blobs(&path, &contents)?);
        } else {
            blobs.extend(parse_blobs(&path, &contents)?);
        }
    }
    Ok(blobs)
}

fn parse_blobs(path: &Path, contents: &str) -> Result<Vec<serde_json::Value>, BlobWalkError> {
    let trimmed = contents.trim_start();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    if trimmed.starts_with('[') {
        let values: Vec<serde_json::Value> = serde_json::from_str(contents)
            .map_err(|err| BlobWalkError::Parse(path.display().to_string(), err))?;
        return Ok(values);
    }
    // Try whole-file single object first; fall back to NDJSON.
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(contents) {
        return Ok(vec![value]);
    }
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            serde_json::from_str(line).map_err(|err| BlobWalkError::Parse(path.display().to_string(), err))
        })
        .collect()
}

/// Parses a `---`-separated YAML document stream, the on-disk form real
/// FBC catalogs ship when rendered as YAML rather than JSON-with-a-.yaml-
/// extension. Each document becomes one blob; empty/null documents (a
/// bare trailing `---`) are dropped.
fn parse_yaml_blobs(path: &Path, contents: &str) -> Result<Vec<serde_json::Value>, BlobWalkError> {
    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut blobs = Vec::new();
    for document in serde_yaml::Deserializer::from_str(contents) {
        let value = serde_json::Value::deserialize(document)
            .map_err(|err| BlobWalkError::ParseYaml(path.display().to_string(), err))?;
        if value.is_null() {
            continue;
        }
        match value {
            serde_json::Value::Array(values) => blobs.extend(values),
            other => blobs.push(other),
        }
    }
    Ok(blobs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_single_object_files_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.json"), r#"{"schema":"olm.channel"}"#).unwrap();
        std::fs::write(dir.path().join("a.json"), r#"{"schema":"olm.package"}"#).unwrap();

        let blobs = walk(dir.path()).unwrap();
        let schemas: Vec<&str> = blobs
            .iter()
            .map(|b| b["schema"].as_str().unwrap())
            .collect();
        assert_eq!(schemas, vec!["olm.package", "olm.channel"]);
    }

    #[test]
    fn walks_ndjson_and_arrays() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("bundles.json"),
            "{\"schema\":\"olm.bundle\",\"name\":\"a\"}\n{\"schema\":\"olm.bundle\",\"name\":\"b\"}\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("array.json"),
            r#"[{"schema":"olm.package","name":"p1"},{"schema":"olm.package","name":"p2"}]"#,
        )
        .unwrap();

        let blobs = walk(dir.path()).unwrap();
        assert_eq!(blobs.len(), 4);
    }

    #[test]
    fn walks_yaml_doc_streams_and_plain_objects() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("catalog.yaml"),
            "---\nschema: olm.package\nname: pkg\n---\nschema: olm.channel\nname: stable\npackage: pkg\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("bundle.yml"), "schema: olm.bundle\nname: pkg.v1.0.0\n").unwrap();

        let blobs = walk(dir.path()).unwrap();
        let schemas: Vec<&str> = blobs.iter().map(|b| b["schema"].as_str().unwrap()).collect();
        assert_eq!(schemas, vec!["olm.bundle", "olm.package", "olm.channel"]);
    }

    #[test]
    fn yaml_parse_error_is_typed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.yaml"), "schema: [unterminated\n").unwrap();
        assert!(matches!(walk(dir.path()), Err(BlobWalkError::ParseYaml(_, _))));
    }
}
