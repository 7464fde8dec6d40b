//! Offline-testable validation of OCI image references and served base
//! URLs (spec.md §6).

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // domain := domain-component ['.' domain-component]* [':' port]
    static ref DOMAIN: Regex = Regex::new(
        r"^(?:[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?)(?:\.(?:[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?))*(?::[0-9]+)?$"
    ).unwrap();

    // path-component := alpha-numeric [separator alpha-numeric]*
    // separator := '.' | '_' | '__' | '-'+
    static ref NAME_COMPONENT: Regex =
        Regex::new(r"^[a-z0-9]+(?:(?:\.|_|__|-+)[a-z0-9]+)*$").unwrap();

    static ref TAG: Regex = Regex::new(r"^[\w][\w.-]{0,127}$").unwrap();

    static ref DIGEST_ALGORITHM: Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9_+.-]*$").unwrap();

    static ref SHA256_HEX: Regex = Regex::new(r"^[0-9a-fA-F]{32,}$").unwrap();
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RefValidationError {
    #[error("image reference must contain a domain and a repository path")]
    MissingDomainOrPath,
    #[error("invalid domain {0:?}")]
    InvalidDomain(String),
    #[error("invalid repository path component {0:?}")]
    InvalidNameComponent(String),
    #[error("image reference must end with a tag or a digest")]
    MissingTagOrDigest,
    #[error("invalid tag {0:?}")]
    InvalidTag(String),
    #[error("invalid digest algorithm {0:?}")]
    InvalidDigestAlgorithm(String),
    #[error("invalid sha256 digest encoding {0:?}")]
    InvalidDigestEncoding(String),
    #[error("invalid url {0:?}: {1}")]
    InvalidUrl(String, String),
    #[error("url scheme must be http or https, got {0:?}")]
    InvalidUrlScheme(String),
}

/// True iff `s` parses as `<algorithm>:<encoded>` with a known-shape
/// algorithm and (for `sha256`) hex encoding of at least 32 characters.
pub fn is_digest(s: &str) -> bool {
    parse_digest(s).is_ok()
}

fn parse_digest(s: &str) -> Result<(), RefValidationError> {
    let (algorithm, encoded) = s
        .split_once(':')
        .ok_or_else(|| RefValidationError::InvalidDigestAlgorithm(s.to_string()))?;

    if !DIGEST_ALGORITHM.is_match(algorithm) {
        return Err(RefValidationError::InvalidDigestAlgorithm(
            algorithm.to_string(),
        ));
    }
    if algorithm.eq_ignore_ascii_case("sha256") && !SHA256_HEX.is_match(encoded) {
        return Err(RefValidationError::InvalidDigestEncoding(s.to_string()));
    }
    Ok(())
}

/// Validates an OCI image reference of the form
/// `domain/path[/path...][:tag][@digest]`, requiring a trailing tag or
/// digest (spec.md §6).
pub fn validate_image_ref(reference: &str) -> Result<(), RefValidationError> {
    let (domain_and_path, digest) = match reference.rsplit_once('@') {
        Some((rest, digest)) => (rest, Some(digest)),
        None => (reference, None),
    };

    let (domain_and_path, tag) = match domain_and_path.rsplit_once(':') {
        // Only treat this as a tag separator if there's no slash after
        // it — otherwise it's a `domain:port/path` form.
        Some((rest, candidate)) if !candidate.contains('/') => (rest, Some(candidate)),
        _ => (domain_and_path, None),
    };

    if tag.is_none() && digest.is_none() {
        return Err(RefValidationError::MissingTagOrDigest);
    }

    let mut parts = domain_and_path.splitn(2, '/');
    let domain = parts.next().filter(|s| !s.is_empty());
    let path = parts.next().filter(|s| !s.is_empty());
    let (domain, path) = match (domain, path) {
        (Some(d), Some(p)) => (d, p),
        _ => return Err(RefValidationError::MissingDomainOrPath),
    };

    if !DOMAIN.is_match(domain) {
        return Err(RefValidationError::InvalidDomain(domain.to_string()));
    }
    for component in path.split('/') {
        if !NAME_COMPONENT.is_match(component) {
            return Err(RefValidationError::InvalidNameComponent(
                component.to_string(),
            ));
        }
    }
    if let Some(tag) = tag {
        if !TAG.is_match(tag) {
            return Err(RefValidationError::InvalidTag(tag.to_string()));
        }
    }
    if let Some(digest) = digest {
        parse_digest(digest)?;
    }

    Ok(())
}

/// Validates `status.urls.base`: a syntactically valid URL with an
/// `http`/`https` scheme.
pub fn validate_base_url(base: &str) -> Result<(), RefValidationError> {
    let parsed = url::Url::parse(base)
        .map_err(|err| RefValidationError::InvalidUrl(base.to_string(), err.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(RefValidationError::InvalidUrlScheme(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_ref_with_port_is_accepted() {
        assert_eq!(
            validate_image_ref("my-subdomain.docker.io:8080/foo/bar:latest"),
            Ok(())
        );
    }

    #[test]
    fn digest_ref_is_accepted() {
        assert_eq!(
            validate_image_ref(
                "docker.io/test-image@sha256:abcdef123456789abcdef123456789abc"
            ),
            Ok(())
        );
    }

    #[test]
    fn missing_tag_or_digest_is_rejected() {
        assert_eq!(
            validate_image_ref("docker.io/test-image"),
            Err(RefValidationError::MissingTagOrDigest)
        );
    }

    #[test]
    fn short_sha256_digest_is_rejected() {
        assert!(validate_image_ref("docker.io/test-image@sha256:abc").is_err());
    }

    #[test]
    fn base_url_requires_http_scheme() {
        assert!(validate_base_url("ftp://example.com/foo").is_err());
        assert_eq!(validate_base_url("https://example.com/foo"), Ok(()));
    }
}
