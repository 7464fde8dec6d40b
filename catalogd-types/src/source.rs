use crate::ref_validation::{is_digest, validate_image_ref, RefValidationError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// `spec.source` is a tagged sum over source variants. Today only `Image`
/// is implemented; the explicit discriminator (via serde's internally
/// tagged representation) keeps adding `Git`/`HTTP`/etc. a matter of
/// extending the enum rather than introducing reflective dispatch
/// (spec.md §9).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type")]
pub enum Source {
    Image(ImageSource),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ImageSource {
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(
        rename = "pollIntervalMinutes",
        skip_serializing_if = "Option::is_none"
    )]
    pub poll_interval_minutes: Option<u32>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SourceValidationError {
    #[error("spec.source.image.ref: {0}")]
    InvalidRef(#[from] RefValidationError),
    #[error("cannot specify pollIntervalMinutes while using digest-based image")]
    PollIntervalWithDigest,
}

impl Source {
    pub fn validate(&self) -> Result<(), SourceValidationError> {
        match self {
            Source::Image(image) => image.validate(),
        }
    }

    /// Whether this source is pinned to an immutable digest rather than a
    /// mutable tag. Digest refs never poll (spec.md §4.1).
    pub fn is_digest_based(&self) -> bool {
        match self {
            Source::Image(image) => image.is_digest_based(),
        }
    }

    pub fn poll_interval(&self) -> Option<std::time::Duration> {
        match self {
            Source::Image(image) if !image.is_digest_based() => image
                .poll_interval_minutes
                .map(|m| std::time::Duration::from_secs(m as u64 * 60)),
            Source::Image(_) => None,
        }
    }
}

impl ImageSource {
    fn is_digest_based(&self) -> bool {
        self.reference
            .rsplit_once('@')
            .map(|(_, digest)| is_digest(digest))
            .unwrap_or(false)
    }

    fn validate(&self) -> Result<(), SourceValidationError> {
        validate_image_ref(&self.reference)?;
        if self.is_digest_based() && self.poll_interval_minutes.is_some() {
            return Err(SourceValidationError::PollIntervalWithDigest);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_ref_with_poll_interval_is_rejected() {
        let source = Source::Image(ImageSource {
            reference: "docker.io/test-image@sha256:abcdef123456789abcdef123456789abc"
                .to_string(),
            poll_interval_minutes: Some(1),
        });
        assert_eq!(
            source.validate(),
            Err(SourceValidationError::PollIntervalWithDigest)
        );
    }

    #[test]
    fn tag_ref_with_poll_interval_is_accepted() {
        let source = Source::Image(ImageSource {
            reference: "my-subdomain.docker.io:8080/foo/bar:latest".to_string(),
            poll_interval_minutes: Some(10),
        });
        assert_eq!(source.validate(), Ok(()));
        assert_eq!(
            source.poll_interval(),
            Some(std::time::Duration::from_secs(600))
        );
    }

    #[test]
    fn digest_ref_never_polls() {
        let source = Source::Image(ImageSource {
            reference: "docker.io/test-image@sha256:abcdef123456789abcdef123456789abc"
                .to_string(),
            poll_interval_minutes: None,
        });
        assert_eq!(source.poll_interval(), None);
        assert!(source.is_digest_based());
    }
}
