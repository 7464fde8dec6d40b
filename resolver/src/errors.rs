use resolver_variables::version::{RangeParseError, VersionParseError};

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("invalid version range for package {package:?}: {source}")]
    InvalidRange {
        package: String,
        #[source]
        source: RangeParseError,
    },
    #[error("{0}")]
    NotFound(String),
    #[error("installed bundle not found: image {image:?} (deployment {deployment_name:?})")]
    InstalledBundleNotFound { image: String, deployment_name: String },
    #[error("installed bundle {bundle:?} has an unparseable version: {source}")]
    InvalidInstalledVersion {
        bundle: String,
        #[source]
        source: VersionParseError,
    },
    #[error("could not determine dependencies for package {package:?} range {range:?}")]
    DependencyResolutionFailed { package: String, range: String },
    #[error("bundle {bundle:?} declares malformed required-package properties: {reason}")]
    MalformedRequiredPackages { bundle: String, reason: String },
}

/// Builds the "not found" message for a failed required-package lookup,
/// whose wording depends on which filters were actually set (spec.md
/// §4.6, required-package variables, step 5).
pub fn not_found_message(package: &str, channel: Option<&str>, range: Option<&str>) -> String {
    match (channel, range) {
        (None, None) => format!("no bundles found for package {package:?}"),
        (Some(channel), None) => format!("no bundles found for package {package:?} in channel {channel:?}"),
        (None, Some(range)) => format!("no bundles found for package {package:?} matching range {range:?}"),
        (Some(channel), Some(range)) => format!(
            "no bundles found for package {package:?} in channel {channel:?} matching range {range:?}"
        ),
    }
}
