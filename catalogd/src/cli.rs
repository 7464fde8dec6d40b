//! The `catalogd` binary's command-line surface (SPEC_FULL.md §2,
//! "Configuration"): one `clap` `Args` struct, collected into the
//! `FeatureGates` the design notes in spec.md §9 ask for — an explicit
//! struct passed down to `Storage` and (eventually) the resolver, instead
//! of process-wide mutable flags.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "catalogd", about, version)]
pub struct Cli {
    /// Directory under which unpacked catalog content and query indexes
    /// are stored (spec.md §4.2, §6).
    #[arg(long, env = "CATALOGD_STORAGE_ROOT", default_value = "/var/cache/catalogd/catalogs")]
    pub storage_root: PathBuf,

    /// Address the catalog content HTTP server binds to.
    #[arg(long, env = "CATALOGD_HTTP_BIND", default_value = "0.0.0.0:8443")]
    pub http_bind: SocketAddr,

    /// Base URL prefix served catalogs are reachable at, used to build
    /// `status.urls.base` (spec.md §4.1).
    #[arg(long, env = "CATALOGD_BASE_URL", default_value = "http://localhost:8443/catalogs")]
    pub base_url: String,

    /// Address the Prometheus `/metrics` endpoint binds to (spec.md §6).
    #[arg(long, env = "CATALOGD_METRICS_BIND", default_value = "0.0.0.0:7443")]
    pub metrics_bind: SocketAddr,

    /// How often the garbage collector sweeps `storage-root` for
    /// orphaned catalog content (spec.md §4.4). Also runs once at
    /// startup regardless of this value.
    #[arg(long, env = "CATALOGD_GC_INTERVAL", value_parser = humantime_duration, default_value = "12h")]
    pub gc_interval: Duration,

    /// Reports orphans the garbage collector would remove without
    /// actually removing them (SPEC_FULL.md §3).
    #[arg(long, env = "CATALOGD_GC_DRY_RUN")]
    pub gc_dry_run: bool,

    #[command(flatten)]
    pub feature_gates: FeatureGatesArgs,
}

#[derive(Debug, Clone, Copy, clap::Args)]
pub struct FeatureGatesArgs {
    /// Enables the persisted query index and `GET /{catalog}/api/v1/query`
    /// (spec.md §6).
    #[arg(long = "feature-api-v1-query-handler", env = "CATALOGD_FEATURE_API_V1_QUERY_HANDLER", default_value = "true")]
    pub api_v1_query_handler: bool,

    /// Reserved (spec.md §6): accepted but currently inert.
    #[arg(long = "feature-api-v1-metas-handler", env = "CATALOGD_FEATURE_API_V1_METAS_HANDLER", default_value = "false")]
    pub api_v1_metas_handler: bool,

    /// Switches the resolver's installed-package successor rule from the
    /// legacy channel graph to strict semver ranges (spec.md §4.6, §6).
    #[arg(long = "feature-force-semver-upgrade-constraints", env = "CATALOGD_FEATURE_FORCE_SEMVER_UPGRADE_CONSTRAINTS", default_value = "false")]
    pub force_semver_upgrade_constraints: bool,
}

/// `FeatureGates` (spec.md §9 design note): the explicit configuration
/// struct threaded from the top-level assembly down to `Storage` and the
/// resolver, replacing any process-wide mutable flag state.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureGates {
    pub api_v1_query_handler: bool,
    pub api_v1_metas_handler: bool,
    pub force_semver_upgrade_constraints: bool,
}

impl From<FeatureGatesArgs> for FeatureGates {
    fn from(args: FeatureGatesArgs) -> Self {
        FeatureGates {
            api_v1_query_handler: args.api_v1_query_handler,
            api_v1_metas_handler: args.api_v1_metas_handler,
            force_semver_upgrade_constraints: args.force_semver_upgrade_constraints,
        }
    }
}

fn humantime_duration(s: &str) -> Result<Duration, String> {
    humantime::parse_duration(s).map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse() {
        let cli = Cli::parse_from(["catalogd"]);
        assert_eq!(cli.gc_interval, Duration::from_secs(12 * 3600));
        assert!(cli.feature_gates.api_v1_query_handler);
        assert!(!cli.feature_gates.force_semver_upgrade_constraints);
    }

    #[test]
    fn feature_flags_are_overridable() {
        let cli = Cli::parse_from(["catalogd", "--feature-force-semver-upgrade-constraints=true"]);
        assert!(cli.feature_gates.force_semver_upgrade_constraints);
    }
}
