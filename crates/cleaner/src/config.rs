use std::path::PathBuf;

use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::{cli::Cli, retention::RetentionPolicy, Error, Result};

pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Loads environment variables (`RUST_LOG`, `KUBECONFIG`) from a .env file if it exists.
///
/// Must run before logging is set up or the kubeconfig is looked up.
pub fn load_env() {
    let _ = dotenvy::dotenv();
}

/// Log filter from `RUST_LOG`, falling back to [`DEFAULT_LOG_FILTER`].
pub fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Where cluster credentials come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterSource {
    InCluster,
    /// `path: None` defers to kube's lookup of `KUBECONFIG`, then `~/.kube/config`.
    Kubeconfig {
        path: Option<PathBuf>,
        context: Option<String>,
    },
}

/// Settings for one run, fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub source: ClusterSource,
    pub namespace: Option<String>,
    pub policy: RetentionPolicy,
    pub dry_run: bool,
}

impl Config {
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let label_group = cli
            .label_group
            .map(|label| label.trim().to_string())
            .filter(|label| !label.is_empty())
            .ok_or_else(|| Error::Validation("--label-group must be set".to_string()))?;

        let source = if cli.in_cluster {
            if cli.kubeconfig.is_some() || cli.context.is_some() {
                warn!("--kubeconfig and --context are ignored with --in-cluster");
            }
            ClusterSource::InCluster
        } else {
            ClusterSource::Kubeconfig {
                path: cli.kubeconfig,
                context: cli.context.filter(|context| !context.is_empty()),
            }
        };

        Ok(Self {
            source,
            namespace: cli.namespace.filter(|namespace| !namespace.is_empty()),
            policy: RetentionPolicy {
                label_group,
                max_count: cli.max_count,
            },
            dry_run: cli.dry_run,
        })
    }
}
