use std::path::PathBuf;

use clap::Parser;

pub const DEFAULT_MAX_COUNT: usize = 10;

/// Delete finished Jobs, keeping the most recently completed ones per label group
#[derive(Debug, Parser)]
#[command(name = "k8s-job-cleaner", disable_version_flag = true)]
pub struct Cli {
    /// Kubernetes context
    #[arg(long)]
    pub context: Option<String>,

    /// Print what would be deleted without deleting anything
    #[arg(long)]
    pub dry_run: bool,

    /// Execute in Kubernetes cluster
    #[arg(long)]
    pub in_cluster: bool,

    /// Path of kubeconfig (defaults to $KUBECONFIG, then ~/.kube/config)
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,

    /// Label name for grouping Jobs
    #[arg(long)]
    pub label_group: Option<String>,

    /// Number of Jobs to keep per group
    #[arg(long, default_value_t = DEFAULT_MAX_COUNT)]
    pub max_count: usize,

    /// Kubernetes namespace (defaults to the kubeconfig context, then all namespaces)
    #[arg(long)]
    pub namespace: Option<String>,

    /// Print version
    #[arg(short = 'v', long)]
    pub version: bool,
}
