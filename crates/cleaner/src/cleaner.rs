use std::io::Write;

use tracing::info;

use crate::{
    kubernetes::ClusterClient,
    retention::{RetentionPlan, RetentionPolicy},
    Result,
};

/// Counts of what a run deleted, or would have deleted in dry-run mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupSummary {
    pub jobs: usize,
    pub pods: usize,
    pub dry_run: bool,
}

impl std::fmt::Display for CleanupSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let verb = if self.dry_run { "Would delete" } else { "Deleted" };
        write!(f, "{} {} Job(s) and {} Pod(s)", verb, self.jobs, self.pods)
    }
}

pub struct Cleaner<C> {
    client: C,
    dry_run: bool,
}

impl<C: ClusterClient> Cleaner<C> {
    pub fn new(client: C, dry_run: bool) -> Self {
        Self { client, dry_run }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Lists Jobs and Pods in `namespace`, plans and executes one pruning pass.
    pub async fn run<W: Write>(
        &self,
        namespace: &str,
        policy: &RetentionPolicy,
        out: &mut W,
    ) -> Result<CleanupSummary> {
        let jobs = self.client.list_jobs(namespace).await?;
        let pods = self.client.list_pods(namespace).await?;

        let plan = RetentionPlan::build(jobs, pods, policy);
        info!(
            "Keeping {} Jobs; {} Jobs and {} Pods exceed the retention count of {}",
            plan.retained,
            plan.job_count(),
            plan.pod_count(),
            policy.max_count
        );

        self.execute(&plan, out).await
    }

    /// Deletes every Job in `plan` followed by its Pods, stopping at the first failure.
    pub async fn execute<W: Write>(
        &self,
        plan: &RetentionPlan,
        out: &mut W,
    ) -> Result<CleanupSummary> {
        let suffix = if self.dry_run { " [dry-run]" } else { "" };
        let mut summary = CleanupSummary {
            dry_run: self.dry_run,
            ..Default::default()
        };

        for deletion in &plan.deletions {
            writeln!(out, "Deleting Job {}...{}", deletion.job.name, suffix)?;
            if !self.dry_run {
                self.client.delete_job(&deletion.job).await?;
            }
            summary.jobs += 1;

            for pod in &deletion.pods {
                writeln!(out, "  Deleting Pod {}...{}", pod.name, suffix)?;
                if !self.dry_run {
                    self.client.delete_pod(pod).await?;
                }
                summary.pods += 1;
            }
        }

        Ok(summary)
    }
}
