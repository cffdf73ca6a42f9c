//! Grouping of finished Jobs by label value and the keep-the-newest-N rule.
//!
//! Everything here works on [`JobRecord`]/[`PodRecord`] snapshots, so the
//! policy can be exercised without a cluster.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::kubernetes::{JobRecord, PodRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Label key whose value places a Job in a group.
    pub label_group: String,
    /// Number of most recently completed Jobs kept per group.
    pub max_count: usize,
}

/// Finished Jobs sharing one grouping label value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobGroup {
    label: String,
    jobs: Vec<JobRecord>,
}

impl JobGroup {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            jobs: Vec::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn jobs(&self) -> &[JobRecord] {
        &self.jobs
    }

    pub fn push(&mut self, job: JobRecord) {
        self.jobs.push(job);
    }

    /// Most recently completed first. Ties keep their list order, and Jobs
    /// without a completion time sort after every timestamped one.
    pub fn sort_by_recency(&mut self) {
        self.jobs.sort_by(|a, b| b.completion_time.cmp(&a.completion_time));
    }

    /// Splits the group into `(retained, expired)` at `max_count`.
    ///
    /// Only meaningful after [`JobGroup::sort_by_recency`].
    pub fn split_retained(&self, max_count: usize) -> (&[JobRecord], &[JobRecord]) {
        self.jobs.split_at(max_count.min(self.jobs.len()))
    }
}

/// Partitions finished Jobs by the value of `label_key`.
///
/// Unfinished Jobs and Jobs without a value for the label are dropped.
pub fn group_jobs<I>(jobs: I, label_key: &str) -> BTreeMap<String, JobGroup>
where
    I: IntoIterator<Item = JobRecord>,
{
    let mut groups: BTreeMap<String, JobGroup> = BTreeMap::new();

    for job in jobs {
        if !job.is_finished() {
            continue;
        }
        let Some(label) = job.label(label_key).map(str::to_string) else {
            continue;
        };
        if job.completion_time.is_none() {
            warn!(
                "Job {}/{} succeeded but has no completion time; treating it as the oldest",
                job.namespace, job.name
            );
        }
        groups
            .entry(label.clone())
            .or_insert_with(|| JobGroup::new(label))
            .push(job);
    }

    groups
}

/// Finished Pods keyed by the (namespace, name) of the Job that owns them.
pub fn group_pods<I>(pods: I) -> BTreeMap<(String, String), Vec<PodRecord>>
where
    I: IntoIterator<Item = PodRecord>,
{
    let mut groups: BTreeMap<(String, String), Vec<PodRecord>> = BTreeMap::new();

    for pod in pods {
        if !pod.is_finished() {
            debug!(
                "Skipping Pod {}/{} in phase {}",
                pod.namespace, pod.name, pod.phase
            );
            continue;
        }
        let Some(job_name) = pod.job_name().map(str::to_string) else {
            continue;
        };
        groups
            .entry((pod.namespace.clone(), job_name))
            .or_default()
            .push(pod);
    }

    groups
}

/// A Job past the retention count together with its finished Pods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDeletion {
    pub group: String,
    pub job: JobRecord,
    pub pods: Vec<PodRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionPlan {
    pub deletions: Vec<JobDeletion>,
    pub retained: usize,
}

impl RetentionPlan {
    /// Builds the plan for one snapshot of Jobs and Pods.
    pub fn build<J, P>(jobs: J, pods: P, policy: &RetentionPolicy) -> Self
    where
        J: IntoIterator<Item = JobRecord>,
        P: IntoIterator<Item = PodRecord>,
    {
        let groups = group_jobs(jobs, &policy.label_group);
        let mut pod_groups = group_pods(pods);
        let mut plan = RetentionPlan::default();

        for mut group in groups.into_values() {
            group.sort_by_recency();
            let (retained, expired) = group.split_retained(policy.max_count);
            debug!(
                "Group '{}': keeping {}, deleting {}",
                group.label(),
                retained.len(),
                expired.len()
            );
            plan.retained += retained.len();

            for job in expired {
                let pods = pod_groups
                    .remove(&(job.namespace.clone(), job.name.clone()))
                    .unwrap_or_default();
                plan.deletions.push(JobDeletion {
                    group: group.label().to_string(),
                    job: job.clone(),
                    pods,
                });
            }
        }

        plan
    }

    pub fn is_empty(&self) -> bool {
        self.deletions.is_empty()
    }

    pub fn job_count(&self) -> usize {
        self.deletions.len()
    }

    pub fn pod_count(&self) -> usize {
        self.deletions.iter().map(|d| d.pods.len()).sum()
    }
}
