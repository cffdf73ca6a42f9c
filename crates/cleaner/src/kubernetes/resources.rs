use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;

/// Label the Job controller sets on every Pod it creates.
pub const JOB_NAME_LABEL: &str = "batch.kubernetes.io/job-name";

/// Pre-1.27 spelling of [`JOB_NAME_LABEL`], still set alongside it.
pub const LEGACY_JOB_NAME_LABEL: &str = "job-name";

/// Point-in-time view of a Job as far as pruning is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    pub namespace: String,
    pub name: String,
    pub succeeded: i32,
    pub completion_time: Option<DateTime<Utc>>,
    pub labels: BTreeMap<String, String>,
}

impl JobRecord {
    /// A Job counts as finished once at least one of its Pods succeeded.
    pub fn is_finished(&self) -> bool {
        self.succeeded > 0
    }

    /// Value of `key`, treating an empty value as absent.
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }
}

impl From<&Job> for JobRecord {
    fn from(job: &Job) -> Self {
        let status = job.status.as_ref();
        Self {
            namespace: job.namespace().unwrap_or_default(),
            name: job.name_any(),
            succeeded: status.and_then(|s| s.succeeded).unwrap_or(0),
            completion_time: status
                .and_then(|s| s.completion_time.as_ref())
                .map(|t| t.0),
            labels: job.labels().clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl PodPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, PodPhase::Succeeded | PodPhase::Failed)
    }
}

impl From<&str> for PodPhase {
    fn from(phase: &str) -> Self {
        match phase {
            "Pending" => PodPhase::Pending,
            "Running" => PodPhase::Running,
            "Succeeded" => PodPhase::Succeeded,
            "Failed" => PodPhase::Failed,
            _ => PodPhase::Unknown,
        }
    }
}

impl fmt::Display for PodPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self {
            PodPhase::Pending => "Pending",
            PodPhase::Running => "Running",
            PodPhase::Succeeded => "Succeeded",
            PodPhase::Failed => "Failed",
            PodPhase::Unknown => "Unknown",
        };
        f.write_str(phase)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodRecord {
    pub namespace: String,
    pub name: String,
    pub phase: PodPhase,
    pub labels: BTreeMap<String, String>,
}

impl PodRecord {
    pub fn is_finished(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Name of the Job that owns this Pod, if the Job controller labelled it.
    pub fn job_name(&self) -> Option<&str> {
        [JOB_NAME_LABEL, LEGACY_JOB_NAME_LABEL]
            .iter()
            .filter_map(|key| self.labels.get(*key))
            .map(String::as_str)
            .find(|value| !value.is_empty())
    }
}

impl From<&Pod> for PodRecord {
    fn from(pod: &Pod) -> Self {
        Self {
            namespace: pod.namespace().unwrap_or_default(),
            name: pod.name_any(),
            phase: pod
                .status
                .as_ref()
                .and_then(|s| s.phase.as_deref())
                .map(PodPhase::from)
                .unwrap_or(PodPhase::Unknown),
            labels: pod.labels().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_job_record_from_succeeded_job() {
        let job: Job = serde_json::from_value(json!({
            "apiVersion": "batch/v1",
            "kind": "Job",
            "metadata": {
                "name": "report-28461230",
                "namespace": "batch",
                "labels": { "cronjob": "report" }
            },
            "status": {
                "succeeded": 1,
                "completionTime": "2024-03-01T10:15:00Z"
            }
        }))
        .unwrap();

        let record = JobRecord::from(&job);
        assert_eq!(record.name, "report-28461230");
        assert_eq!(record.namespace, "batch");
        assert!(record.is_finished());
        assert_eq!(record.label("cronjob"), Some("report"));
        assert_eq!(
            record.completion_time.map(|t| t.to_rfc3339()),
            Some("2024-03-01T10:15:00+00:00".to_string())
        );
    }

    #[test]
    fn test_job_without_status_is_not_finished() {
        let job: Job = serde_json::from_value(json!({
            "apiVersion": "batch/v1",
            "kind": "Job",
            "metadata": { "name": "pending", "namespace": "batch" }
        }))
        .unwrap();

        let record = JobRecord::from(&job);
        assert!(!record.is_finished());
        assert!(record.completion_time.is_none());
        assert!(record.labels.is_empty());
    }

    #[test]
    fn test_empty_label_value_is_absent() {
        let mut labels = BTreeMap::new();
        labels.insert("cronjob".to_string(), String::new());
        let record = JobRecord {
            namespace: "batch".to_string(),
            name: "j".to_string(),
            succeeded: 1,
            completion_time: None,
            labels,
        };
        assert_eq!(record.label("cronjob"), None);
        assert_eq!(record.label("missing"), None);
    }

    #[test]
    fn test_pod_phases() {
        let cases = [
            ("Succeeded", true),
            ("Failed", true),
            ("Running", false),
            ("Pending", false),
            ("", false),
        ];
        for (phase, terminal) in cases {
            assert_eq!(PodPhase::from(phase).is_terminal(), terminal, "phase {}", phase);
        }
    }

    #[test]
    fn test_pod_record_job_name_label() {
        let pod: Pod = serde_json::from_value(json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {
                "name": "report-28461230-x7k2p",
                "namespace": "batch",
                "labels": { "job-name": "report-28461230" }
            },
            "status": { "phase": "Succeeded" }
        }))
        .unwrap();

        let record = PodRecord::from(&pod);
        assert!(record.is_finished());
        assert_eq!(record.phase.to_string(), "Succeeded");
        assert_eq!(record.job_name(), Some("report-28461230"));
    }

    #[test]
    fn test_pod_record_prefers_current_job_name_label() {
        let pod: Pod = serde_json::from_value(json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {
                "name": "p",
                "labels": {
                    "batch.kubernetes.io/job-name": "current",
                    "job-name": "legacy"
                }
            }
        }))
        .unwrap();

        let record = PodRecord::from(&pod);
        assert_eq!(record.phase, PodPhase::Unknown);
        assert_eq!(record.job_name(), Some("current"));
    }
}
