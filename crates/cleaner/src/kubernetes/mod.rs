mod client;
mod resources;

#[cfg(test)]
pub use client::MockClusterClient;
pub use client::{resolve_namespace, ClusterClient, KubeClient};
pub use resources::{JobRecord, PodPhase, PodRecord, JOB_NAME_LABEL, LEGACY_JOB_NAME_LABEL};
