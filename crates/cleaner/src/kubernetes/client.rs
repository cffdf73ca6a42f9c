use std::path::Path;

use async_trait::async_trait;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::NamespaceResourceScope;
use kube::{
    api::{Api, DeleteParams, ListParams, PropagationPolicy},
    config::{KubeConfigOptions, Kubeconfig},
    Client, Resource,
};
use tracing::debug;

use super::resources::{JobRecord, PodRecord};
use crate::{Error, Result};

/// List and delete operations the cleaner needs from the cluster.
///
/// An empty `namespace` means all namespaces.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClusterClient: Send + Sync {
    async fn list_jobs(&self, namespace: &str) -> Result<Vec<JobRecord>>;
    async fn list_pods(&self, namespace: &str) -> Result<Vec<PodRecord>>;
    async fn delete_job(&self, job: &JobRecord) -> Result<()>;
    async fn delete_pod(&self, pod: &PodRecord) -> Result<()>;
}

pub struct KubeClient {
    client: Client,
    kubeconfig: Option<Kubeconfig>,
    context: Option<String>,
}

impl KubeClient {
    /// Builds a client from a kubeconfig file, or from kube's default lookup
    /// (`KUBECONFIG`, then `~/.kube/config`) when `path` is `None`.
    pub async fn from_kubeconfig(path: Option<&Path>, context: Option<&str>) -> Result<Self> {
        let kubeconfig = match path {
            Some(path) => Kubeconfig::read_from(path).map_err(|e| {
                Error::Config(format!(
                    "failed to load local kubeconfig {}: {}",
                    path.display(),
                    e
                ))
            })?,
            None => Kubeconfig::read()
                .map_err(|e| Error::Config(format!("failed to load local kubeconfig: {}", e)))?,
        };

        let options = KubeConfigOptions {
            context: context.map(str::to_string),
            cluster: None,
            user: None,
        };
        let config = kube::Config::from_custom_kubeconfig(kubeconfig.clone(), &options)
            .await
            .map_err(|e| Error::Config(format!("failed to build client config: {}", e)))?;
        let client = Client::try_from(config)
            .map_err(|e| Error::Config(format!("failed to create Kubernetes client: {}", e)))?;

        Ok(Self {
            client,
            kubeconfig: Some(kubeconfig),
            context: context.map(str::to_string),
        })
    }

    /// Builds a client from the mounted service account of the current Pod.
    pub fn in_cluster() -> Result<Self> {
        let config = kube::Config::incluster()
            .map_err(|e| Error::Config(format!("failed to load kubeconfig in cluster: {}", e)))?;
        let client = Client::try_from(config)
            .map_err(|e| Error::Config(format!("failed to create Kubernetes client: {}", e)))?;

        Ok(Self {
            client,
            kubeconfig: None,
            context: None,
        })
    }

    #[cfg(test)]
    fn with_client(client: Client) -> Self {
        Self {
            client,
            kubeconfig: None,
            context: None,
        }
    }

    /// Namespace recorded in the selected kubeconfig context, if any.
    pub fn namespace_in_config(&self) -> Option<String> {
        self.kubeconfig
            .as_ref()
            .and_then(|kubeconfig| context_namespace(kubeconfig, self.context.as_deref()))
    }

    /// Namespace to operate on: explicit flag, then kubeconfig context, then
    /// all namespaces (`""`).
    pub fn resolve_namespace(&self, explicit: Option<&str>) -> String {
        resolve_namespace(explicit, self.namespace_in_config())
    }

    fn api<K>(&self, namespace: &str) -> Api<K>
    where
        K: Resource<Scope = NamespaceResourceScope>,
        K::DynamicType: Default,
    {
        if namespace.is_empty() {
            Api::all(self.client.clone())
        } else {
            Api::namespaced(self.client.clone(), namespace)
        }
    }
}

#[async_trait]
impl ClusterClient for KubeClient {
    async fn list_jobs(&self, namespace: &str) -> Result<Vec<JobRecord>> {
        let jobs = self
            .api::<Job>(namespace)
            .list(&ListParams::default())
            .await
            .map_err(|e| Error::from_kube("failed to retrieve Jobs", e))?;
        debug!("Listed {} Jobs in namespace '{}'", jobs.items.len(), namespace);

        Ok(jobs.items.iter().map(JobRecord::from).collect())
    }

    async fn list_pods(&self, namespace: &str) -> Result<Vec<PodRecord>> {
        let pods = self
            .api::<Pod>(namespace)
            .list(&ListParams::default())
            .await
            .map_err(|e| Error::from_kube("failed to retrieve Pods", e))?;
        debug!("Listed {} Pods in namespace '{}'", pods.items.len(), namespace);

        Ok(pods.items.iter().map(PodRecord::from).collect())
    }

    async fn delete_job(&self, job: &JobRecord) -> Result<()> {
        self.api::<Job>(&job.namespace)
            .delete(&job.name, &orphan_delete())
            .await
            .map_err(|e| {
                Error::from_kube(
                    format!("failed to delete Job {}/{}", job.namespace, job.name),
                    e,
                )
            })?;

        Ok(())
    }

    async fn delete_pod(&self, pod: &PodRecord) -> Result<()> {
        self.api::<Pod>(&pod.namespace)
            .delete(&pod.name, &DeleteParams::default())
            .await
            .map_err(|e| {
                Error::from_kube(
                    format!("failed to delete Pod {}/{}", pod.namespace, pod.name),
                    e,
                )
            })?;

        Ok(())
    }
}

/// Pods are removed one by one afterwards, so the garbage collector must not race for them.
fn orphan_delete() -> DeleteParams {
    DeleteParams {
        propagation_policy: Some(PropagationPolicy::Orphan),
        ..Default::default()
    }
}

pub fn resolve_namespace(explicit: Option<&str>, in_config: Option<String>) -> String {
    match explicit.filter(|ns| !ns.is_empty()) {
        Some(namespace) => namespace.to_string(),
        None => in_config.unwrap_or_default(),
    }
}

fn context_namespace(kubeconfig: &Kubeconfig, context: Option<&str>) -> Option<String> {
    let name = context.or(kubeconfig.current_context.as_deref())?;
    kubeconfig
        .contexts
        .iter()
        .find(|named| named.name == name)
        .and_then(|named| named.context.as_ref())
        .and_then(|ctx| ctx.namespace.clone())
        .filter(|ns| !ns.is_empty())
}
