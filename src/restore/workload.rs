use std::sync::Arc;

use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::batch::v1::{CronJob, Job};
use k8s_openapi::api::core::v1::{Pod, PodSpec, ReplicationController};
use k8s_openapi::Resource;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::containers::swap_pod_spec_images;
use super::diagnostics::{DiagnosticSink, TracingSink};
use super::error::RestoreError;
use crate::oci::NamespaceMapping;

/// Annotation holding the registry hostname images were backed up from
pub const ANNOTATION_BACKUP_REGISTRY: &str = "openshift.io/backup-registry-hostname";
/// Annotation holding the registry hostname images are restored into
pub const ANNOTATION_RESTORE_REGISTRY: &str = "openshift.io/restore-registry-hostname";

/// Resources a restore action wants to receive, e.g. `deployments.apps`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSelector {
    pub included_resources: Vec<String>,
}

/// Per-restore information supplied by the host
#[derive(Debug, Clone, Default)]
pub struct RestoreContext {
    pub namespace_mapping: NamespaceMapping,
}

/// Annotation keys that carry the old and new registry of a workload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryAnnotations {
    pub backup_registry: String,
    pub restore_registry: String,
}

impl Default for RegistryAnnotations {
    fn default() -> Self {
        Self {
            backup_registry: ANNOTATION_BACKUP_REGISTRY.to_string(),
            restore_registry: ANNOTATION_RESTORE_REGISTRY.to_string(),
        }
    }
}

/// Hook invoked by the restore host for every item it restores
pub trait RestoreItemAction {
    fn applies_to(&self) -> ResourceSelector;

    /// Returns the updated item
    fn execute(&self, item: Value, ctx: &RestoreContext) -> Result<Value, RestoreError>;
}

/// Kubernetes workloads that embed a pod spec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadKind {
    Pod,
    Deployment,
    DaemonSet,
    StatefulSet,
    ReplicaSet,
    ReplicationController,
    Job,
    CronJob,
}

impl WorkloadKind {
    pub const ALL: [WorkloadKind; 8] = [
        WorkloadKind::Pod,
        WorkloadKind::Deployment,
        WorkloadKind::DaemonSet,
        WorkloadKind::StatefulSet,
        WorkloadKind::ReplicaSet,
        WorkloadKind::ReplicationController,
        WorkloadKind::Job,
        WorkloadKind::CronJob,
    ];

    /// Look up a workload by its manifest `kind`
    pub fn from_kind(kind: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.kind() == kind)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            WorkloadKind::Pod => Pod::KIND,
            WorkloadKind::Deployment => Deployment::KIND,
            WorkloadKind::DaemonSet => DaemonSet::KIND,
            WorkloadKind::StatefulSet => StatefulSet::KIND,
            WorkloadKind::ReplicaSet => ReplicaSet::KIND,
            WorkloadKind::ReplicationController => ReplicationController::KIND,
            WorkloadKind::Job => Job::KIND,
            WorkloadKind::CronJob => CronJob::KIND,
        }
    }

    /// Resource name qualified by API group, as used in resource selectors
    pub fn resource(&self) -> &'static str {
        match self {
            WorkloadKind::Pod => "pods",
            WorkloadKind::Deployment => "deployments.apps",
            WorkloadKind::DaemonSet => "daemonsets.apps",
            WorkloadKind::StatefulSet => "statefulsets.apps",
            WorkloadKind::ReplicaSet => "replicasets.apps",
            WorkloadKind::ReplicationController => "replicationcontrollers",
            WorkloadKind::Job => "jobs.batch",
            WorkloadKind::CronJob => "cronjobs.batch",
        }
    }
}

/// Restore action that relocates the container images of one workload kind
#[derive(Clone)]
pub struct WorkloadRestoreAction {
    kind: WorkloadKind,
    annotations: RegistryAnnotations,
    sink: Arc<dyn DiagnosticSink + Send + Sync>,
}

impl WorkloadRestoreAction {
    pub fn new(kind: WorkloadKind, annotations: RegistryAnnotations) -> Self {
        Self {
            kind,
            annotations,
            sink: Arc::new(TracingSink),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink + Send + Sync>) -> Self {
        self.sink = sink;
        self
    }

    pub fn kind(&self) -> WorkloadKind {
        self.kind
    }

    /// Old and new registry from the item's annotations, if both are set
    fn registries(&self, item: &Value) -> Option<(String, String)> {
        let annotations = item.get("metadata")?.get("annotations")?;
        let lookup = |key: &str| {
            annotations
                .get(key)
                .and_then(Value::as_str)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };
        Some((
            lookup(&self.annotations.backup_registry)?,
            lookup(&self.annotations.restore_registry)?,
        ))
    }

    fn relocate<K>(
        &self,
        item: Value,
        ctx: &RestoreContext,
        pod_spec: fn(&mut K) -> Option<&mut PodSpec>,
    ) -> Result<Value, RestoreError>
    where
        K: Resource + DeserializeOwned + Serialize,
    {
        let Some((old_registry, new_registry)) = self.registries(&item) else {
            debug!(kind = K::KIND, "No registry annotations on item, leaving images unchanged");
            return Ok(item);
        };

        let mut workload: K = serde_json::from_value(item).map_err(|source| {
            RestoreError::Deserialize {
                kind: K::KIND,
                source,
            }
        })?;

        if let Some(spec) = pod_spec(&mut workload) {
            info!(
                kind = K::KIND,
                from = %old_registry,
                to = %new_registry,
                "Relocating container images"
            );
            swap_pod_spec_images(
                spec,
                &old_registry,
                &new_registry,
                self.sink.as_ref(),
                &ctx.namespace_mapping,
            );
        }

        serde_json::to_value(&workload).map_err(|source| RestoreError::Serialize {
            kind: K::KIND,
            source,
        })
    }
}

impl RestoreItemAction for WorkloadRestoreAction {
    fn applies_to(&self) -> ResourceSelector {
        ResourceSelector {
            included_resources: vec![self.kind.resource().to_string()],
        }
    }

    fn execute(&self, item: Value, ctx: &RestoreContext) -> Result<Value, RestoreError> {
        match self.kind {
            WorkloadKind::Pod => self.relocate(item, ctx, pod_spec_of_pod),
            WorkloadKind::Deployment => self.relocate(item, ctx, pod_spec_of_deployment),
            WorkloadKind::DaemonSet => self.relocate(item, ctx, pod_spec_of_daemon_set),
            WorkloadKind::StatefulSet => self.relocate(item, ctx, pod_spec_of_stateful_set),
            WorkloadKind::ReplicaSet => self.relocate(item, ctx, pod_spec_of_replica_set),
            WorkloadKind::ReplicationController => {
                self.relocate(item, ctx, pod_spec_of_replication_controller)
            }
            WorkloadKind::Job => self.relocate(item, ctx, pod_spec_of_job),
            WorkloadKind::CronJob => self.relocate(item, ctx, pod_spec_of_cron_job),
        }
    }
}

/// One restore action per supported workload kind
pub fn restore_actions(annotations: &RegistryAnnotations) -> Vec<WorkloadRestoreAction> {
    WorkloadKind::ALL
        .into_iter()
        .map(|kind| WorkloadRestoreAction::new(kind, annotations.clone()))
        .collect()
}

/// Restore action for a manifest `kind`
pub fn action_for_kind(
    kind: &str,
    annotations: &RegistryAnnotations,
) -> Result<WorkloadRestoreAction, RestoreError> {
    WorkloadKind::from_kind(kind)
        .map(|kind| WorkloadRestoreAction::new(kind, annotations.clone()))
        .ok_or_else(|| RestoreError::UnsupportedKind(kind.to_string()))
}

fn pod_spec_of_pod(pod: &mut Pod) -> Option<&mut PodSpec> {
    pod.spec.as_mut()
}

fn pod_spec_of_deployment(deployment: &mut Deployment) -> Option<&mut PodSpec> {
    deployment.spec.as_mut()?.template.spec.as_mut()
}

fn pod_spec_of_daemon_set(daemon_set: &mut DaemonSet) -> Option<&mut PodSpec> {
    daemon_set.spec.as_mut()?.template.spec.as_mut()
}

fn pod_spec_of_stateful_set(stateful_set: &mut StatefulSet) -> Option<&mut PodSpec> {
    stateful_set.spec.as_mut()?.template.spec.as_mut()
}

fn pod_spec_of_replica_set(replica_set: &mut ReplicaSet) -> Option<&mut PodSpec> {
    replica_set.spec.as_mut()?.template.as_mut()?.spec.as_mut()
}

fn pod_spec_of_replication_controller(rc: &mut ReplicationController) -> Option<&mut PodSpec> {
    rc.spec.as_mut()?.template.as_mut()?.spec.as_mut()
}

fn pod_spec_of_job(job: &mut Job) -> Option<&mut PodSpec> {
    job.spec.as_mut()?.template.spec.as_mut()
}

fn pod_spec_of_cron_job(cron_job: &mut CronJob) -> Option<&mut PodSpec> {
    cron_job
        .spec
        .as_mut()?
        .job_template
        .spec
        .as_mut()?
        .template
        .spec
        .as_mut()
}
