mod containers;
mod diagnostics;
mod error;
mod workload;

pub use containers::{swap_container_images, swap_pod_spec_images, ContainerImage};
pub use diagnostics::{DiagnosticSink, TracingSink};
pub use error::RestoreError;
pub use workload::{
    action_for_kind, restore_actions, RegistryAnnotations, ResourceSelector, RestoreContext,
    RestoreItemAction, WorkloadKind, WorkloadRestoreAction, ANNOTATION_BACKUP_REGISTRY,
    ANNOTATION_RESTORE_REGISTRY,
};
