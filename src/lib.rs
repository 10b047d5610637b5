//! Container image reference relocation for restored Kubernetes workloads.
//!
//! [`oci`] parses and rewrites image references, [`restore`] applies the
//! rewrite to the containers of workload objects handed over by a restore host.

pub mod oci;
pub mod restore;

#[cfg(feature = "cli")]
pub mod settings;
