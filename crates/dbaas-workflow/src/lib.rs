//! Database provisioning workflows.
//!
//! Each workflow is a [`dbaas_saga::StepSequence`] over a
//! [`ProvisionContext`]. The [`Orchestrator`] validates the caller's
//! parameters, opens a monitoring session, runs the sequence and closes the
//! session again, whatever the outcome.

pub mod classify;
mod config;
mod context;
mod error;
mod orchestrator;
pub mod providers;
pub mod steps;
pub mod traits;
mod types;
mod workflows;

#[cfg(any(test, feature = "testing"))]
pub mod mocks;

pub use config::{EngineConfig, RunFile};
pub use context::ProvisionContext;
pub use error::{
    ConfigError, ConfigurationError, ExecutionFailure, NFS_ACCESS_CODE, ProviderError,
};
pub use orchestrator::{Orchestrator, WorkflowParams, WorkflowResult};
pub use types::{CredentialSpec, DatabaseSpec, HostExport, Instance, ResourceState};
pub use workflows::WorkflowKind;
