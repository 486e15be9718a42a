use std::fmt;
use std::str::FromStr;

use dbaas_saga::{SequenceBuilder, StepSequence};
use serde::Serialize;

use crate::context::ProvisionContext;
use crate::error::ConfigurationError;
use crate::steps::{
    CheckInstanceStatus, CreateAlarms, CreateCredential, CreateDatabase, DestroyAlarms,
    GrantNfsAccess,
};
use crate::traits::{AccessProvider, RemoteExecutor};

/// The named workflows this crate knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkflowKind {
    /// Create a database and its credential on a running instance and put
    /// it under monitoring.
    Provision,
    /// Give the hosts of a restored instance access to the snapshot exports
    /// and rebuild its alarms.
    RestoreSnapshot,
    /// Replace an instance's alarms after checking it is reachable.
    RebuildAlarms,
}

impl WorkflowKind {
    pub const ALL: [Self; 3] = [Self::Provision, Self::RestoreSnapshot, Self::RebuildAlarms];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Provision => "provision",
            Self::RestoreSnapshot => "restore-snapshot",
            Self::RebuildAlarms => "rebuild-alarms",
        }
    }

    /// The step sequence for this workflow.
    #[must_use]
    pub fn sequence<E, A>(self) -> StepSequence<ProvisionContext<E, A>>
    where
        E: RemoteExecutor + 'static,
        A: AccessProvider + 'static,
    {
        let builder = SequenceBuilder::new(self.name());
        match self {
            Self::Provision => builder
                .first_step(CheckInstanceStatus::new())
                .then(CreateDatabase::new())
                .then(CreateCredential::new())
                .then(CreateAlarms::new())
                .build(),
            Self::RestoreSnapshot => builder
                .first_step(GrantNfsAccess::new())
                .then(CreateAlarms::new())
                .build(),
            Self::RebuildAlarms => builder
                .first_step(DestroyAlarms::new())
                .then(CheckInstanceStatus::new())
                .then(CreateAlarms::new())
                .build(),
        }
    }
}

impl fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WorkflowKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| ConfigurationError::UnknownWorkflow {
                name: s.to_string(),
                available: Self::ALL.map(Self::name).join(", "),
            })
    }
}
