//! Concrete workflow steps.

mod database;
mod monitoring;
mod nfs;

pub use database::{CheckInstanceStatus, CreateCredential, CreateDatabase};
pub use monitoring::{CreateAlarms, DestroyAlarms};
pub use nfs::GrantNfsAccess;

use crate::error::ProviderError;

/// Treat "already gone" as success, for compensations.
fn tolerate_not_found<T>(result: Result<T, ProviderError>) -> Result<(), ProviderError> {
    match result {
        Ok(_) => Ok(()),
        Err(error) if error.is_not_found() => Ok(()),
        Err(error) => Err(error),
    }
}
