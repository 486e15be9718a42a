mod access_provider;
mod monitoring;
mod remote_executor;

pub use access_provider::AccessProvider;
pub use monitoring::{MonitoringProvider, MonitoringSession};
pub use remote_executor::{DriverParams, RemoteExecutor};
