mod script;
mod script_access;
mod script_monitoring;

pub use script::ScriptExecutor;
pub use script_access::ScriptAccessProvider;
pub use script_monitoring::ScriptMonitoringProvider;
