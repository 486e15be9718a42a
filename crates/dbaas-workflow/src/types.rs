use std::fmt;

use serde::Deserialize;

/// The database instance a workflow operates on.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Instance {
    /// Infrastructure environment the instance lives in (e.g. "prod").
    pub environment: String,
    pub hostname: String,
    pub dns: String,
    pub address: String,
    pub port: u16,
    /// Administrative user the driver connects as.
    pub user: String,
    pub password: String,
}

impl Instance {
    /// `address:port`, as handed to the driver.
    #[must_use]
    pub fn connection(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("environment", &self.environment)
            .field("hostname", &self.hostname)
            .field("dns", &self.dns)
            .field("address", &self.address)
            .field("port", &self.port)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

/// A logical database to create on the instance.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseSpec {
    pub name: String,
}

/// Application credential to create for the database.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialSpec {
    pub user: String,
    pub password: String,
}

impl fmt::Debug for CredentialSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSpec")
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

/// Association between a host and the NFS export it should be able to mount.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostExport {
    pub host: String,
    pub export_id: String,
}

impl HostExport {
    #[must_use]
    pub fn new(host: impl Into<String>, export_id: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            export_id: export_id.into(),
        }
    }
}

/// How far a create step got with its resource, so that its undo knows
/// whether there is anything of ours to remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceState {
    /// The create call was issued but did not confirm success.
    Attempted,
    Created,
    /// The resource was there before the run; undo leaves it alone.
    AlreadyExisted,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance() -> Instance {
        Instance {
            environment: "dev".to_string(),
            hostname: "db-01".to_string(),
            dns: "db-01.example.internal".to_string(),
            address: "10.0.0.7".to_string(),
            port: 27017,
            user: "admin".to_string(),
            password: "s3cret".to_string(),
        }
    }

    #[test]
    fn connection_is_address_and_port() {
        assert_eq!(instance().connection(), "10.0.0.7:27017");
    }

    #[test]
    fn debug_output_hides_passwords() {
        let credential = CredentialSpec {
            user: "app".to_string(),
            password: "hunter2".to_string(),
        };

        assert!(!format!("{:?}", instance()).contains("s3cret"));
        assert!(!format!("{credential:?}").contains("hunter2"));
        assert!(format!("{credential:?}").contains("app"));
    }
}
