/// Data-source description for Oracle connections
///
/// A `SourceOptions` value arrives from the host configuration form once per
/// invocation and is treated as immutable. It carries everything needed to
/// reach one Oracle instance, including how the database is identified
/// (service name vs SID) and where the Instant Client lives.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// How the `database` field selects the target database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DatabaseType {
    #[default]
    #[serde(rename = "SERVICE_NAME")]
    ServiceName,
    #[serde(rename = "SID")]
    Sid,
}

/// Whether the Instant Client is resolved from the default search path or a
/// user-supplied directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClientPathType {
    #[default]
    Default,
    Custom,
}

/// Configuration for one Oracle data source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceOptions {
    /// Database host/hostname
    pub host: String,

    /// Database port (typically 1521)
    pub port: u16,

    /// Database username
    pub username: String,

    /// Database password
    pub password: String,

    /// Service name or SID, depending on `database_type`
    pub database: String,

    #[serde(default)]
    pub database_type: DatabaseType,

    /// Connect over TLS (TCPS) instead of plain TCP
    #[serde(default)]
    pub ssl_enabled: bool,

    #[serde(default)]
    pub client_path_type: ClientPathType,

    /// Custom Instant Client directory, used when `client_path_type` is
    /// `custom`
    #[serde(default)]
    pub path: Option<String>,
}

impl SourceOptions {
    /// Validates the source options before any connection is attempted.
    pub fn validate(&self) -> Result<(), Error> {
        if self.host.is_empty() {
            return Err(Error::InvalidOptions("host cannot be empty".to_string()));
        }
        if self.port == 0 {
            return Err(Error::InvalidOptions("port must be greater than 0".to_string()));
        }
        if self.username.is_empty() {
            return Err(Error::InvalidOptions("username cannot be empty".to_string()));
        }
        if self.password.is_empty() {
            return Err(Error::InvalidOptions("password cannot be empty".to_string()));
        }
        if self.database.is_empty() {
            return Err(Error::InvalidOptions("database cannot be empty".to_string()));
        }
        if self.client_path_type == ClientPathType::Custom
            && self.path.as_deref().map_or(true, str::is_empty)
        {
            return Err(Error::InvalidOptions(
                "custom client path selected but no path given".to_string(),
            ));
        }
        Ok(())
    }

    /// The custom Instant Client directory, if one is configured.
    pub fn client_path(&self) -> Option<&str> {
        match self.client_path_type {
            ClientPathType::Custom => self.path.as_deref(),
            ClientPathType::Default => None,
        }
    }

    /// Builds the Oracle connect descriptor for this source.
    ///
    /// The descriptor selects SERVICE_NAME or SID from `database_type` and
    /// switches the protocol to TCPS when TLS is enabled.
    pub fn connect_descriptor(&self) -> String {
        let protocol = if self.ssl_enabled { "TCPS" } else { "TCP" };
        let identifier = match self.database_type {
            DatabaseType::ServiceName => "SERVICE_NAME",
            DatabaseType::Sid => "SID",
        };
        format!(
            "(DESCRIPTION=(ADDRESS=(PROTOCOL={})(HOST={})(PORT={}))\
             (CONNECT_DATA=(SERVER=DEDICATED)({}={})))",
            protocol, self.host, self.port, identifier, self.database
        )
    }
}
