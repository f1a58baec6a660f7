//! Connection settings model.

use std::fmt;

use serde::Deserialize;
use url::Url;

use crate::error::{ConfigError, ConfigResult};
use crate::validate::validate_connection;

/// Scheme used when the configured host does not name one.
pub const DEFAULT_SCHEME: &str = "http";

/// Address and credentials of the daemon's Web UI.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    /// Host name or address, optionally prefixed with a scheme.
    pub host: String,
    /// Web UI port.
    pub port: u32,
    /// Web UI user.
    pub username: String,
    /// Web UI password.
    #[serde(default)]
    pub password: String,
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl ConnectionConfig {
    /// Check the invariants every loaded configuration must satisfy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] naming the first offending field.
    pub fn validate(&self) -> ConfigResult<()> {
        validate_connection(self)
    }

    /// Root URL of the Web UI, always ending in `/`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] when host and port do not form a URL.
    pub fn base_url(&self) -> ConfigResult<Url> {
        let host = self.host.trim();
        let raw = if host.contains("://") {
            host.to_string()
        } else if host.contains(':') && !host.starts_with('[') {
            format!("{DEFAULT_SCHEME}://[{host}]")
        } else {
            format!("{DEFAULT_SCHEME}://{host}")
        };
        let invalid = |source| ConfigError::InvalidUrl {
            value: raw.clone(),
            source,
        };
        let mut url = Url::parse(&raw).map_err(invalid)?;
        let port = u16::try_from(self.port).map_err(|_| ConfigError::InvalidField {
            section: "web_ui",
            field: "port",
            value: Some(self.port.to_string()),
            reason: "must be between 1 and 65535",
        })?;
        url.set_port(Some(port))
            .map_err(|()| invalid(url::ParseError::EmptyHost))?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }
}
