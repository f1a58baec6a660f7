//! File and environment loading.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::model::ConnectionConfig;
use crate::validate::parse_port;

/// Overrides [`ConnectionConfig::host`].
pub const ENV_HOST: &str = "MAGNETQ_HOST";
/// Overrides [`ConnectionConfig::port`].
pub const ENV_PORT: &str = "MAGNETQ_PORT";
/// Overrides [`ConnectionConfig::username`].
pub const ENV_USERNAME: &str = "MAGNETQ_USERNAME";
/// Overrides [`ConnectionConfig::password`].
pub const ENV_PASSWORD: &str = "MAGNETQ_PASSWORD";

#[derive(Debug, Deserialize)]
struct ConfigDocument {
    web_ui: ConnectionConfig,
}

/// Parse the `web_ui` section out of a YAML document without validating it.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] when the document is malformed or the
/// section is missing.
pub fn parse(yaml: &str) -> ConfigResult<ConnectionConfig> {
    let document: ConfigDocument =
        serde_yaml::from_str(yaml).map_err(|source| ConfigError::Parse { source })?;
    Ok(document.web_ui)
}

/// Replace fields for which `lookup` yields a value.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when the port override is not numeric.
pub fn apply_overrides<F>(mut config: ConnectionConfig, lookup: F) -> ConfigResult<ConnectionConfig>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup(ENV_HOST) {
        debug!(var = ENV_HOST, "applying environment override");
        config.host = host;
    }
    if let Some(port) = lookup(ENV_PORT) {
        debug!(var = ENV_PORT, "applying environment override");
        config.port = parse_port(&port)?;
    }
    if let Some(username) = lookup(ENV_USERNAME) {
        debug!(var = ENV_USERNAME, "applying environment override");
        config.username = username;
    }
    if let Some(password) = lookup(ENV_PASSWORD) {
        debug!(var = ENV_PASSWORD, "applying environment override");
        config.password = password;
    }
    Ok(config)
}

/// Load, override, and validate the configuration at `path` using `lookup`
/// for environment values.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] when the file cannot be read, plus any parse or
/// validation failure.
pub fn load_with<F>(path: &Path, lookup: F) -> ConfigResult<ConnectionConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = apply_overrides(parse(&raw)?, lookup)?;
    config.validate()?;
    info!(
        path = %path.display(),
        host = %config.host,
        port = config.port,
        "loaded connection configuration"
    );
    Ok(config)
}

/// Load the configuration at `path`, honouring `MAGNETQ_*` overrides from the
/// process environment.
///
/// # Errors
///
/// See [`load_with`].
pub fn load(path: &Path) -> ConfigResult<ConnectionConfig> {
    load_with(path, |key| std::env::var(key).ok())
}
