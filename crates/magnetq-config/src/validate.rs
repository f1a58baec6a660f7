//! Validation rules for connection settings.

use crate::error::{ConfigError, ConfigResult};
use crate::model::ConnectionConfig;

const SECTION: &str = "web_ui";

pub(crate) fn validate_connection(config: &ConnectionConfig) -> ConfigResult<()> {
    if config.host.trim().is_empty() {
        return Err(invalid("host", None, "must not be empty"));
    }
    validate_port(config.port)?;
    if config.username.trim().is_empty() {
        return Err(invalid("username", None, "must not be empty"));
    }
    Ok(())
}

/// Ensure `port` lies in `1..=65535`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] for out-of-range values.
pub fn validate_port(port: u32) -> ConfigResult<()> {
    if (1..=65_535).contains(&port) {
        Ok(())
    } else {
        Err(invalid(
            "port",
            Some(port.to_string()),
            "must be between 1 and 65535",
        ))
    }
}

/// Parse a port override coming from the environment.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when the value is not an integer.
pub fn parse_port(raw: &str) -> ConfigResult<u32> {
    raw.trim()
        .parse()
        .map_err(|_| invalid("port", Some(raw.to_string()), "must be an integer"))
}

fn invalid(
    field: &'static str,
    value: Option<String>,
    reason: &'static str,
) -> ConfigError {
    ConfigError::InvalidField {
        section: SECTION,
        field,
        value,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_bounds() {
        assert!(validate_port(1).is_ok());
        assert!(validate_port(65_535).is_ok());
        assert!(matches!(
            validate_port(0),
            Err(ConfigError::InvalidField { field: "port", .. })
        ));
        assert!(validate_port(65_536).is_err());
    }

    #[test]
    fn port_override_must_be_numeric() {
        assert_eq!(parse_port(" 8080 ").ok(), Some(8080));
        assert!(matches!(
            parse_port("http"),
            Err(ConfigError::InvalidField {
                reason: "must be an integer",
                ..
            })
        ));
    }

    #[test]
    fn blank_username_is_rejected() {
        let config = ConnectionConfig {
            host: "localhost".to_string(),
            port: 8080,
            username: "  ".to_string(),
            password: String::new(),
        };
        assert!(matches!(
            validate_connection(&config),
            Err(ConfigError::InvalidField {
                field: "username",
                ..
            })
        ));
    }
}
