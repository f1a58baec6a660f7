use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use magnetq_config::{
    ConfigError, ENV_PASSWORD, ENV_PORT, load_with, parse,
};
use tempfile::NamedTempFile;

const DOCUMENT: &str = r"
web_ui:
  host: localhost
  port: 8080
  username: admin
  password: adminadmin
";

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn loads_web_ui_section() {
    let file = write_config(DOCUMENT);
    let config = load_with(file.path(), no_env).expect("config should load");
    assert_eq!(config.host, "localhost");
    assert_eq!(config.port, 8080);
    assert_eq!(config.username, "admin");
    assert_eq!(config.password, "adminadmin");
    assert_eq!(
        config.base_url().expect("url").as_str(),
        "http://localhost:8080/"
    );
}

#[test]
fn environment_overrides_file_values() {
    let file = write_config(DOCUMENT);
    let env: HashMap<&str, &str> = HashMap::from([(ENV_PORT, "9090"), (ENV_PASSWORD, "rotated")]);
    let config = load_with(file.path(), |key| env.get(key).map(ToString::to_string))
        .expect("config should load");
    assert_eq!(config.port, 9090);
    assert_eq!(config.password, "rotated");
    assert_eq!(config.username, "admin");
}

#[test]
fn override_is_validated() {
    let file = write_config(DOCUMENT);
    let err = load_with(file.path(), |key| {
        (key == ENV_PORT).then(|| "0".to_string())
    })
    .expect_err("port 0 is invalid");
    assert!(matches!(err, ConfigError::InvalidField { field: "port", .. }));
}

#[test]
fn missing_section_is_a_parse_error() {
    let err = parse("other: {}\n").expect_err("web_ui is required");
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn unknown_fields_are_rejected() {
    let err = parse("web_ui:\n  host: a\n  port: 1\n  username: u\n  pasword: typo\n")
        .expect_err("typo should fail");
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn empty_host_fails_validation() {
    let file = write_config("web_ui:\n  host: ''\n  port: 8080\n  username: admin\n");
    let err = load_with(file.path(), no_env).expect_err("empty host");
    assert!(matches!(err, ConfigError::InvalidField { field: "host", .. }));
}

#[test]
fn missing_file_reports_path() {
    let err = load_with(Path::new("/nonexistent/magnetq.yaml"), no_env)
        .expect_err("missing file");
    assert!(matches!(err, ConfigError::Io { ref path, .. } if path.ends_with("magnetq.yaml")));
}
