//! File-based loading tests.

use std::io::Write;

use tempfile::Builder;
use trellis_config::{ConfigError, ConfigLoader, LogFormat};

fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn loads_toml_file() {
    let file = write_temp(
        ".toml",
        r#"
            [server]
            http_addr = "127.0.0.1:4000"
            request_timeout_ms = 500

            [logging]
            format = "pretty"
        "#,
    );

    let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
    assert_eq!(config.server.http_addr, "127.0.0.1:4000");
    assert_eq!(config.server.request_timeout_ms, 500);
    assert_eq!(config.logging.format, LogFormat::Pretty);
    assert_eq!(config.server.max_body_bytes(), Some(32 << 20));
}

#[test]
fn loads_json_file() {
    let file = write_temp(".json", r#"{"server": {"max_body_bytes": 4096}}"#);

    let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
    assert_eq!(config.server.max_body_bytes, 4096);
}

#[test]
fn rejects_unknown_fields() {
    let file = write_temp(".toml", "[server]\nport = 8080\n");

    let result = ConfigLoader::new().with_file(file.path());
    assert!(matches!(result, Err(ConfigError::TomlError(_))));
}

#[test]
fn rejects_unsupported_extension() {
    let file = write_temp(".yaml", "server: {}\n");

    let result = ConfigLoader::new().with_file(file.path());
    assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
}

#[test]
fn validation_runs_on_load() {
    let file = write_temp(".toml", "[server]\nhttp_addr = \"not-an-address\"\n");

    let loader = ConfigLoader::new().with_file(file.path()).unwrap();
    assert!(matches!(loader.load(), Err(ConfigError::InvalidValue { .. })));
}
