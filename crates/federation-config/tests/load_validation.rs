// crates/federation-config/tests/load_validation.rs
// ============================================================================
// Module: Config Load Validation Tests
// Description: Validate config loading guards (path, size, encoding, merge).
// Purpose: Ensure config input handling is strict and fail-closed.
// ============================================================================
//! ## Overview
//! Exercises file and directory loading for both the proxy and account
//! documents.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::fs;
use std::io::Write;
use std::path::Path;

use federation_config::AccountConfig;
use federation_config::ConfigError;
use federation_config::ProxyConfig;
use federation_core::AccountAlias;
use tempfile::NamedTempFile;
use tempfile::TempDir;

type TestResult = Result<(), String>;

fn assert_invalid<T>(result: Result<T, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config load".to_string()),
    }
}

fn write_file(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

#[test]
fn load_rejects_path_too_long() -> TestResult {
    let long_path = "a".repeat(5_000);
    assert_invalid(ProxyConfig::load(Some(Path::new(&long_path))), "config path exceeds max length")
}

#[test]
fn load_rejects_path_component_too_long() -> TestResult {
    let long_component = "a".repeat(300);
    assert_invalid(
        ProxyConfig::load(Some(Path::new(&long_component))),
        "config path component too long",
    )
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    let payload = vec![b'a'; 1_048_577];
    file.write_all(&payload).map_err(|err| err.to_string())?;
    assert_invalid(ProxyConfig::load(Some(file.path())), "config file exceeds size limit")
}

#[test]
fn load_rejects_non_utf8_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(&[0xFF, 0xFE, 0xFF]).map_err(|err| err.to_string())?;
    assert_invalid(ProxyConfig::load(Some(file.path())), "config file must be utf-8")
}

#[test]
fn load_reports_missing_file_as_io_error() {
    let dir = TempDir::new().unwrap();
    let result = ProxyConfig::load(Some(&dir.path().join("missing.yaml")));
    assert!(matches!(result, Err(ConfigError::Io(_))));
}

#[test]
fn load_rejects_invalid_yaml() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "proxy.yaml", "provider: [unterminated");
    let result = ProxyConfig::load(Some(&dir.path().join("proxy.yaml")));
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn load_reads_single_file() {
    let dir = TempDir::new().unwrap();
    write_file(
        dir.path(),
        "proxy.yaml",
        "provider:\n  kind: static\n  accounts:\n    prod: [admin]\nserver:\n  bind: 0.0.0.0:9000\n",
    );
    let config = ProxyConfig::load(Some(&dir.path().join("proxy.yaml"))).unwrap();
    assert_eq!(config.provider.kind, "static");
    assert_eq!(config.server.bind_addr().unwrap().port(), 9000);
}

#[test]
fn load_merges_directory_in_lexical_order() {
    let dir = TempDir::new().unwrap();
    write_file(
        dir.path(),
        "10-base.yaml",
        "aws:\n  region: eu-west-1\n  timeout_ms: 1000\nprovider:\n  kind: static_groups\n  regex: \"x-(?P<account>.*)-(?P<role>.*)\"\n  groups: [x-a-b]\n",
    );
    write_file(dir.path(), "20-override.yml", "aws:\n  timeout_ms: 2500\nprovider:\n  groups: [x-c-d]\n");
    write_file(dir.path(), "README.txt", "not: [yaml");
    let config = ProxyConfig::load(Some(dir.path())).unwrap();
    assert_eq!(config.aws.region, "eu-west-1");
    assert_eq!(config.aws.timeout_ms, 2500);
    assert_eq!(config.provider.kind, "static_groups");
    assert_eq!(
        config.provider.options.get("groups"),
        Some(&serde_yaml::from_str::<serde_yaml::Value>("[x-c-d]").unwrap())
    );
}

#[test]
fn load_treats_empty_file_as_empty_mapping() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "00-empty.yaml", "# nothing here\n");
    write_file(dir.path(), "10-provider.yaml", "provider:\n  kind: host\n");
    let config = ProxyConfig::load(Some(dir.path())).unwrap();
    assert_eq!(config.provider.kind, "host");
}

#[test]
fn load_rejects_directory_without_yaml() -> TestResult {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "notes.txt", "hello");
    assert_invalid(ProxyConfig::load(Some(dir.path())), "contains no yaml files")
}

#[test]
fn account_config_loads_directory() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "a.yaml", "prod:\n  id: \"123456789012\"\n");
    write_file(dir.path(), "b.yaml", "dev:\n  id: 210987654321\n  owner: platform\n");
    let accounts = AccountConfig::load(Some(dir.path())).unwrap();
    assert_eq!(accounts.len(), 2);
    assert_eq!(accounts.id(&AccountAlias::new("prod")).unwrap().as_str(), "123456789012");
    assert_eq!(accounts.id(&AccountAlias::new("dev")).unwrap().as_str(), "210987654321");
    assert_eq!(accounts.directory().len(), 2);
}

#[test]
fn account_config_later_file_overrides_id() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "a.yaml", "prod:\n  id: \"111111111111\"\n");
    write_file(dir.path(), "b.yaml", "prod:\n  id: \"222222222222\"\n");
    let accounts = AccountConfig::load(Some(dir.path())).unwrap();
    assert_eq!(accounts.id(&AccountAlias::new("prod")).unwrap().as_str(), "222222222222");
}
