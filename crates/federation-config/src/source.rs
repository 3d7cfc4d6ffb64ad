// crates/federation-config/src/source.rs
// ============================================================================
// Module: Config Sources
// Description: Path resolution, bounded file reads, and directory merging.
// Purpose: Turn a config path into one YAML document under hard limits.
// Dependencies: serde_yaml
// ============================================================================

//! ## Overview
//! A config path names either a YAML file or a directory. Directories are
//! expanded to their `*.yaml` and `*.yml` files in lexical order and the
//! documents are deep-merged: mappings merge key by key, any other value
//! replaces what came before.
//! Invariants:
//! - Every file read is bounded by [`MAX_CONFIG_FILE_SIZE`] and must be UTF-8.
//! - Paths are rejected before any I/O when they exceed length limits.
//! - An empty document merges as an empty mapping.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde_yaml::Mapping;
use serde_yaml::Value;

use crate::config::ConfigError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum config file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of files merged from one directory.
pub(crate) const MAX_DIRECTORY_FILES: usize = 256;

// ============================================================================
// SECTION: Path Handling
// ============================================================================

/// Resolves the config path from an explicit path, an env var, or a default.
pub(crate) fn resolve_path(
    path: Option<&Path>,
    env_var: &str,
    default_name: &str,
) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(env_var) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(default_name))
}

/// Validates a path against length limits.
pub(crate) fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Document Loading
// ============================================================================

/// Reads a file or directory into a single merged YAML document.
///
/// # Errors
///
/// Returns [`ConfigError`] when the path is invalid, unreadable, too large,
/// not UTF-8, or not valid YAML.
pub(crate) fn read_document(path: &Path) -> Result<Value, ConfigError> {
    validate_path(path)?;
    let metadata = fs::metadata(path)
        .map_err(|err| ConfigError::Io(format!("{}: {err}", path.display())))?;
    if metadata.is_dir() { read_directory(path) } else { read_file(path) }
}

/// Reads and parses one YAML file.
fn read_file(path: &Path) -> Result<Value, ConfigError> {
    let bytes =
        fs::read(path).map_err(|err| ConfigError::Io(format!("{}: {err}", path.display())))?;
    if bytes.len() > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
    }
    let content = std::str::from_utf8(&bytes)
        .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
    let value: Value = serde_yaml::from_str(content)
        .map_err(|err| ConfigError::Parse(format!("{}: {err}", path.display())))?;
    Ok(match value {
        Value::Null => Value::Mapping(Mapping::new()),
        other => other,
    })
}

/// Merges every YAML file in a directory in lexical order.
fn read_directory(path: &Path) -> Result<Value, ConfigError> {
    let entries =
        fs::read_dir(path).map_err(|err| ConfigError::Io(format!("{}: {err}", path.display())))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| ConfigError::Io(err.to_string()))?;
        let candidate = entry.path();
        if candidate.is_file() && is_yaml_file(&candidate) {
            files.push(candidate);
        }
    }
    if files.is_empty() {
        return Err(ConfigError::Invalid(format!(
            "config directory {} contains no yaml files",
            path.display()
        )));
    }
    if files.len() > MAX_DIRECTORY_FILES {
        return Err(ConfigError::Invalid(format!(
            "config directory {} exceeds {MAX_DIRECTORY_FILES} files",
            path.display()
        )));
    }
    files.sort();
    let mut merged = Value::Mapping(Mapping::new());
    for file in files {
        validate_path(&file)?;
        tracing::debug!(file = %file.display(), "merging config file");
        deep_merge(&mut merged, read_file(&file)?);
    }
    Ok(merged)
}

/// Returns true for `.yaml` and `.yml` files.
fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}

// ============================================================================
// SECTION: Merge
// ============================================================================

/// Merges `overlay` into `base`.
///
/// Mappings merge recursively; any other overlay value (scalars, sequences,
/// or a mapping replacing a non-mapping) replaces the base value.
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use serde_yaml::Value;

    use super::deep_merge;

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn merge_combines_nested_mappings() {
        let mut base = yaml("aws: {region: eu-west-1, timeout_ms: 100}\nprovider: {kind: static}");
        deep_merge(&mut base, yaml("aws: {timeout_ms: 200}"));
        assert_eq!(
            base,
            yaml("aws: {region: eu-west-1, timeout_ms: 200}\nprovider: {kind: static}")
        );
    }

    #[test]
    fn merge_replaces_sequences() {
        let mut base = yaml("groups: [a, b]");
        deep_merge(&mut base, yaml("groups: [c]"));
        assert_eq!(base, yaml("groups: [c]"));
    }

    #[test]
    fn merge_replaces_scalar_with_mapping() {
        let mut base = yaml("audit: stderr");
        deep_merge(&mut base, yaml("audit: {sink: none}"));
        assert_eq!(base, yaml("audit: {sink: none}"));
    }
}
