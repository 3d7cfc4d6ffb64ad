// crates/federation-config/src/accounts.rs
// ============================================================================
// Module: Account Configuration
// Description: Account alias to numeric account id table.
// Purpose: Load the alias table consumed by the credential exchanger.
// Dependencies: federation-core, serde, serde_yaml
// ============================================================================

//! ## Overview
//! The account document maps each alias to an entry with an `id`:
//!
//! ```yaml
//! prod:
//!   id: "123456789012"
//! dev:
//!   id: 210987654321
//! ```
//!
//! Ids may be written as strings or integers but must be all digits. Extra
//! keys in an entry are ignored.

use std::collections::BTreeMap;
use std::path::Path;

use federation_core::AccountAlias;
use federation_core::AccountDirectory;
use federation_core::AccountId;
use serde::Deserialize;

use crate::config::ConfigError;
use crate::source::read_document;
use crate::source::resolve_path;

/// Default account config filename when no path is specified.
pub const DEFAULT_ACCOUNT_CONFIG_NAME: &str = "accounts.yaml";
/// Environment variable naming the account configuration path.
pub const ACCOUNT_CONFIG_ENV_VAR: &str = "FEDERATION_PROXY_ACCOUNT_CONFIG";

/// Raw entry as written in YAML.
#[derive(Deserialize)]
struct RawAccountEntry {
    /// Account id as text or integer.
    id: RawAccountId,
}

/// Account id accepted as a YAML integer or string.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawAccountId {
    /// Unquoted integer id.
    Number(u64),
    /// Quoted id.
    Text(String),
}

/// Validated alias to id table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountConfig {
    /// Ids keyed by alias.
    accounts: BTreeMap<AccountAlias, AccountId>,
}

impl AccountConfig {
    /// Loads the account table from disk.
    ///
    /// Resolution order: explicit `path`, then
    /// `FEDERATION_PROXY_ACCOUNT_CONFIG`, then `accounts.yaml`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path, ACCOUNT_CONFIG_ENV_VAR, DEFAULT_ACCOUNT_CONFIG_NAME)?;
        let config = Self::from_value(read_document(&resolved)?)?;
        tracing::debug!(path = %resolved.display(), accounts = config.len(), "account config loaded");
        Ok(config)
    }

    /// Parses the account table from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let value: serde_yaml::Value =
            serde_yaml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        Self::from_value(value)
    }

    /// Validates the account table from a merged document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for a malformed document and
    /// [`ConfigError::Invalid`] for empty aliases or non-numeric ids.
    pub fn from_value(value: serde_yaml::Value) -> Result<Self, ConfigError> {
        let raw: BTreeMap<String, RawAccountEntry> = match value {
            serde_yaml::Value::Null => BTreeMap::new(),
            other => {
                serde_yaml::from_value(other).map_err(|err| ConfigError::Parse(err.to_string()))?
            }
        };
        let mut accounts = BTreeMap::new();
        for (alias, entry) in raw {
            if alias.trim().is_empty() {
                return Err(ConfigError::Invalid("account alias must be non-empty".to_string()));
            }
            let text = match entry.id {
                RawAccountId::Number(number) => number.to_string(),
                RawAccountId::Text(text) => text,
            };
            let id = AccountId::parse(&text).ok_or_else(|| {
                ConfigError::Invalid(format!("account {alias} has a non-numeric id: {text}"))
            })?;
            accounts.insert(AccountAlias::new(alias), id);
        }
        Ok(Self {
            accounts,
        })
    }

    /// Returns the id configured for an alias.
    #[must_use]
    pub fn id(&self, alias: &AccountAlias) -> Option<&AccountId> {
        self.accounts.get(alias)
    }

    /// Returns the number of configured accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Returns true when no accounts are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Iterates aliases and ids in alias order.
    pub fn iter(&self) -> impl Iterator<Item = (&AccountAlias, &AccountId)> {
        self.accounts.iter()
    }

    /// Builds the exchanger's account directory.
    #[must_use]
    pub fn directory(&self) -> AccountDirectory {
        AccountDirectory::new(self.accounts.clone())
    }
}
