// crates/federation-providers/src/settings.rs
// ============================================================================
// Module: Provider Settings
// Description: Provider selector plus provider-specific options.
// Purpose: Carry the `provider` configuration section into the factory.
// Dependencies: serde, serde_yaml, federation-core
// ============================================================================

//! ## Overview
//! [`ProviderSettings`] holds the provider `kind`, the optional group `regex`,
//! and every other key of the section as raw YAML. Each provider decodes the
//! raw options into its own strongly typed config and rejects unknown keys.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use federation_core::FederationError;
use federation_core::GroupRegexResolver;
use federation_core::ProviderError;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Provider section of the proxy configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Provider selector.
    #[serde(default)]
    pub kind: String,
    /// Group pattern with `account` and `role` captures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    /// Provider-specific options.
    #[serde(flatten)]
    pub options: BTreeMap<String, serde_yaml::Value>,
}

impl ProviderSettings {
    /// Creates settings for a provider kind without options.
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            regex: None,
            options: BTreeMap::new(),
        }
    }

    /// Sets the group pattern.
    #[must_use]
    pub fn with_regex(mut self, regex: impl Into<String>) -> Self {
        self.regex = Some(regex.into());
        self
    }

    /// Adds a provider-specific option.
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: serde_yaml::Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    /// Decodes provider-specific options into a typed config.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Configuration`] when the options do not match
    /// the provider's schema.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, ProviderError> {
        let value = serde_yaml::to_value(&self.options).map_err(|err| {
            ProviderError::Configuration(format!("invalid {} provider options: {err}", self.kind))
        })?;
        serde_yaml::from_value(value).map_err(|err| {
            ProviderError::Configuration(format!("invalid {} provider options: {err}", self.kind))
        })
    }

    /// Compiles the group pattern required by group-based providers.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Configuration`] when `regex` is missing or invalid.
    pub fn group_resolver(&self) -> Result<GroupRegexResolver, ProviderError> {
        let pattern = self.regex.as_deref().ok_or_else(|| {
            ProviderError::Configuration(format!("{} provider requires a regex", self.kind))
        })?;
        GroupRegexResolver::new(pattern).map_err(|err| match err {
            FederationError::Configuration(message) => ProviderError::Configuration(message),
            other => ProviderError::Configuration(other.to_string()),
        })
    }
}
