// crates/federation-providers/src/registry.rs
// ============================================================================
// Module: Provider Factory
// Description: Maps configured provider kinds to provider constructors.
// Purpose: Select the identity provider once at startup without reflection.
// Dependencies: federation-core
// ============================================================================

//! ## Overview
//! The factory resolves `provider.kind` to a constructor and builds the
//! [`PermissionProvider`] used for the lifetime of the process. Unknown kinds
//! fail at startup with a configuration error naming the kind.
//! Invariants:
//! - Kind identifiers are unique within the factory.
//! - Built-in kinds are `static`, `static_groups`, `local_groups`,
//!   `nss_groups`, `ldap`, and `host`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use federation_core::GroupPermissionProvider;
use federation_core::PermissionProvider;
use federation_core::ProviderError;

use crate::HostPermissionProvider;
use crate::LdapGroupSource;
use crate::LocalGroupSource;
use crate::NssGroupSource;
use crate::ProviderSettings;
use crate::StaticGroupSource;
use crate::StaticPermissionProvider;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Provider constructor registered under a kind identifier.
pub type ProviderConstructor =
    Box<dyn Fn(&ProviderSettings) -> Result<Arc<dyn PermissionProvider>, ProviderError> + Send + Sync>;

/// Registry of provider constructors keyed by kind.
///
/// # Invariants
/// - Kind identifiers are unique.
pub struct ProviderFactory {
    /// Constructors keyed by kind identifier.
    constructors: BTreeMap<String, ProviderConstructor>,
}

impl ProviderFactory {
    /// Creates an empty factory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Creates a factory with every built-in provider kind registered.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when a built-in kind is registered twice.
    pub fn with_builtin_providers() -> Result<Self, ProviderError> {
        let mut factory = Self::new();
        factory.register_builtin_providers()?;
        Ok(factory)
    }

    /// Registers a constructor under a kind identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Configuration`] when the kind is already registered.
    pub fn register<F>(&mut self, kind: impl Into<String>, constructor: F) -> Result<(), ProviderError>
    where
        F: Fn(&ProviderSettings) -> Result<Arc<dyn PermissionProvider>, ProviderError>
            + Send
            + Sync
            + 'static,
    {
        let kind = kind.into();
        if self.constructors.contains_key(&kind) {
            return Err(ProviderError::Configuration(format!(
                "provider kind already registered: {kind}"
            )));
        }
        self.constructors.insert(kind, Box::new(constructor));
        Ok(())
    }

    /// Registers the built-in provider kinds.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when a built-in kind is already registered.
    pub fn register_builtin_providers(&mut self) -> Result<(), ProviderError> {
        self.register("static", |settings| {
            Ok(Arc::new(StaticPermissionProvider::new(settings.decode()?)))
        })?;
        self.register("static_groups", |settings| {
            let source = StaticGroupSource::new(settings.decode()?);
            Ok(Arc::new(GroupPermissionProvider::new(source, settings.group_resolver()?)))
        })?;
        self.register("local_groups", |settings| {
            let source = LocalGroupSource::new(settings.decode()?);
            Ok(Arc::new(GroupPermissionProvider::new(source, settings.group_resolver()?)))
        })?;
        self.register("nss_groups", |settings| {
            let source = NssGroupSource::new(settings.decode()?)?;
            Ok(Arc::new(GroupPermissionProvider::new(source, settings.group_resolver()?)))
        })?;
        self.register("ldap", |settings| {
            let source = LdapGroupSource::new(settings.decode()?)?;
            Ok(Arc::new(GroupPermissionProvider::new(source, settings.group_resolver()?)))
        })?;
        self.register("host", |settings| {
            Ok(Arc::new(HostPermissionProvider::from_config(settings.decode()?)?))
        })?;
        Ok(())
    }

    /// Iterates registered kind identifiers in sorted order.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    /// Builds the provider selected by `settings.kind`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Configuration`] when the kind is missing or
    /// unknown, or when the provider rejects its options.
    pub fn build(&self, settings: &ProviderSettings) -> Result<Arc<dyn PermissionProvider>, ProviderError> {
        let kind = settings.kind.trim();
        if kind.is_empty() {
            return Err(ProviderError::Configuration(
                "no provider kind configured".to_string(),
            ));
        }
        let constructor = self.constructors.get(kind).ok_or_else(|| {
            ProviderError::Configuration(format!("unknown provider kind: {kind}"))
        })?;
        let provider = constructor(settings)?;
        tracing::info!(kind, "identity provider ready");
        Ok(provider)
    }
}

impl Default for ProviderFactory {
    fn default() -> Self {
        Self::new()
    }
}
