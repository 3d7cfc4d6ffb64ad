// crates/federation-providers/src/lib.rs
// ============================================================================
// Module: Federation Providers
// Description: Identity sources and the provider factory.
// Purpose: Supply interchangeable permission providers selected at startup.
// Dependencies: federation-core, ldap3, serde, serde_yaml, tokio
// ============================================================================

//! ## Overview
//! This crate ships the built-in identity providers (static, static groups,
//! local group file, NSS groups, LDAP, and host naming) and a factory that maps the
//! configured provider kind to an implementation.
//! Invariants:
//! - Providers are selected once via [`ProviderFactory`] by kind identifier.
//! - Group-based providers always resolve through an anchored pattern.
//!
//! Security posture: directory and resolver output is untrusted input.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod fixed;
pub mod host;
pub mod ldap;
pub mod local_groups;
pub mod nss;
pub mod registry;
pub mod settings;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use fixed::StaticGroupSource;
pub use fixed::StaticGroupsConfig;
pub use fixed::StaticPermissionProvider;
pub use fixed::StaticProviderConfig;
pub use host::GetentResolver;
pub use host::HostPermissionProvider;
pub use host::HostProviderConfig;
pub use host::HostnameResolver;
pub use host::StaticHostResolver;
pub use ldap::LdapGroupSource;
pub use ldap::LdapGroupsConfig;
pub use local_groups::LocalGroupSource;
pub use local_groups::LocalGroupsConfig;
pub use nss::NssGroupSource;
pub use nss::NssGroupsConfig;
pub use registry::ProviderConstructor;
pub use registry::ProviderFactory;
pub use settings::ProviderSettings;
