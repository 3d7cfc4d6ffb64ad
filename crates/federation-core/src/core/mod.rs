// crates/federation-core/src/core/mod.rs
// ============================================================================
// Module: Federation Core Types
// Description: Identifiers, permission registries, and credential values.
// Purpose: Provide stable, serializable types shared by every federation crate.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Core types are plain values: identifiers, the per-request permission
//! registry, and the credentials produced by the token service. None of them
//! perform I/O.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod credentials;
pub mod identifiers;
pub mod registry;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use credentials::ConsoleSigninUrl;
pub use credentials::Credentials;
pub use credentials::SigninSession;
pub use identifiers::AccountAlias;
pub use identifiers::AccountId;
pub use identifiers::GroupLabel;
pub use identifiers::Principal;
pub use identifiers::RoleArn;
pub use identifiers::RoleName;
pub use registry::PermissionEntry;
pub use registry::PermissionRegistry;
pub use registry::RoleGrant;
