// crates/federation-config/src/lib.rs
// ============================================================================
// Module: Federation Config Library
// Description: Proxy and account configuration for the federation proxy.
// Purpose: Single source of truth for config file semantics.
// Dependencies: federation-core, federation-providers, serde, serde_yaml
// ============================================================================

//! ## Overview
//! `federation-config` loads the two YAML documents the proxy needs: the proxy
//! configuration (provider, AWS identity, HTTP surface, logging) and the
//! account alias table. Either may be a single file or a directory of files
//! merged in lexical order. Validation is strict and fails closed.
//!
//! Security posture: config inputs are untrusted; limits on path length, file
//! size, and encoding are enforced before parsing.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod accounts;
pub mod config;
pub mod source;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use accounts::AccountConfig;
pub use config::*;
pub use source::deep_merge;
