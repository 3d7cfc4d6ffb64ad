// crates/federation-core/src/lib.rs
// ============================================================================
// Module: Federation Core Library
// Description: Public API surface for the federation broker core.
// Purpose: Expose core types, interfaces, audit sinks, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime, audit}
// ============================================================================

//! ## Overview
//! Federation core decides which cloud accounts and roles a principal may
//! assume and exchanges an allowed request for short-lived credentials and a
//! console sign-in URL. Identity backends and the token service plug in
//! through explicit interfaces; this crate performs no network I/O itself.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use audit::AuditOutcome;
pub use audit::AuditSink;
pub use audit::AuditStep;
pub use audit::BrokerAuditEvent;
pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use interfaces::AssumeRoleRequest;
pub use interfaces::IdentityGroupSource;
pub use interfaces::PermissionProvider;
pub use interfaces::ProviderError;
pub use interfaces::SigninTokenService;
pub use interfaces::TokenService;
pub use interfaces::TokenServiceError;
pub use runtime::AccountDirectory;
pub use runtime::AuthorizationGate;
pub use runtime::BrokerTimeouts;
pub use runtime::CredentialExchanger;
pub use runtime::FederationBroker;
pub use runtime::FederationError;
pub use runtime::GroupPermissionProvider;
pub use runtime::GroupRegexResolver;
pub use runtime::PermissionDenied;
pub use runtime::anchor_pattern;
