// crates/federation-server/src/lib.rs
// ============================================================================
// Module: Federation Server Library
// Description: HTTP surface and startup wiring for the federation proxy.
// Purpose: Expose the broker over HTTP with stable status mapping.
// Dependencies: axum, tracing-subscriber, federation-*
// ============================================================================

//! ## Overview
//! `federation-server` wires configuration into a
//! [`federation_core::FederationBroker`] and serves it over HTTP. The
//! `federation-proxy` binary in this crate is a thin command-line front end
//! over the same functions.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod api;
pub mod error;
pub mod observability;
pub mod server;
pub mod wiring;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use api::CredentialsDocument;
pub use api::MONITORING_PRINCIPAL;
pub use api::UNKNOWN_USER;
pub use api::USERNAME_HEADER;
pub use error::ApiError;
pub use error::ServerError;
pub use observability::init_tracing;
pub use server::AppState;
pub use server::ProxyServer;
pub use server::build_router;
pub use server::serve_listener;
pub use wiring::build_audit_sink;
pub use wiring::build_broker;
pub use wiring::build_provider;
