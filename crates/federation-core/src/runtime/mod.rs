// crates/federation-core/src/runtime/mod.rs
// ============================================================================
// Module: Federation Runtime
// Description: Resolution, authorization, and credential exchange engine.
// Purpose: Execute federation requests against providers and token services.
// Dependencies: crate::{core, interfaces, audit}
// ============================================================================

//! ## Overview
//! Runtime modules implement group resolution, the authorization gate, the
//! credential exchanger, and the broker that sequences them. The HTTP surface
//! and the CLI both go through [`FederationBroker`].

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod broker;
pub mod error;
pub mod exchange;
pub mod gate;
pub mod resolver;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use broker::BrokerStage;
pub use broker::BrokerTimeouts;
pub use broker::FederationBroker;
pub use broker::FederationBrokerBuilder;
pub use error::FederationError;
pub use error::PermissionDenied;
pub use exchange::AccountDirectory;
pub use exchange::CONSOLE_DESTINATION;
pub use exchange::CONSOLE_FEDERATION_URL;
pub use exchange::CredentialExchanger;
pub use exchange::build_console_url;
pub use exchange::encode_query_value;
pub use exchange::encode_signin_session;
pub use gate::AuthorizationGate;
pub use resolver::GroupPermissionProvider;
pub use resolver::GroupRegexResolver;
pub use resolver::anchor_pattern;
