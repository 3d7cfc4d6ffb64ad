// crates/federation-server/src/server.rs
// ============================================================================
// Module: Proxy Server
// Description: Router assembly and the HTTP listener loop.
// Purpose: Serve the federation routes over a shared, read-only broker.
// Dependencies: axum, tokio, federation-config, federation-core
// ============================================================================

//! ## Overview
//! [`ProxyServer`] owns the broker and the listener address. The router is
//! exposed separately through [`build_router`] so tests can serve it on an
//! ephemeral port with injected token services.
//!
//! Security posture: the only state shared across requests is the broker,
//! which holds configuration and clients but no per-request results.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use federation_config::AccountConfig;
use federation_config::ProxyConfig;
use federation_config::UserIdentificationConfig;
use federation_core::FederationBroker;
use tokio::net::TcpListener;

use crate::api;
use crate::error::ServerError;
use crate::wiring::build_broker;

// ============================================================================
// SECTION: State
// ============================================================================

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// Broker shared by all requests.
    pub broker: Arc<FederationBroker>,
    /// Principal identification settings.
    pub identification: UserIdentificationConfig,
}

/// Builds the federation router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/status", get(api::status))
        .route("/account", get(api::list_accounts))
        .route("/account/{account}/{role}", get(api::credentials_and_console))
        .route("/account/{account}/{role}/credentials", get(api::credentials))
        .route("/account/{account}/{role}/consoleurl", get(api::console_url))
        .route("/meta-data/iam/security-credentials/", get(api::metadata_role))
        .route("/meta-data/iam/security-credentials/{role}", get(api::metadata_credentials))
        .with_state(state)
}

/// Serves the router on an already-bound listener until it fails.
///
/// # Errors
///
/// Returns [`ServerError::Transport`] when the server loop fails.
pub async fn serve_listener(listener: TcpListener, router: Router) -> Result<(), ServerError> {
    axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .map_err(|err| ServerError::Transport(format!("http server failed: {err}")))
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// Federation proxy HTTP server.
pub struct ProxyServer {
    /// Listener address.
    bind: SocketAddr,
    /// Handler state.
    state: AppState,
}

impl ProxyServer {
    /// Builds the server from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when the bind address or any broker component
    /// is invalid.
    pub async fn from_config(
        config: &ProxyConfig,
        accounts: &AccountConfig,
    ) -> Result<Self, ServerError> {
        let bind = config.server.bind_addr().map_err(|err| ServerError::Config(err.to_string()))?;
        let broker = build_broker(config, accounts).await?;
        Ok(Self::new(bind, broker, config.api.user_identification.clone()))
    }

    /// Creates a server over an existing broker.
    #[must_use]
    pub fn new(
        bind: SocketAddr,
        broker: FederationBroker,
        identification: UserIdentificationConfig,
    ) -> Self {
        Self {
            bind,
            state: AppState {
                broker: Arc::new(broker),
                identification,
            },
        }
    }

    /// Overrides the listener address.
    #[must_use]
    pub fn with_bind(mut self, bind: SocketAddr) -> Self {
        self.bind = bind;
        self
    }

    /// Returns the listener address.
    #[must_use]
    pub const fn bind(&self) -> SocketAddr {
        self.bind
    }

    /// Returns the router for this server.
    #[must_use]
    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Binds the listener and serves requests until the process stops.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.bind)
            .await
            .map_err(|err| ServerError::Transport(format!("http bind failed on {}: {err}", self.bind)))?;
        tracing::info!(addr = %self.bind, "federation proxy listening");
        serve_listener(listener, self.router()).await
    }
}
