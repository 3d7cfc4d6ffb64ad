// crates/federation-server/src/wiring.rs
// ============================================================================
// Module: Broker Wiring
// Description: Builds the federation broker from loaded configuration.
// Purpose: Resolve the provider, AWS clients, audit sink, and timeouts once.
// Dependencies: federation-aws, federation-config, federation-core, federation-providers
// ============================================================================

//! ## Overview
//! Everything configuration-driven is resolved here at startup so a bad
//! provider kind, pattern, endpoint, or audit path stops the process before
//! the listener binds.

use std::sync::Arc;

use federation_aws::HttpSigninTokenService;
use federation_aws::StsSettings;
use federation_aws::StsTokenService;
use federation_config::AccountConfig;
use federation_config::AuditConfig;
use federation_config::AuditSinkKind;
use federation_config::AwsConfig;
use federation_config::ProxyConfig;
use federation_core::AuditSink;
use federation_core::BrokerTimeouts;
use federation_core::CredentialExchanger;
use federation_core::FederationBroker;
use federation_core::FileAuditSink;
use federation_core::NoopAuditSink;
use federation_core::PermissionProvider;
use federation_core::StderrAuditSink;
use federation_providers::ProviderFactory;

use crate::error::ServerError;

/// Builds the permission provider selected by `provider.kind`.
///
/// # Errors
///
/// Returns [`ServerError::Config`] when the kind is unknown or its options
/// are rejected.
pub fn build_provider(config: &ProxyConfig) -> Result<Arc<dyn PermissionProvider>, ServerError> {
    let factory =
        ProviderFactory::with_builtin_providers().map_err(|err| ServerError::Init(err.to_string()))?;
    factory.build(&config.provider).map_err(|err| ServerError::Config(err.to_string()))
}

/// Builds the audit sink selected by `logging.audit`.
///
/// # Errors
///
/// Returns [`ServerError::Init`] when the audit file cannot be opened.
pub fn build_audit_sink(config: &AuditConfig) -> Result<Arc<dyn AuditSink>, ServerError> {
    let sink: Arc<dyn AuditSink> = match config.sink {
        AuditSinkKind::Stderr => Arc::new(StderrAuditSink),
        AuditSinkKind::None => Arc::new(NoopAuditSink),
        AuditSinkKind::File => {
            let path = config.path.as_deref().ok_or_else(|| {
                ServerError::Config("logging.audit.path is required for the file sink".to_string())
            })?;
            let sink = FileAuditSink::new(path).map_err(|err| {
                ServerError::Init(format!("failed to open audit log {}: {err}", path.display()))
            })?;
            Arc::new(sink)
        }
    };
    Ok(sink)
}

/// Converts the AWS section into STS client settings.
#[must_use]
pub fn sts_settings(config: &AwsConfig) -> StsSettings {
    StsSettings {
        region: config.region.clone(),
        access_key: config.access_key.clone(),
        secret_key: config.secret_key.clone(),
        endpoint: config.endpoint.clone(),
    }
}

/// Returns the broker timeouts derived from configuration.
#[must_use]
pub const fn broker_timeouts(config: &ProxyConfig) -> BrokerTimeouts {
    BrokerTimeouts {
        identity: Some(config.broker.identity_timeout()),
        exchange: Some(config.aws.timeout()),
    }
}

/// Builds the broker with live AWS clients.
///
/// # Errors
///
/// Returns [`ServerError`] when any component fails to initialize.
pub async fn build_broker(
    config: &ProxyConfig,
    accounts: &AccountConfig,
) -> Result<FederationBroker, ServerError> {
    let provider = build_provider(config)?;
    let token_service = StsTokenService::connect(&sts_settings(&config.aws)).await;
    let signin = HttpSigninTokenService::new(&config.signin.endpoint, config.aws.timeout())
        .map_err(|err| ServerError::Config(err.to_string()))?;
    let exchanger =
        CredentialExchanger::new(Arc::new(token_service), Arc::new(signin), accounts.directory());
    let audit = build_audit_sink(&config.logging.audit)?;
    tracing::info!(
        provider = %config.provider.kind,
        accounts = accounts.len(),
        region = %config.aws.region,
        "federation broker ready"
    );
    FederationBroker::builder()
        .provider(provider)
        .exchanger(exchanger)
        .audit(audit)
        .timeouts(broker_timeouts(config))
        .build()
        .map_err(|err| ServerError::Init(err.to_string()))
}
