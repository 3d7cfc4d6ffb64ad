// crates/federation-core/src/runtime/broker.rs
// ============================================================================
// Module: Federation Broker
// Description: Orchestrates permission resolution, authorization, and exchange.
// Purpose: Provide the single entry point used by the HTTP surface.
// Dependencies: tokio, tracing, crate::audit, crate::runtime
// ============================================================================

//! ## Overview
//! [`FederationBroker`] runs each request through the stages
//! `ResolvePermissions -> CheckPermission -> ExchangeCredentials ->
//! [BuildConsoleUrl]`, stopping at the first failure. Every permission check
//! and every exchange is recorded through the configured [`AuditSink`], and
//! every stage emits a timing trace with its arguments and outcome.
//! Invariants:
//! - No state is shared between requests; registries are resolved per call.
//! - Identity lookups and token-service calls are bounded by [`BrokerTimeouts`].
//! - Failures are never retried inside the broker.
//!
//! Security posture: denials reveal only the requested pair; credentials are
//! never logged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use crate::audit::AuditOutcome;
use crate::audit::AuditSink;
use crate::audit::AuditStep;
use crate::audit::BrokerAuditEvent;
use crate::audit::BrokerAuditEventParams;
use crate::audit::NoopAuditSink;
use crate::core::AccountAlias;
use crate::core::AccountId;
use crate::core::ConsoleSigninUrl;
use crate::core::Credentials;
use crate::core::PermissionRegistry;
use crate::core::Principal;
use crate::core::RoleName;
use crate::interfaces::PermissionProvider;
use crate::interfaces::TokenServiceError;
use crate::runtime::error::FederationError;
use crate::runtime::exchange::AccountDirectory;
use crate::runtime::exchange::CredentialExchanger;
use crate::runtime::gate::AuthorizationGate;

// ============================================================================
// SECTION: Stages and Timeouts
// ============================================================================

/// Request stage of the broker state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerStage {
    /// Identity lookup and group resolution.
    ResolvePermissions,
    /// Authorization gate evaluation.
    CheckPermission,
    /// Token-service role assumption.
    ExchangeCredentials,
    /// Sign-in token exchange and console URL construction.
    BuildConsoleUrl,
}

impl BrokerStage {
    /// Returns a stable label for traces.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ResolvePermissions => "get_accounts_and_roles",
            Self::CheckPermission => "check_user_permissions",
            Self::ExchangeCredentials => "get_aws_credentials",
            Self::BuildConsoleUrl => "get_console_url",
        }
    }
}

/// Upper bounds on the broker's blocking calls.
///
/// `None` disables the bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BrokerTimeouts {
    /// Bound on identity-source lookups.
    pub identity: Option<Duration>,
    /// Bound on token-service and sign-in calls.
    pub exchange: Option<Duration>,
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Builder for a federation broker.
#[derive(Default)]
pub struct FederationBrokerBuilder {
    /// Required permission provider.
    provider: Option<Arc<dyn PermissionProvider>>,
    /// Required credential exchanger.
    exchanger: Option<CredentialExchanger>,
    /// Audit sink; [`NoopAuditSink`] when unset.
    audit: Option<Arc<dyn AuditSink>>,
    /// Per-call deadlines; unbounded by default.
    timeouts: BrokerTimeouts,
}

impl FederationBrokerBuilder {
    /// Sets the permission provider.
    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn PermissionProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Sets the credential exchanger.
    #[must_use]
    pub fn exchanger(mut self, exchanger: CredentialExchanger) -> Self {
        self.exchanger = Some(exchanger);
        self
    }

    /// Sets the audit sink (defaults to [`NoopAuditSink`]).
    #[must_use]
    pub fn audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Sets call timeouts.
    #[must_use]
    pub const fn timeouts(mut self, timeouts: BrokerTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Builds the broker.
    ///
    /// # Errors
    ///
    /// Returns [`FederationError::Configuration`] when the provider or the
    /// exchanger is missing.
    pub fn build(self) -> Result<FederationBroker, FederationError> {
        let provider = self.provider.ok_or_else(|| {
            FederationError::Configuration("no permission provider configured".to_string())
        })?;
        let exchanger = self.exchanger.ok_or_else(|| {
            FederationError::Configuration("no credential exchanger configured".to_string())
        })?;
        Ok(FederationBroker {
            provider,
            exchanger,
            audit: self.audit.unwrap_or_else(|| Arc::new(NoopAuditSink)),
            timeouts: self.timeouts,
        })
    }
}

// ============================================================================
// SECTION: Broker
// ============================================================================

/// Composition root for authorization and credential exchange.
pub struct FederationBroker {
    /// Resolves principals into registries.
    provider: Arc<dyn PermissionProvider>,
    /// Performs role assumption and console sign-in.
    exchanger: CredentialExchanger,
    /// Receives one event per broker stage.
    audit: Arc<dyn AuditSink>,
    /// Per-call deadlines.
    timeouts: BrokerTimeouts,
}

impl FederationBroker {
    /// Returns a builder for the broker.
    #[must_use]
    pub fn builder() -> FederationBrokerBuilder {
        FederationBrokerBuilder::default()
    }

    /// Returns the configured account directory.
    #[must_use]
    pub const fn accounts(&self) -> &AccountDirectory {
        self.exchanger.accounts()
    }

    /// Returns the numeric id configured for an account alias.
    #[must_use]
    pub fn account_id(&self, account: &AccountAlias) -> Option<&AccountId> {
        self.exchanger.accounts().id(account)
    }

    /// Resolves the full permission registry for a principal.
    ///
    /// # Errors
    ///
    /// Returns [`FederationError::Configuration`] or
    /// [`FederationError::IdentitySource`] when the provider fails or times out.
    pub async fn accounts_and_roles(
        &self,
        principal: &Principal,
    ) -> Result<PermissionRegistry, FederationError> {
        let args = format!("principal={principal}");
        let (result, _) = timed(BrokerStage::ResolvePermissions, &args, async {
            let lookup = self.provider.accounts_and_roles(principal);
            let registry = match self.timeouts.identity {
                Some(limit) => tokio::time::timeout(limit, lookup).await.map_err(|_| {
                    FederationError::IdentitySource(format!(
                        "identity lookup for '{principal}' timed out after {} ms",
                        limit.as_millis()
                    ))
                })??,
                None => lookup.await?,
            };
            Ok::<_, FederationError>(registry)
        })
        .await;
        result
    }

    /// Checks whether the principal may assume `role` in `account`.
    ///
    /// Returns the audit reason of the matching grant on allow.
    ///
    /// # Errors
    ///
    /// Returns [`FederationError::Permission`] on deny, or the resolution
    /// error when the registry cannot be built.
    pub async fn check_permission(
        &self,
        principal: &Principal,
        account: &AccountAlias,
        role: &RoleName,
    ) -> Result<String, FederationError> {
        let request = AuditedRequest {
            principal,
            account,
            role,
        };
        let (result, duration_ms) = timed(BrokerStage::CheckPermission, &request.args(), async {
            let registry = self.accounts_and_roles(principal).await?;
            Ok::<_, FederationError>(AuthorizationGate::check(
                &registry, principal, account, role,
            )?)
        })
        .await;
        match &result {
            Ok(reason) => self.record(
                AuditStep::PermissionCheck,
                &request,
                AuditOutcome::Allow,
                Some(reason.clone()),
                None,
                duration_ms,
            ),
            Err(err) => {
                let outcome = if matches!(err, FederationError::Permission(_)) {
                    AuditOutcome::Deny
                } else {
                    AuditOutcome::Failure
                };
                self.record(AuditStep::PermissionCheck, &request, outcome, None, Some(err), duration_ms);
            }
        }
        result
    }

    /// Checks permission and assumes the role, returning fresh credentials.
    ///
    /// # Errors
    ///
    /// Returns the first failing stage's error: permission, configuration for
    /// an unknown account id, or upstream failures as [`FederationError::Aws`].
    pub async fn credentials(
        &self,
        principal: &Principal,
        account: &AccountAlias,
        role: &RoleName,
    ) -> Result<Credentials, FederationError> {
        self.check_permission(principal, account, role).await?;
        let request = AuditedRequest {
            principal,
            account,
            role,
        };
        let (result, duration_ms) = timed(BrokerStage::ExchangeCredentials, &request.args(), async {
            self.bounded(self.exchanger.exchange(principal, account, role)).await
        })
        .await;
        self.record_completion(AuditStep::CredentialExchange, &request, result.as_ref().err(), duration_ms);
        result
    }

    /// Checks permission, assumes the role and converts the credentials into
    /// a console sign-in URL.
    ///
    /// # Errors
    ///
    /// Same as [`FederationBroker::credentials`], plus sign-in failures as
    /// [`FederationError::Aws`].
    pub async fn console_url(
        &self,
        principal: &Principal,
        account: &AccountAlias,
        role: &RoleName,
        callback_url: &str,
    ) -> Result<ConsoleSigninUrl, FederationError> {
        let (_, url) =
            self.credentials_with_console(principal, account, role, callback_url).await?;
        Ok(url)
    }

    /// Returns both the credentials and the console URL for one exchange.
    ///
    /// # Errors
    ///
    /// Same as [`FederationBroker::console_url`].
    pub async fn credentials_with_console(
        &self,
        principal: &Principal,
        account: &AccountAlias,
        role: &RoleName,
        callback_url: &str,
    ) -> Result<(Credentials, ConsoleSigninUrl), FederationError> {
        let credentials = self.credentials(principal, account, role).await?;
        let request = AuditedRequest {
            principal,
            account,
            role,
        };
        let (result, duration_ms) = timed(BrokerStage::BuildConsoleUrl, &request.args(), async {
            self.bounded(self.exchanger.console_url(&credentials, callback_url)).await
        })
        .await;
        self.record_completion(AuditStep::ConsoleUrl, &request, result.as_ref().err(), duration_ms);
        Ok((credentials, result?))
    }

    /// Applies the exchange timeout to an upstream call.
    async fn bounded<T, F>(&self, call: F) -> Result<T, FederationError>
    where
        F: Future<Output = Result<T, FederationError>>,
    {
        match self.timeouts.exchange {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                FederationError::Aws(TokenServiceError::transport(format!(
                    "token service call timed out after {} ms",
                    limit.as_millis()
                )))
            })?,
            None => call.await,
        }
    }

    /// Emits a success or failure event for an exchange stage.
    fn record_completion(
        &self,
        step: AuditStep,
        request: &AuditedRequest<'_>,
        error: Option<&FederationError>,
        duration_ms: u128,
    ) {
        let outcome = if error.is_some() { AuditOutcome::Failure } else { AuditOutcome::Success };
        self.record(step, request, outcome, None, error, duration_ms);
    }

    /// Emits one audit event for a finished stage.
    fn record(
        &self,
        step: AuditStep,
        request: &AuditedRequest<'_>,
        outcome: AuditOutcome,
        reason: Option<String>,
        error: Option<&FederationError>,
        duration_ms: u128,
    ) {
        self.audit.record(&BrokerAuditEvent::new(BrokerAuditEventParams {
            step,
            principal: request.principal.clone(),
            account: request.account.clone(),
            role: request.role.clone(),
            outcome,
            reason,
            error_kind: error.map(FederationError::kind),
            message: error.map(ToString::to_string),
            duration_ms,
        }));
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Request identity shared by the audit events of one call.
struct AuditedRequest<'a> {
    /// Requesting principal.
    principal: &'a Principal,
    /// Requested account alias.
    account: &'a AccountAlias,
    /// Requested role.
    role: &'a RoleName,
}

impl AuditedRequest<'_> {
    /// Renders the request for timing trace lines.
    fn args(&self) -> String {
        format!("principal={} account={} role={}", self.principal, self.account, self.role)
    }
}

/// Runs a stage and emits a timing trace with its arguments and outcome.
async fn timed<T, F>(stage: BrokerStage, args: &str, call: F) -> (Result<T, FederationError>, u128)
where
    F: Future<Output = Result<T, FederationError>>,
{
    let started = Instant::now();
    let result = call.await;
    let elapsed = started.elapsed().as_millis();
    let elapsed_ms = u64::try_from(elapsed).unwrap_or(u64::MAX);
    match &result {
        Ok(_) => tracing::info!(
            operation = stage.as_str(),
            args,
            elapsed_ms,
            outcome = "ok",
            "broker call finished"
        ),
        Err(err) => tracing::warn!(
            operation = stage.as_str(),
            args,
            elapsed_ms,
            outcome = err.kind(),
            error = %err,
            "broker call failed"
        ),
    }
    (result, elapsed)
}
