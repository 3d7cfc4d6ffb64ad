// crates/federation-core/src/audit.rs
// ============================================================================
// Module: Federation Audit Logging
// Description: Structured audit events for authorization and exchange steps.
// Purpose: Make every allow/deny and credential exchange reconstructable.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Audit events are emitted by the broker for each permission check, each
//! credential exchange, and each console URL request. Sinks write one JSON
//! object per line and are shared across concurrent requests.
//!
//! Security posture: events carry identifiers and reasons only; credential
//! material is never part of an event.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::core::AccountAlias;
use crate::core::Principal;
use crate::core::RoleName;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Audited broker step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStep {
    /// Authorization gate evaluation.
    PermissionCheck,
    /// Token-service role assumption.
    CredentialExchange,
    /// Console sign-in URL construction.
    ConsoleUrl,
}

impl AuditStep {
    /// Returns the event identifier for the step.
    #[must_use]
    pub const fn event_name(self) -> &'static str {
        match self {
            Self::PermissionCheck => "permission_check",
            Self::CredentialExchange => "credential_exchange",
            Self::ConsoleUrl => "console_url",
        }
    }
}

/// Outcome recorded for an audited step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// Permission check allowed the request.
    Allow,
    /// Permission check denied the request.
    Deny,
    /// Exchange step completed.
    Success,
    /// Step failed before completing.
    Failure,
}

/// Broker audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct BrokerAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Principal that made the request.
    pub principal: Principal,
    /// Requested account alias.
    pub account: AccountAlias,
    /// Requested role.
    pub role: RoleName,
    /// Step outcome.
    pub outcome: AuditOutcome,
    /// Allow reason when the gate permitted the request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Error kind label on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    /// Error message on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Step duration in milliseconds.
    pub duration_ms: u128,
}

/// Inputs required to construct a broker audit event.
pub struct BrokerAuditEventParams {
    /// Audited step.
    pub step: AuditStep,
    /// Principal that made the request.
    pub principal: Principal,
    /// Requested account alias.
    pub account: AccountAlias,
    /// Requested role.
    pub role: RoleName,
    /// Step outcome.
    pub outcome: AuditOutcome,
    /// Allow reason when present.
    pub reason: Option<String>,
    /// Error kind label on failure.
    pub error_kind: Option<&'static str>,
    /// Error message on failure.
    pub message: Option<String>,
    /// Step duration in milliseconds.
    pub duration_ms: u128,
}

impl BrokerAuditEvent {
    /// Creates a new audit event with a consistent timestamp.
    #[must_use]
    pub fn new(params: BrokerAuditEventParams) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: params.step.event_name(),
            timestamp_ms,
            principal: params.principal,
            account: params.account,
            role: params.role,
            outcome: params.outcome,
            reason: params.reason,
            error_kind: params.error_kind,
            message: params.message,
            duration_ms: params.duration_ms,
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink for broker events.
pub trait AuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &BrokerAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, event: &BrokerAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, event: &BrokerAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &BrokerAuditEvent) {}
}
