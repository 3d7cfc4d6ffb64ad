// crates/federation-server/src/api.rs
// ============================================================================
// Module: HTTP Handlers
// Description: Account listing, credential, console URL, and metadata routes.
// Purpose: Translate HTTP requests into broker calls and broker results into
//          responses.
// Dependencies: axum, serde, serde_json, time, federation-core
// ============================================================================

//! ## Overview
//! Every handler resolves the principal first, runs one broker operation,
//! and stamps the response with `X-Username`, success or failure. The header
//! falls back to `Unknown User` when no principal could be resolved.
//!
//! Security posture: the principal header is trusted only because an
//! authenticating front end is expected to set it; peers reaching the proxy
//! directly can impersonate anyone when `source: header` is configured.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::net::SocketAddr;

use axum::Json;
use axum::extract::ConnectInfo;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::HeaderValue;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::response::Response;
use federation_config::PrincipalSource;
use federation_core::AccountAlias;
use federation_core::AccountId;
use federation_core::Credentials;
use federation_core::FederationError;
use federation_core::PermissionRegistry;
use federation_core::Principal;
use federation_core::RoleName;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

use crate::error::ApiError;
use crate::server::AppState;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Response header carrying the resolved principal.
pub const USERNAME_HEADER: &str = "x-username";
/// Header value used when the principal is unknown.
pub const UNKNOWN_USER: &str = "Unknown User";
/// Synthetic principal used by the status route.
pub const MONITORING_PRINCIPAL: &str = "monitoring";

/// Content type for plain-text responses.
const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

// ============================================================================
// SECTION: Response Documents
// ============================================================================

/// Credentials document returned by credential routes.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CredentialsDocument {
    /// Always `Success`.
    pub code: &'static str,
    /// Always `AWS-HMAC`.
    #[serde(rename = "Type")]
    pub kind: &'static str,
    /// Access key identifier.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
    /// Session token.
    pub token: String,
    /// Credential expiration (RFC 3339).
    pub expiration: String,
    /// Time the document was produced (UTC, second precision).
    pub last_updated: String,
    /// Console sign-in URL, present on the combined route.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub console_url: Option<String>,
}

impl CredentialsDocument {
    /// Builds the document from credentials, stamping `LastUpdated` now.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when a timestamp cannot be formatted.
    pub fn new(credentials: &Credentials) -> Result<Self, ApiError> {
        let expiration = credentials
            .expiration
            .format(&Rfc3339)
            .map_err(|err| ApiError::internal(format!("failed to format expiration: {err}")))?;
        let last_updated = OffsetDateTime::now_utc()
            .format(format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z"))
            .map_err(|err| ApiError::internal(format!("failed to format timestamp: {err}")))?;
        Ok(Self {
            code: "Success",
            kind: "AWS-HMAC",
            access_key_id: credentials.access_key_id.clone(),
            secret_access_key: credentials.secret_access_key.clone(),
            token: credentials.session_token.clone(),
            expiration,
            last_updated,
            console_url: None,
        })
    }
}

/// Query parameters accepted by console routes.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    /// Issuer URL embedded in the console login URL.
    #[serde(default)]
    pub callbackurl: String,
}

// ============================================================================
// SECTION: Principal Resolution
// ============================================================================

/// Resolves the principal for a request from the configured source.
///
/// # Errors
///
/// Returns an internal [`ApiError`] naming the missing header.
pub fn resolve_principal(
    state: &AppState,
    headers: &HeaderMap,
    peer: SocketAddr,
) -> Result<Principal, ApiError> {
    let identification = &state.identification;
    match identification.source {
        PrincipalSource::PeerIp => Ok(Principal::new(peer.ip().to_string())),
        PrincipalSource::Header => headers
            .get(identification.header.as_str())
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(Principal::new)
            .ok_or_else(|| ApiError::internal(format!("No {} specified", identification.header))),
    }
}

/// Stamps the response with the principal header.
fn with_username(principal: Option<&Principal>, result: Result<Response, ApiError>) -> Response {
    let mut response = match result {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(
                principal = principal.map_or(UNKNOWN_USER, Principal::as_str),
                status = err.status.as_u16(),
                message = %err.message,
                "request failed"
            );
            err.into_response()
        }
    };
    let value = principal
        .and_then(|principal| HeaderValue::from_str(principal.as_str()).ok())
        .unwrap_or_else(|| HeaderValue::from_static(UNKNOWN_USER));
    response.headers_mut().insert(USERNAME_HEADER, value);
    response
}

/// Runs a handler body for the request principal and stamps the response.
async fn respond<F, Fut>(state: &AppState, headers: &HeaderMap, peer: SocketAddr, body: F) -> Response
where
    F: FnOnce(Principal) -> Fut,
    Fut: Future<Output = Result<Response, ApiError>>,
{
    match resolve_principal(state, headers, peer) {
        Ok(principal) => {
            let result = body(principal.clone()).await;
            with_username(Some(&principal), result)
        }
        Err(err) => with_username(None, Err(err)),
    }
}

/// Builds a plain-text response.
fn text_response(body: String) -> Response {
    ([(CONTENT_TYPE, TEXT_PLAIN)], body).into_response()
}

// ============================================================================
// SECTION: Account Listing
// ============================================================================

/// Renders the registry as `{account: [roles]}` or, with ids, as
/// `{account: {"id": <id or null>, "roles": [roles]}}`.
pub fn account_listing(
    registry: &PermissionRegistry,
    with_ids: bool,
    lookup: impl Fn(&AccountAlias) -> Option<AccountId>,
) -> Value {
    let mut listing = serde_json::Map::new();
    for account in registry.accounts() {
        let roles: Vec<&str> =
            registry.role_names(account).into_iter().map(RoleName::as_str).collect();
        let entry = if with_ids {
            json!({
                "id": lookup(account).map(|id| id.as_str().to_string()),
                "roles": roles,
            })
        } else {
            json!(roles)
        };
        listing.insert(account.as_str().to_string(), entry);
    }
    Value::Object(listing)
}

/// Returns the only account and role in the registry.
///
/// # Errors
///
/// Returns [`FederationError::Configuration`] unless the registry holds
/// exactly one account with exactly one role.
pub fn single_account_role(
    registry: &PermissionRegistry,
) -> Result<(AccountAlias, RoleName), FederationError> {
    let mut accounts = registry.accounts();
    let (Some(account), None) = (accounts.next(), accounts.next()) else {
        return Err(FederationError::Configuration(format!(
            "Did not get exactly one account: {}",
            account_listing(registry, false, |_| None)
        )));
    };
    let roles = registry.role_names(account);
    let mut iter = roles.iter();
    let (Some(role), None) = (iter.next(), iter.next()) else {
        return Err(FederationError::Configuration(format!(
            "Did not get exactly one role: {}",
            account_listing(registry, false, |_| None)
        )));
    };
    Ok((account.clone(), (*role).clone()))
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// `GET /status`
pub async fn status() -> Response {
    let principal = Principal::new(MONITORING_PRINCIPAL);
    with_username(Some(&principal), Ok(Json(json!({"status": "200", "message": "OK"})).into_response()))
}

/// `GET /account[?withid]`
pub async fn list_accounts(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Query(query): Query<BTreeMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let with_ids = query.contains_key("withid");
    let broker = &state.broker;
    respond(&state, &headers, peer, |principal| async move {
        let registry = broker.accounts_and_roles(&principal).await?;
        let listing = account_listing(&registry, with_ids, |alias| broker.account_id(alias).cloned());
        Ok::<_, ApiError>(Json(listing).into_response())
    })
    .await
}

/// `GET /account/{account}/{role}`
pub async fn credentials_and_console(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Path((account, role)): Path<(String, String)>,
    Query(query): Query<CallbackQuery>,
    headers: HeaderMap,
) -> Response {
    let broker = &state.broker;
    respond(&state, &headers, peer, |principal| async move {
        let (credentials, url) = broker
            .credentials_with_console(
                &principal,
                &AccountAlias::new(account),
                &RoleName::new(role),
                &query.callbackurl,
            )
            .await?;
        let mut document = CredentialsDocument::new(&credentials)?;
        document.console_url = Some(url.into_string());
        Ok::<_, ApiError>(Json(document).into_response())
    })
    .await
}

/// `GET /account/{account}/{role}/credentials`
pub async fn credentials(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Path((account, role)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let broker = &state.broker;
    respond(&state, &headers, peer, |principal| async move {
        let credentials = broker
            .credentials(&principal, &AccountAlias::new(account), &RoleName::new(role))
            .await?;
        Ok::<_, ApiError>(Json(CredentialsDocument::new(&credentials)?).into_response())
    })
    .await
}

/// `GET /account/{account}/{role}/consoleurl`
pub async fn console_url(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Path((account, role)): Path<(String, String)>,
    Query(query): Query<CallbackQuery>,
    headers: HeaderMap,
) -> Response {
    let broker = &state.broker;
    respond(&state, &headers, peer, |principal| async move {
        let url = broker
            .console_url(
                &principal,
                &AccountAlias::new(account),
                &RoleName::new(role),
                &query.callbackurl,
            )
            .await?;
        Ok::<_, ApiError>(text_response(url.into_string()))
    })
    .await
}

/// `GET /meta-data/iam/security-credentials/`
///
/// Returns the single permitted role name, or an empty body when the
/// exchange for it is denied.
pub async fn metadata_role(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Response {
    let broker = &state.broker;
    respond(&state, &headers, peer, |principal| async move {
        let registry = broker.accounts_and_roles(&principal).await?;
        let (account, role) = single_account_role(&registry)?;
        match broker.credentials(&principal, &account, &role).await {
            Ok(_) => Ok::<_, ApiError>(text_response(role.as_str().to_string())),
            Err(FederationError::Permission(_)) => Ok(text_response(String::new())),
            Err(err) => Err(err.into()),
        }
    })
    .await
}

/// `GET /meta-data/iam/security-credentials/{role}`
pub async fn metadata_credentials(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Path(role): Path<String>,
    headers: HeaderMap,
) -> Response {
    let broker = &state.broker;
    respond(&state, &headers, peer, |principal| async move {
        let registry = broker.accounts_and_roles(&principal).await?;
        let (account, _) = single_account_role(&registry)?;
        let credentials = broker.credentials(&principal, &account, &RoleName::new(role)).await?;
        Ok::<_, ApiError>(Json(CredentialsDocument::new(&credentials)?).into_response())
    })
    .await
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use federation_core::PermissionEntry;
    use federation_core::PermissionRegistry;
    use serde_json::json;

    use super::account_listing;
    use super::single_account_role;

    fn registry(entries: &[(&str, &str, &str)]) -> PermissionRegistry {
        entries
            .iter()
            .map(|(account, role, reason)| PermissionEntry::new(*account, *role, *reason))
            .collect()
    }

    #[test]
    fn listing_dedups_roles_across_reasons() {
        let registry = registry(&[("prod", "admin", "a"), ("prod", "admin", "b"), ("prod", "ro", "c")]);
        assert_eq!(account_listing(&registry, false, |_| None), json!({"prod": ["admin", "ro"]}));
    }

    #[test]
    fn listing_with_ids_reports_missing_ids_as_null() {
        let registry = registry(&[("prod", "admin", "a")]);
        assert_eq!(
            account_listing(&registry, true, |_| None),
            json!({"prod": {"id": null, "roles": ["admin"]}})
        );
    }

    #[test]
    fn single_account_role_requires_exactly_one() {
        let one = registry(&[("prod", "admin", "a"), ("prod", "admin", "b")]);
        let (account, role) = single_account_role(&one).unwrap();
        assert_eq!((account.as_str(), role.as_str()), ("prod", "admin"));

        let two_roles = registry(&[("prod", "admin", "a"), ("prod", "ro", "b")]);
        assert!(single_account_role(&two_roles).unwrap_err().to_string().contains("exactly one role"));

        let two_accounts = registry(&[("prod", "admin", "a"), ("dev", "admin", "b")]);
        assert!(
            single_account_role(&two_accounts).unwrap_err().to_string().contains("exactly one account")
        );

        let none = PermissionRegistry::empty();
        assert!(single_account_role(&none).is_err());
    }
}
