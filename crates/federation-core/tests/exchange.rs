// crates/federation-core/tests/exchange.rs
// ============================================================================
// Module: Credential Exchanger Tests
// Description: Role ARN construction, session naming, and console URLs.
// ============================================================================
//! ## Overview
//! Drives the exchanger with recording token and sign-in services to verify
//! the request sent upstream and the exact console URL shape.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::sync::Arc;
use std::sync::Mutex;

use federation_core::AccountAlias;
use federation_core::AccountDirectory;
use federation_core::AccountId;
use federation_core::AssumeRoleRequest;
use federation_core::CredentialExchanger;
use federation_core::Credentials;
use federation_core::FederationError;
use federation_core::Principal;
use federation_core::RoleName;
use federation_core::SigninTokenService;
use federation_core::TokenService;
use federation_core::TokenServiceError;
use federation_core::runtime::build_console_url;
use federation_core::runtime::encode_query_value;
use federation_core::runtime::encode_signin_session;
use time::macros::datetime;

fn fixed_credentials() -> Credentials {
    Credentials {
        access_key_id: "ASIAEXAMPLE".to_string(),
        secret_access_key: "secret/key+value".to_string(),
        session_token: "token=".to_string(),
        expiration: datetime!(2030-01-01 12:00:00 UTC),
    }
}

#[derive(Default)]
struct RecordingTokenService {
    requests: Mutex<Vec<AssumeRoleRequest>>,
}

#[async_trait::async_trait]
impl TokenService for RecordingTokenService {
    async fn assume_role(
        &self,
        request: &AssumeRoleRequest,
    ) -> Result<Credentials, TokenServiceError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(fixed_credentials())
    }
}

struct RejectingTokenService;

#[async_trait::async_trait]
impl TokenService for RejectingTokenService {
    async fn assume_role(
        &self,
        _request: &AssumeRoleRequest,
    ) -> Result<Credentials, TokenServiceError> {
        Err(TokenServiceError::upstream(403, "AccessDenied"))
    }
}

#[derive(Default)]
struct RecordingSignin {
    sessions: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl SigninTokenService for RecordingSignin {
    async fn signin_token(&self, encoded_session: &str) -> Result<String, TokenServiceError> {
        self.sessions.lock().unwrap().push(encoded_session.to_string());
        Ok("SIGNINTOKEN".to_string())
    }
}

struct FailingSignin;

#[async_trait::async_trait]
impl SigninTokenService for FailingSignin {
    async fn signin_token(&self, _encoded_session: &str) -> Result<String, TokenServiceError> {
        Err(TokenServiceError::upstream(400, "Bad Request"))
    }
}

fn directory() -> AccountDirectory {
    [(AccountAlias::from("testaccount"), AccountId::parse("123456789").unwrap())]
        .into_iter()
        .collect()
}

#[tokio::test]
async fn exchange_builds_arn_and_uses_principal_as_session_name() {
    let tokens = Arc::new(RecordingTokenService::default());
    let exchanger =
        CredentialExchanger::new(tokens.clone(), Arc::new(RecordingSignin::default()), directory());

    let credentials = exchanger
        .exchange(
            &Principal::from("mmustermann"),
            &AccountAlias::from("testaccount"),
            &RoleName::from("role"),
        )
        .await
        .unwrap();

    assert_eq!(credentials, fixed_credentials());
    let requests = tokens.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].role_arn.as_str(), "arn:aws:iam::123456789:role/role");
    assert_eq!(requests[0].session_name, "mmustermann");
}

#[tokio::test]
async fn unknown_account_alias_is_a_configuration_error() {
    let tokens = Arc::new(RecordingTokenService::default());
    let exchanger =
        CredentialExchanger::new(tokens.clone(), Arc::new(RecordingSignin::default()), directory());

    let err = exchanger
        .exchange(
            &Principal::from("mmustermann"),
            &AccountAlias::from("unconfigured-alias"),
            &RoleName::from("role"),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, FederationError::Configuration(ref message) if message.contains("unconfigured-alias")));
    assert!(tokens.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn upstream_rejection_is_an_aws_error() {
    let exchanger = CredentialExchanger::new(
        Arc::new(RejectingTokenService),
        Arc::new(RecordingSignin::default()),
        directory(),
    );
    let err = exchanger
        .exchange(
            &Principal::from("mmustermann"),
            &AccountAlias::from("testaccount"),
            &RoleName::from("role"),
        )
        .await
        .unwrap_err();
    match err {
        FederationError::Aws(inner) => {
            assert_eq!(inner.status, Some(403));
            assert_eq!(inner.message, "AccessDenied");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn signin_session_is_json_with_three_keys_form_encoded() {
    let encoded = encode_signin_session(&fixed_credentials()).unwrap();
    assert_eq!(
        encoded,
        "%7B%22sessionId%22%3A%22ASIAEXAMPLE%22%2C%22sessionKey%22%3A%22secret%2Fkey%2Bvalue%22%2C\
         %22sessionToken%22%3A%22token%3D%22%7D"
    );
}

#[tokio::test]
async fn console_url_matches_template() {
    let signin = Arc::new(RecordingSignin::default());
    let exchanger = CredentialExchanger::new(
        Arc::new(RecordingTokenService::default()),
        signin.clone(),
        directory(),
    );

    let url = exchanger
        .console_url(&fixed_credentials(), "https://portal.example.com/logout?next=/")
        .await
        .unwrap();

    assert_eq!(
        url.as_str(),
        "https://signin.aws.amazon.com/federation?Action=login\
         &Issuer=https%3A%2F%2Fportal.example.com%2Flogout%3Fnext%3D%2F\
         &Destination=https%3A%2F%2Fconsole.aws.amazon.com%2F\
         &SigninToken=SIGNINTOKEN"
    );
    let sessions = signin.sessions.lock().unwrap();
    assert_eq!(sessions.as_slice(), [encode_signin_session(&fixed_credentials()).unwrap()]);
}

#[test]
fn console_url_encodes_reserved_callback_bytes() {
    let url = build_console_url("TOKEN", "https://portal.example.com/a b*~!");
    assert_eq!(
        url.as_str(),
        "https://signin.aws.amazon.com/federation?Action=login\
         &Issuer=https%3A%2F%2Fportal.example.com%2Fa+b%2A%7E%21\
         &Destination=https%3A%2F%2Fconsole.aws.amazon.com%2F\
         &SigninToken=TOKEN"
    );
    assert_eq!(encode_query_value("a*b*"), "a%2Ab%2A");
    assert_eq!(encode_query_value("-._"), "-._");
}

#[tokio::test]
async fn signin_failure_carries_status_and_reason() {
    let exchanger = CredentialExchanger::new(
        Arc::new(RecordingTokenService::default()),
        Arc::new(FailingSignin),
        directory(),
    );
    let err = exchanger.console_url(&fixed_credentials(), "").await.unwrap_err();
    assert!(matches!(err, FederationError::Aws(_)));
    assert_eq!(err.to_string(), "Error 400 Bad Request");
}

#[test]
fn credentials_debug_redacts_secrets() {
    let rendered = format!("{:?}", fixed_credentials());
    assert!(rendered.contains("ASIAEXAMPLE"));
    assert!(!rendered.contains("secret/key+value"));
    assert!(!rendered.contains("token="));
}
