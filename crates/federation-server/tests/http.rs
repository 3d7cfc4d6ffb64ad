// crates/federation-server/tests/http.rs
// ============================================================================
// Module: HTTP Surface Tests
// Description: Routes, status mapping, and principal headers over real sockets.
// ============================================================================
//! ## Overview
//! Serves the router on an ephemeral loopback port with a configured
//! `static_groups` provider and in-memory token services, then drives it with
//! `reqwest`.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::sync::Arc;
use std::sync::Mutex;

use federation_config::AccountConfig;
use federation_config::PrincipalSource;
use federation_config::ProxyConfig;
use federation_config::UserIdentificationConfig;
use federation_core::AssumeRoleRequest;
use federation_core::CredentialExchanger;
use federation_core::Credentials;
use federation_core::FederationBroker;
use federation_core::SigninTokenService;
use federation_core::TokenService;
use federation_core::TokenServiceError;
use federation_server::AppState;
use federation_server::build_provider;
use federation_server::build_router;
use federation_server::serve_listener;
use serde_json::Value;
use serde_json::json;
use time::macros::datetime;
use tokio::net::TcpListener;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

const CONFIG: &str = r#"
provider:
  kind: static_groups
  regex: "aws-(?P<account>[^-]+)-(?P<role>.+)"
  members:
    alice: [aws-prod-admin, aws-prod-readonly, aws-dev-admin, aws-prod-broken, staff]
    bob: [aws-prod-readonly, staff]
    carol: [aws-ghost-admin]
    127.0.0.1: [aws-dev-admin]
"#;

const ACCOUNTS: &str = r#"
prod:
  id: "123456789012"
dev:
  id: 210987654321
"#;

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
        if request.role_arn.as_str().ends_with("/broken") {
            return Err(TokenServiceError::upstream(403, "AccessDenied: not trusted"));
        }
        Ok(Credentials {
            access_key_id: "ASIAHTTPTEST".to_string(),
            secret_access_key: "http-secret".to_string(),
            session_token: "http-token".to_string(),
            expiration: datetime!(2031-05-04 03:02:01 UTC),
        })
    }
}

struct FixedSignin;

#[async_trait::async_trait]
impl SigninTokenService for FixedSignin {
    async fn signin_token(&self, _encoded_session: &str) -> Result<String, TokenServiceError> {
        Ok("TOKEN123".to_string())
    }
}

struct TestServer {
    base: String,
    tokens: Arc<RecordingTokenService>,
    client: reqwest::Client,
}

impl TestServer {
    async fn start(source: PrincipalSource) -> Self {
        let config = ProxyConfig::from_yaml_str(CONFIG).unwrap();
        let accounts = AccountConfig::from_yaml_str(ACCOUNTS).unwrap();
        let tokens = Arc::new(RecordingTokenService::default());
        let exchanger =
            CredentialExchanger::new(tokens.clone(), Arc::new(FixedSignin), accounts.directory());
        let broker = FederationBroker::builder()
            .provider(build_provider(&config).unwrap())
            .exchanger(exchanger)
            .build()
            .unwrap();
        let state = AppState {
            broker: Arc::new(broker),
            identification: UserIdentificationConfig {
                source,
                ..UserIdentificationConfig::default()
            },
        };
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve_listener(listener, build_router(state)));
        Self {
            base: format!("http://{addr}"),
            tokens,
            client: reqwest::Client::new(),
        }
    }

    async fn get(&self, path: &str, user: Option<&str>) -> (u16, String, String, String) {
        let mut request = self.client.get(format!("{}{path}", self.base));
        if let Some(user) = user {
            request = request.header("X-Remote-User", user);
        }
        let response = request.send().await.unwrap();
        let status = response.status().as_u16();
        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .map(|value| value.to_str().unwrap().to_string())
                .unwrap_or_default()
        };
        let username = header("X-Username");
        let content_type = header("content-type");
        let body = response.text().await.unwrap();
        (status, username, content_type, body)
    }

    fn exchange_count(&self) -> usize {
        self.tokens.requests.lock().unwrap().len()
    }
}

fn parse(body: &str) -> Value {
    serde_json::from_str(body).unwrap()
}

// ============================================================================
// SECTION: Status and Listing
// ============================================================================

#[tokio::test]
async fn status_reports_ok_as_monitoring() {
    let server = TestServer::start(PrincipalSource::Header).await;
    let (status, username, _, body) = server.get("/status", None).await;
    assert_eq!(status, 200);
    assert_eq!(username, "monitoring");
    assert_eq!(parse(&body), json!({"status": "200", "message": "OK"}));
}

#[tokio::test]
async fn account_listing_is_sorted_and_deduplicated() {
    let server = TestServer::start(PrincipalSource::Header).await;
    let (status, username, content_type, body) = server.get("/account", Some("alice")).await;
    assert_eq!(status, 200);
    assert_eq!(username, "alice");
    assert!(content_type.starts_with("application/json"));
    assert_eq!(parse(&body), json!({"dev": ["admin"], "prod": ["admin", "broken", "readonly"]}));
}

#[tokio::test]
async fn account_listing_with_ids_reports_unknown_ids_as_null() {
    let server = TestServer::start(PrincipalSource::Header).await;
    let (_, _, _, body) = server.get("/account?withid", Some("bob")).await;
    assert_eq!(parse(&body), json!({"prod": {"id": "123456789012", "roles": ["readonly"]}}));
    let (_, _, _, body) = server.get("/account?withid", Some("carol")).await;
    assert_eq!(parse(&body), json!({"ghost": {"id": null, "roles": ["admin"]}}));
}

#[tokio::test]
async fn unknown_principal_gets_empty_listing() {
    let server = TestServer::start(PrincipalSource::Header).await;
    let (status, username, _, body) = server.get("/account", Some("mallory")).await;
    assert_eq!(status, 200);
    assert_eq!(username, "mallory");
    assert_eq!(parse(&body), json!({}));
}

// ============================================================================
// SECTION: Credentials and Console
// ============================================================================

#[tokio::test]
async fn credentials_route_returns_credentials_document() {
    let server = TestServer::start(PrincipalSource::Header).await;
    let (status, username, _, body) =
        server.get("/account/prod/admin/credentials", Some("alice")).await;
    assert_eq!(status, 200);
    assert_eq!(username, "alice");
    let document = parse(&body);
    assert_eq!(document["Code"], "Success");
    assert_eq!(document["Type"], "AWS-HMAC");
    assert_eq!(document["AccessKeyId"], "ASIAHTTPTEST");
    assert_eq!(document["SecretAccessKey"], "http-secret");
    assert_eq!(document["Token"], "http-token");
    assert_eq!(document["Expiration"], "2031-05-04T03:02:01Z");
    let last_updated = document["LastUpdated"].as_str().unwrap();
    assert_eq!(last_updated.len(), 20);
    assert!(last_updated.ends_with('Z'));
    assert!(document.get("ConsoleUrl").is_none());

    let requests = server.tokens.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].role_arn.as_str(), "arn:aws:iam::123456789012:role/admin");
    assert_eq!(requests[0].session_name, "alice");
}

#[tokio::test]
async fn combined_route_includes_console_url() {
    let server = TestServer::start(PrincipalSource::Header).await;
    let (status, _, _, body) = server.get("/account/dev/admin", Some("alice")).await;
    assert_eq!(status, 200);
    let document = parse(&body);
    assert_eq!(document["AccessKeyId"], "ASIAHTTPTEST");
    assert_eq!(
        document["ConsoleUrl"],
        "https://signin.aws.amazon.com/federation?Action=login&Issuer=\
         &Destination=https%3A%2F%2Fconsole.aws.amazon.com%2F&SigninToken=TOKEN123"
    );
}

#[tokio::test]
async fn console_route_returns_plain_text_url() {
    let server = TestServer::start(PrincipalSource::Header).await;
    let (status, username, content_type, body) = server
        .get("/account/prod/readonly/consoleurl?callbackurl=https%3A%2F%2Fexample.com%2F", Some("bob"))
        .await;
    assert_eq!(status, 200);
    assert_eq!(username, "bob");
    assert!(content_type.starts_with("text/plain"));
    assert_eq!(
        body,
        "https://signin.aws.amazon.com/federation?Action=login\
         &Issuer=https%3A%2F%2Fexample.com%2F\
         &Destination=https%3A%2F%2Fconsole.aws.amazon.com%2F&SigninToken=TOKEN123"
    );
}

// ============================================================================
// SECTION: Error Mapping
// ============================================================================

#[tokio::test]
async fn denied_role_is_forbidden_without_exchange() {
    let server = TestServer::start(PrincipalSource::Header).await;
    let (status, username, content_type, body) =
        server.get("/account/prod/admin/credentials", Some("bob")).await;
    assert_eq!(status, 403);
    assert_eq!(username, "bob");
    assert!(content_type.starts_with("application/json"));
    assert_eq!(
        parse(&body),
        json!({
            "status": 403,
            "error": "Forbidden",
            "message": "User 'bob' may not access role 'admin' in account 'prod'",
        })
    );
    assert_eq!(server.exchange_count(), 0);
}

#[tokio::test]
async fn unknown_account_is_denied_like_unknown_role() {
    let server = TestServer::start(PrincipalSource::Header).await;
    let (status, _, _, body) = server.get("/account/staging/admin/credentials", Some("alice")).await;
    assert_eq!(status, 403);
    assert_eq!(parse(&body)["message"], "User 'alice' may not access role 'admin' in account 'staging'");
}

#[tokio::test]
async fn unconfigured_account_is_not_found() {
    let server = TestServer::start(PrincipalSource::Header).await;
    let (status, username, _, body) = server.get("/account/ghost/admin/credentials", Some("carol")).await;
    assert_eq!(status, 404);
    assert_eq!(username, "carol");
    let document = parse(&body);
    assert_eq!(document["error"], "Not Found");
    assert!(document["message"].as_str().unwrap().contains("ghost"));
    assert_eq!(server.exchange_count(), 0);
}

#[tokio::test]
async fn upstream_failure_is_bad_gateway() {
    let server = TestServer::start(PrincipalSource::Header).await;
    let (status, username, _, body) = server.get("/account/prod/broken/credentials", Some("alice")).await;
    assert_eq!(status, 502);
    assert_eq!(username, "alice");
    let document = parse(&body);
    assert_eq!(document["status"], 502);
    assert_eq!(document["error"], "Bad Gateway");
    assert!(document["message"].as_str().unwrap().contains("AccessDenied: not trusted"));
}

#[tokio::test]
async fn missing_principal_header_is_internal_error() {
    let server = TestServer::start(PrincipalSource::Header).await;
    let (status, username, _, body) = server.get("/account", None).await;
    assert_eq!(status, 500);
    assert_eq!(username, "Unknown User");
    assert_eq!(parse(&body)["message"], "No X-Remote-User specified");
}

// ============================================================================
// SECTION: Instance Metadata
// ============================================================================

#[tokio::test]
async fn metadata_role_lists_single_role() {
    let server = TestServer::start(PrincipalSource::Header).await;
    let (status, username, content_type, body) =
        server.get("/meta-data/iam/security-credentials/", Some("bob")).await;
    assert_eq!(status, 200);
    assert_eq!(username, "bob");
    assert!(content_type.starts_with("text/plain"));
    assert_eq!(body, "readonly");
}

#[tokio::test]
async fn metadata_credentials_use_single_account() {
    let server = TestServer::start(PrincipalSource::Header).await;
    let (status, _, _, body) =
        server.get("/meta-data/iam/security-credentials/readonly", Some("bob")).await;
    assert_eq!(status, 200);
    assert_eq!(parse(&body)["AccessKeyId"], "ASIAHTTPTEST");
    let requests = server.tokens.requests.lock().unwrap();
    assert_eq!(requests[0].role_arn.as_str(), "arn:aws:iam::123456789012:role/readonly");
}

#[tokio::test]
async fn metadata_requires_exactly_one_account() {
    let server = TestServer::start(PrincipalSource::Header).await;
    let (status, _, _, body) = server.get("/meta-data/iam/security-credentials/", Some("alice")).await;
    assert_eq!(status, 404);
    assert!(parse(&body)["message"].as_str().unwrap().contains("Did not get exactly one account"));
    assert_eq!(server.exchange_count(), 0);
}

// ============================================================================
// SECTION: Peer Identification
// ============================================================================

#[tokio::test]
async fn peer_ip_identifies_principal() {
    let server = TestServer::start(PrincipalSource::PeerIp).await;
    let (status, username, _, body) = server.get("/account", Some("alice")).await;
    assert_eq!(status, 200);
    assert_eq!(username, "127.0.0.1");
    assert_eq!(parse(&body), json!({"dev": ["admin"]}));
}
