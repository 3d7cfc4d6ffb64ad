// crates/federation-aws/tests/clients.rs
// ============================================================================
// Module: Upstream Client Tests
// Description: Sign-in and STS clients against canned local endpoints.
// ============================================================================
//! ## Overview
//! Serves canned responses with `tiny_http` and checks request shape, token
//! extraction, and upstream error propagation.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::io::Read;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use federation_aws::HttpSigninTokenService;
use federation_aws::StsSettings;
use federation_aws::StsTokenService;
use federation_core::AccountId;
use federation_core::AssumeRoleRequest;
use federation_core::RoleArn;
use federation_core::RoleName;
use federation_core::SigninTokenService;
use federation_core::TokenService;
use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;

/// Captured request line and body.
struct Captured {
    url: String,
    body: String,
}

/// Serves one canned response and reports the request it received.
fn serve_once(status: u16, content_type: &str, body: &str) -> (String, mpsc::Receiver<Captured>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr();
    let (sender, receiver) = mpsc::channel();
    let body = body.to_string();
    let content_type = content_type.to_string();
    thread::spawn(move || {
        if let Ok(mut request) = server.recv() {
            let mut request_body = String::new();
            let _ = request.as_reader().read_to_string(&mut request_body);
            let _ = sender.send(Captured {
                url: request.url().to_string(),
                body: request_body,
            });
            let response = Response::from_data(body.into_bytes())
                .with_status_code(status)
                .with_header(Header::from_bytes("Content-Type", content_type.as_bytes()).unwrap());
            let _ = request.respond(response);
        }
    });
    (format!("http://{addr}"), receiver)
}

// ============================================================================
// SECTION: Sign-In Endpoint
// ============================================================================

#[tokio::test]
async fn signin_token_is_read_from_json_response() {
    let (base, requests) = serve_once(200, "application/json", r#"{"SigninToken":"abc123"}"#);
    let client =
        HttpSigninTokenService::new(&format!("{base}/federation"), Duration::from_secs(5)).unwrap();

    let token = client.signin_token("%7B%22sessionId%22%7D").await.unwrap();

    assert_eq!(token, "abc123");
    let captured = requests.recv().unwrap();
    assert_eq!(captured.url, "/federation?Action=getSigninToken&Session=%7B%22sessionId%22%7D");
}

#[tokio::test]
async fn signin_non_200_carries_status_and_reason() {
    let (base, _requests) = serve_once(400, "text/plain", "nope");
    let client =
        HttpSigninTokenService::new(&format!("{base}/federation"), Duration::from_secs(5)).unwrap();

    let err = client.signin_token("x").await.unwrap_err();

    assert_eq!(err.status, Some(400));
    assert_eq!(err.message, "Bad Request");
    assert_eq!(err.to_string(), "Error 400 Bad Request");
}

#[tokio::test]
async fn signin_malformed_body_is_transport_error() {
    let (base, _requests) = serve_once(200, "application/json", r#"{"Other":"x"}"#);
    let client =
        HttpSigninTokenService::new(&format!("{base}/federation"), Duration::from_secs(5)).unwrap();

    let err = client.signin_token("x").await.unwrap_err();
    assert_eq!(err.status, None);
    assert!(err.message.contains("invalid sign-in response"));
}

#[test]
fn signin_endpoint_is_validated() {
    assert!(HttpSigninTokenService::new("not a url", Duration::from_secs(1)).is_err());
    assert!(HttpSigninTokenService::new("ftp://example.com/", Duration::from_secs(1)).is_err());
    assert!(HttpSigninTokenService::new("https://example.com/f?x=1", Duration::from_secs(1)).is_err());
    let client =
        HttpSigninTokenService::new("https://signin.aws.amazon.com/federation", Duration::from_secs(1))
            .unwrap();
    assert_eq!(client.endpoint().as_str(), "https://signin.aws.amazon.com/federation");
}

// ============================================================================
// SECTION: STS
// ============================================================================

const ASSUME_ROLE_XML: &str = r#"<AssumeRoleResponse xmlns="https://sts.amazonaws.com/doc/2011-06-15/">
  <AssumeRoleResult>
    <AssumedRoleUser>
      <AssumedRoleId>AROAEXAMPLE:mmustermann</AssumedRoleId>
      <Arn>arn:aws:sts::123456789:assumed-role/role/mmustermann</Arn>
    </AssumedRoleUser>
    <Credentials>
      <AccessKeyId>ASIASTSEXAMPLE</AccessKeyId>
      <SecretAccessKey>sts-secret</SecretAccessKey>
      <SessionToken>sts-session-token</SessionToken>
      <Expiration>2030-06-01T12:00:00Z</Expiration>
    </Credentials>
  </AssumeRoleResult>
  <ResponseMetadata>
    <RequestId>c6104cbe-af31-11e0-8154-cbc7ccf896c7</RequestId>
  </ResponseMetadata>
</AssumeRoleResponse>"#;

const ACCESS_DENIED_XML: &str = r#"<ErrorResponse xmlns="https://sts.amazonaws.com/doc/2011-06-15/">
  <Error>
    <Type>Sender</Type>
    <Code>AccessDenied</Code>
    <Message>not authorized to perform sts:AssumeRole</Message>
  </Error>
  <RequestId>c6104cbe-af31-11e0-8154-cbc7ccf896c7</RequestId>
</ErrorResponse>"#;

fn sts_settings(endpoint: String) -> StsSettings {
    StsSettings {
        region: "us-east-1".to_string(),
        access_key: Some("AKIDEXAMPLE".to_string()),
        secret_key: Some("broker-secret".to_string()),
        endpoint: Some(endpoint),
    }
}

fn request() -> AssumeRoleRequest {
    AssumeRoleRequest {
        role_arn: RoleArn::new(&AccountId::parse("123456789").unwrap(), &RoleName::from("role")),
        session_name: "mmustermann".to_string(),
    }
}

#[tokio::test]
async fn sts_assume_role_returns_credentials() {
    let (endpoint, requests) = serve_once(200, "text/xml", ASSUME_ROLE_XML);
    let service = StsTokenService::connect(&sts_settings(endpoint)).await;

    let credentials = service.assume_role(&request()).await.unwrap();

    assert_eq!(credentials.access_key_id, "ASIASTSEXAMPLE");
    assert_eq!(credentials.secret_access_key, "sts-secret");
    assert_eq!(credentials.session_token, "sts-session-token");
    assert_eq!(credentials.expiration.unix_timestamp(), 1_906_545_600);

    let captured = requests.recv().unwrap();
    assert!(captured.body.contains("Action=AssumeRole"));
    assert!(captured.body.contains("RoleSessionName=mmustermann"));
    assert!(captured.body.contains("RoleArn=arn%3Aaws%3Aiam%3A%3A123456789%3Arole%2Frole"));
}

#[tokio::test]
async fn sts_rejection_keeps_status_and_code() {
    let (endpoint, _requests) = serve_once(403, "text/xml", ACCESS_DENIED_XML);
    let service = StsTokenService::connect(&sts_settings(endpoint)).await;

    let err = service.assume_role(&request()).await.unwrap_err();

    assert_eq!(err.status, Some(403));
    assert!(err.message.starts_with("AccessDenied"));
    assert!(err.message.contains("not authorized"));
}

#[test]
fn sts_settings_debug_redacts_secret() {
    let rendered = format!("{:?}", sts_settings("http://localhost".to_string()));
    assert!(!rendered.contains("broker-secret"));
    assert!(rendered.contains("AKIDEXAMPLE"));
}
