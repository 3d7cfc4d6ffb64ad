// crates/federation-aws/src/signin.rs
// ============================================================================
// Module: Sign-In Token Client
// Description: HTTP client for the console federation sign-in endpoint.
// Purpose: Exchange a session document for a single-use sign-in token.
// Dependencies: reqwest, serde_json, url, federation-core
// ============================================================================

//! ## Overview
//! Issues `GET <endpoint>?Action=getSigninToken&Session=<encoded>` and reads
//! `SigninToken` from the JSON response. Non-200 answers fail with the status
//! code and reason phrase. Redirects are not followed and response bodies are
//! size-limited.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use federation_core::SigninTokenService;
use federation_core::TokenServiceError;
use reqwest::Client;
use reqwest::StatusCode;
use reqwest::redirect::Policy;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default sign-in federation endpoint.
pub const DEFAULT_SIGNIN_ENDPOINT: &str = "https://signin.aws.amazon.com/federation";
/// Maximum accepted response size.
pub const MAX_SIGNIN_RESPONSE_BYTES: usize = 64 * 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while constructing the sign-in client.
#[derive(Debug, Error)]
pub enum SigninClientError {
    /// Endpoint is not an http(s) URL.
    #[error("invalid sign-in endpoint: {0}")]
    InvalidEndpoint(String),
    /// HTTP client could not be built.
    #[error("http client error: {0}")]
    Http(String),
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Body returned by `Action=getSigninToken`.
#[derive(Deserialize)]
struct SigninTokenResponse {
    /// Single-use console sign-in token.
    #[serde(rename = "SigninToken")]
    signin_token: String,
}

/// Sign-in token service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSigninTokenService {
    /// HTTP client with the configured timeout.
    client: Client,
    /// Federation endpoint, without a query.
    endpoint: Url,
}

impl HttpSigninTokenService {
    /// Builds a client for `endpoint` with a request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`SigninClientError`] when the endpoint is invalid or the HTTP
    /// client cannot be constructed.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, SigninClientError> {
        let endpoint =
            Url::parse(endpoint).map_err(|err| SigninClientError::InvalidEndpoint(err.to_string()))?;
        match endpoint.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(SigninClientError::InvalidEndpoint(format!(
                    "unsupported scheme: {scheme}"
                )));
            }
        }
        if endpoint.query().is_some() {
            return Err(SigninClientError::InvalidEndpoint(
                "endpoint must not carry a query string".to_string(),
            ));
        }
        let client = Client::builder()
            .redirect(Policy::none())
            .timeout(timeout)
            .build()
            .map_err(|err| SigninClientError::Http(err.to_string()))?;
        Ok(Self {
            client,
            endpoint,
        })
    }

    /// Returns the configured endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Builds the token request URL for an encoded session document.
    fn request_url(&self, encoded_session: &str) -> String {
        format!("{}?Action=getSigninToken&Session={encoded_session}", self.endpoint)
    }
}

#[async_trait]
impl SigninTokenService for HttpSigninTokenService {
    async fn signin_token(&self, encoded_session: &str) -> Result<String, TokenServiceError> {
        let response = self
            .client
            .get(self.request_url(encoded_session))
            .send()
            .await
            .map_err(|err| TokenServiceError::transport(format!("sign-in request failed: {err}")))?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(TokenServiceError::upstream(
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown"),
            ));
        }
        if response.content_length().is_some_and(|length| length > MAX_SIGNIN_RESPONSE_BYTES as u64) {
            return Err(TokenServiceError::transport("sign-in response exceeds size limit"));
        }
        let body = response
            .bytes()
            .await
            .map_err(|err| TokenServiceError::transport(format!("sign-in response failed: {err}")))?;
        if body.len() > MAX_SIGNIN_RESPONSE_BYTES {
            return Err(TokenServiceError::transport("sign-in response exceeds size limit"));
        }
        let parsed: SigninTokenResponse = serde_json::from_slice(&body).map_err(|err| {
            TokenServiceError::transport(format!("invalid sign-in response: {err}"))
        })?;
        Ok(parsed.signin_token)
    }
}
