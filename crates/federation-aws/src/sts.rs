// crates/federation-aws/src/sts.rs
// ============================================================================
// Module: STS Token Service
// Description: AssumeRole client over the AWS security token service.
// Purpose: Mint temporary credentials for an authorized role ARN.
// Dependencies: aws-config, aws-sdk-sts, time, federation-core
// ============================================================================

//! ## Overview
//! [`StsTokenService`] issues one `AssumeRole` call per request using the
//! broker's own identity: static keys when configured, otherwise the default
//! AWS credential chain. Upstream failures keep their HTTP status and error
//! code so they can be reported verbatim.
//!
//! Security posture: broker keys are never logged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::Region;
use aws_sdk_sts::Client;
use aws_sdk_sts::config::http::HttpResponse;
use aws_sdk_sts::error::DisplayErrorContext;
use aws_sdk_sts::error::ProvideErrorMetadata;
use aws_sdk_sts::error::SdkError;
use aws_sdk_sts::operation::assume_role::AssumeRoleError;
use federation_core::AssumeRoleRequest;
use federation_core::Credentials;
use federation_core::TokenService;
use federation_core::TokenServiceError;
use time::OffsetDateTime;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Default STS region.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Connection settings for the STS client.
#[derive(Clone, PartialEq, Eq)]
pub struct StsSettings {
    /// Region used for STS requests.
    pub region: String,
    /// Broker access key; the default credential chain is used when absent.
    pub access_key: Option<String>,
    /// Broker secret key paired with `access_key`.
    pub secret_key: Option<String>,
    /// Endpoint override (local stacks and tests).
    pub endpoint: Option<String>,
}

impl Default for StsSettings {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            access_key: None,
            secret_key: None,
            endpoint: None,
        }
    }
}

impl std::fmt::Debug for StsSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StsSettings")
            .field("region", &self.region)
            .field("access_key", &self.access_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

// ============================================================================
// SECTION: Token Service
// ============================================================================

/// Token service backed by `sts:AssumeRole`.
#[derive(Debug, Clone)]
pub struct StsTokenService {
    /// SDK client bound to the configured region and credentials.
    client: Client,
}

impl StsTokenService {
    /// Loads AWS configuration and builds the STS client.
    pub async fn connect(settings: &StsSettings) -> Self {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(settings.region.clone()));
        if let (Some(access_key), Some(secret_key)) = (&settings.access_key, &settings.secret_key) {
            loader = loader.credentials_provider(aws_sdk_sts::config::Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                "federation-proxy",
            ));
        }
        if let Some(endpoint) = &settings.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let shared_config = loader.load().await;
        tracing::debug!(region = %settings.region, "sts client configured");
        Self::from_client(Client::new(&shared_config))
    }

    /// Wraps a preconfigured client.
    #[must_use]
    pub const fn from_client(client: Client) -> Self {
        Self {
            client,
        }
    }
}

#[async_trait]
impl TokenService for StsTokenService {
    async fn assume_role(
        &self,
        request: &AssumeRoleRequest,
    ) -> Result<Credentials, TokenServiceError> {
        let response = self
            .client
            .assume_role()
            .role_arn(request.role_arn.as_str())
            .role_session_name(&request.session_name)
            .send()
            .await
            .map_err(|err| upstream_error(&err))?;
        let credentials = response.credentials().ok_or_else(|| {
            TokenServiceError::transport("STS AssumeRole returned no credentials")
        })?;
        let expiration = credentials.expiration();
        let expiration = OffsetDateTime::from_unix_timestamp(expiration.secs())
            .map(|instant| instant + time::Duration::nanoseconds(i64::from(expiration.subsec_nanos())))
            .map_err(|err| TokenServiceError::transport(format!("invalid expiration: {err}")))?;
        Ok(Credentials {
            access_key_id: credentials.access_key_id().to_string(),
            secret_access_key: credentials.secret_access_key().to_string(),
            session_token: credentials.session_token().to_string(),
            expiration,
        })
    }
}

/// Maps an SDK failure to a token-service error, keeping the HTTP status.
fn upstream_error(err: &SdkError<AssumeRoleError, HttpResponse>) -> TokenServiceError {
    let message = match (err.code(), err.message()) {
        (Some(code), Some(message)) => format!("{code}: {message}"),
        (Some(code), None) => code.to_string(),
        _ => DisplayErrorContext(err).to_string(),
    };
    match err.raw_response().map(|response| response.status().as_u16()) {
        Some(status) => TokenServiceError::upstream(status, message),
        None => TokenServiceError::transport(message),
    }
}
