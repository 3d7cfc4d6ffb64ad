// crates/federation-config/src/config.rs
// ============================================================================
// Module: Proxy Configuration
// Description: Configuration model and validation for the federation proxy.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: federation-providers, serde, serde_yaml
// ============================================================================

//! ## Overview
//! The proxy configuration is a YAML document (or a directory of documents)
//! with sections for the broker's AWS identity, the identity provider, the
//! HTTP surface, and logging. Every section has defaults except the provider,
//! whose `kind` must always be set.
//! Security posture: config inputs are untrusted and the broker secret key is
//! redacted from `Debug` output.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use federation_providers::ProviderSettings;
use serde::Deserialize;
use thiserror::Error;

use crate::source::read_document;
use crate::source::resolve_path;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "federation-proxy.yaml";
/// Environment variable naming the proxy configuration path.
pub const CONFIG_ENV_VAR: &str = "FEDERATION_PROXY_CONFIG";
/// Default AWS region for the token service.
pub const DEFAULT_AWS_REGION: &str = "us-east-1";
/// Default token-service and sign-in timeout in milliseconds.
pub const DEFAULT_AWS_TIMEOUT_MS: u64 = 10_000;
/// Default identity lookup timeout in milliseconds.
pub const DEFAULT_IDENTITY_TIMEOUT_MS: u64 = 5_000;
/// Default HTTP bind address.
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
/// Default header carrying the authenticated principal.
pub const DEFAULT_USER_HEADER: &str = "X-Remote-User";
/// Default sign-in token endpoint.
pub const DEFAULT_SIGNIN_ENDPOINT: &str = "https://signin.aws.amazon.com/federation";
/// Default tracing filter.
pub const DEFAULT_LOG_FILTER: &str = "info";
/// Provider kinds that resolve permissions through a group pattern.
pub const GROUP_PROVIDER_KINDS: [&str; 4] = ["static_groups", "local_groups", "nss_groups", "ldap"];

// ============================================================================
// SECTION: Proxy Config
// ============================================================================

/// Top-level proxy configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProxyConfig {
    /// Broker AWS identity and token-service settings.
    #[serde(default)]
    pub aws: AwsConfig,
    /// Identity provider selection and options.
    #[serde(default)]
    pub provider: ProviderSettings,
    /// Request handling settings.
    #[serde(default)]
    pub api: ApiConfig,
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Broker settings.
    #[serde(default)]
    pub broker: BrokerConfig,
    /// Sign-in endpoint settings.
    #[serde(default)]
    pub signin: SigninConfig,
    /// Tracing and audit settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ProxyConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// Resolution order: explicit `path`, then `FEDERATION_PROXY_CONFIG`, then
    /// `federation-proxy.yaml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path, CONFIG_ENV_VAR, DEFAULT_CONFIG_NAME)?;
        let document = read_document(&resolved)?;
        let config = Self::from_value(document)?;
        tracing::debug!(path = %resolved.display(), provider = %config.provider.kind, "proxy config loaded");
        Ok(config)
    }

    /// Parses and validates configuration from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let value: serde_yaml::Value =
            serde_yaml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        Self::from_value(value)
    }

    /// Deserializes and validates configuration from a merged document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the document does not match the model or
    /// fails validation.
    pub fn from_value(value: serde_yaml::Value) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yaml::from_value(value).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.aws.validate()?;
        validate_provider(&self.provider)?;
        self.api.user_identification.validate()?;
        self.server.validate()?;
        self.broker.validate()?;
        self.signin.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Checks the provider selector and, for group kinds, the pattern.
fn validate_provider(provider: &ProviderSettings) -> Result<(), ConfigError> {
    let kind = provider.kind.trim();
    if kind.is_empty() {
        return Err(ConfigError::Invalid("provider.kind must be set".to_string()));
    }
    if GROUP_PROVIDER_KINDS.contains(&kind) {
        let regex = provider.regex.as_deref().unwrap_or_default();
        if regex.trim().is_empty() {
            return Err(ConfigError::Invalid(format!("provider.regex is required for {kind}")));
        }
        provider.group_resolver().map_err(|err| ConfigError::Invalid(err.to_string()))?;
    }
    Ok(())
}

// ============================================================================
// SECTION: AWS
// ============================================================================

/// Broker AWS identity and token-service settings.
#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AwsConfig {
    /// Static access key id; the default credential chain is used when absent.
    #[serde(default)]
    pub access_key: Option<String>,
    /// Static secret key paired with `access_key`.
    #[serde(default)]
    pub secret_key: Option<String>,
    /// Token-service region.
    #[serde(default = "default_region")]
    pub region: String,
    /// Optional token-service endpoint override.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Token-service and sign-in timeout in milliseconds.
    #[serde(default = "default_aws_timeout_ms")]
    pub timeout_ms: u64,
}

impl AwsConfig {
    /// Returns the upstream call timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Validates AWS settings.
    fn validate(&self) -> Result<(), ConfigError> {
        let has_access = self.access_key.as_deref().is_some_and(|key| !key.trim().is_empty());
        let has_secret = self.secret_key.as_deref().is_some_and(|key| !key.trim().is_empty());
        if has_access != has_secret {
            return Err(ConfigError::Invalid(
                "aws.access_key and aws.secret_key must be set together".to_string(),
            ));
        }
        if self.region.trim().is_empty() {
            return Err(ConfigError::Invalid("aws.region must be non-empty".to_string()));
        }
        if self.endpoint.as_deref().is_some_and(|endpoint| endpoint.trim().is_empty()) {
            return Err(ConfigError::Invalid("aws.endpoint must be non-empty".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid("aws.timeout_ms must be greater than zero".to_string()));
        }
        Ok(())
    }
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            access_key: None,
            secret_key: None,
            region: default_region(),
            endpoint: None,
            timeout_ms: DEFAULT_AWS_TIMEOUT_MS,
        }
    }
}

impl fmt::Debug for AwsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsConfig")
            .field("access_key", &self.access_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

// ============================================================================
// SECTION: API
// ============================================================================

/// Request handling settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// How the requesting principal is identified.
    #[serde(default)]
    pub user_identification: UserIdentificationConfig,
}

/// Where the principal is taken from on each request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalSource {
    /// A request header set by an authenticating front end.
    #[default]
    Header,
    /// The peer IP address of the connection.
    PeerIp,
}

/// Principal identification settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserIdentificationConfig {
    /// Principal source.
    #[serde(default)]
    pub source: PrincipalSource,
    /// Header name used when `source` is `header`.
    #[serde(default = "default_user_header")]
    pub header: String,
}

impl UserIdentificationConfig {
    /// Validates principal identification settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.source == PrincipalSource::Header {
            let header = self.header.trim();
            if header.is_empty() {
                return Err(ConfigError::Invalid(
                    "api.user_identification.header must be non-empty".to_string(),
                ));
            }
            if !header.bytes().all(|byte| byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_')
            {
                return Err(ConfigError::Invalid(format!(
                    "api.user_identification.header is not a valid header name: {header}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for UserIdentificationConfig {
    fn default() -> Self {
        Self {
            source: PrincipalSource::Header,
            header: default_user_header(),
        }
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Socket address to bind.
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl ServerConfig {
    /// Parses the bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the address does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("invalid server.bind address: {}", self.bind)))
    }

    /// Validates listener settings.
    fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr().map(|_| ())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

// ============================================================================
// SECTION: Broker
// ============================================================================

/// Broker settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BrokerConfig {
    /// Identity lookup timeout in milliseconds.
    #[serde(default = "default_identity_timeout_ms")]
    pub identity_timeout_ms: u64,
}

impl BrokerConfig {
    /// Returns the identity lookup timeout.
    #[must_use]
    pub const fn identity_timeout(&self) -> Duration {
        Duration::from_millis(self.identity_timeout_ms)
    }

    /// Validates broker settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.identity_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "broker.identity_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            identity_timeout_ms: DEFAULT_IDENTITY_TIMEOUT_MS,
        }
    }
}

// ============================================================================
// SECTION: Sign-In
// ============================================================================

/// Sign-in token endpoint settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SigninConfig {
    /// Endpoint queried with `Action=getSigninToken`.
    #[serde(default = "default_signin_endpoint")]
    pub endpoint: String,
}

impl SigninConfig {
    /// Validates sign-in settings.
    fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = self.endpoint.trim();
        if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
            return Err(ConfigError::Invalid(format!(
                "signin.endpoint must be an http(s) url: {endpoint}"
            )));
        }
        Ok(())
    }
}

impl Default for SigninConfig {
    fn default() -> Self {
        Self {
            endpoint: default_signin_endpoint(),
        }
    }
}

// ============================================================================
// SECTION: Logging
// ============================================================================

/// Tracing and audit settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default tracing filter; `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Audit sink settings.
    #[serde(default)]
    pub audit: AuditConfig,
}

impl LoggingConfig {
    /// Validates logging settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.filter.trim().is_empty() {
            return Err(ConfigError::Invalid("logging.filter must be non-empty".to_string()));
        }
        self.audit.validate()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            audit: AuditConfig::default(),
        }
    }
}

/// Audit sink selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to `path`.
    File,
    /// Discard audit events.
    None,
}

/// Audit sink settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Sink selector.
    #[serde(default)]
    pub sink: AuditSinkKind,
    /// Audit log path for the file sink.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl AuditConfig {
    /// Validates audit settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.sink == AuditSinkKind::File {
            let Some(path) = &self.path else {
                return Err(ConfigError::Invalid(
                    "logging.audit.path is required for the file sink".to_string(),
                ));
            };
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(
                    "logging.audit.path must be non-empty".to_string(),
                ));
            }
            crate::source::validate_path(path)?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// YAML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default token-service region.
fn default_region() -> String {
    DEFAULT_AWS_REGION.to_string()
}

/// Default upstream timeout.
const fn default_aws_timeout_ms() -> u64 {
    DEFAULT_AWS_TIMEOUT_MS
}

/// Default identity timeout.
const fn default_identity_timeout_ms() -> u64 {
    DEFAULT_IDENTITY_TIMEOUT_MS
}

/// Default bind address.
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

/// Default principal header.
fn default_user_header() -> String {
    DEFAULT_USER_HEADER.to_string()
}

/// Default sign-in endpoint.
fn default_signin_endpoint() -> String {
    DEFAULT_SIGNIN_ENDPOINT.to_string()
}

/// Default tracing filter.
fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}
