// crates/federation-server/src/main.rs
// ============================================================================
// Module: Federation Proxy CLI Entry Point
// Description: Command dispatcher for serving and checking configuration.
// Purpose: Provide the `federation-proxy` binary.
// Dependencies: clap, federation-config, federation-server, serde_json, tokio
// ============================================================================

//! ## Overview
//! Subcommands:
//! - `serve` loads both config documents, builds the broker, and serves HTTP.
//! - `check-config` loads, validates, and builds the provider, then prints `ok`.
//! - `accounts` prints the account to roles mapping for one principal.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use federation_config::AccountConfig;
use federation_config::ProxyConfig;
use federation_core::PermissionProvider;
use federation_core::Principal;
use federation_server::ProxyServer;
use federation_server::api::account_listing;
use federation_server::build_provider;
use federation_server::init_tracing;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "federation-proxy", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server.
    Serve(ServeCommand),
    /// Load and validate configuration, then build the provider.
    CheckConfig(ConfigArgs),
    /// Print the account to roles mapping for a principal as JSON.
    Accounts(AccountsCommand),
}

/// Config path arguments shared by subcommands.
#[derive(Args, Debug)]
struct ConfigArgs {
    /// Proxy config file or directory (overrides `FEDERATION_PROXY_CONFIG`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Account config file or directory (overrides `FEDERATION_PROXY_ACCOUNT_CONFIG`).
    #[arg(long = "account-config", value_name = "PATH")]
    account_config: Option<PathBuf>,
}

/// Arguments for `serve`.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Config paths.
    #[command(flatten)]
    paths: ConfigArgs,
    /// Listener address (overrides `server.bind`).
    #[arg(long, value_name = "ADDR")]
    bind: Option<SocketAddr>,
}

/// Arguments for `accounts`.
#[derive(Args, Debug)]
struct AccountsCommand {
    /// Config paths.
    #[command(flatten)]
    paths: ConfigArgs,
    /// Principal to resolve.
    #[arg(long, value_name = "NAME")]
    principal: String,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(command) => command_serve(command).await,
        Commands::CheckConfig(paths) => command_check_config(&paths),
        Commands::Accounts(command) => command_accounts(command).await,
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Loads both config documents.
fn load_configs(paths: &ConfigArgs) -> CliResult<(ProxyConfig, AccountConfig)> {
    let config = ProxyConfig::load(paths.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load proxy config: {err}")))?;
    let accounts = AccountConfig::load(paths.account_config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load account config: {err}")))?;
    Ok((config, accounts))
}

/// Runs the HTTP server.
async fn command_serve(command: ServeCommand) -> CliResult<ExitCode> {
    let (config, accounts) = load_configs(&command.paths)?;
    init_tracing(&config.logging.filter);
    let mut server = ProxyServer::from_config(&config, &accounts)
        .await
        .map_err(|err| CliError::new(format!("failed to start: {err}")))?;
    if let Some(bind) = command.bind {
        server = server.with_bind(bind);
    }
    tokio::select! {
        result = server.serve() => {
            result.map_err(|err| CliError::new(format!("server failed: {err}")))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown requested");
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Validates configuration and the provider selection.
fn command_check_config(paths: &ConfigArgs) -> CliResult<ExitCode> {
    let (config, _) = load_configs(paths)?;
    build_provider(&config).map_err(|err| CliError::new(err.to_string()))?;
    write_stdout_line("ok")?;
    Ok(ExitCode::SUCCESS)
}

/// Prints the registry for one principal.
async fn command_accounts(command: AccountsCommand) -> CliResult<ExitCode> {
    let (config, accounts) = load_configs(&command.paths)?;
    init_tracing(&config.logging.filter);
    let provider = build_provider(&config).map_err(|err| CliError::new(err.to_string()))?;
    let principal = Principal::new(command.principal);
    let registry = provider
        .accounts_and_roles(&principal)
        .await
        .map_err(|err| CliError::new(format!("failed to resolve {principal}: {err}")))?;
    let listing = account_listing(&registry, true, |alias| accounts.id(alias).cloned());
    let rendered = serde_json::to_string_pretty(&listing)
        .map_err(|err| CliError::new(format!("failed to render listing: {err}")))?;
    write_stdout_line(&rendered)?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output
// ============================================================================

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
        .map_err(|err| CliError::new(format!("failed to write stdout: {err}")))
}

/// Writes an error to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = writeln!(std::io::stderr(), "{message}");
    ExitCode::FAILURE
}
