// crates/lakegate-cli/src/main.rs
// ============================================================================
// Module: Lakegate CLI Entry Point
// Description: Command dispatcher for the Lakegate gateway server.
// Purpose: Load configuration, build the platform client, and serve.
// Dependencies: clap, lakegate-config, lakegate-mcp, lakegate-platform, tokio
// ============================================================================

//! ## Overview
//! The Lakegate CLI starts the gateway server and offers configuration
//! checking. The platform access token is read from the environment at
//! startup and handed to the REST client; it never appears in configuration
//! files or output.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use lakegate_config::ConfigError;
use lakegate_config::GatewayConfig;
use lakegate_config::Transport;
use lakegate_mcp::GatewayServer;
use lakegate_platform::RestPlatformClient;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "lakegate", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Lakegate gateway server.
    Serve(ServeCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Configuration for the `serve` command.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Optional config file path (defaults to lakegate.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate a configuration file.
    Check(ConfigCheckCommand),
}

/// Configuration for the `config check` command.
#[derive(Args, Debug)]
struct ConfigCheckCommand {
    /// Optional config file path (defaults to lakegate.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI failure carrying a user-facing message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// User-facing failure description.
    message: String,
}

impl CliError {
    /// Creates a CLI error from a displayable message.
    fn new(message: impl ToString) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// CLI result alias.
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
    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&format!("lakegate {version}"))?;
        return Ok(ExitCode::SUCCESS);
    }
    let Some(command) = cli.command else {
        write_stdout_line("usage: lakegate <serve|config> [--help]")?;
        return Ok(ExitCode::SUCCESS);
    };
    match command {
        Commands::Serve(command) => command_serve(command).await,
        Commands::Config {
            command,
        } => command_config(&command),
    }
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(command: ServeCommand) -> CliResult<ExitCode> {
    let config = GatewayConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("config load failed: {err}")))?;
    let platform = build_platform_client(&config)?;
    let server = GatewayServer::new(config, platform)
        .map_err(|err| CliError::new(format!("server init failed: {err}")))?;
    server.serve().await.map_err(|err| CliError::new(format!("server failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

/// Builds the REST platform client from validated configuration.
fn build_platform_client(
    config: &GatewayConfig,
) -> CliResult<Arc<RestPlatformClient>> {
    let token = config
        .platform
        .resolve_token()
        .map_err(|err| CliError::new(format!("platform token unavailable: {err}")))?;
    let client = RestPlatformClient::new(
        config.platform.base_url.clone(),
        token,
        Duration::from_millis(config.platform.connect_timeout_ms),
        Duration::from_millis(config.platform.request_timeout_ms),
    )
    .map_err(|err| CliError::new(format!("platform client init failed: {err}")))?;
    Ok(Arc::new(client))
}

// ============================================================================
// SECTION: Config Command
// ============================================================================

/// Executes the `config` subcommands.
fn command_config(command: &ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Check(check) => command_config_check(check.config.as_deref()),
    }
}

/// Loads and validates a configuration file, reporting the outcome.
fn command_config_check(path: Option<&Path>) -> CliResult<ExitCode> {
    match check_config(path) {
        Ok(summary) => {
            write_stdout_line(&summary)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            write_stderr_line(&format!("configuration invalid: {err}"))?;
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Loads and validates a configuration file, returning a summary line.
fn check_config(path: Option<&Path>) -> Result<String, ConfigError> {
    let config = GatewayConfig::load(path)?;
    Ok(format!(
        "configuration valid: transport={} bind={}",
        transport_label(config.server.transport),
        config.server.bind
    ))
}

/// Returns the configuration label for a transport.
const fn transport_label(transport: Transport) -> &'static str {
    match transport {
        Transport::Stdio => "stdio",
        Transport::Http => "http",
        Transport::Sse => "sse",
    }
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes one line to stdout.
fn write_stdout_line(line: &str) -> CliResult<()> {
    writeln!(std::io::stdout(), "{line}")
        .map_err(|err| CliError::new(format!("stdout write failed: {err}")))
}

/// Writes one line to stderr.
fn write_stderr_line(line: &str) -> CliResult<()> {
    writeln!(std::io::stderr(), "{line}")
        .map_err(|err| CliError::new(format!("stderr write failed: {err}")))
}

/// Emits an error to stderr and maps it to a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = writeln!(std::io::stderr(), "lakegate: {message}");
    ExitCode::FAILURE
}
