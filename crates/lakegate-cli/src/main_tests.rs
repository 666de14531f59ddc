// crates/lakegate-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument parsing and config checking.
// Purpose: Ensure the CLI accepts its documented surface and rejects the rest.
// Dependencies: lakegate-cli main helpers
// ============================================================================

//! ## Overview
//! Validates clap argument parsing, transport labeling, and the `config
//! check` command against real temporary files.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use lakegate_config::Transport;
use tempfile::TempDir;

use super::Cli;
use super::Commands;
use super::ConfigCommand;
use super::check_config;
use super::transport_label;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn write_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("lakegate.toml");
    fs::write(&path, content).expect("write config file");
    path
}

// ============================================================================
// SECTION: Parsing Tests
// ============================================================================

#[test]
fn serve_accepts_an_explicit_config_path() {
    let cli = Cli::try_parse_from(["lakegate", "serve", "--config", "/etc/lakegate.toml"])
        .expect("parse serve command");
    let Some(Commands::Serve(command)) = cli.command else {
        panic!("expected serve command");
    };
    assert_eq!(command.config, Some(PathBuf::from("/etc/lakegate.toml")));
}

#[test]
fn serve_config_path_defaults_to_none() {
    let cli = Cli::try_parse_from(["lakegate", "serve"]).expect("parse serve command");
    let Some(Commands::Serve(command)) = cli.command else {
        panic!("expected serve command");
    };
    assert!(command.config.is_none());
}

#[test]
fn version_flag_parses_without_a_subcommand() {
    let cli = Cli::try_parse_from(["lakegate", "--version"]).expect("parse version flag");
    assert!(cli.show_version);
    assert!(cli.command.is_none());
}

#[test]
fn config_check_accepts_a_path() {
    let cli = Cli::try_parse_from(["lakegate", "config", "check", "--config", "gate.toml"])
        .expect("parse config check");
    let Some(Commands::Config {
        command: ConfigCommand::Check(check),
    }) = cli.command
    else {
        panic!("expected config check command");
    };
    assert_eq!(check.config, Some(PathBuf::from("gate.toml")));
}

#[test]
fn unknown_subcommands_are_rejected() {
    assert!(Cli::try_parse_from(["lakegate", "launch"]).is_err());
}

// ============================================================================
// SECTION: Config Check Tests
// ============================================================================

#[test]
fn config_check_passes_a_valid_file() {
    let dir = TempDir::new().expect("create temp dir");
    let path = write_config(
        &dir,
        "[server]\ntransport = \"stdio\"\n\n[platform]\nbase_url = \"http://127.0.0.1:9\"\n",
    );
    let summary = check_config(Some(&path)).expect("valid config");
    assert!(summary.contains("transport=stdio"));
}

#[test]
fn config_check_fails_a_bad_scheme() {
    let dir = TempDir::new().expect("create temp dir");
    let path = write_config(&dir, "[platform]\nbase_url = \"ftp://127.0.0.1:9\"\n");
    let err = check_config(Some(&path)).expect_err("scheme must be rejected");
    assert!(err.to_string().contains("base_url"));
}

#[test]
fn config_check_fails_a_missing_file() {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("absent.toml");
    assert!(check_config(Some(&path)).is_err());
}

// ============================================================================
// SECTION: Label Tests
// ============================================================================

#[test]
fn transport_labels_match_configuration_spelling() {
    assert_eq!(transport_label(Transport::Stdio), "stdio");
    assert_eq!(transport_label(Transport::Http), "http");
    assert_eq!(transport_label(Transport::Sse), "sse");
}
