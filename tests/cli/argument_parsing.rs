//! CLI argument parsing tests
//!
//! Parsing through the public startup entry point, the way the binary does it.

use plugin_updater::app::cli::args::*;
use plugin_updater::app::startup::{initial_color, parse_args};
use std::ffi::OsString;
use std::path::PathBuf;

static COMMAND_NAME: &str = "plugin-updater";

#[test]
fn test_parse_rollback_with_globals() {
    let args = parse_args([
        COMMAND_NAME,
        "--plugin-file",
        "/srv/site/plugins/acme-forms/acme-forms.php",
        "rollback",
        "--to",
        "1.8.0",
        "--session",
        "alice",
        "-v",
        "--debug-trace",
        "--package-mirror",
        "/srv/mirror",
    ])
    .unwrap();

    assert_eq!(
        args.plugin_file,
        Some(PathBuf::from("/srv/site/plugins/acme-forms/acme-forms.php"))
    );
    assert_eq!(args.verbosity(), 1);
    assert!(args.debug_trace);
    assert_eq!(args.package_mirror, Some(PathBuf::from("/srv/mirror")));
    assert_eq!(
        args.selected_command(),
        Command::Rollback {
            target_version: "1.8.0".to_string(),
            nonce: None,
            session: Some("alice".to_string()),
            json: false,
        }
    );
}

#[test]
fn test_parse_rejects_unknown_log_level() {
    assert!(parse_args([COMMAND_NAME, "--log-level", "chatty"]).is_err());
    assert!(parse_args([COMMAND_NAME, "--log-level", "warn"]).is_ok());
}

#[test]
fn test_help_and_version_are_reported_as_errors_with_zero_exit() {
    let help = parse_args([COMMAND_NAME, "--help"]).unwrap_err();
    assert_eq!(help.exit_code(), 0);
    let version = parse_args([COMMAND_NAME, "--version"]).unwrap_err();
    assert_eq!(version.exit_code(), 0);
}

#[test]
fn test_initial_color_scan() {
    let argv: Vec<OsString> = [COMMAND_NAME, "check", "--no-color"]
        .iter()
        .map(OsString::from)
        .collect();
    assert_eq!(initial_color(&argv), Some(false));
}

#[test]
fn test_nonce_and_recheck_subcommands() {
    let args = parse_args([COMMAND_NAME, "nonce", "--session", "bob"]).unwrap();
    assert_eq!(
        args.selected_command(),
        Command::Nonce {
            session: Some("bob".to_string())
        }
    );
    let args = parse_args([COMMAND_NAME, "recheck"]).unwrap();
    assert_eq!(args.selected_command(), Command::Recheck);
}
