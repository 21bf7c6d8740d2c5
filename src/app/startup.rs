//! Application startup
//!
//! Parse arguments, layer the configuration file underneath them, start
//! logging and hand over to the selected command.

use super::cli::args::Args;
use super::commands;
use crate::core::error_handling::log_error_with_context;
use crate::core::logging::{init_logging, verbosity_level};
use crate::core::styles::palette_to_clap;
use crate::core::version::long_version;
use clap::{CommandFactory, FromArgMatches};
use std::ffi::OsString;

/// Exit code for unusable arguments or configuration
pub const EXIT_USAGE: i32 = 2;

fn color_choice(color_setting: Option<bool>) -> clap::ColorChoice {
    match color_setting {
        Some(true) => clap::ColorChoice::Always,
        Some(false) => clap::ColorChoice::Never,
        None => clap::ColorChoice::Auto,
    }
}

/// Colour flags seen before full parsing, so help and errors are styled consistently
pub fn initial_color(argv: &[OsString]) -> Option<bool> {
    let mut color = None;
    for arg in argv.iter().skip(1) {
        match arg.to_str() {
            Some("--") => break,
            Some("--color") | Some("-g") => color = Some(true),
            Some("--no-color") | Some("-n") => color = Some(false),
            _ => {}
        }
    }
    color
}

/// Parse a full argument vector (program name first)
pub fn parse_args<I, T>(argv: I) -> Result<Args, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let argv: Vec<OsString> = argv.into_iter().map(Into::into).collect();
    let color = initial_color(&argv);
    let styled = color.unwrap_or_else(|| std::io::IsTerminal::is_terminal(&std::io::stdout()));

    let matches = Args::command()
        .long_version(long_version())
        .color(color_choice(color))
        .styles(palette_to_clap(styled))
        .try_get_matches_from(argv)?;
    Args::from_arg_matches(&matches)
}

/// Log level from `--log-level`, else from `-v`/`-q`
fn effective_log_level(args: &Args) -> String {
    match (&args.log_level, args.verbosity()) {
        (Some(level), 0) => level.clone(),
        (_, verbosity) => verbosity_level(verbosity).to_string(),
    }
}

/// `none` or `-` disables file logging
fn effective_log_file(args: &Args) -> Option<String> {
    args.log_file
        .as_ref()
        .map(|path| path.to_string_lossy().to_string())
        .filter(|file| !matches!(file.to_ascii_lowercase().as_str(), "none" | "-"))
}

/// Run the application; returns the process exit code
pub async fn startup() -> i32 {
    let mut args = match parse_args(std::env::args_os()) {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return e.exit_code();
        }
    };

    // Logging is not up yet; configuration errors go straight to stderr
    if let Err(e) = args.load_config_file().await {
        eprintln!("Error: {}", e);
        return EXIT_USAGE;
    }

    let log_level = effective_log_level(&args);
    let log_file = effective_log_file(&args);
    if let Err(e) = init_logging(
        Some(&log_level),
        args.log_format.as_deref(),
        log_file.as_deref(),
        args.use_color(),
    ) {
        eprintln!("Error: could not start logging: {}", e);
        return EXIT_USAGE;
    }
    log::debug!("plugin-updater {}", long_version());

    if let Err(e) = args.validate() {
        log_error_with_context(&e, "Validating arguments");
        return EXIT_USAGE;
    }

    match commands::run(&args).await {
        Ok(code) => code,
        Err(e) => {
            log_error_with_context(&e, "Running command");
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(list: &[&str]) -> Vec<OsString> {
        list.iter().map(OsString::from).collect()
    }

    #[test]
    fn test_initial_color_last_flag_wins() {
        assert_eq!(initial_color(&argv(&["plugin-updater"])), None);
        assert_eq!(initial_color(&argv(&["plugin-updater", "--color"])), Some(true));
        assert_eq!(
            initial_color(&argv(&["plugin-updater", "--color", "check", "-n"])),
            Some(false)
        );
        assert_eq!(
            initial_color(&argv(&["plugin-updater", "--", "--color"])),
            None
        );
    }

    #[test]
    fn test_effective_log_level() {
        let mut args = Args::new();
        assert_eq!(effective_log_level(&args), "info");
        args.log_level = Some("warn".to_string());
        assert_eq!(effective_log_level(&args), "warn");
        args.verbose = 2;
        assert_eq!(effective_log_level(&args), "trace");
    }

    #[test]
    fn test_log_file_none_disables_file_logging() {
        let mut args = Args::new();
        assert_eq!(effective_log_file(&args), None);
        args.log_file = Some("none".into());
        assert_eq!(effective_log_file(&args), None);
        args.log_file = Some("-".into());
        assert_eq!(effective_log_file(&args), None);
        args.log_file = Some("/tmp/updater.log".into());
        assert_eq!(effective_log_file(&args).as_deref(), Some("/tmp/updater.log"));
    }

    #[test]
    fn test_parse_args_reports_usage_errors() {
        let err = parse_args(["plugin-updater", "rollback"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
