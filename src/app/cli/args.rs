//! Core CLI arguments structure and basic functionality
//!
//! This module contains the main Args struct definition and the accessors the
//! commands use. Configuration file loading lives in `config`.

use crate::core::validation::ValidationError;
use crate::rollback::api::DEFAULT_NONCE_LIFETIME_SECS;
use crate::updater::api::{ClientCredentials, DEFAULT_CACHE_TTL_SECS, DEFAULT_REDIRECT, DEFAULT_TIMEOUT_SECS};
use clap::{ArgAction, Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Session token used when the caller does not name one
pub const DEFAULT_SESSION: &str = "cli";

#[derive(Parser, Debug, Clone, Default, PartialEq)]
#[command(name = "plugin-updater")]
#[command(about = "Update checks and rollbacks for self-hosted plugins")]
#[command(version)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long = "config-file", value_name = "FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Main plugin file (the one carrying the plugin header)
    #[arg(short = 'p', long = "plugin-file", value_name = "FILE", global = true)]
    pub plugin_file: Option<PathBuf>,

    /// Plugins directory (default: two levels above the plugin file)
    #[arg(short = 'd', long = "plugins-dir", value_name = "DIR", global = true)]
    pub plugins_dir: Option<PathBuf>,

    /// Site directory holding activation state (default: parent of the plugins directory)
    #[arg(long = "site-dir", value_name = "DIR", global = true)]
    pub site_dir: Option<PathBuf>,

    /// Public URL of this site
    #[arg(long = "site-url", value_name = "URL", global = true)]
    pub site_url: Option<String>,

    /// License key sent to the update server
    #[arg(short = 'k', long = "license-key", value_name = "KEY", global = true)]
    pub license_key: Option<String>,

    /// Product identifier sent to the update server
    #[arg(long = "product-id", value_name = "ID", global = true)]
    pub product_id: Option<String>,

    /// Extra request argument (repeatable)
    #[arg(long = "arg", value_name = "KEY=VALUE", value_parser = parse_key_value, action = ArgAction::Append, global = true)]
    pub extra_args: Vec<(String, String)>,

    /// Directory for cached update decisions
    #[arg(long = "cache-dir", value_name = "DIR", global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Keep update decisions in memory only
    #[arg(long = "no-cache", global = true)]
    pub no_cache: bool,

    /// Seconds a cached update decision stays valid
    #[arg(long = "cache-ttl", value_name = "SECONDS", global = true)]
    pub cache_ttl: Option<u64>,

    /// Update server request timeout in seconds
    #[arg(short = 't', long = "timeout", value_name = "SECONDS", global = true)]
    pub timeout: Option<u64>,

    /// Secret used to sign rollback tokens
    #[arg(long = "nonce-secret", value_name = "SECRET", global = true, hide = true)]
    pub nonce_secret: Option<String>,

    /// Rollback token lifetime in seconds
    #[arg(long = "nonce-lifetime", value_name = "SECONDS", global = true)]
    pub nonce_lifetime: Option<u64>,

    /// Only install rollback packages served from the update server's host
    #[arg(long = "same-origin-packages", global = true)]
    pub same_origin_packages: bool,

    /// Local directory serving published rollback packages by URL path
    #[arg(long = "package-mirror", value_name = "DIR", global = true)]
    pub package_mirror: Option<PathBuf>,

    /// Where callers go after a forced recheck
    #[arg(long = "redirect-to", value_name = "TARGET", global = true)]
    pub redirect_to: Option<String>,

    /// Whether the caller may manage updates (configuration only)
    #[arg(skip)]
    pub manage_updates: Option<bool>,

    /// Attach state traces to rollback results
    #[arg(long = "debug-trace", global = true)]
    pub debug_trace: bool,

    /// More log output (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Less log output (repeatable)
    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Force colored output (overrides TTY detection)
    #[arg(short = 'g', long = "color", overrides_with = "no_color", global = true)]
    pub color: bool,

    /// Disable colored output
    #[arg(short = 'n', long = "no-color", overrides_with = "color", global = true)]
    pub no_color: bool,

    /// Color setting from the configuration file
    #[arg(skip)]
    pub config_color: Option<bool>,

    /// Log level
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", value_parser = ["trace", "debug", "info", "warn", "error", "off"], global = true)]
    pub log_level: Option<String>,

    /// Log file path (use 'none' to disable file logging)
    #[arg(short = 'f', long = "log-file", value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,

    /// Log output format
    #[arg(short = 'o', long = "log-format", value_name = "FORMAT", value_parser = ["text", "ext", "json"], global = true)]
    pub log_format: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Check whether a newer version is available (default)
    Check {
        /// Ignore the cached decision
        #[arg(long)]
        force: bool,
        /// Print the decision as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the plugin details published by the update server
    Info {
        #[arg(long)]
        json: bool,
    },
    /// Roll the plugin back to a published version
    Rollback {
        /// Version to install
        #[arg(long = "to", value_name = "VERSION")]
        target_version: String,
        /// Rollback token (issued on the spot when omitted)
        #[arg(long, value_name = "TOKEN")]
        nonce: Option<String>,
        /// Session the token belongs to
        #[arg(long, value_name = "SESSION")]
        session: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Clear the cached update decision
    Recheck,
    /// Issue a rollback token for a session
    Nonce {
        #[arg(long, value_name = "SESSION")]
        session: Option<String>,
    },
}

impl Default for Command {
    fn default() -> Self {
        Command::Check {
            force: false,
            json: false,
        }
    }
}

/// Parse `KEY=VALUE`
pub fn parse_key_value(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((key, val)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), val.trim().to_string()))
        }
        _ => Err(format!("'{}' is not in KEY=VALUE form", value)),
    }
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_command(&self) -> Command {
        self.command.clone().unwrap_or_default()
    }

    /// `--color`/`--no-color` first, then the configuration file; `None` = auto
    pub fn color_setting(&self) -> Option<bool> {
        if self.color {
            Some(true)
        } else if self.no_color {
            Some(false)
        } else {
            self.config_color
        }
    }

    pub fn use_color(&self) -> bool {
        self.color_setting()
            .unwrap_or_else(|| std::io::IsTerminal::is_terminal(&std::io::stdout()))
    }

    /// `-v` minus `-q`
    pub fn verbosity(&self) -> i8 {
        (self.verbose.min(64) as i8) - (self.quiet.min(64) as i8)
    }

    pub fn plugin_file(&self) -> Result<&Path, ValidationError> {
        self.plugin_file.as_deref().ok_or_else(|| {
            ValidationError::new("No plugin file given (use --plugin-file or 'plugin-file' in the configuration)")
        })
    }

    pub fn plugins_dir(&self) -> Result<PathBuf, ValidationError> {
        if let Some(dir) = &self.plugins_dir {
            return Ok(dir.clone());
        }
        self.plugin_file()?
            .parent()
            .and_then(Path::parent)
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .ok_or_else(|| ValidationError::new("Cannot derive the plugins directory; use --plugins-dir"))
    }

    pub fn site_dir(&self) -> Result<PathBuf, ValidationError> {
        if let Some(dir) = &self.site_dir {
            return Ok(dir.clone());
        }
        let plugins_dir = self.plugins_dir()?;
        Ok(plugins_dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or(plugins_dir))
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("PluginUpdater")
        })
    }

    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS).max(1))
    }

    pub fn cache_ttl_secs(&self) -> i64 {
        self.cache_ttl
            .map(|ttl| ttl.min(i64::MAX as u64) as i64)
            .unwrap_or(DEFAULT_CACHE_TTL_SECS)
    }

    pub fn nonce_lifetime_secs(&self) -> i64 {
        self.nonce_lifetime
            .map(|secs| secs.min(i64::MAX as u64) as i64)
            .unwrap_or(DEFAULT_NONCE_LIFETIME_SECS)
    }

    /// Configured secret, or one bound to this site's location
    pub fn nonce_secret(&self) -> Result<String, ValidationError> {
        match &self.nonce_secret {
            Some(secret) if !secret.is_empty() => Ok(secret.clone()),
            _ => {
                log::debug!("No nonce-secret configured; deriving one from the site directory");
                Ok(format!("plugin-updater:{}", self.site_dir()?.display()))
            }
        }
    }

    pub fn redirect_to(&self) -> String {
        self.redirect_to
            .clone()
            .unwrap_or_else(|| DEFAULT_REDIRECT.to_string())
    }

    pub fn can_manage_updates(&self) -> bool {
        self.manage_updates.unwrap_or(true)
    }

    pub fn credentials(&self) -> ClientCredentials {
        ClientCredentials {
            license_key: self.license_key.clone().unwrap_or_default(),
            product_id: self.product_id.clone().unwrap_or_default(),
            extra_args: self.extra_args.iter().cloned().collect::<BTreeMap<_, _>>(),
            site_url: self.site_url.clone(),
        }
    }

    /// Validate CLI arguments for consistency and constraints
    pub fn validate(&self) -> Result<(), ValidationError> {
        let plugin_file = self.plugin_file()?;
        if !plugin_file.is_file() {
            return Err(ValidationError::new(&format!(
                "Plugin file does not exist: '{}'",
                plugin_file.display()
            )));
        }
        let plugins_dir = self.plugins_dir()?;
        if !plugins_dir.is_dir() {
            return Err(ValidationError::new(&format!(
                "Plugins directory does not exist: '{}'",
                plugins_dir.display()
            )));
        }
        if let Some(mirror) = self.package_mirror.as_deref().filter(|dir| !dir.is_dir()) {
            return Err(ValidationError::new(&format!(
                "Package mirror does not exist: '{}'",
                mirror.display()
            )));
        }
        if self.timeout == Some(0) {
            return Err(ValidationError::new("Timeout must be greater than 0"));
        }
        if self.nonce_lifetime.is_some_and(|secs| secs < 2) {
            return Err(ValidationError::new("Nonce lifetime must be at least 2 seconds"));
        }
        if let Some(site_url) = &self.site_url {
            reqwest::Url::parse(site_url).map_err(|e| {
                ValidationError::new(&format!("Invalid site URL '{}': {}", site_url, e))
            })?;
        }
        Ok(())
    }
}
