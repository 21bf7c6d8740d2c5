//! TOML configuration file parsing and loading
//!
//! This module handles loading and parsing of TOML configuration files,
//! including default config file discovery and validation of config values.
//! Values from the file only fill in what the command line left unset.

use crate::core::error_handling::ContextualError;
use crate::core::validation::{validate_positive_int, validate_update_uri, ValidationError};
use std::path::{Path, PathBuf};

use super::args::{parse_key_value, Args};

pub const CONFIG_DIR_NAME: &str = "PluginUpdater";
pub const CONFIG_FILE_NAME: &str = "plugin-updater.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("The specified configuration file does not exist: {path:?}")]
    NotFound { path: PathBuf },

    #[error("Error reading configuration file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error parsing configuration file {path:?}: {cause}")]
    Parse { path: PathBuf, cause: String },

    #[error("Error in configuration file {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: ValidationError,
    },
}

impl ContextualError for ConfigError {
    fn is_user_actionable(&self) -> bool {
        !matches!(self, ConfigError::Read { .. })
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            ConfigError::NotFound { .. } => Some("The specified configuration file does not exist"),
            ConfigError::Read { .. } => None,
            ConfigError::Parse { .. } => Some("The configuration file is not valid TOML"),
            ConfigError::Invalid { source, .. } => Some(source.message()),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// `<config_dir>/PluginUpdater/plugin-updater.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

fn get_str<'a>(config: &'a toml::Table, key: &str) -> Result<Option<&'a str>, ValidationError> {
    match config.get(key) {
        None => Ok(None),
        Some(toml::Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(ValidationError::new(&format!(
            "'{}' must be a string, found {}",
            key,
            other.type_str()
        ))),
    }
}

fn get_bool(config: &toml::Table, key: &str) -> Result<Option<bool>, ValidationError> {
    match config.get(key) {
        None => Ok(None),
        Some(toml::Value::Boolean(b)) => Ok(Some(*b)),
        Some(other) => Err(ValidationError::new(&format!(
            "'{}' must be true or false, found {}",
            key,
            other.type_str()
        ))),
    }
}

/// Accepts an integer or a numeric string
fn get_seconds(config: &toml::Table, key: &str) -> Result<Option<u64>, ValidationError> {
    match config.get(key) {
        None => Ok(None),
        Some(toml::Value::Integer(i)) if *i > 0 => Ok(Some(*i as u64)),
        Some(toml::Value::Integer(_)) => Err(ValidationError::new(&format!(
            "'{}' must be a positive number of seconds",
            key
        ))),
        Some(toml::Value::String(s)) => validate_positive_int(s)
            .map(Some)
            .map_err(|e| ValidationError::new(&format!("'{}': {}", key, e.message()))),
        Some(other) => Err(ValidationError::new(&format!(
            "'{}' must be a number, found {}",
            key,
            other.type_str()
        ))),
    }
}

fn fill_string(target: &mut Option<String>, value: Option<&str>) {
    if target.is_none() {
        if let Some(value) = value {
            *target = Some(value.to_string());
        }
    }
}

fn fill_path(target: &mut Option<PathBuf>, value: Option<&str>) {
    if target.is_none() {
        if let Some(value) = value {
            *target = Some(PathBuf::from(value));
        }
    }
}

impl Args {
    /// Load the configuration file and apply it; returns the raw table if one was read
    ///
    /// An explicitly named file must exist; the default location is optional.
    pub async fn load_config_file(&mut self) -> ConfigResult<Option<toml::Table>> {
        let path = match self.config_file.clone() {
            Some(path) if !path.exists() => return Err(ConfigError::NotFound { path }),
            Some(path) => path,
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(None),
            },
        };
        log::debug!("Loading configuration from {:?}", path);
        self.load_config_from(&path).await.map(Some)
    }

    async fn load_config_from(&mut self, path: &Path) -> ConfigResult<toml::Table> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let config = toml::from_str::<toml::Table>(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            cause: e.to_string(),
        })?;
        Self::apply_toml_values(self, &config).map_err(|source| ConfigError::Invalid {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config)
    }

    /// Apply TOML configuration values to Args
    pub fn apply_toml_values(args: &mut Self, config: &toml::Table) -> Result<(), ValidationError> {
        fill_path(&mut args.plugin_file, get_str(config, "plugin-file")?);
        fill_path(&mut args.plugins_dir, get_str(config, "plugins-dir")?);
        fill_path(&mut args.site_dir, get_str(config, "site-dir")?);
        fill_path(&mut args.cache_dir, get_str(config, "cache-dir")?);
        fill_path(&mut args.package_mirror, get_str(config, "package-mirror")?);
        fill_string(&mut args.license_key, get_str(config, "license-key")?);
        fill_string(&mut args.product_id, get_str(config, "product-id")?);
        fill_string(&mut args.nonce_secret, get_str(config, "nonce-secret")?);
        fill_string(&mut args.redirect_to, get_str(config, "redirect-to")?);

        if args.site_url.is_none() {
            if let Some(site_url) = get_str(config, "site-url")? {
                validate_update_uri(site_url)
                    .map_err(|e| ValidationError::new(&format!("'site-url': {}", e.message())))?;
                args.site_url = Some(site_url.to_string());
            }
        }

        if args.cache_ttl.is_none() {
            args.cache_ttl = get_seconds(config, "cache-ttl")?;
        }
        if args.timeout.is_none() {
            args.timeout = get_seconds(config, "timeout")?;
        }
        if args.nonce_lifetime.is_none() {
            args.nonce_lifetime = get_seconds(config, "nonce-lifetime")?;
        }

        if get_bool(config, "verbose")? == Some(true) {
            args.debug_trace = true;
        }
        if get_bool(config, "same-origin-packages")? == Some(true) {
            args.same_origin_packages = true;
        }
        if get_bool(config, "no-cache")? == Some(true) {
            args.no_cache = true;
        }
        if args.manage_updates.is_none() {
            args.manage_updates = get_bool(config, "manage-updates")?;
        }
        args.config_color = get_bool(config, "color")?;

        if args.log_level.is_none() {
            if let Some(level) = get_str(config, "log-level")? {
                let level = level.to_ascii_lowercase();
                if !["trace", "debug", "info", "warn", "error", "off"].contains(&level.as_str()) {
                    return Err(ValidationError::new(&format!(
                        "'log-level' must be one of trace, debug, info, warn, error, off (got '{}')",
                        level
                    )));
                }
                args.log_level = Some(level);
            }
        }
        if args.log_format.is_none() {
            if let Some(format) = get_str(config, "log-format")? {
                let format = format.to_ascii_lowercase();
                if !["text", "ext", "json"].contains(&format.as_str()) {
                    return Err(ValidationError::new(&format!(
                        "'log-format' must be one of text, ext, json (got '{}')",
                        format
                    )));
                }
                args.log_format = Some(format);
            }
        }
        fill_path(&mut args.log_file, get_str(config, "log-file")?);

        Self::apply_extra_args(args, config)
    }

    /// `[args]` table; command-line `--arg` entries win on key clashes
    fn apply_extra_args(args: &mut Self, config: &toml::Table) -> Result<(), ValidationError> {
        let Some(value) = config.get("args") else {
            return Ok(());
        };
        let table = value
            .as_table()
            .ok_or_else(|| ValidationError::new("'args' must be a table of KEY = VALUE pairs"))?;

        let mut from_file = Vec::new();
        for (key, value) in table {
            if args.extra_args.iter().any(|(k, _)| k == key) {
                continue;
            }
            let text = match value {
                toml::Value::String(s) => s.clone(),
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Float(f) => f.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                other => {
                    return Err(ValidationError::new(&format!(
                        "'args.{}' must be a plain value, found {}",
                        key,
                        other.type_str()
                    )))
                }
            };
            from_file.push(parse_key_value(&format!("{}={}", key, text)).map_err(|e| ValidationError::new(&e))?);
        }
        from_file.append(&mut args.extra_args);
        args.extra_args = from_file;
        Ok(())
    }
}
