//! `fetchbot-config`: Fetchbot runtime configuration.
//!
//! Provides:
//! - Typed config schema (downloads, video, WhatsApp, server, logging)
//! - YAML read/write with atomic replace
//! - `${ENV_VAR}` substitution and well-known env overrides
//! - Config redaction for safe display
//! - Default value application
//! - Validation with errors and warnings

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{apply_env_overrides_with, resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_config, write_config};
pub use redact::redact;
pub use schema::{
    DownloadsConfig, FetchbotConfig, LoggingConfig, ServerConfig, VideoConfig, WhatsAppConfig,
};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;

/// Load a config file and run it through the preparation pipeline:
/// `${VAR}` substitution, env overrides, defaults, then validation.
///
/// A missing file yields the defaults (plus env overrides). The report is
/// handed back unlogged because the logger itself depends on this config.
pub async fn load_prepared(path: &Path) -> Result<(FetchbotConfig, ValidationReport)> {
    let value = io::load_raw(path).await?;
    let config = prepare_value(value, &|name: &str| std::env::var(name).ok())?;
    let report = validate(&config);
    Ok((config, report))
}

/// Everything in `load_prepared` after reading the file, minus validation.
pub fn prepare_value(
    value: Value,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Result<FetchbotConfig> {
    let value = resolve_env_vars_with(&value, lookup)
        .context("Failed to resolve env vars in config")?;

    let config: FetchbotConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;

    let config = apply_env_overrides_with(config, lookup);
    Ok(apply_all_defaults(config))
}
