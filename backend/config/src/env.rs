//! Environment handling for config values.
//!
//! Two mechanisms:
//! - `${VAR_NAME}` references inside string values of the config file,
//!   resolved before deserialization (uppercase `[A-Z_][A-Z0-9_]*` only;
//!   `$${VAR}` is left as a literal `${VAR}`).
//! - Well-known variables (`DOWNLOAD_FOLDER`, `WHATSAPP_TOKEN`, ...) that
//!   override individual fields after the file is loaded.

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;
use std::path::PathBuf;

use crate::schema::{FetchbotConfig, WhatsAppConfig};

/// `${NAME}`, optionally preceded by an escaping `$`.
static ENV_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\$?)\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

/// Error returned for a reference to an unset or empty variable.
#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Resolve `${VAR}` references through `lookup`.
pub fn resolve_env_vars_with(value: &Value, lookup: &dyn Fn(&str) -> Option<String>) -> Result<Value> {
    resolve_at(value, lookup, "")
}

fn resolve_at(value: &Value, lookup: &dyn Fn(&str) -> Option<String>, path: &str) -> Result<Value> {
    Ok(match value {
        Value::String(s) => Value::String(resolve_string(s, lookup, path)?),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .enumerate()
                .map(|(i, v)| resolve_at(v, lookup, &format!("{path}[{i}]")))
                .collect::<Result<_>>()?,
        ),
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                let child = if path.is_empty() { k.clone() } else { format!("{path}.{k}") };
                out.insert(k.clone(), resolve_at(v, lookup, &child)?);
            }
            Value::Object(out)
        }
        other => other.clone(),
    })
}

fn resolve_string(s: &str, lookup: &dyn Fn(&str) -> Option<String>, path: &str) -> Result<String> {
    if !s.contains("${") {
        return Ok(s.to_string());
    }

    let mut missing: Option<MissingEnvVarError> = None;
    let resolved = ENV_REF.replace_all(s, |caps: &Captures| {
        let name = &caps[2];
        if !caps[1].is_empty() {
            return format!("${{{name}}}");
        }
        match lookup(name).filter(|v| !v.is_empty()) {
            Some(val) => val,
            None => {
                missing.get_or_insert_with(|| MissingEnvVarError {
                    var_name: name.to_string(),
                    config_path: path.to_string(),
                });
                String::new()
            }
        }
    });

    if let Some(err) = missing {
        bail!(err);
    }
    Ok(resolved.into_owned())
}

/// Apply the well-known environment overrides through `lookup`.
///
/// Empty values are ignored. Any WhatsApp variable creates the `whatsapp`
/// section if the file did not have one.
pub fn apply_env_overrides_with(
    mut config: FetchbotConfig,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> FetchbotConfig {
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(folder) = get("DOWNLOAD_FOLDER") {
        config.downloads.folder = Some(PathBuf::from(folder));
    }
    if let Some(bin) = get("YTDLP_PATH") {
        config.video.binary = Some(PathBuf::from(bin));
    }
    if let Some(bind) = get("FETCHBOT_BIND") {
        config.server.bind = Some(bind);
    }
    match get("FETCHBOT_PORT").map(|p| p.parse::<u16>()) {
        Some(Ok(port)) => config.server.port = Some(port),
        Some(Err(e)) => tracing::warn!(error = %e, "Ignoring invalid FETCHBOT_PORT"),
        None => {}
    }
    if let Some(level) = get("FETCHBOT_LOG_LEVEL") {
        config.logging.level = Some(level);
    }
    if let Some(dir) = get("FETCHBOT_LOG_DIR") {
        config.logging.dir = Some(PathBuf::from(dir));
    }

    let token = get("WHATSAPP_TOKEN");
    let phone_number_id = get("PHONE_NUMBER_ID");
    let verify_token = get("WEBHOOK_VERIFY_TOKEN");
    if token.is_some() || phone_number_id.is_some() || verify_token.is_some() {
        let wa = config.whatsapp.get_or_insert_with(WhatsAppConfig::default);
        if token.is_some() {
            wa.token = token;
        }
        if phone_number_id.is_some() {
            wa.phone_number_id = phone_number_id;
        }
        if verify_token.is_some() {
            wa.verify_token = verify_token;
        }
    }

    config
}
