//! `fetchbot config` subcommands.

use std::path::Path;

use anyhow::{Context, Result};
use fetchbot_config::{apply_all_defaults, load_prepared, redact, write_config, FetchbotConfig};

/// Print the effective config with secrets masked, followed by any findings.
pub async fn show(path: &Path) -> Result<()> {
    let (config, report) = load_prepared(path).await?;
    print!("{}", render_redacted(&config)?);

    for warning in &report.warnings {
        eprintln!("warning: {}: {}", warning.path, warning.message);
    }
    for error in &report.errors {
        eprintln!("error: {}: {}", error.path, error.message);
    }
    Ok(())
}

/// Write a config file populated with every default.
pub async fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    write_config(&apply_all_defaults(FetchbotConfig::default()), path).await?;
    println!("Wrote {}", path.display());
    Ok(())
}

pub fn render_redacted(config: &FetchbotConfig) -> Result<String> {
    let value = serde_json::to_value(config).context("Failed to serialize config")?;
    serde_yaml::to_string(&redact(&value)).context("Failed to render config as YAML")
}
