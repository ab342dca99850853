//! Config validation with field paths and user-friendly messages.

use crate::schema::FetchbotConfig;
use thiserror::Error;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// All errors and warnings found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Emit every finding through `tracing`.
    pub fn log(&self) {
        for warning in &self.warnings {
            tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
        }
        for error in &self.errors {
            tracing::error!(path = %error.path, message = %error.message, "Config error");
        }
    }

    /// Fail with every error joined into one message.
    pub fn ensure_valid(&self) -> anyhow::Result<()> {
        if self.is_valid() {
            return Ok(());
        }
        let joined = self.errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ");
        anyhow::bail!("Invalid config: {joined}")
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

const KNOWN_MERGE_FORMATS: &[&str] = &["mp4", "mkv", "webm", "mov", "avi", "flv"];
const KNOWN_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &FetchbotConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_downloads(config, &mut report);
    validate_video(config, &mut report);
    validate_whatsapp(config, &mut report);
    validate_server(config, &mut report);
    validate_logging(config, &mut report);
    report
}

fn validate_downloads(config: &FetchbotConfig, report: &mut ValidationReport) {
    let d = &config.downloads;
    if d.folder.as_ref().is_some_and(|f| f.as_os_str().is_empty()) {
        report.error("downloads.folder", "Download folder cannot be empty");
    }
    if d.chunk_size == Some(0) {
        report.error("downloads.chunkSize", "chunkSize must be > 0");
    }
    if d.request_timeout_secs == Some(0) {
        report.error("downloads.requestTimeoutSecs", "requestTimeoutSecs must be > 0");
    }
    if d.connect_timeout_secs == Some(0) {
        report.error("downloads.connectTimeoutSecs", "connectTimeoutSecs must be > 0");
    }
}

fn validate_video(config: &FetchbotConfig, report: &mut ValidationReport) {
    let v = &config.video;
    if v.timeout_secs == Some(0) {
        report.error("video.timeoutSecs", "timeoutSecs must be > 0");
    }
    if v.output_template.as_deref().is_some_and(|t| t.trim().is_empty()) {
        report.error("video.outputTemplate", "Output template cannot be empty");
    }
    let merge = v.merge_output_format();
    if !KNOWN_MERGE_FORMATS.contains(&merge) {
        report.warn(
            "video.mergeOutputFormat",
            format!("Unrecognized merge format '{merge}'; yt-dlp may reject it"),
        );
    }
}

fn validate_whatsapp(config: &FetchbotConfig, report: &mut ValidationReport) {
    let Some(wa) = &config.whatsapp else { return };
    let blank = |v: &Option<String>| v.as_deref().map(str::trim).map(str::is_empty).unwrap_or(true);

    if blank(&wa.token) {
        report.warn("whatsapp.token", "No access token; replies cannot be sent");
    }
    if blank(&wa.phone_number_id) {
        report.warn("whatsapp.phoneNumberId", "No phone number id; replies cannot be sent");
    }
    if blank(&wa.verify_token) {
        report.warn("whatsapp.verifyToken", "No verify token; webhook verification will always fail");
    }
    if !wa.webhook_path().starts_with('/') {
        report.error("whatsapp.webhookPath", "webhookPath must start with '/'");
    }
}

fn validate_server(config: &FetchbotConfig, report: &mut ValidationReport) {
    if config.server.port == Some(0) {
        report.error("server.port", "port must be between 1 and 65535");
    }
    if config.server.bind.as_deref().is_some_and(|b| b.trim().is_empty()) {
        report.error("server.bind", "bind address cannot be empty");
    }
}

fn validate_logging(config: &FetchbotConfig, report: &mut ValidationReport) {
    let level = config.logging.level();
    // Directives such as "fetchbot=debug" are passed through to EnvFilter as-is.
    if !level.contains('=') && !KNOWN_LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
        report.warn("logging.level", format!("Unknown log level '{level}'"));
    }
}
