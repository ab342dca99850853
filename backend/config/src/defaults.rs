//! Config defaults: applies default values to parsed config.

use std::path::PathBuf;

use crate::schema::FetchbotConfig;

pub const DEFAULT_DOWNLOAD_FOLDER: &str = "./downloads";
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

pub const DEFAULT_VIDEO_BINARY: &str = "yt-dlp";
pub const DEFAULT_VIDEO_FORMAT: &str = "bestvideo+bestaudio/best";
pub const DEFAULT_MERGE_OUTPUT_FORMAT: &str = "mp4";
pub const DEFAULT_OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";
pub const DEFAULT_VIDEO_TIMEOUT_SECS: u64 = 3600;

pub const DEFAULT_GRAPH_API_BASE: &str = "https://graph.facebook.com";
pub const DEFAULT_GRAPH_API_VERSION: &str = "v17.0";
pub const DEFAULT_WEBHOOK_PATH: &str = "/webhook";

pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: FetchbotConfig) -> FetchbotConfig {
    let config = apply_download_defaults(config);
    let config = apply_video_defaults(config);
    let config = apply_whatsapp_defaults(config);
    let config = apply_server_defaults(config);
    apply_logging_defaults(config)
}

fn apply_download_defaults(mut config: FetchbotConfig) -> FetchbotConfig {
    let d = &mut config.downloads;
    d.folder.get_or_insert_with(|| PathBuf::from(DEFAULT_DOWNLOAD_FOLDER));
    d.chunk_size.get_or_insert(DEFAULT_CHUNK_SIZE);
    d.request_timeout_secs.get_or_insert(DEFAULT_REQUEST_TIMEOUT_SECS);
    d.connect_timeout_secs.get_or_insert(DEFAULT_CONNECT_TIMEOUT_SECS);
    config
}

fn apply_video_defaults(mut config: FetchbotConfig) -> FetchbotConfig {
    let v = &mut config.video;
    v.binary.get_or_insert_with(|| PathBuf::from(DEFAULT_VIDEO_BINARY));
    v.format.get_or_insert_with(|| DEFAULT_VIDEO_FORMAT.to_string());
    v.merge_output_format.get_or_insert_with(|| DEFAULT_MERGE_OUTPUT_FORMAT.to_string());
    v.output_template.get_or_insert_with(|| DEFAULT_OUTPUT_TEMPLATE.to_string());
    v.no_playlist.get_or_insert(true);
    v.timeout_secs.get_or_insert(DEFAULT_VIDEO_TIMEOUT_SECS);
    config
}

/// Only fills an existing section; a missing one keeps the webhook off.
fn apply_whatsapp_defaults(mut config: FetchbotConfig) -> FetchbotConfig {
    if let Some(wa) = config.whatsapp.as_mut() {
        wa.api_base.get_or_insert_with(|| DEFAULT_GRAPH_API_BASE.to_string());
        wa.api_version.get_or_insert_with(|| DEFAULT_GRAPH_API_VERSION.to_string());
        wa.webhook_path.get_or_insert_with(|| DEFAULT_WEBHOOK_PATH.to_string());
    }
    config
}

fn apply_server_defaults(mut config: FetchbotConfig) -> FetchbotConfig {
    config.server.bind.get_or_insert_with(|| DEFAULT_BIND.to_string());
    config.server.port.get_or_insert(DEFAULT_PORT);
    config
}

fn apply_logging_defaults(mut config: FetchbotConfig) -> FetchbotConfig {
    config.logging.level.get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::WhatsAppConfig;

    #[test]
    fn fills_missing_values() {
        let cfg = apply_all_defaults(FetchbotConfig::default());
        assert_eq!(cfg.downloads.chunk_size, Some(DEFAULT_CHUNK_SIZE));
        assert_eq!(cfg.server.port, Some(DEFAULT_PORT));
        assert_eq!(cfg.logging.level.as_deref(), Some("info"));
        assert!(cfg.whatsapp.is_none());
    }

    #[test]
    fn keeps_explicit_values() {
        let mut cfg = FetchbotConfig::default();
        cfg.downloads.chunk_size = Some(1024);
        cfg.whatsapp = Some(WhatsAppConfig {
            api_version: Some("v19.0".into()),
            ..Default::default()
        });
        let cfg = apply_all_defaults(cfg);
        assert_eq!(cfg.downloads.chunk_size, Some(1024));
        let wa = cfg.whatsapp.unwrap();
        assert_eq!(wa.api_version.as_deref(), Some("v19.0"));
        assert_eq!(wa.webhook_path.as_deref(), Some(DEFAULT_WEBHOOK_PATH));
    }
}
