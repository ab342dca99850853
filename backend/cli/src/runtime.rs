//! Wiring from a prepared `FetchbotConfig` to live components.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use fetchbot_channels::WhatsAppSettings;
use fetchbot_commands::CommandRouter;
use fetchbot_config::FetchbotConfig;
use fetchbot_downloader::{DownloadService, DownloadSettings, VideoSettings, YtDlpFetcher};

pub fn download_service(config: &FetchbotConfig) -> Result<Arc<DownloadService>> {
    let downloads = &config.downloads;
    let mut settings = DownloadSettings {
        destination_dir: downloads.folder(),
        chunk_size: downloads.chunk_size(),
        request_timeout: Duration::from_secs(downloads.request_timeout_secs()),
        connect_timeout: Duration::from_secs(downloads.connect_timeout_secs()),
        ..DownloadSettings::default()
    };
    if let Some(agent) = &downloads.user_agent {
        settings.user_agent = agent.clone();
    }

    let video = &config.video;
    let video_settings = VideoSettings {
        template: video.output_template().to_string(),
        format: video.format().to_string(),
        merge_format: video.merge_output_format().to_string(),
        no_playlist: video.no_playlist(),
    };
    let fetcher = YtDlpFetcher::new(video.binary(), Duration::from_secs(video.timeout_secs()))
        .with_extra_args(video.extra_args.clone());

    let service = DownloadService::new(settings, video_settings, Arc::new(fetcher))
        .with_context(|| format!("Failed to prepare download folder {}", downloads.folder().display()))?;
    Ok(Arc::new(service))
}

pub fn command_router(config: &FetchbotConfig) -> Result<Arc<CommandRouter>> {
    Ok(Arc::new(CommandRouter::new(download_service(config)?)))
}

/// `None` when the config has no `whatsapp` section.
pub fn whatsapp_settings(config: &FetchbotConfig) -> Option<WhatsAppSettings> {
    let wa = config.whatsapp.as_ref()?;
    Some(WhatsAppSettings {
        token: wa.token.clone(),
        phone_number_id: wa.phone_number_id.clone(),
        verify_token: wa.verify_token.clone(),
        api_base: wa.api_base().to_string(),
        api_version: wa.api_version().to_string(),
        webhook_path: wa.webhook_path().to_string(),
    })
}
