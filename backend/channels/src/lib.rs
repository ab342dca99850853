use async_trait::async_trait;

pub mod console;
pub mod graph;
pub mod whatsapp;

pub use console::{run_console, ConsoleAdapter};
pub use graph::GraphSender;
pub use whatsapp::{WebhookPayload, WhatsAppAdapter, WhatsAppSettings};

/// All channel adapters implement this trait.
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    /// Human-readable adapter name for logging.
    fn name(&self) -> &str;

    /// Build an optional Axum sub-router for inbound webhook endpoints.
    /// Adapters that read from a local stream return an empty router.
    fn build_router(&self) -> axum::Router {
        axum::Router::new()
    }

    /// Run the adapter's own loop, if it has one. Webhook-only adapters
    /// return immediately.
    async fn start(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
