//! Outbound WhatsApp messages through the Meta Graph API.
//!
//! `POST {api_base}/{api_version}/{phone_number_id}/messages` with a bearer
//! token and a plain text body.

use anyhow::{Context, Result, bail};
use fetchbot_core::OutboundReply;
use logging::redact_sensitive_data;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

#[derive(Serialize)]
struct GraphTextMessage<'a> {
    messaging_product: &'static str,
    to: &'a str,
    text: GraphText<'a>,
}

#[derive(Serialize)]
struct GraphText<'a> {
    body: &'a str,
}

/// Sends replies on behalf of one WhatsApp business phone number.
#[derive(Clone)]
pub struct GraphSender {
    client: Client,
    messages_url: String,
    token: String,
}

impl GraphSender {
    pub fn new(api_base: &str, api_version: &str, phone_number_id: &str, token: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build Graph API client")?;
        Ok(Self {
            client,
            messages_url: format!(
                "{}/{}/{}/messages",
                api_base.trim_end_matches('/'),
                api_version.trim_matches('/'),
                phone_number_id
            ),
            token: token.into(),
        })
    }

    pub fn messages_url(&self) -> &str {
        &self.messages_url
    }

    /// Deliver one reply. Non-2xx responses are errors carrying the body.
    pub async fn send(&self, reply: &OutboundReply) -> Result<()> {
        let payload = GraphTextMessage {
            messaging_product: "whatsapp",
            to: &reply.to,
            text: GraphText { body: &reply.text },
        };

        let resp = self
            .client
            .post(&self.messages_url)
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await
            .context("Graph API request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("Graph API returned {}: {}", status, redact_sensitive_data(&body));
        }

        debug!(in_reply_to = %reply.in_reply_to, "WhatsApp reply delivered");
        Ok(())
    }
}
