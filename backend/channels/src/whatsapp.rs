/// WhatsApp Cloud API channel adapter.
///
/// Serves the Meta webhook: `GET` answers the subscription challenge, `POST`
/// carries inbound messages. Each text message is routed as a command and the
/// reply is sent back to the sender through the Graph API.
use crate::ChannelAdapter;
use crate::graph::GraphSender;
use anyhow::Result;
use async_trait::async_trait;
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use fetchbot_commands::CommandRouter;
use fetchbot_core::{InboundMessage, OutboundReply};
use logging::redact_sensitive_data;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};

pub const CHANNEL_NAME: &str = "whatsapp";

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct WhatsAppSettings {
    pub token: Option<String>,
    pub phone_number_id: Option<String>,
    pub verify_token: Option<String>,
    pub api_base: String,
    pub api_version: String,
    pub webhook_path: String,
}

// ---------------------------------------------------------------------------
// Webhook wire types
// ---------------------------------------------------------------------------

/// Every level defaults when absent; Meta sends status updates without messages.
#[derive(Debug, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub entry: Vec<Entry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub changes: Vec<Change>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Change {
    #[serde(default)]
    pub value: ChangeValue,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChangeValue {
    #[serde(default)]
    pub messages: Vec<WhatsAppMessage>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WhatsAppMessage {
    #[serde(default)]
    pub from: String,
    pub text: Option<TextData>,
}

#[derive(Debug, Deserialize)]
pub struct TextData {
    #[serde(default)]
    pub body: String,
}

impl WebhookPayload {
    /// `(sender, body)` for every message with a sender and non-empty text.
    pub fn text_messages(&self) -> Vec<(&str, &str)> {
        self.entry
            .iter()
            .flat_map(|e| &e.changes)
            .flat_map(|c| &c.value.messages)
            .filter_map(|m| m.text.as_ref().map(|t| (m.from.as_str(), t.body.as_str())))
            .filter(|(from, body)| !from.is_empty() && !body.is_empty())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct AppState {
    router: Arc<CommandRouter>,
    sender: Option<GraphSender>,
    verify_token: Option<String>,
}

pub struct WhatsAppAdapter {
    webhook_path: String,
    state: AppState,
}

impl WhatsAppAdapter {
    pub fn new(settings: WhatsAppSettings, router: Arc<CommandRouter>) -> Result<Self> {
        let sender = match (&settings.token, &settings.phone_number_id) {
            (Some(token), Some(phone_number_id)) => Some(GraphSender::new(
                &settings.api_base,
                &settings.api_version,
                phone_number_id,
                token.clone(),
            )?),
            _ => {
                warn!("WhatsApp token or phone number id missing; replies will only be logged");
                None
            }
        };

        Ok(Self {
            webhook_path: settings.webhook_path,
            state: AppState {
                router,
                sender,
                verify_token: settings.verify_token.filter(|t| !t.is_empty()),
            },
        })
    }

    pub fn webhook_path(&self) -> &str {
        &self.webhook_path
    }
}

#[async_trait]
impl ChannelAdapter for WhatsAppAdapter {
    fn name(&self) -> &str {
        CHANNEL_NAME
    }

    fn build_router(&self) -> Router {
        Router::new()
            .route(&self.webhook_path, get(verify_webhook).post(receive_webhook))
            .with_state(self.state.clone())
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn verify_webhook(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let mode = params.get("hub.mode").map(String::as_str);
    let token = params.get("hub.verify_token").map(String::as_str);
    let expected = state.verify_token.as_deref();

    if mode == Some("subscribe") && expected.is_some() && token == expected {
        info!("WhatsApp webhook verified");
        let challenge = params.get("hub.challenge").cloned().unwrap_or_default();
        (StatusCode::OK, challenge)
    } else {
        warn!(?mode, "WhatsApp webhook verification failed");
        (StatusCode::FORBIDDEN, "Verification failed".to_string())
    }
}

async fn receive_webhook(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    match serde_json::from_slice::<WebhookPayload>(&body) {
        Ok(payload) => {
            // Downloads can outlast Meta's delivery timeout, so acknowledge first.
            tokio::spawn(async move {
                process_payload(&state, &payload).await;
            });
        }
        Err(e) => warn!(error = %e, "Ignoring unparseable WhatsApp webhook body"),
    }

    (StatusCode::OK, Json(serde_json::json!({ "status": "received" })))
}

async fn process_payload(state: &AppState, payload: &WebhookPayload) -> Vec<OutboundReply> {
    let mut replies = Vec::new();
    for (from, body) in payload.text_messages() {
        let message = InboundMessage::new(CHANNEL_NAME, from, body);
        info!(
            message_id = %message.id,
            from = %redact_sensitive_data(from),
            "WhatsApp message received"
        );

        let reply = state.router.handle(&message).await;
        match &state.sender {
            Some(sender) => {
                if let Err(e) = sender.send(&reply).await {
                    error!(message_id = %message.id, error = %e, "Failed to send WhatsApp reply");
                }
            }
            None => info!(message_id = %message.id, reply = %reply.text, "No Graph API sender; reply not delivered"),
        }
        replies.push(reply);
    }
    replies
}

#[cfg(test)]
mod tests {
    use super::*;
    use fetchbot_commands::{DownloadBackend, UNKNOWN_COMMAND};
    use fetchbot_core::{DownloadRequest, DownloadResult};
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct SavesEverything;

    #[async_trait]
    impl DownloadBackend for SavesEverything {
        async fn fetch(&self, _request: &DownloadRequest) -> DownloadResult {
            DownloadResult::saved("downloads/report.pdf")
        }
    }

    fn settings(api_base: &str) -> WhatsAppSettings {
        WhatsAppSettings {
            token: Some("EAAtest".into()),
            phone_number_id: Some("1099".into()),
            verify_token: Some("let-me-in".into()),
            api_base: api_base.into(),
            api_version: "v17.0".into(),
            webhook_path: "/webhook".into(),
        }
    }

    fn adapter(api_base: &str) -> WhatsAppAdapter {
        WhatsAppAdapter::new(settings(api_base), Arc::new(CommandRouter::new(Arc::new(SavesEverything)))).unwrap()
    }

    async fn serve(adapter: &WhatsAppAdapter) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = adapter.build_router();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn text_payload(from: &str, body: &str) -> serde_json::Value {
        serde_json::json!({
            "object": "whatsapp_business_account",
            "entry": [{ "changes": [{ "value": { "messages": [
                { "from": from, "type": "text", "text": { "body": body } }
            ]}}]}]
        })
    }

    #[test]
    fn payload_tolerates_missing_levels() {
        let cases = [
            "{}",
            r#"{"entry": [{}]}"#,
            r#"{"entry": [{"changes": [{"value": {"statuses": []}}]}]}"#,
            r#"{"entry": [{"changes": [{"value": {"messages": [{"from": "1", "type": "image"}]}}]}]}"#,
        ];
        for raw in cases {
            let payload: WebhookPayload = serde_json::from_str(raw).unwrap();
            assert!(payload.text_messages().is_empty(), "{raw}");
        }
    }

    #[test]
    fn empty_text_bodies_are_skipped() {
        let payload: WebhookPayload = serde_json::from_value(serde_json::json!({
            "entry": [{ "changes": [{ "value": { "messages": [
                { "from": "15550001111", "text": { "body": "" } },
                { "from": "15550001111", "text": {} },
                { "from": "15550002222", "text": { "body": "/help" } }
            ]}}]}]
        }))
        .unwrap();
        assert_eq!(payload.text_messages(), vec![("15550002222", "/help")]);
    }

    #[tokio::test]
    async fn verification_echoes_challenge() {
        let base = serve(&adapter("http://127.0.0.1:9")).await;
        let resp = reqwest::get(format!(
            "{base}/webhook?hub.mode=subscribe&hub.verify_token=let-me-in&hub.challenge=1158201444"
        ))
        .await
        .unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.text().await.unwrap(), "1158201444");
    }

    #[tokio::test]
    async fn verification_rejects_wrong_token() {
        let base = serve(&adapter("http://127.0.0.1:9")).await;
        let resp = reqwest::get(format!(
            "{base}/webhook?hub.mode=subscribe&hub.verify_token=nope&hub.challenge=1"
        ))
        .await
        .unwrap();
        assert_eq!(resp.status(), 403);
        assert_eq!(resp.text().await.unwrap(), "Verification failed");

        let resp = reqwest::get(format!("{base}/webhook")).await.unwrap();
        assert_eq!(resp.status(), 403);
    }

    #[tokio::test]
    async fn post_always_acknowledges() {
        let base = serve(&adapter("http://127.0.0.1:9")).await;
        let client = reqwest::Client::new();
        for body in ["not json", "{}", r#"{"entry": []}"#] {
            let resp = client
                .post(format!("{base}/webhook"))
                .header("content-type", "application/json")
                .body(body)
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status(), 200);
            let json: serde_json::Value = resp.json().await.unwrap();
            assert_eq!(json, serde_json::json!({ "status": "received" }));
        }
    }

    #[tokio::test]
    async fn process_replies_to_each_sender() {
        let graph = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v17.0/1099/messages"))
            .respond_with(ResponseTemplate::new(200))
            .expect(2)
            .mount(&graph)
            .await;

        let adapter = adapter(&graph.uri());
        let payload: WebhookPayload = serde_json::from_value(serde_json::json!({
            "entry": [{ "changes": [{ "value": { "messages": [
                { "from": "15550001111", "text": { "body": "/download_file https://example.test/report.pdf" } },
                { "from": "15550002222", "text": { "body": "hello" } }
            ]}}]}]
        }))
        .unwrap();

        let replies = process_payload(&adapter.state, &payload).await;
        let summary: Vec<_> = replies.iter().map(|r| (r.to.as_str(), r.text.as_str())).collect();
        assert_eq!(
            summary,
            vec![
                ("15550001111", "File saved: downloads/report.pdf"),
                ("15550002222", UNKNOWN_COMMAND),
            ]
        );
    }

    #[tokio::test]
    async fn webhook_post_delivers_reply_through_graph_api() {
        let graph = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v17.0/1099/messages"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&graph)
            .await;

        let base = serve(&adapter(&graph.uri())).await;
        reqwest::Client::new()
            .post(format!("{base}/webhook"))
            .json(&text_payload("15550001111", "/help"))
            .send()
            .await
            .unwrap();

        let mut delivered = Vec::new();
        for _ in 0..50 {
            delivered = graph.received_requests().await.unwrap_or_default();
            if !delivered.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(delivered.len(), 1);
        let sent: serde_json::Value = serde_json::from_slice(&delivered[0].body).unwrap();
        assert_eq!(sent["to"], "15550001111");
        assert!(sent["text"]["body"].as_str().unwrap().contains("/download_file"));
    }

    #[tokio::test]
    async fn graph_failure_still_yields_reply() {
        let graph = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&graph)
            .await;

        let adapter = adapter(&graph.uri());
        let payload: WebhookPayload =
            serde_json::from_value(text_payload("15550001111", "/help")).unwrap();
        let replies = process_payload(&adapter.state, &payload).await;
        assert_eq!(replies.len(), 1);
    }
}
