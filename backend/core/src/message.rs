use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A text command received from a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub id: Uuid,
    /// Channel that delivered it ("whatsapp", "console").
    pub channel: String,
    /// Sender address on that channel, used as the reply target.
    pub sender: String,
    pub text: String,
    pub received_at: DateTime<Utc>,
}

impl InboundMessage {
    pub fn new(channel: impl Into<String>, sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel: channel.into(),
            sender: sender.into(),
            text: text.into(),
            received_at: Utc::now(),
        }
    }

    /// Build the reply addressed back to this message's sender.
    pub fn reply(&self, text: impl Into<String>) -> OutboundReply {
        OutboundReply {
            in_reply_to: self.id,
            to: self.sender.clone(),
            text: text.into(),
        }
    }
}

/// Exactly one of these is produced per inbound command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundReply {
    pub in_reply_to: Uuid,
    pub to: String,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_targets_sender() {
        let msg = InboundMessage::new("whatsapp", "15550001111", "/help");
        let reply = msg.reply("Commands: ...");
        assert_eq!(reply.to, "15550001111");
        assert_eq!(reply.in_reply_to, msg.id);
        assert_eq!(reply.text, "Commands: ...");
    }

    #[test]
    fn test_message_serialization_roundtrip() {
        let msg = InboundMessage::new("console", "local", "/download_file https://example.test/a.bin");
        let json = serde_json::to_string(&msg).unwrap();
        let back: InboundMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, msg.id);
        assert_eq!(back.text, msg.text);
    }
}
