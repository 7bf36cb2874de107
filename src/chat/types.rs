use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    User,
    Bot,
}

/// Text of a transcript entry. Structured bodies were valid JSON and are kept
/// pretty-printed; the distinction only affects display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageBody {
    Plain(String),
    Structured(String),
}

impl MessageBody {
    pub fn from_text(text: &str) -> Self {
        match serde_json::from_str::<serde_json::Value>(text) {
            Ok(value) => match serde_json::to_string_pretty(&value) {
                Ok(pretty) => MessageBody::Structured(pretty),
                Err(_) => MessageBody::Plain(text.to_string()),
            },
            Err(_) => MessageBody::Plain(text.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            MessageBody::Plain(text) | MessageBody::Structured(text) => text,
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, MessageBody::Structured(_))
    }
}

/// A transcript entry. Never mutated after it is appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: Sender,
    pub body: MessageBody,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(sender: Sender, text: &str) -> Self {
        Self {
            sender,
            body: MessageBody::from_text(text),
            timestamp: Utc::now(),
        }
    }

    pub fn user(text: &str) -> Self {
        Self::new(Sender::User, text)
    }

    pub fn bot(text: &str) -> Self {
        Self::new(Sender::Bot, text)
    }

    pub fn text(&self) -> &str {
        self.body.as_str()
    }
}
