use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Text,
    Image,
    Voice,
    File,
    Other,
}

/// One event handed over by the chat host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub content_type: ContentType,
    pub text: String,
}

impl InboundMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content_type: ContentType::Text,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Image(Vec<u8>),
    Error(String),
}

/// What the host should do after a handler has seen a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleOutcome {
    /// Not ours; let the next handler see it.
    Continue,
    /// Send this reply and stop the handler chain.
    Break(Reply),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub model_id: String,
    pub prompt: String,
    pub aspect_ratio: String,
}
