//! Message types for LLM communication

use prism_foundation::Media;
use serde::{Deserialize, Serialize};

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Role of this message
    pub role: MessageRole,

    /// Text content
    pub content: String,

    /// Images or documents sent alongside the text
    pub attachments: Vec<Media>,
}

impl Message {
    fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            attachments: Vec::new(),
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Create a user message carrying a single attachment
    pub fn user_with_media(content: impl Into<String>, media: Media) -> Self {
        Self::new(MessageRole::User, content).with_attachment(media)
    }

    pub fn with_attachment(mut self, media: Media) -> Self {
        self.attachments.push(media);
        self
    }

    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }
}

/// A tool call requested by the assistant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique ID for this tool call
    pub id: String,

    /// Name of the tool to call
    pub name: String,

    /// Arguments as JSON
    pub arguments: serde_json::Value,
}

impl ToolCall {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}
