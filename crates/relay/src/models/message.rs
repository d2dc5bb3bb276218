use super::content::MessageContent;
use super::role::Role;
use chrono::Utc;

#[derive(Debug, Clone, PartialEq)]
/// A message in a thread, or returned by a chat completion
pub struct ThreadMessage {
    pub role: Role,
    pub created: i64,
    pub content: Vec<MessageContent>,
}

impl ThreadMessage {
    pub fn new(role: Role, created: i64, content: Vec<MessageContent>) -> Self {
        ThreadMessage {
            role,
            created,
            content,
        }
    }

    /// Create a new user message with the current timestamp
    pub fn user() -> Self {
        Self::new(Role::User, Utc::now().timestamp(), Vec::new())
    }

    /// Create a new assistant message with the current timestamp
    pub fn assistant() -> Self {
        Self::new(Role::Assistant, Utc::now().timestamp(), Vec::new())
    }

    /// Add any MessageContent to the message
    pub fn with_content(mut self, content: MessageContent) -> Self {
        self.content.push(content);
        self
    }

    /// Add text content to the message
    pub fn with_text<S: Into<String>>(self, text: S) -> Self {
        self.with_content(MessageContent::text(text))
    }

    /// The text of the first content item, when that item is text
    pub fn first_text(&self) -> Option<&str> {
        self.content.first().and_then(MessageContent::as_text)
    }
}
