#[derive(Debug, Clone, PartialEq)]
/// A single content item of a thread message
pub enum MessageContent {
    Text { text: String },
    /// Content we relay no further, such as image files or refusals. Only the
    /// service's type name is kept.
    Unsupported { kind: String },
}

impl MessageContent {
    pub fn text<S: Into<String>>(text: S) -> Self {
        MessageContent::Text { text: text.into() }
    }

    pub fn unsupported<S: Into<String>>(kind: S) -> Self {
        MessageContent::Unsupported { kind: kind.into() }
    }

    /// Get the text content if this is a Text variant
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text { text } => Some(text),
            MessageContent::Unsupported { .. } => None,
        }
    }
}
