use serde::Serialize;

/// Output vocabulary handed to chat-stream consumers.
///
/// Serializes as `{"type":"text","text":..}`, `{"type":"reasoning","text":..}`, or
/// `{"type":"usage","inputTokens":..,"outputTokens":..,"cacheReadTokens":..}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputChunk {
    Text {
        text: String,
    },
    Reasoning {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    Usage {
        input_tokens: u64,
        output_tokens: u64,
        cache_read_tokens: u64,
    },
}

impl OutputChunk {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn reasoning(text: impl Into<String>) -> Self {
        Self::Reasoning { text: text.into() }
    }
}
