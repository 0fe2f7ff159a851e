use serde::de::Error as _;
use serde_json::Value;

/// One line of `codex exec --json` output.
///
/// The upstream protocol is versioned and grows new event and item kinds over time, so every
/// field is optional and unknown kinds are carried through rather than rejected:
/// - `item.started` / `item.updated` / `item.completed` carry an [`Item`].
/// - `turn.completed` carries [`Usage`]; `turn.failed` carries an [`EventError`].
/// - `error` carries a top-level `message`.
///
/// Fields are read out of the raw JSON one by one. A field with an unexpected type is treated as
/// absent; only text that is not a JSON object fails to parse.
#[derive(Clone, Debug, PartialEq)]
pub struct ProtocolEvent {
    pub kind: EventKind,
    pub item: Option<Item>,
    pub usage: Option<Usage>,
    pub error: Option<EventError>,
    pub message: Option<String>,
}

impl ProtocolEvent {
    /// Parses a single JSONL line.
    pub fn from_line(line: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(line)?;
        if !value.is_object() {
            return Err(serde_json::Error::custom("codex event is not a JSON object"));
        }
        Ok(Self::from_value(&value))
    }

    pub fn from_value(value: &Value) -> Self {
        let kind = extract_str(value, "type")
            .map(|kind| EventKind::from(kind.to_string()))
            .unwrap_or_default();

        Self {
            kind,
            item: value
                .get("item")
                .filter(|item| item.is_object())
                .map(Item::from_value),
            usage: value
                .get("usage")
                .filter(|usage| usage.is_object())
                .map(Usage::from_value),
            error: value.get("error").map(EventError::from_value),
            message: extract_string(value, "message"),
        }
    }

    pub fn is_item_event(&self) -> bool {
        matches!(
            self.kind,
            EventKind::ItemStarted | EventKind::ItemUpdated | EventKind::ItemCompleted
        )
    }
}

/// Event discriminator taken from the `type` field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum EventKind {
    ItemStarted,
    ItemUpdated,
    ItemCompleted,
    TurnCompleted,
    TurnFailed,
    Error,
    /// Any other `type`, including `thread.started` and `turn.started`.
    Other(String),
    /// `type` absent or not a string.
    #[default]
    Missing,
}

impl From<String> for EventKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "item.started" => Self::ItemStarted,
            "item.updated" => Self::ItemUpdated,
            "item.completed" => Self::ItemCompleted,
            "turn.completed" => Self::TurnCompleted,
            "turn.failed" => Self::TurnFailed,
            "error" => Self::Error,
            _ => Self::Other(value),
        }
    }
}

/// Token accounting reported with `turn.completed`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
    pub cached_input_tokens: Option<u64>,
}

impl Usage {
    fn from_value(value: &Value) -> Self {
        Self {
            input_tokens: extract_count(value, "input_tokens"),
            output_tokens: extract_count(value, "output_tokens"),
            cached_input_tokens: extract_count(value, "cached_input_tokens"),
        }
    }
}

/// Error payload attached to `turn.failed`.
///
/// Only an object's string `message` is read; any other shape leaves `message` empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventError {
    pub message: Option<String>,
}

impl EventError {
    fn from_value(value: &Value) -> Self {
        Self {
            message: extract_string(value, "message"),
        }
    }
}

/// A unit of agent activity.
#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    pub id: Option<String>,
    pub text: Option<String>,
    pub status: Option<String>,
    pub details: ItemDetails,
}

impl Item {
    pub fn from_value(value: &Value) -> Self {
        let kind = extract_str(value, "type").unwrap_or_default();
        let details = match kind {
            "agent_message" => ItemDetails::AgentMessage,
            "reasoning" => ItemDetails::Reasoning,
            "command_execution" => ItemDetails::CommandExecution(CommandExecution {
                command: extract_string(value, "command"),
                aggregated_output: extract_string(value, "aggregated_output"),
                exit_code: value
                    .get("exit_code")
                    .and_then(Value::as_i64)
                    .and_then(|code| i32::try_from(code).ok()),
            }),
            "todo_list" => ItemDetails::TodoList(TodoList {
                steps: value
                    .get("steps")
                    .and_then(Value::as_array)
                    .map(|steps| steps.iter().map(TodoStep::from_value).collect())
                    .unwrap_or_default(),
            }),
            "file_change" => ItemDetails::FileChange,
            "mcp_tool_call" => ItemDetails::McpToolCall(McpToolCall {
                tool_name: extract_string(value, "tool_name"),
                tool_input: extract_json(value, "tool_input"),
                tool_result: extract_json(value, "tool_result"),
            }),
            "web_search" => ItemDetails::WebSearch,
            other => ItemDetails::Unknown(other.to_string()),
        };

        Self {
            id: extract_scalar(value, "id"),
            text: extract_string(value, "text"),
            status: extract_string(value, "status"),
            details,
        }
    }

    /// Returns the item text when present and non-empty.
    pub fn non_empty_text(&self) -> Option<&str> {
        self.text.as_deref().filter(|text| !text.is_empty())
    }
}

/// Kind-specific item data, keyed by the upstream `item.type`.
#[derive(Clone, Debug, PartialEq)]
pub enum ItemDetails {
    AgentMessage,
    Reasoning,
    CommandExecution(CommandExecution),
    TodoList(TodoList),
    FileChange,
    McpToolCall(McpToolCall),
    WebSearch,
    /// An item kind this crate does not model; holds the raw `type` (empty when absent).
    Unknown(String),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CommandExecution {
    pub command: Option<String>,
    pub aggregated_output: Option<String>,
    pub exit_code: Option<i32>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TodoList {
    pub steps: Vec<TodoStep>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TodoStep {
    pub title: String,
    pub status: Option<String>,
}

impl TodoStep {
    fn from_value(value: &Value) -> Self {
        Self {
            title: extract_scalar(value, "title").unwrap_or_default(),
            status: extract_scalar(value, "status"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct McpToolCall {
    pub tool_name: Option<String>,
    pub tool_input: Option<Value>,
    pub tool_result: Option<Value>,
}

fn extract_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

fn extract_string(value: &Value, key: &str) -> Option<String> {
    extract_str(value, key).map(str::to_string)
}

// Strings as-is; numbers and booleans in their JSON spelling.
fn extract_scalar(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(text) => Some(text.clone()),
        scalar @ (Value::Number(_) | Value::Bool(_)) => Some(scalar.to_string()),
        _ => None,
    }
}

fn extract_count(value: &Value, key: &str) -> Option<u64> {
    let count = value.get(key)?;
    count.as_u64().or_else(|| {
        count
            .as_f64()
            .filter(|count| count.is_finite() && *count >= 0.0)
            .map(|count| count as u64)
    })
}

fn extract_json(value: &Value, key: &str) -> Option<Value> {
    value.get(key).filter(|json| !json.is_null()).cloned()
}
