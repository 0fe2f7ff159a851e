//! Maps Codex protocol events onto [`OutputChunk`]s.
//!
//! Everything here is a pure function of the event (or line) it is handed, so the same line
//! always normalizes to the same chunk.

use serde_json::Value;
use tracing::warn;

use crate::{
    defaults::{
        COMMAND_OUTPUT_CHAR_LIMIT, PROTOCOL_ERROR_FALLBACK, TRUNCATION_MARKER,
        TURN_FAILED_FALLBACK,
    },
    event::{CommandExecution, EventKind, Item, ItemDetails, McpToolCall, TodoList},
    CodexError, OutputChunk, ProtocolEvent,
};

const FILE_CHANGE_FALLBACK: &str = "Codex CLI proposed file changes.";
const WEB_SEARCH_FALLBACK: &str = "Codex CLI performed a web search.";
const TODO_LIST_FALLBACK: &str = "Codex CLI updated its plan.";

/// Parses one JSONL line, logging and discarding it when it is not a valid event.
pub fn parse_event_line(line: &str) -> Option<ProtocolEvent> {
    match ProtocolEvent::from_line(line) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(error = %err, line, "failed to parse Codex CLI output");
            None
        }
    }
}

/// Maps an event to at most one chunk.
///
/// `turn.failed` and `error` events become [`CodexError::TurnFailed`] and
/// [`CodexError::ProtocolError`]; everything unrecognized maps to `Ok(None)`.
pub fn map_event(event: &ProtocolEvent) -> Result<Option<OutputChunk>, CodexError> {
    if event.is_item_event() {
        return Ok(event.item.as_ref().and_then(map_item));
    }

    match &event.kind {
        EventKind::TurnCompleted => Ok(event.usage.map(|usage| OutputChunk::Usage {
            input_tokens: usage.input_tokens.unwrap_or(0),
            output_tokens: usage.output_tokens.unwrap_or(0),
            cache_read_tokens: usage.cached_input_tokens.unwrap_or(0),
        })),
        EventKind::TurnFailed => Err(CodexError::TurnFailed {
            message: non_empty(
                event
                    .error
                    .as_ref()
                    .and_then(|error| error.message.as_deref()),
            )
            .unwrap_or(TURN_FAILED_FALLBACK)
            .to_string(),
        }),
        EventKind::Error => Err(CodexError::ProtocolError {
            message: non_empty(event.message.as_deref())
                .unwrap_or(PROTOCOL_ERROR_FALLBACK)
                .to_string(),
        }),
        _ => Ok(None),
    }
}

/// Maps a single item to a chunk, or `None` when it carries nothing worth surfacing.
pub fn map_item(item: &Item) -> Option<OutputChunk> {
    match &item.details {
        ItemDetails::AgentMessage => item.non_empty_text().map(OutputChunk::text),
        ItemDetails::Reasoning => item.non_empty_text().map(OutputChunk::reasoning),
        ItemDetails::CommandExecution(command) => Some(OutputChunk::reasoning(
            format_command_execution(command),
        )),
        ItemDetails::TodoList(todo) => Some(OutputChunk::reasoning(format_todo_list(
            todo,
            item.non_empty_text(),
        ))),
        ItemDetails::FileChange => Some(OutputChunk::reasoning(
            item.non_empty_text().unwrap_or(FILE_CHANGE_FALLBACK),
        )),
        ItemDetails::McpToolCall(call) => Some(OutputChunk::reasoning(format_tool_call(call))),
        ItemDetails::WebSearch => Some(OutputChunk::reasoning(
            item.non_empty_text().unwrap_or(WEB_SEARCH_FALLBACK),
        )),
        ItemDetails::Unknown(_) => item.non_empty_text().map(OutputChunk::reasoning),
    }
}

/// `Command: <cmd>` followed by the trimmed, truncated aggregated output.
pub fn format_command_execution(command: &CommandExecution) -> String {
    let header = match non_empty(command.command.as_deref()) {
        Some(command) => format!("Command: {command}"),
        None => "Command executed".to_string(),
    };
    let output = command.aggregated_output.as_deref().unwrap_or("").trim();
    if output.is_empty() {
        return header;
    }
    format!("{header}\n{}", truncate_output(output))
}

/// Checklist rendering; falls back to the item text when there are no steps.
pub fn format_todo_list(todo: &TodoList, text: Option<&str>) -> String {
    if todo.steps.is_empty() {
        return text.unwrap_or(TODO_LIST_FALLBACK).to_string();
    }

    let steps: Vec<String> = todo
        .steps
        .iter()
        .map(|step| {
            format!(
                "- [{}] {}",
                step.status.as_deref().unwrap_or(""),
                step.title
            )
        })
        .collect();
    format!("Updated plan:\n{}", steps.join("\n"))
}

pub fn format_tool_call(call: &McpToolCall) -> String {
    let header = match non_empty(call.tool_name.as_deref()) {
        Some(name) => format!("Tool: {name}"),
        None => "Tool call".to_string(),
    };
    let empty = Value::Object(serde_json::Map::new());
    let input = call.tool_input.as_ref().unwrap_or(&empty);
    format!("{header}\nInput: {input}")
}

/// Cuts `output` to [`COMMAND_OUTPUT_CHAR_LIMIT`] characters, appending `…` when it was longer.
pub fn truncate_output(output: &str) -> String {
    match output.char_indices().nth(COMMAND_OUTPUT_CHAR_LIMIT) {
        Some((cut, _)) => {
            let mut truncated = output[..cut].to_string();
            truncated.push(TRUNCATION_MARKER);
            truncated
        }
        None => output.to_string(),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}
