use super::*;
use crate::event::{CommandExecution, McpToolCall, TodoList, TodoStep};
use crate::normalize::{
    format_command_execution, format_todo_list, format_tool_call, map_event, map_item,
    parse_event_line, truncate_output,
};
use futures_util::StreamExt;
use serde_json::json;

mod support;
#[cfg(unix)]
use support::*;

#[cfg(unix)]
mod exec;
