//! Chat-stream adapter for the OpenAI Codex CLI.
//!
//! Shells out to `codex exec --json`, reads its JSONL events line by line, and narrows them down
//! to three chunk shapes: [`OutputChunk::Text`], [`OutputChunk::Reasoning`], and
//! [`OutputChunk::Usage`].
//!
//! ## Pipeline
//! - [`launch`] spawns `codex exec --json --skip-git-repo-check --sandbox read-only --color never
//!   [--model <id>] <prompt>` with stdin closed. A missing binary becomes
//!   [`CodexError::BinaryNotFound`].
//! - [`LineReader`] pulls trimmed stdout lines, buffers stderr, and maps a non-zero exit to
//!   [`CodexError::ExecutionFailed`]. Dropping it early kills the process.
//! - [`normalize`] parses each line into a [`ProtocolEvent`] and maps it to at most one chunk.
//!   Malformed lines are logged and skipped; `turn.failed` and `error` events end the stream.
//! - [`CodexCliHandler`] ties the pieces together with prompt assembly ([`build_prompt`]) and
//!   model resolution against the static [`ModelCatalog`].
//!
//! ## Item mapping
//! - `agent_message` → text; `reasoning` → reasoning (both dropped when empty).
//! - `command_execution`, `todo_list`, `file_change`, `mcp_tool_call`, `web_search` → a
//!   human-readable reasoning summary. Command output is capped at
//!   [`COMMAND_OUTPUT_CHAR_LIMIT`] characters.
//! - Unknown item kinds surface their `text` as reasoning when present.
//!
//! ## Setup
//! - The binary defaults to `CODEX_BINARY` or `codex` on `PATH`; override it with
//!   [`CodexCliHandlerBuilder::binary`].
//! - The agent runs in [`CodexCliHandlerBuilder::working_dir`] or the current directory.
//! - No timeouts are applied; a run lasts until Codex exits or the stream is dropped.

mod chunk;
mod defaults;
mod error;
pub mod event;
mod exec;
mod handler;
mod models;
pub mod normalize;
mod process;
mod prompt;
mod reader;

pub use chunk::OutputChunk;
pub use defaults::COMMAND_OUTPUT_CHAR_LIMIT;
pub use error::CodexError;
pub use event::{EventKind, Item, ItemDetails, ProtocolEvent, Usage};
pub use exec::{stream_events, DynProtocolEventStream};
pub use handler::{ChunkStream, CodexCliHandler, CodexCliHandlerBuilder};
pub use models::{ModelCatalog, ModelInfo, ModelSelection};
pub use process::{exec_args, launch, ExecRequest};
pub use prompt::{build_prompt, ChatMessage, MessageRole};
pub use reader::LineReader;

#[cfg(test)]
mod tests;
