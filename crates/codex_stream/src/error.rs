use std::path::PathBuf;

use thiserror::Error;

/// Errors that end a Codex CLI run.
///
/// Every variant is fatal to the stream it surfaces from. By the time one reaches the caller the
/// child process has already been reaped or killed. Malformed JSONL lines are not errors; they
/// are logged and skipped.
#[derive(Debug, Error)]
pub enum CodexError {
    #[error(
        "codex binary `{binary}` was not found or is not executable; install it from {installation_url} ({source})"
    )]
    BinaryNotFound {
        binary: PathBuf,
        installation_url: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("codex binary `{binary}` could not be spawned: {source}")]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to resolve working directory: {source}")]
    WorkingDirectory {
        #[source]
        source: std::io::Error,
    },
    #[error("codex stdout unavailable")]
    StdoutUnavailable,
    #[error("codex stderr unavailable")]
    StderrUnavailable,
    #[error("failed to capture codex output: {0}")]
    CaptureIo(#[from] std::io::Error),
    #[error("failed to wait for codex process: {source}")]
    Wait {
        #[source]
        source: std::io::Error,
    },
    #[error("failed to join codex stderr task: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("codex exited with code {exit_code}: {stderr}")]
    ExecutionFailed { exit_code: i32, stderr: String },
    #[error("{message}")]
    TurnFailed { message: String },
    #[error("{message}")]
    ProtocolError { message: String },
}
