use std::{env, path::PathBuf};

pub(crate) const CODEX_BINARY_ENV: &str = "CODEX_BINARY";
pub(crate) const DEFAULT_BINARY: &str = "codex";
pub(crate) const INSTALLATION_URL: &str = "https://github.com/openai/codex";

pub(crate) const SANDBOX_MODE: &str = "read-only";
pub(crate) const COLOR_MODE: &str = "never";

/// Maximum number of characters of command output forwarded in a reasoning chunk.
pub const COMMAND_OUTPUT_CHAR_LIMIT: usize = 4000;
pub(crate) const TRUNCATION_MARKER: char = '…';

pub(crate) const DEFAULT_MODEL_ID: &str = "gpt-5.1-codex-max";

pub(crate) const TURN_FAILED_FALLBACK: &str = "Codex CLI turn failed";
pub(crate) const PROTOCOL_ERROR_FALLBACK: &str = "Codex CLI reported an error";

pub(crate) fn default_binary_path() -> PathBuf {
    env::var_os(CODEX_BINARY_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_BINARY))
}
