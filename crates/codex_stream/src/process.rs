use std::{
    env,
    ffi::OsString,
    io,
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};

use tokio::{
    io::{AsyncRead, AsyncReadExt},
    process::{Child, Command},
};
use tracing::debug;

use crate::{
    defaults::{default_binary_path, COLOR_MODE, INSTALLATION_URL, SANDBOX_MODE},
    CodexError,
};

/// Options for a single `codex exec --json` invocation.
#[derive(Clone, Debug)]
pub struct ExecRequest {
    /// Prompt passed as the final positional argument.
    pub prompt: String,
    /// Binary override; defaults to `CODEX_BINARY` or `codex` on `PATH`.
    pub binary: Option<PathBuf>,
    /// Forwarded as `--model <id>` when set.
    pub model: Option<String>,
    /// Workspace root; defaults to the current working directory.
    pub working_dir: Option<PathBuf>,
}

impl ExecRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            binary: None,
            model: None,
            working_dir: None,
        }
    }

    pub fn binary(mut self, binary: impl Into<PathBuf>) -> Self {
        let binary = binary.into();
        self.binary = (!binary.as_os_str().is_empty()).then_some(binary);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        let model = model.into();
        self.model = (!model.trim().is_empty()).then_some(model);
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub(crate) fn binary_path(&self) -> PathBuf {
        self.binary.clone().unwrap_or_else(default_binary_path)
    }

    pub(crate) fn resolve_working_dir(&self) -> Result<PathBuf, CodexError> {
        if let Some(dir) = &self.working_dir {
            return Ok(dir.clone());
        }

        env::current_dir().map_err(|source| CodexError::WorkingDirectory { source })
    }
}

/// Builds the argument list for `codex exec`, prompt last.
pub fn exec_args(prompt: &str, model: Option<&str>) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "exec",
        "--json",
        "--skip-git-repo-check",
        "--sandbox",
        SANDBOX_MODE,
        "--color",
        COLOR_MODE,
    ]
    .into_iter()
    .map(OsString::from)
    .collect();

    if let Some(model) = model.filter(|model| !model.trim().is_empty()) {
        args.push(OsString::from("--model"));
        args.push(OsString::from(model));
    }

    args.push(OsString::from(prompt));
    args
}

/// Starts the Codex CLI with stdin closed and stdout/stderr piped.
///
/// The returned child is marked `kill_on_drop`; ownership normally moves straight into a
/// [`crate::LineReader`], which is responsible for terminating it.
pub fn launch(request: &ExecRequest) -> Result<Child, CodexError> {
    let binary = request.binary_path();
    let working_dir = request.resolve_working_dir()?;

    let mut command = Command::new(&binary);
    command
        .args(exec_args(&request.prompt, request.model.as_deref()))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .current_dir(&working_dir);

    debug!(
        binary = ?binary,
        working_dir = ?working_dir,
        model = request.model.as_deref().unwrap_or("<default>"),
        "spawning codex exec"
    );

    spawn_with_retry(&mut command, &binary)
}

pub(crate) fn spawn_with_retry(command: &mut Command, binary: &Path) -> Result<Child, CodexError> {
    let mut backoff = Duration::from_millis(2);
    let mut attempt = 0;
    loop {
        match command.spawn() {
            Ok(child) => return Ok(child),
            Err(source) => {
                // ETXTBSY: the binary was just written and another fork still holds it open.
                let is_busy = source.raw_os_error() == Some(26);
                if is_busy && attempt < 4 {
                    attempt += 1;
                    std::thread::sleep(backoff);
                    backoff = std::cmp::min(backoff * 2, Duration::from_millis(50));
                    continue;
                }
                return Err(classify_spawn_error(binary, source));
            }
        }
    }
}

fn classify_spawn_error(binary: &Path, source: io::Error) -> CodexError {
    match source.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => CodexError::BinaryNotFound {
            binary: binary.to_path_buf(),
            installation_url: INSTALLATION_URL,
            source,
        },
        _ => CodexError::Spawn {
            binary: binary.to_path_buf(),
            source,
        },
    }
}

/// Drains `reader` into memory.
pub(crate) async fn collect_stream<R>(mut reader: R) -> Result<Vec<u8>, io::Error>
where
    R: AsyncRead + Unpin,
{
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..n]);
    }
    Ok(buffer)
}
