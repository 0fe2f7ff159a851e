use std::process::ExitStatus;

use futures_core::Stream;
use futures_util::stream;
use tokio::{
    io::{AsyncBufReadExt, BufReader, Split},
    process::{Child, ChildStdout},
    task::JoinHandle,
};
use tracing::debug;

use crate::{process::collect_stream, CodexError};

/// Pull-based reader over a running Codex process.
///
/// Yields trimmed, non-empty stdout lines one at a time while stderr is buffered on a side task.
/// Once stdout reaches EOF the reader waits for the process and applies the exit-code policy:
/// exit code `0` or no code at all is success, any other code is
/// [`CodexError::ExecutionFailed`] carrying the trimmed stderr.
///
/// Dropping the reader before the process has been waited on closes stdout, aborts the stderr
/// task and kills the child. Every stream built on top of a `LineReader` inherits that cleanup,
/// whether it ends naturally, with an error, or is abandoned by its consumer.
pub struct LineReader {
    child: Child,
    lines: Split<BufReader<ChildStdout>>,
    stderr_task: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    finished: bool,
}

impl LineReader {
    /// Takes ownership of `child` and starts collecting its stderr.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn new(mut child: Child) -> Result<Self, CodexError> {
        let stdout = child.stdout.take().ok_or(CodexError::StdoutUnavailable)?;
        let stderr = child.stderr.take().ok_or(CodexError::StderrUnavailable)?;

        Ok(Self {
            child,
            lines: BufReader::new(stdout).split(b'\n'),
            stderr_task: Some(tokio::spawn(collect_stream(stderr))),
            finished: false,
        })
    }

    /// OS process id, while the child has not been reaped.
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    /// Returns the next non-empty line, or `None` once the process has exited successfully.
    pub async fn next_line(&mut self) -> Result<Option<String>, CodexError> {
        if self.finished {
            return Ok(None);
        }

        while let Some(segment) = self.lines.next_segment().await? {
            let line = String::from_utf8_lossy(&segment);
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            return Ok(Some(trimmed.to_string()));
        }

        self.finish().await?;
        Ok(None)
    }

    /// Converts the reader into a lazy, single-pass stream of lines.
    pub fn into_stream(self) -> impl Stream<Item = Result<String, CodexError>> + Send {
        stream::try_unfold(self, |mut reader| async move {
            let line = reader.next_line().await?;
            Ok::<_, CodexError>(line.map(|line| (line, reader)))
        })
    }

    async fn finish(&mut self) -> Result<(), CodexError> {
        self.finished = true;
        let status = self
            .child
            .wait()
            .await
            .map_err(|source| CodexError::Wait { source })?;
        debug!(status = ?status, "codex process exited");
        let stderr = match self.stderr_task.take() {
            Some(task) => task.await??,
            None => Vec::new(),
        };
        check_exit_status(status, &stderr)
    }
}

impl Drop for LineReader {
    fn drop(&mut self) {
        if let Some(task) = self.stderr_task.take() {
            task.abort();
        }
        if self.finished {
            return;
        }
        if let Err(err) = self.child.start_kill() {
            debug!(error = %err, "codex process already gone at drop");
        }
    }
}

pub(crate) fn check_exit_status(status: ExitStatus, stderr: &[u8]) -> Result<(), CodexError> {
    match status.code() {
        Some(0) => Ok(()),
        None => {
            debug!(status = ?status, "codex exited without an exit code; treating as success");
            Ok(())
        }
        Some(exit_code) => Err(CodexError::ExecutionFailed {
            exit_code,
            stderr: String::from_utf8_lossy(stderr).trim().to_string(),
        }),
    }
}
