use std::{path::PathBuf, pin::Pin};

use futures_core::Stream;
use futures_util::{stream, StreamExt};
use tracing::debug;

use crate::{
    exec::{stream_events, DynProtocolEventStream},
    models::{ModelCatalog, ModelSelection},
    normalize::map_event,
    process::ExecRequest,
    prompt::{build_prompt, ChatMessage},
    CodexError, OutputChunk,
};

/// Type-erased stream of output chunks for a single turn.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<OutputChunk, CodexError>> + Send>>;

/// Chat-stream adapter over `codex exec`.
///
/// Each [`CodexCliHandler::create_message`] call spawns one Codex process, pins the model chosen
/// by [`CodexCliHandler::model`], and yields [`OutputChunk`]s in the order Codex emitted them.
/// The stream ends after the first error.
///
/// ```rust,no_run
/// use codex_stream::{ChatMessage, CodexCliHandler, OutputChunk};
/// use futures_util::StreamExt;
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let handler = CodexCliHandler::builder().model("gpt-5.1-codex").build();
/// let mut chunks = handler.create_message("Be brief.", &[ChatMessage::user("Hi")])?;
/// while let Some(chunk) = chunks.next().await {
///     if let OutputChunk::Text { text } = chunk? {
///         println!("{text}");
///     }
/// }
/// # Ok(()) }
/// ```
#[derive(Clone, Debug)]
pub struct CodexCliHandler {
    binary: Option<PathBuf>,
    model_id: Option<String>,
    working_dir: Option<PathBuf>,
    catalog: &'static ModelCatalog,
}

impl CodexCliHandler {
    pub fn builder() -> CodexCliHandlerBuilder {
        CodexCliHandlerBuilder::default()
    }

    /// The model this handler runs with; unknown or missing ids resolve to the catalog default.
    pub fn model(&self) -> ModelSelection {
        self.catalog.resolve(self.model_id.as_deref())
    }

    /// Starts a Codex turn for `messages` and streams its output chunks.
    ///
    /// Launch failures (including [`CodexError::BinaryNotFound`]) are returned before any stream
    /// is created.
    ///
    /// # Panics
    ///
    /// The process is spawned eagerly, so this must be called from within a Tokio runtime.
    pub fn create_message(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
    ) -> Result<ChunkStream, CodexError> {
        let model = self.model();
        let mut request = ExecRequest::new(build_prompt(system_prompt, messages)).model(model.id);
        request.binary = self.binary.clone();
        request.working_dir = self.working_dir.clone();

        let events = stream_events(&request)?;
        Ok(Box::pin(chunks_from_events(events)))
    }
}

impl Default for CodexCliHandler {
    fn default() -> Self {
        Self::builder().build()
    }
}

pub(crate) fn chunks_from_events(
    events: DynProtocolEventStream,
) -> impl Stream<Item = Result<OutputChunk, CodexError>> + Send {
    stream::try_unfold(events, |mut events| async move {
        while let Some(event) = events.next().await {
            let event = event?;
            if let Some(chunk) = map_event(&event)? {
                return Ok(Some((chunk, events)));
            }
            debug!(kind = ?event.kind, "codex event produced no chunk");
        }
        Ok::<_, CodexError>(None)
    })
}

/// Builder for [`CodexCliHandler`].
#[derive(Clone, Debug, Default)]
pub struct CodexCliHandlerBuilder {
    binary: Option<PathBuf>,
    model_id: Option<String>,
    working_dir: Option<PathBuf>,
}

impl CodexCliHandlerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path to the Codex binary.
    ///
    /// Defaults to `CODEX_BINARY` when present or `codex` on `PATH`.
    pub fn binary(mut self, binary: impl Into<PathBuf>) -> Self {
        let binary = binary.into();
        self.binary = (!binary.as_os_str().is_empty()).then_some(binary);
        self
    }

    /// Requested model id. Resolved against the catalog when the handler is asked for its model.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        let model = model.into();
        self.model_id = (!model.trim().is_empty()).then_some(model);
        self
    }

    /// Workspace root the agent runs in. Defaults to the current working directory.
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn build(self) -> CodexCliHandler {
        CodexCliHandler {
            binary: self.binary,
            model_id: self.model_id,
            working_dir: self.working_dir,
            catalog: ModelCatalog::codex_cli(),
        }
    }
}
