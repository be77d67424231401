use std::sync::Arc;

use forge_artifact_parser::{ParsedResponse, Projection, StreamingProjector};
use tokio::sync::{mpsc, watch};

use crate::error::{Result, WorkbenchError};

/// Latest projection published to the UI; `None` before the first chunk
pub type ProjectionSender = watch::Sender<Option<Arc<Projection>>>;

/// One model response being generated.
///
/// Chunks are appended strictly in arrival order and every chunk re-projects
/// the whole buffer. Dropping the session (or the task driving it) cancels
/// generation; there is nothing to unwind.
#[derive(Debug)]
pub struct GenerationSession {
    projector: StreamingProjector,
    buffer: String,
    chunks: usize,
    focus: Option<watch::Receiver<Option<String>>>,
}

impl GenerationSession {
    pub fn new(projector: StreamingProjector) -> Self {
        Self {
            projector,
            buffer: String::new(),
            chunks: 0,
            focus: None,
        }
    }

    /// Follow focus changes published by the UI
    #[must_use]
    pub fn with_focus_channel(mut self, focus: watch::Receiver<Option<String>>) -> Self {
        self.focus = Some(focus);
        self
    }

    pub fn set_focus(&mut self, path: Option<&str>) {
        self.projector.set_focus(path);
    }

    /// Text received so far
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn chunks_received(&self) -> usize {
        self.chunks
    }

    /// Append a chunk and project the full buffer
    pub fn push_chunk(&mut self, chunk: &str) -> Projection {
        self.apply_focus_change();
        self.buffer.push_str(chunk);
        self.chunks += 1;
        self.projector.project(&self.buffer)
    }

    /// Project the current buffer without appending
    pub fn snapshot(&mut self) -> Projection {
        self.apply_focus_change();
        self.projector.project(&self.buffer)
    }

    fn apply_focus_change(&mut self) {
        let Some(focus) = self.focus.as_mut() else {
            return;
        };
        if focus.has_changed().unwrap_or(false) {
            let path = focus.borrow_and_update().clone();
            self.projector.set_focus(path.as_deref());
        }
    }

    /// Consume chunks until the sender closes, publishing a projection per
    /// chunk. Returns the final response.
    pub async fn drive(
        mut self,
        mut chunks: mpsc::Receiver<String>,
        updates: ProjectionSender,
    ) -> Result<ParsedResponse> {
        while let Some(chunk) = chunks.recv().await {
            let projection = self.push_chunk(&chunk);
            if updates.send(Some(Arc::new(projection))).is_err() {
                log::debug!(
                    "projection receiver dropped after {} chunks, stopping",
                    self.chunks
                );
                return Err(WorkbenchError::UpdatesClosed);
            }
        }

        let last = self.snapshot();
        log::debug!(
            "generation finished: {} chunks, {} bytes, {} files",
            self.chunks,
            self.buffer.len(),
            last.response.files.len()
        );
        Ok(last.response)
    }
}
