//! Streaming projection of a growing response buffer.
//!
//! Every update re-runs the whole pipeline on the full buffer. The only state
//! carried between updates is the focused path and the last content seen for
//! each file, used when the focused file has not started streaming yet. That
//! cache is pruned to the latest merged set plus the focused path.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::boilerplate::Boilerplate;
use crate::language::Language;
use crate::merge::{Layer, LayerKind};
use crate::parser::ArtifactParser;
use crate::paths;
use crate::tree::FileTree;
use crate::types::{ParsedFile, ParsedResponse};

/// Where the focused file's content came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusSource {
    /// A closed directive in the current buffer
    Closed,
    /// An open directive still receiving content
    Live,
    /// A boilerplate file, shown complete
    Boilerplate,
    /// Earlier layers or a previous projection
    Known,
}

/// The file currently shown in the editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FocusedFile {
    pub id: String,
    pub path: String,
    pub content: String,
    pub language: String,

    /// True while content is still arriving
    pub streaming: bool,
    pub source: FocusSource,
}

/// One rendered frame of the stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Projection {
    pub response: ParsedResponse,
    pub tree: FileTree,
    pub focused: Option<FocusedFile>,

    /// Whether the envelope's closing tag has arrived
    pub complete: bool,
}

/// Re-projects a growing buffer onto the merged file set
#[derive(Debug, Clone)]
pub struct StreamingProjector {
    parser: Arc<ArtifactParser>,
    base_layers: Vec<Layer>,
    focus: Option<String>,
    known: HashMap<String, String>,
}

impl StreamingProjector {
    pub fn new(parser: Arc<ArtifactParser>) -> Self {
        Self {
            parser,
            base_layers: Vec::new(),
            focus: None,
            known: HashMap::new(),
        }
    }

    /// Add a boilerplate base layer. It is parsed once here, not per chunk.
    #[must_use]
    pub fn with_boilerplate(mut self, boilerplate: &Boilerplate) -> Self {
        let parsed = boilerplate.parse_with(&self.parser);
        self.base_layers.insert(0, Layer::new(LayerKind::Boilerplate, parsed));
        self
    }

    /// Add files carried over from earlier turns
    #[must_use]
    pub fn with_prior_files(mut self, files: &[ParsedFile]) -> Self {
        self.base_layers
            .push(Layer::from_files(LayerKind::PriorTurn, files));
        self
    }

    pub fn parser(&self) -> &ArtifactParser {
        &self.parser
    }

    /// Change the focused file; `None` clears focus
    pub fn set_focus(&mut self, path: Option<&str>) {
        self.focus = path
            .map(paths::normalize_path)
            .filter(|p| !p.is_empty());
    }

    pub fn focus(&self) -> Option<&str> {
        self.focus.as_deref()
    }

    /// Project the full buffer received so far
    pub fn project(&mut self, buffer: &str) -> Projection {
        let envelope = self.parser.scanner().scan(buffer);
        let current = match &envelope {
            Some(envelope) => self.parser.parse_envelope(buffer, envelope),
            None => ParsedResponse::narrative_only(buffer),
        };

        let response = if self.base_layers.is_empty() {
            current
        } else {
            let mut layers = self.base_layers.clone();
            layers.push(Layer::new(LayerKind::CurrentTurn, current));
            self.parser.merge_layers(&layers)
        };

        let focused = self.focus.as_deref().and_then(|path| {
            let envelope_content = envelope.as_ref().map(|e| e.content.as_str());
            self.focused_view(path, envelope_content, &response)
        });

        let focus = self.focus.as_deref();
        self.known
            .retain(|path, _| Some(path.as_str()) == focus || response.file(path).is_some());
        for file in &response.files {
            self.known.insert(file.path.clone(), file.content.clone());
        }

        Projection {
            tree: FileTree::build(&response.files, &response.directories),
            complete: envelope.as_ref().is_some_and(|e| e.is_complete()),
            focused,
            response,
        }
    }

    fn focused_view(
        &self,
        path: &str,
        envelope_content: Option<&str>,
        response: &ParsedResponse,
    ) -> Option<FocusedFile> {
        let merged = response.file(path).map(|f| f.content.as_str());
        let known = || merged.or_else(|| self.known.get(path).map(String::as_str));

        let injected = self
            .parser
            .policy()
            .is_boilerplate(path)
            .then(known)
            .flatten();

        let (content, source) = if let Some(content) = injected {
            (content.to_string(), FocusSource::Boilerplate)
        } else {
            let directive = envelope_content
                .and_then(|content| self.parser.interpreter().find_file_directive(content, path));
            match directive {
                Some(d) if d.closed => match merged {
                    Some(content) => (content.to_string(), FocusSource::Closed),
                    None => (d.body.trim().to_string(), FocusSource::Closed),
                },
                Some(d) => (live_text(d.body), FocusSource::Live),
                None => (known()?.to_string(), FocusSource::Known),
            }
        };

        Some(FocusedFile {
            id: paths::file_id(path),
            path: path.to_string(),
            language: Language::from_path(path).as_str().to_string(),
            streaming: source == FocusSource::Live,
            content,
            source,
        })
    }
}

/// Partial body as shown while typing: leading blank lines dropped, trailing
/// text kept as-is.
fn live_text(body: &str) -> String {
    body.trim_start_matches(['\r', '\n']).to_string()
}
