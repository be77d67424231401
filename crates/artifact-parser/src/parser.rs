use once_cell::sync::Lazy;

use crate::boilerplate::Boilerplate;
use crate::config::ParserConfig;
use crate::error::Result;
use crate::interpreter::{Action, ActionInterpreter};
use crate::merge::{EntrySet, Layer, LayerKind, MergeEngine};
use crate::policy::PathPolicy;
use crate::scanner::{DirectiveScanner, Envelope};
use crate::types::{build_steps, Artifact, ParsedDirectory, ParsedFile, ParsedResponse};

static DEFAULT_PARSER: Lazy<ArtifactParser> = Lazy::new(|| {
    ArtifactParser::new(ParserConfig::default()).expect("default parser configuration is valid")
});

/// Parse a single response with the default configuration
pub fn parse(text: &str) -> ParsedResponse {
    DEFAULT_PARSER.parse(text)
}

/// The shared default parser
pub fn default_parser() -> &'static ArtifactParser {
    &DEFAULT_PARSER
}

/// Scan, interpret, resolve and merge model output.
///
/// Every call is a pure function of its inputs; no state is kept between
/// calls.
#[derive(Debug, Clone)]
pub struct ArtifactParser {
    config: ParserConfig,
    scanner: DirectiveScanner,
    interpreter: ActionInterpreter,
    policy: PathPolicy,
}

impl ArtifactParser {
    /// Create a parser from a validated configuration
    pub fn new(config: ParserConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            scanner: DirectiveScanner::new(&config.artifact_tags)?,
            interpreter: ActionInterpreter::new(&config.action_tags)?,
            policy: PathPolicy::from_config(&config)?,
            config,
        })
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn scanner(&self) -> &DirectiveScanner {
        &self.scanner
    }

    pub fn interpreter(&self) -> &ActionInterpreter {
        &self.interpreter
    }

    pub fn policy(&self) -> &PathPolicy {
        &self.policy
    }

    /// Parse one response. Text without an envelope yields an empty
    /// response whose narrative is the whole text.
    pub fn parse(&self, text: &str) -> ParsedResponse {
        match self.scanner.scan(text) {
            Some(envelope) => self.parse_envelope(text, &envelope),
            None => ParsedResponse::narrative_only(text),
        }
    }

    pub(crate) fn parse_envelope(&self, text: &str, envelope: &Envelope) -> ParsedResponse {
        let (id, title) =
            envelope.metadata(&self.config.default_artifact_id, &self.config.default_title);

        let mut set = EntrySet::new();
        let mut commands = Vec::new();
        for action in self.interpreter.interpret(&envelope.content) {
            match action {
                Action::File { path, content } => {
                    if let Some(file) = ParsedFile::new(&path, content) {
                        set.upsert_file(file);
                    }
                }
                Action::Directory { path } => {
                    if let Some(dir) = ParsedDirectory::new(&path) {
                        set.upsert_directory(dir);
                    }
                }
                Action::Shell { command } => commands.push(command),
            }
        }

        let (files, directories) = set.into_parts();
        log::debug!(
            "parsed artifact {id}: {} files, {} directories, {} commands",
            files.len(),
            directories.len(),
            commands.len()
        );

        let steps = build_steps(&directories, &files, &commands);
        ParsedResponse {
            files,
            directories,
            artifact: Some(Artifact {
                id,
                title,
                shell_commands: commands,
                complete: envelope.is_complete(),
            }),
            narrative: envelope.narrative(text),
            steps,
        }
    }

    /// Merge pre-parsed layers given lowest precedence first
    pub fn merge_layers(&self, layers: &[Layer]) -> ParsedResponse {
        MergeEngine::new(&self.policy).merge(layers)
    }

    /// Overlay the current turn on a boilerplate bundle
    pub fn parse_with_boilerplate(&self, boilerplate: &Boilerplate, current: &str) -> ParsedResponse {
        self.merge_layers(&[
            Layer::new(LayerKind::Boilerplate, boilerplate.parse_with(self)),
            Layer::new(LayerKind::CurrentTurn, self.parse(current)),
        ])
    }

    /// Overlay the current turn on files from earlier turns, optionally on
    /// top of a boilerplate bundle
    pub fn parse_with_history(
        &self,
        prior_files: &[ParsedFile],
        current: &str,
        boilerplate: Option<&Boilerplate>,
    ) -> ParsedResponse {
        let mut layers = Vec::with_capacity(3);
        if let Some(boilerplate) = boilerplate {
            layers.push(Layer::new(LayerKind::Boilerplate, boilerplate.parse_with(self)));
        }
        layers.push(Layer::from_files(LayerKind::PriorTurn, prior_files));
        layers.push(Layer::new(LayerKind::CurrentTurn, self.parse(current)));
        self.merge_layers(&layers)
    }

    /// Merge a whole conversation: boilerplate, then each earlier response
    /// in order, then the current one
    pub fn parse_conversation(
        &self,
        boilerplate: Option<&Boilerplate>,
        prior_responses: &[&str],
        current: &str,
    ) -> ParsedResponse {
        let mut layers = Vec::with_capacity(prior_responses.len() + 2);
        if let Some(boilerplate) = boilerplate {
            layers.push(Layer::new(LayerKind::Boilerplate, boilerplate.parse_with(self)));
        }
        layers.extend(
            prior_responses
                .iter()
                .map(|text| Layer::new(LayerKind::PriorTurn, self.parse(text))),
        );
        layers.push(Layer::new(LayerKind::CurrentTurn, self.parse(current)));
        self.merge_layers(&layers)
    }
}
