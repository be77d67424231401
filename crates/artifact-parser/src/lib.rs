//! # Forge Artifact Parser
//!
//! Tolerant, incremental parsing of model responses that carry a pseudo-XML
//! bundle of files and shell commands, and merging of those bundles into one
//! consistent virtual file set.
//!
//! ## Pipeline
//!
//! ```text
//! Raw text (complete or still streaming)
//!     │
//!     ├──> DirectiveScanner   closed → encoded closed → open → encoded open
//!     │
//!     ├──> ActionInterpreter  file / directory / shell directives
//!     │
//!     ├──> Path resolution    normalized paths, implied directories, stable ids
//!     │
//!     ├──> MergeEngine        boilerplate < prior turns < current turn
//!     │
//!     └──> FileTree           nested view for rendering
//! ```
//!
//! [`StreamingProjector`] wraps the pipeline for a buffer that grows chunk by
//! chunk and tracks the live content of one focused file.
//!
//! ## Example
//!
//! ```rust
//! let text = r#"<forgeArtifact id="demo" title="Demo">
//! <forgeAction type="file" filePath="src/app/page.tsx">export default function Page(){}</forgeAction>
//! <forgeAction type="shell">npm install</forgeAction>
//! </forgeArtifact>"#;
//!
//! let response = forge_artifact_parser::parse(text);
//! assert_eq!(response.files[0].path, "src/app/page.tsx");
//! assert_eq!(response.shell_commands(), ["npm install"]);
//! ```

mod attributes;
mod boilerplate;
mod config;
mod error;
mod interpreter;
mod language;
mod merge;
mod parser;
pub mod paths;
mod policy;
mod projector;
mod scanner;
mod tree;
mod types;

pub use attributes::Attributes;
pub use boilerplate::Boilerplate;
pub use config::ParserConfig;
pub use error::{ParserError, Result};
pub use interpreter::{Action, ActionInterpreter, FileDirective};
pub use language::Language;
pub use merge::{EntrySet, Layer, LayerKind, MergeEngine};
pub use parser::{default_parser, parse, ArtifactParser};
pub use policy::PathPolicy;
pub use projector::{FocusSource, FocusedFile, Projection, StreamingProjector};
pub use scanner::{decode_entities, DirectiveScanner, Envelope, ScanTier};
pub use tree::{FileTree, TreeNode};
pub use types::{Artifact, ParsedDirectory, ParsedFile, ParsedResponse, Step, StepKind};
