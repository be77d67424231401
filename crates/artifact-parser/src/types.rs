use serde::{Deserialize, Serialize};

use crate::language::Language;
use crate::paths;

/// A generated file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParsedFile {
    /// Stable identifier derived from `path`
    pub id: String,

    /// Last path segment
    pub name: String,

    /// Normalized path, no leading slash
    pub path: String,

    /// Full (trimmed) file body
    pub content: String,

    /// Display language tag
    pub language: String,
}

impl ParsedFile {
    /// Create a file record, or `None` when the path normalizes to nothing
    pub fn new(path: &str, content: impl Into<String>) -> Option<Self> {
        let path = paths::normalize_path(path);
        if path.is_empty() {
            return None;
        }

        Some(Self {
            id: paths::file_id(&path),
            name: paths::file_name(&path).to_string(),
            language: Language::from_path(&path).as_str().to_string(),
            content: content.into(),
            path,
        })
    }
}

/// A directory, either declared or implied by a file path
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParsedDirectory {
    pub id: String,
    pub name: String,
    pub path: String,
}

impl ParsedDirectory {
    /// Create a directory record, or `None` when the path normalizes to nothing
    pub fn new(path: &str) -> Option<Self> {
        let path = paths::normalize_path(path);
        if path.is_empty() {
            return None;
        }

        Some(Self {
            id: paths::dir_id(&path),
            name: paths::file_name(&path).to_string(),
            path,
        })
    }
}

/// Envelope metadata of one response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Artifact {
    pub id: String,
    pub title: String,

    /// Shell commands in execution order
    pub shell_commands: Vec<String>,

    /// Whether the closing envelope tag has been received
    pub complete: bool,
}

/// Kind of a legacy progress step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    CreateDirectory,
    CreateFile,
    RunCommand,
}

impl StepKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateDirectory => "create_directory",
            Self::CreateFile => "create_file",
            Self::RunCommand => "run_command",
        }
    }
}

/// One entry of the flattened, execution-order progress view
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Step {
    /// 1-based position in execution order
    pub index: usize,
    pub kind: StepKind,

    /// Path for directory/file steps, command text for command steps
    pub target: String,
    pub description: String,
}

/// Everything recovered from one or more model responses
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParsedResponse {
    pub files: Vec<ParsedFile>,
    pub directories: Vec<ParsedDirectory>,

    /// `None` when no envelope was found; the response is plain commentary
    pub artifact: Option<Artifact>,

    /// Text outside the envelope
    pub narrative: String,
    pub steps: Vec<Step>,
}

impl ParsedResponse {
    /// A response with no structured content
    pub fn narrative_only(text: &str) -> Self {
        Self {
            narrative: text.trim().to_string(),
            ..Default::default()
        }
    }

    /// Shell commands in execution order
    #[must_use]
    pub fn shell_commands(&self) -> &[String] {
        self.artifact
            .as_ref()
            .map(|a| a.shell_commands.as_slice())
            .unwrap_or_default()
    }

    /// Look up a file by path (normalized before comparison)
    #[must_use]
    pub fn file(&self, path: &str) -> Option<&ParsedFile> {
        let path = paths::normalize_path(path);
        self.files.iter().find(|f| f.path == path)
    }

    /// Look up a directory by path (normalized before comparison)
    #[must_use]
    pub fn directory(&self, path: &str) -> Option<&ParsedDirectory> {
        let path = paths::normalize_path(path);
        self.directories.iter().find(|d| d.path == path)
    }

    /// Whether any files, directories or commands were recovered
    #[must_use]
    pub fn has_content(&self) -> bool {
        !self.files.is_empty() || !self.directories.is_empty() || !self.shell_commands().is_empty()
    }

    /// `(path, content)` pairs for the sandbox mount
    pub fn mount_entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files
            .iter()
            .map(|f| (f.path.as_str(), f.content.as_str()))
    }
}

/// Build the legacy step list: directories (parents first), then files,
/// then commands.
pub(crate) fn build_steps(
    directories: &[ParsedDirectory],
    files: &[ParsedFile],
    commands: &[String],
) -> Vec<Step> {
    let mut dirs: Vec<&ParsedDirectory> = directories.iter().collect();
    dirs.sort_by_key(|d| d.path.matches('/').count());

    let dir_steps = dirs.into_iter().map(|d| {
        (
            StepKind::CreateDirectory,
            d.path.clone(),
            format!("Create directory {}", d.path),
        )
    });
    let file_steps = files.iter().map(|f| {
        (
            StepKind::CreateFile,
            f.path.clone(),
            format!("Create {}", f.path),
        )
    });
    let command_steps = commands
        .iter()
        .map(|c| (StepKind::RunCommand, c.clone(), format!("Run `{c}`")));

    dir_steps
        .chain(file_steps)
        .chain(command_steps)
        .enumerate()
        .map(|(i, (kind, target, description))| Step {
            index: i + 1,
            kind,
            target,
            description,
        })
        .collect()
}
