use regex::Regex;

use crate::attributes::Attributes;
use crate::error::Result;
use crate::paths;
use crate::scanner::{tag_alternation, TAG_ATTRIBUTES};

/// A classified action directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Create or replace a file
    File { path: String, content: String },
    /// Create a directory
    Directory { path: String },
    /// Run a shell command
    Shell { command: String },
}

/// Location of a file directive inside envelope content, possibly unterminated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDirective<'a> {
    /// Raw body after the opening tag
    pub body: &'a str,

    /// Whether a closing tag follows the body
    pub closed: bool,
}

/// Finds and classifies action directives
#[derive(Debug, Clone)]
pub struct ActionInterpreter {
    /// Closed directive: attributes in group 1, body in group 2.
    /// Self-closing directives have no body group.
    directive: Regex,
    open: Regex,
    close: Regex,
    action_tags: Vec<String>,
}

impl ActionInterpreter {
    /// Build an interpreter for the given action tag names
    pub fn new(action_tags: &[String]) -> Result<Self> {
        let alt = tag_alternation(action_tags);
        Ok(Self {
            directive: Regex::new(&format!(
                r"(?s)<(?:{alt})\b{TAG_ATTRIBUTES}(?:/>|>(.*?)</(?:{alt})\s*>)"
            ))?,
            open: Regex::new(&format!(r"<(?:{alt})\b{TAG_ATTRIBUTES}>"))?,
            close: Regex::new(&format!(r"</(?:{alt})\s*>"))?,
            action_tags: action_tags.to_vec(),
        })
    }

    /// Every closed directive in `content`, in source order.
    /// Unrecognised shapes are skipped.
    pub fn interpret(&self, content: &str) -> Vec<Action> {
        self.directive
            .captures_iter(content)
            .filter_map(|caps| {
                let attrs = Attributes::parse(caps.get(1).map_or("", |m| m.as_str()));
                let body = caps.get(2).map_or("", |m| m.as_str());
                classify(&attrs, body)
            })
            .collect()
    }

    /// The last file directive for `path`, closed or still streaming
    pub fn find_file_directive<'a>(&self, content: &'a str, path: &str) -> Option<FileDirective<'a>> {
        let wanted = paths::normalize_path(path);
        if wanted.is_empty() {
            return None;
        }

        let mut found = None;
        for caps in self.open.captures_iter(content) {
            let attrs = Attributes::parse(caps.get(1).map_or("", |m| m.as_str()));
            if !attrs.value("type").eq_ignore_ascii_case("file")
                || paths::normalize_path(attrs.value("filePath")) != wanted
            {
                continue;
            }

            let Some(whole) = caps.get(0) else {
                continue;
            };
            let rest = &content[whole.end()..];
            found = Some(match self.close.find(rest) {
                Some(end) => FileDirective {
                    body: &rest[..end.start()],
                    closed: true,
                },
                None => FileDirective {
                    body: strip_partial_close(rest, &self.action_tags),
                    closed: false,
                },
            });
        }
        found
    }
}

fn classify(attrs: &Attributes, body: &str) -> Option<Action> {
    let kind = attrs.value("type").to_ascii_lowercase();
    match kind.as_str() {
        "file" => {
            let path = paths::normalize_path(attrs.value("filePath"));
            let content = body.trim();
            if path.is_empty() || content.is_empty() {
                log::debug!(
                    "skipping file directive (filePath={:?}, {} body bytes)",
                    attrs.value("filePath"),
                    content.len()
                );
                return None;
            }
            Some(Action::File {
                path,
                content: content.to_string(),
            })
        }
        "directory" => {
            let declared = attrs
                .non_empty("dirPath")
                .unwrap_or_else(|| attrs.value("filePath"));
            let path = paths::normalize_path(declared);
            if path.is_empty() {
                log::debug!("skipping directory directive without a path");
                return None;
            }
            Some(Action::Directory { path })
        }
        "shell" | "command" => {
            let command = attrs
                .non_empty("command")
                .unwrap_or_else(|| body.trim())
                .to_string();
            if command.is_empty() {
                log::debug!("skipping empty {kind} directive");
                return None;
            }
            Some(Action::Shell { command })
        }
        other => {
            log::debug!("ignoring unrecognised directive type {other:?}");
            None
        }
    }
}

/// Drop a closing tag that has only partially arrived, e.g. a trailing `</forgeAc`.
fn strip_partial_close<'a>(body: &'a str, tags: &[String]) -> &'a str {
    let Some(idx) = body.rfind("</") else {
        return body;
    };
    let tail = &body[idx..];
    let is_partial = tags.iter().any(|tag| {
        let full = format!("</{tag}>");
        full.len() > tail.len() && full.starts_with(tail)
    });
    if is_partial {
        &body[..idx]
    } else {
        body
    }
}
