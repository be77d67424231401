use std::collections::BTreeMap;

use forge_artifact_parser::paths;
use forge_artifact_parser::ParsedFile;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Node of the filesystem handed to the sandbox.
///
/// Serializes as `{"file": {"contents": ..}}` / `{"directory": {..}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MountNode {
    File { contents: String },
    Directory(BTreeMap<String, MountNode>),
}

/// Hierarchical mount input synthesized from flat `(path, content)` records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MountTree {
    entries: BTreeMap<String, MountNode>,
}

impl MountTree {
    pub fn from_files(files: &[ParsedFile]) -> Self {
        Self::from_entries(files.iter().map(|f| (f.path.as_str(), f.content.as_str())))
    }

    /// Build from `(path, content)` pairs. When a path is needed both as a
    /// file and as a directory, the directory wins.
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut tree = Self::default();
        for (path, content) in entries {
            tree.insert(path, content);
        }
        tree
    }

    fn insert(&mut self, path: &str, content: &str) {
        let path = paths::normalize_path(path);
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let Some((name, parents)) = segments.split_last() else {
            return;
        };

        let mut level = &mut self.entries;
        for segment in parents {
            let node = level
                .entry((*segment).to_string())
                .or_insert_with(|| MountNode::Directory(BTreeMap::new()));
            if let MountNode::File { .. } = node {
                log::warn!("mount: replacing file {segment} with a directory for {path}");
                *node = MountNode::Directory(BTreeMap::new());
            }
            level = match node {
                MountNode::Directory(children) => children,
                MountNode::File { .. } => return,
            };
        }

        if let Some(MountNode::Directory(_)) = level.get(*name) {
            log::warn!("mount: {path} is already a directory, skipping file");
            return;
        }
        level.insert(
            (*name).to_string(),
            MountNode::File {
                contents: content.to_string(),
            },
        );
    }

    /// Node at a normalized path
    pub fn get(&self, path: &str) -> Option<&MountNode> {
        let path = paths::normalize_path(path);
        let mut level = &self.entries;
        let mut segments = path.split('/').filter(|s| !s.is_empty()).peekable();
        while let Some(segment) = segments.next() {
            let node = level.get(segment)?;
            if segments.peek().is_none() {
                return Some(node);
            }
            match node {
                MountNode::Directory(children) => level = children,
                MountNode::File { .. } => return None,
            }
        }
        None
    }

    pub fn contains_file(&self, path: &str) -> bool {
        matches!(self.get(path), Some(MountNode::File { .. }))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flattened `(path, contents)` pairs in path order
    pub fn files(&self) -> Vec<(String, &str)> {
        fn walk<'a>(
            level: &'a BTreeMap<String, MountNode>,
            prefix: &str,
            out: &mut Vec<(String, &'a str)>,
        ) {
            for (name, node) in level {
                let path = if prefix.is_empty() {
                    name.clone()
                } else {
                    format!("{prefix}/{name}")
                };
                match node {
                    MountNode::File { contents } => out.push((path, contents.as_str())),
                    MountNode::Directory(children) => walk(children, &path, out),
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.entries, "", &mut out);
        out
    }

    /// Content digest; equal trees have equal fingerprints
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for (path, contents) in self.files() {
            hasher.update(path.as_bytes());
            hasher.update([0u8]);
            hasher.update(contents.len().to_le_bytes());
            hasher.update(contents.as_bytes());
        }
        format!("{:x}", hasher.finalize())
    }
}
