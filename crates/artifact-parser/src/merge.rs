//! Multi-source merge with replace-by-path precedence.
//!
//! Layers are applied in order (boilerplate, prior turns, current turn) and a
//! later write to a path replaces the earlier entry in its original slot.
//! Merging is always recomputed from the full set of layers.

use std::collections::{HashMap, HashSet};

use crate::paths;
use crate::policy::PathPolicy;
use crate::types::{build_steps, Artifact, ParsedDirectory, ParsedFile, ParsedResponse};

/// Ordered file/directory collection with at most one entry per path.
///
/// Inserting a file also inserts every ancestor directory.
#[derive(Debug, Clone, Default)]
pub struct EntrySet {
    files: Vec<ParsedFile>,
    file_slots: HashMap<String, usize>,
    directories: Vec<ParsedDirectory>,
    dir_slots: HashMap<String, usize>,
}

impl EntrySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a file; returns the replaced entry
    pub fn upsert_file(&mut self, file: ParsedFile) -> Option<ParsedFile> {
        for ancestor in paths::ancestor_dirs(&file.path) {
            if !self.dir_slots.contains_key(&ancestor) {
                if let Some(dir) = ParsedDirectory::new(&ancestor) {
                    self.upsert_directory(dir);
                }
            }
        }

        match self.file_slots.get(&file.path) {
            Some(&slot) => Some(std::mem::replace(&mut self.files[slot], file)),
            None => {
                self.file_slots.insert(file.path.clone(), self.files.len());
                self.files.push(file);
                None
            }
        }
    }

    /// Insert or replace a directory
    pub fn upsert_directory(&mut self, dir: ParsedDirectory) {
        match self.dir_slots.get(&dir.path) {
            Some(&slot) => self.directories[slot] = dir,
            None => {
                self.dir_slots.insert(dir.path.clone(), self.directories.len());
                self.directories.push(dir);
            }
        }
    }

    pub fn contains_file(&self, path: &str) -> bool {
        self.file_slots.contains_key(path)
    }

    pub fn files(&self) -> &[ParsedFile] {
        &self.files
    }

    pub fn directories(&self) -> &[ParsedDirectory] {
        &self.directories
    }

    pub fn into_parts(self) -> (Vec<ParsedFile>, Vec<ParsedDirectory>) {
        (self.files, self.directories)
    }
}

impl FromIterator<ParsedFile> for EntrySet {
    fn from_iter<I: IntoIterator<Item = ParsedFile>>(iter: I) -> Self {
        let mut set = Self::new();
        for file in iter {
            set.upsert_file(file);
        }
        set
    }
}

/// Precedence class of a merge layer, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LayerKind {
    Boilerplate,
    PriorTurn,
    CurrentTurn,
}

/// One source of files for the merge
#[derive(Debug, Clone)]
pub struct Layer {
    pub kind: LayerKind,
    pub response: ParsedResponse,
}

impl Layer {
    pub fn new(kind: LayerKind, response: ParsedResponse) -> Self {
        Self { kind, response }
    }

    /// A prior-turn layer built from already-materialised files
    pub fn from_files(kind: LayerKind, files: &[ParsedFile]) -> Self {
        let (files, directories) = files.iter().cloned().collect::<EntrySet>().into_parts();
        Self::new(
            kind,
            ParsedResponse {
                files,
                directories,
                ..Default::default()
            },
        )
    }
}

/// Combines layers under the latest-write-wins rule
#[derive(Debug, Clone, Copy)]
pub struct MergeEngine<'a> {
    policy: &'a PathPolicy,
}

impl<'a> MergeEngine<'a> {
    pub fn new(policy: &'a PathPolicy) -> Self {
        Self { policy }
    }

    /// Merge layers given in precedence order (lowest first).
    ///
    /// Files and directories: the last write per path wins, except that a
    /// protected path declared by the boilerplate layer keeps its boilerplate
    /// version. Commands and narrative are concatenated in layer order;
    /// artifact id/title come from the last layer that has an artifact.
    pub fn merge(&self, layers: &[Layer]) -> ParsedResponse {
        if let [only] = layers {
            return only.response.clone();
        }

        let base_paths: HashSet<&str> = layers
            .iter()
            .filter(|l| l.kind == LayerKind::Boilerplate)
            .flat_map(|l| l.response.files.iter().map(|f| f.path.as_str()))
            .collect();

        let mut set = EntrySet::new();
        let mut commands = Vec::new();
        let mut narrative = Vec::new();
        let mut artifact: Option<Artifact> = None;

        for layer in layers {
            let response = &layer.response;

            for dir in &response.directories {
                set.upsert_directory(dir.clone());
            }

            for file in &response.files {
                if layer.kind != LayerKind::Boilerplate
                    && base_paths.contains(file.path.as_str())
                    && self.policy.is_protected(&file.path)
                {
                    log::debug!(
                        "keeping boilerplate version of protected path {}",
                        file.path
                    );
                    continue;
                }
                if set.upsert_file(file.clone()).is_some() {
                    log::trace!("{:?} layer replaced {}", layer.kind, file.path);
                }
            }

            commands.extend(response.shell_commands().iter().cloned());
            if !response.narrative.is_empty() {
                narrative.push(response.narrative.clone());
            }
            if let Some(meta) = &response.artifact {
                artifact = Some(meta.clone());
            }
        }

        let (files, directories) = dedup_last_wins(set.into_parts());
        let artifact = artifact.map(|meta| Artifact {
            shell_commands: commands.clone(),
            ..meta
        });
        let steps = build_steps(&directories, &files, &commands);

        ParsedResponse {
            files,
            directories,
            artifact,
            narrative: narrative.join("\n\n"),
            steps,
        }
    }
}

/// Final pass guaranteeing one entry per path, keeping the last-seen entry
/// in the slot of the first.
fn dedup_last_wins(
    (files, directories): (Vec<ParsedFile>, Vec<ParsedDirectory>),
) -> (Vec<ParsedFile>, Vec<ParsedDirectory>) {
    (
        dedup_by_path(files, |f| f.path.clone()),
        dedup_by_path(directories, |d| d.path.clone()),
    )
}

fn dedup_by_path<T>(items: Vec<T>, key: impl Fn(&T) -> String) -> Vec<T> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        let k = key(&item);
        match slots.get(&k) {
            Some(&slot) => out[slot] = item,
            None => {
                slots.insert(k, out.len());
                out.push(item);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use pretty_assertions::assert_eq;

    fn file(path: &str, content: &str) -> ParsedFile {
        ParsedFile::new(path, content).unwrap()
    }

    fn layer(kind: LayerKind, files: &[(&str, &str)], commands: &[&str]) -> Layer {
        let mut layer = Layer::from_files(
            kind,
            &files.iter().map(|(p, c)| file(p, c)).collect::<Vec<_>>(),
        );
        layer.response.artifact = Some(Artifact {
            id: format!("{kind:?}").to_lowercase(),
            title: format!("{kind:?}"),
            shell_commands: commands.iter().map(|c| (*c).to_string()).collect(),
            complete: true,
        });
        layer
    }

    #[test]
    fn test_entry_set_replaces_in_place() {
        let mut set = EntrySet::new();
        assert!(set.upsert_file(file("a/b.ts", "1")).is_none());
        assert!(set.upsert_file(file("c.ts", "2")).is_none());
        let replaced = set.upsert_file(file("/a/b.ts", "3")).unwrap();

        assert_eq!(replaced.content, "1");
        let paths: Vec<_> = set.files().iter().map(|f| (f.path.as_str(), f.content.as_str())).collect();
        assert_eq!(paths, vec![("a/b.ts", "3"), ("c.ts", "2")]);
        assert_eq!(set.directories().len(), 1);
        assert!(set.contains_file("c.ts"));
    }

    #[test]
    fn test_latest_layer_wins() {
        let policy = PathPolicy::from_config(&ParserConfig::default()).unwrap();
        let merged = MergeEngine::new(&policy).merge(&[
            layer(LayerKind::Boilerplate, &[("package.json", "A"), ("src/app/layout.tsx", "B")], &["npm install"]),
            layer(LayerKind::PriorTurn, &[("src/app/page.tsx", "old")], &[]),
            layer(LayerKind::CurrentTurn, &[("package.json", "C"), ("src/app/page.tsx", "D")], &["npm run dev"]),
        ]);

        let files: Vec<_> = merged.files.iter().map(|f| (f.path.as_str(), f.content.as_str())).collect();
        assert_eq!(
            files,
            vec![("package.json", "C"), ("src/app/layout.tsx", "B"), ("src/app/page.tsx", "D")]
        );
        assert_eq!(merged.shell_commands(), ["npm install", "npm run dev"]);
        let artifact = merged.artifact.unwrap();
        assert_eq!(artifact.id, "currentturn");
        let dirs: Vec<_> = merged.directories.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(dirs, vec!["src", "src/app"]);
    }

    #[test]
    fn test_protected_paths_keep_boilerplate() {
        let config = ParserConfig {
            protected_paths: vec!["tsconfig.json".to_string()],
            ..Default::default()
        };
        let policy = PathPolicy::from_config(&config).unwrap();
        let merged = MergeEngine::new(&policy).merge(&[
            layer(LayerKind::Boilerplate, &[("tsconfig.json", "base")], &[]),
            layer(LayerKind::CurrentTurn, &[("tsconfig.json", "ai"), ("other/tsconfig.json", "x")], &[]),
        ]);

        assert_eq!(merged.file("tsconfig.json").unwrap().content, "base");
        assert_eq!(merged.file("other/tsconfig.json").unwrap().content, "x");
    }

    #[test]
    fn test_protection_needs_boilerplate_declaration() {
        let config = ParserConfig {
            protected_paths: vec!["tsconfig.json".to_string()],
            ..Default::default()
        };
        let policy = PathPolicy::from_config(&config).unwrap();
        let merged = MergeEngine::new(&policy).merge(&[
            layer(LayerKind::PriorTurn, &[("tsconfig.json", "first")], &[]),
            layer(LayerKind::CurrentTurn, &[("tsconfig.json", "second")], &[]),
        ]);

        assert_eq!(merged.file("tsconfig.json").unwrap().content, "second");
    }

    #[test]
    fn test_artifact_falls_back_to_earlier_layer() {
        let policy = PathPolicy::from_config(&ParserConfig::default()).unwrap();
        let mut current = Layer::from_files(LayerKind::CurrentTurn, &[file("a.ts", "x")]);
        current.response.narrative = "Sure, here you go.".to_string();

        let merged = MergeEngine::new(&policy).merge(&[
            layer(LayerKind::Boilerplate, &[("package.json", "A")], &["npm install"]),
            current,
        ]);

        let artifact = merged.artifact.as_ref().unwrap();
        assert_eq!(artifact.id, "boilerplate");
        assert_eq!(merged.shell_commands(), ["npm install"]);
        assert_eq!(merged.narrative, "Sure, here you go.");
    }

    #[test]
    fn test_dedup_by_path_keeps_last() {
        let out = dedup_by_path(vec![("a", 1), ("b", 2), ("a", 3)], |(k, _)| (*k).to_string());
        assert_eq!(out, vec![("a", 3), ("b", 2)]);
    }
}
