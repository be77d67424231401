use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;

use crate::paths;
use crate::types::{ParsedDirectory, ParsedFile};

/// Node of the display tree
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TreeNode {
    Directory {
        id: String,
        name: String,
        path: String,
        children: Vec<TreeNode>,
    },
    File {
        id: String,
        name: String,
        path: String,
        language: String,
    },
}

impl TreeNode {
    pub fn path(&self) -> &str {
        match self {
            TreeNode::Directory { path, .. } | TreeNode::File { path, .. } => path,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TreeNode::Directory { name, .. } | TreeNode::File { name, .. } => name,
        }
    }

    pub fn children(&self) -> &[TreeNode] {
        match self {
            TreeNode::Directory { children, .. } => children,
            TreeNode::File { .. } => &[],
        }
    }
}

/// Hierarchical view of a merged file set.
///
/// Directories sort before files and siblings sort by name, so rebuilding
/// from the same set always yields the same tree.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct FileTree {
    pub roots: Vec<TreeNode>,
}

#[derive(Default)]
struct DirBuilder {
    dirs: BTreeMap<String, DirBuilder>,
    files: BTreeMap<String, TreeNode>,
}

impl DirBuilder {
    fn ensure_dir(&mut self, segments: &[&str]) -> &mut DirBuilder {
        segments
            .iter()
            .fold(self, |node, segment| node.dirs.entry((*segment).to_string()).or_default())
    }

    fn into_nodes(self, prefix: &str) -> Vec<TreeNode> {
        let mut nodes = Vec::with_capacity(self.dirs.len() + self.files.len());
        for (name, dir) in self.dirs {
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}/{name}")
            };
            nodes.push(TreeNode::Directory {
                id: paths::dir_id(&path),
                children: dir.into_nodes(&path),
                name,
                path,
            });
        }
        nodes.extend(self.files.into_values());
        nodes
    }
}

impl FileTree {
    /// Fold flat files and directories into a nested tree
    pub fn build(files: &[ParsedFile], directories: &[ParsedDirectory]) -> Self {
        let mut root = DirBuilder::default();

        for dir in directories {
            let segments: Vec<&str> = dir.path.split('/').filter(|s| !s.is_empty()).collect();
            root.ensure_dir(&segments);
        }

        for file in files {
            let segments: Vec<&str> = file.path.split('/').filter(|s| !s.is_empty()).collect();
            let Some((name, parents)) = segments.split_last() else {
                continue;
            };
            root.ensure_dir(parents).files.insert(
                (*name).to_string(),
                TreeNode::File {
                    id: file.id.clone(),
                    name: file.name.clone(),
                    path: file.path.clone(),
                    language: file.language.clone(),
                },
            );
        }

        Self {
            roots: root.into_nodes(""),
        }
    }

    /// Find a node by normalized path
    pub fn find(&self, path: &str) -> Option<&TreeNode> {
        let path = paths::normalize_path(path);
        let mut level = self.roots.as_slice();
        let mut current = None;
        let mut prefix = String::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(segment);
            let node = level.iter().find(|n| n.path() == prefix)?;
            level = node.children();
            current = Some(node);
        }
        current
    }

    /// Number of file leaves
    pub fn file_count(&self) -> usize {
        fn count(nodes: &[TreeNode]) -> usize {
            nodes
                .iter()
                .map(|n| match n {
                    TreeNode::File { .. } => 1,
                    TreeNode::Directory { children, .. } => count(children),
                })
                .sum()
        }
        count(&self.roots)
    }

    /// Indented outline, directories suffixed with `/`
    pub fn render(&self) -> String {
        fn walk(nodes: &[TreeNode], depth: usize, out: &mut String) {
            for node in nodes {
                let suffix = if matches!(node, TreeNode::Directory { .. }) { "/" } else { "" };
                let _ = writeln!(out, "{}{}{}", "  ".repeat(depth), node.name(), suffix);
                walk(node.children(), depth + 1, out);
            }
        }
        let mut out = String::new();
        walk(&self.roots, 0, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn file(path: &str) -> ParsedFile {
        ParsedFile::new(path, "x").unwrap()
    }

    #[test]
    fn test_build_nested_tree() {
        let files = vec![
            file("src/app/page.tsx"),
            file("package.json"),
            file("src/app/layout.tsx"),
            file("src/lib/solana.ts"),
        ];
        let dirs = vec![ParsedDirectory::new("public").unwrap()];
        let tree = FileTree::build(&files, &dirs);

        assert_eq!(
            tree.render(),
            "public/\nsrc/\n  app/\n    layout.tsx\n    page.tsx\n  lib/\n    solana.ts\npackage.json\n"
        );
        assert_eq!(tree.file_count(), 4);
    }

    #[test]
    fn test_ids_and_find() {
        let tree = FileTree::build(&[file("/src/app/page.tsx")], &[]);
        match tree.find("src/app").unwrap() {
            TreeNode::Directory { id, children, .. } => {
                assert_eq!(id, "dir-src-app");
                assert_eq!(children.len(), 1);
            }
            other => panic!("expected directory, got {other:?}"),
        }
        match tree.find("src/app/page.tsx").unwrap() {
            TreeNode::File { id, language, .. } => {
                assert_eq!(id, "file-src-app-page.tsx");
                assert_eq!(language, "tsx");
            }
            other => panic!("expected file, got {other:?}"),
        }
        assert!(tree.find("src/missing").is_none());
        assert!(tree.find("").is_none());
    }

    #[test]
    fn test_rebuild_is_stable_under_reordering() {
        let a = vec![file("b/x.ts"), file("a/y.ts"), file("z.md")];
        let mut b = a.clone();
        b.reverse();
        assert_eq!(FileTree::build(&a, &[]), FileTree::build(&b, &[]));
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let tree = FileTree::build(&[file("a.ts")], &[]);
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json["roots"][0]["kind"], "file");
        assert_eq!(json["roots"][0]["path"], "a.ts");
    }
}
