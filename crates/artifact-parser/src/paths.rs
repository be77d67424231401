//! Path normalization and stable identity.
//!
//! Identifiers are a pure function of the normalized path so that a file keeps
//! the same id across every re-parse of a growing buffer. The encoding is
//! injective: `/` becomes `-`, ASCII alphanumerics and `.` are kept, and every
//! other character (including `-` and `_` themselves) is written as `_<hex>_`.

use std::fmt::Write as _;

/// Namespace of an identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    const fn prefix(self) -> &'static str {
        match self {
            EntryKind::File => "file-",
            EntryKind::Directory => "dir-",
        }
    }
}

/// Normalize a declared path: backslashes become `/`, leading slashes and
/// empty or `.` segments are dropped.
pub fn normalize_path(raw: &str) -> String {
    raw.trim()
        .replace('\\', "/")
        .split('/')
        .map(str::trim)
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Ancestor directory paths of a normalized path, outermost first.
///
/// `a/b/c.ts` yields `["a", "a/b"]`.
pub fn ancestor_dirs(path: &str) -> Vec<String> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    (1..segments.len())
        .map(|n| segments[..n].join("/"))
        .collect()
}

/// Last segment of a normalized path
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Parent directory of a normalized path, `None` at the root
pub fn parent_dir(path: &str) -> Option<&str> {
    path.rfind('/').map(|idx| &path[..idx])
}

/// Stable identifier for a file path
pub fn file_id(path: &str) -> String {
    identity(EntryKind::File, path)
}

/// Stable identifier for a directory path
pub fn dir_id(path: &str) -> String {
    identity(EntryKind::Directory, path)
}

/// Stable identifier for a path in the given namespace
pub fn identity(kind: EntryKind, path: &str) -> String {
    let normalized = normalize_path(path);
    let mut id = String::with_capacity(kind.prefix().len() + normalized.len());
    id.push_str(kind.prefix());
    for ch in normalized.chars() {
        match ch {
            '/' => id.push('-'),
            c if c.is_ascii_alphanumeric() || c == '.' => id.push(c),
            c => {
                let _ = write!(id, "_{:x}_", c as u32);
            }
        }
    }
    id
}
