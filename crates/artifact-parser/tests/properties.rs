use std::collections::HashSet;

use forge_artifact_parser::paths::{ancestor_dirs, dir_id, file_id, normalize_path};
use forge_artifact_parser::{default_parser, FileTree, Layer, LayerKind, ParsedFile};
use proptest::prelude::*;

fn segment() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_.\\- ]{1,8}".prop_filter("not a dot segment", |s| {
        let t = s.trim();
        !t.is_empty() && t != "."
    })
}

fn path() -> impl Strategy<Value = String> {
    (any::<bool>(), prop::collection::vec(segment(), 1..5))
        .prop_map(|(leading, segs)| format!("{}{}", if leading { "/" } else { "" }, segs.join("/")))
}

fn bundle(files: &[(String, String)]) -> String {
    let mut out = String::from("<forgeArtifact id=\"p\" title=\"Prop\">\n");
    for (path, body) in files {
        out.push_str(&format!(
            "<forgeAction type=\"file\" filePath=\"{path}\">{body}</forgeAction>\n"
        ));
    }
    out.push_str("</forgeArtifact>");
    out
}

proptest! {
    #[test]
    fn ids_are_deterministic_and_namespaced(p in path()) {
        prop_assert_eq!(file_id(&p), file_id(&p));
        prop_assert_eq!(file_id(&p), file_id(&normalize_path(&p)));
        prop_assert_ne!(file_id(&p), dir_id(&p));
    }

    #[test]
    fn distinct_paths_get_distinct_ids(a in path(), b in path()) {
        let (na, nb) = (normalize_path(&a), normalize_path(&b));
        prop_assume!(na != nb);
        prop_assert_ne!(file_id(&na), file_id(&nb));
        prop_assert_ne!(dir_id(&na), dir_id(&nb));
    }

    #[test]
    fn merged_results_are_complete_and_unique(
        base in prop::collection::vec((path(), "[a-z]{1,6}"), 0..6),
        current in prop::collection::vec((path(), "[a-z]{1,6}"), 0..6),
    ) {
        let parser = default_parser();
        let merged = parser.merge_layers(&[
            Layer::new(LayerKind::Boilerplate, parser.parse(&bundle(&base))),
            Layer::new(LayerKind::CurrentTurn, parser.parse(&bundle(&current))),
        ]);

        let file_paths: HashSet<&str> = merged.files.iter().map(|f| f.path.as_str()).collect();
        prop_assert_eq!(file_paths.len(), merged.files.len());

        let dir_paths: HashSet<&str> = merged.directories.iter().map(|d| d.path.as_str()).collect();
        prop_assert_eq!(dir_paths.len(), merged.directories.len());

        for file in &merged.files {
            for ancestor in ancestor_dirs(&file.path) {
                prop_assert!(dir_paths.contains(ancestor.as_str()), "missing {}", ancestor);
            }
        }

        // The last declaration of a path, from the highest layer that has it, wins.
        for (path, body) in base.iter().chain(current.iter()) {
            let normalized = normalize_path(path);
            let expected = current
                .iter()
                .rev()
                .chain(base.iter().rev())
                .find(|(p, _)| normalize_path(p) == normalized)
                .map(|(_, b)| b.as_str());
            let actual = merged.file(&normalized).map(|f| f.content.as_str());
            prop_assert_eq!(actual, expected, "path {} body {}", normalized, body);
        }
    }

    #[test]
    fn tree_rebuild_is_order_independent(paths in prop::collection::vec(path(), 0..8)) {
        let files: Vec<ParsedFile> = paths
            .iter()
            .filter_map(|p| ParsedFile::new(p, "x"))
            .collect();
        let mut reversed = files.clone();
        reversed.reverse();
        prop_assert_eq!(FileTree::build(&files, &[]), FileTree::build(&reversed, &[]));
    }
}
