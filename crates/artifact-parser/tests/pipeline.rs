use forge_artifact_parser::{
    parse, ArtifactParser, Boilerplate, ParsedFile, ParserConfig, StepKind, StreamingProjector,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

const DEMO: &str = r#"<forgeArtifact id="demo" title="Demo"><forgeAction type="file" filePath="src/app/page.tsx">export default function Page(){}</forgeAction><forgeAction type="shell">npm install</forgeAction></forgeArtifact>"#;

fn file_pairs(files: &[ParsedFile]) -> Vec<(&str, &str)> {
    files
        .iter()
        .map(|f| (f.path.as_str(), f.content.as_str()))
        .collect()
}

#[test]
fn demo_response_yields_files_directories_and_commands() {
    let response = parse(DEMO);

    assert_eq!(
        file_pairs(&response.files),
        vec![("src/app/page.tsx", "export default function Page(){}")]
    );
    let dirs: Vec<_> = response.directories.iter().map(|d| d.path.as_str()).collect();
    assert_eq!(dirs, vec!["src", "src/app"]);
    assert_eq!(response.shell_commands(), ["npm install"]);

    let artifact = response.artifact.as_ref().expect("artifact");
    assert_eq!(artifact.id, "demo");
    assert_eq!(artifact.title, "Demo");
    assert!(artifact.complete);
    assert!(response.narrative.is_empty());
}

#[test]
fn parsing_twice_is_identical() {
    assert_eq!(parse(DEMO), parse(DEMO));
}

#[test]
fn boilerplate_merge_scenario() {
    let boilerplate = Boilerplate::from_text(
        r#"<forgeArtifact id="base" title="Base">
<forgeAction type="file" filePath="package.json">A</forgeAction>
<forgeAction type="file" filePath="src/app/layout.tsx">B</forgeAction>
</forgeArtifact>"#,
    );
    let current = r#"<forgeArtifact id="turn" title="Turn">
<forgeAction type="file" filePath="package.json">C</forgeAction>
<forgeAction type="file" filePath="src/app/page.tsx">D</forgeAction>
</forgeArtifact>"#;

    let parser = ArtifactParser::new(ParserConfig::default()).expect("parser");
    let merged = parser.parse_with_boilerplate(&boilerplate, current);

    assert_eq!(
        file_pairs(&merged.files),
        vec![
            ("package.json", "C"),
            ("src/app/layout.tsx", "B"),
            ("src/app/page.tsx", "D"),
        ]
    );
    assert_eq!(merged.artifact.as_ref().map(|a| a.id.as_str()), Some("turn"));
}

#[test]
fn history_merge_applies_layers_transitively() {
    let parser = ArtifactParser::new(ParserConfig::default()).expect("parser");
    let prior = vec![
        ParsedFile::new("package.json", "from-prior").unwrap(),
        ParsedFile::new("src/lib/vault.ts", "v1").unwrap(),
    ];
    let current = r#"<forgeArtifact id="t3"><forgeAction type="file" filePath="src/lib/vault.ts">v2</forgeAction></forgeArtifact>"#;

    let merged = parser.parse_with_history(&prior, current, Some(&Boilerplate::builtin()));

    assert_eq!(merged.file("package.json").unwrap().content, "from-prior");
    assert_eq!(merged.file("src/lib/vault.ts").unwrap().content, "v2");
    assert!(merged.file("src/app/layout.tsx").is_some());
    assert_eq!(merged.shell_commands(), ["npm install"]);
}

#[test]
fn boilerplate_install_runs_before_turn_starts_server() {
    let current = r#"<forgeArtifact id="anchor"><forgeAction type="shell">npm install @coral-xyz/anchor</forgeAction><forgeAction type="shell">npm run dev</forgeAction></forgeArtifact>"#;

    let merged = ArtifactParser::new(ParserConfig::default())
        .expect("parser")
        .parse_with_boilerplate(&Boilerplate::builtin(), current);

    assert_eq!(
        merged.shell_commands(),
        ["npm install", "npm install @coral-xyz/anchor", "npm run dev"]
    );
}

#[test]
fn strict_boilerplate_keeps_build_config() {
    let parser = ArtifactParser::new(ParserConfig::strict_boilerplate()).expect("parser");
    let current = r#"<forgeArtifact id="t"><forgeAction type="file" filePath="tsconfig.json">{}</forgeAction><forgeAction type="file" filePath="package.json">{"name":"mine"}</forgeAction></forgeArtifact>"#;

    let merged = parser.parse_with_boilerplate(&Boilerplate::builtin(), current);

    assert!(merged.file("tsconfig.json").unwrap().content.contains("compilerOptions"));
    assert_eq!(merged.file("package.json").unwrap().content, r#"{"name":"mine"}"#);
}

#[test]
fn truncated_input_has_envelope_but_no_closed_file() {
    let text = r#"<artifact id="x" title="t"><action type="file" filePath="src/a.ts">partial conten"#;
    let parser = ArtifactParser::new(ParserConfig::default()).expect("parser");

    let envelope = parser.scanner().scan(text).expect("envelope");
    assert!(!envelope.is_complete());

    let response = parser.parse(text);
    assert!(response.file("src/a.ts").is_none());
    let artifact = response.artifact.expect("artifact");
    assert_eq!((artifact.id.as_str(), artifact.title.as_str()), ("x", "t"));
    assert!(!artifact.complete);
}

#[test]
fn truncated_input_is_available_through_projector() {
    let text = r#"<artifact id="x" title="t"><action type="file" filePath="src/a.ts">partial conten"#;
    let mut projector =
        StreamingProjector::new(Arc::new(ArtifactParser::new(ParserConfig::default()).unwrap()));
    projector.set_focus(Some("src/a.ts"));

    let focused = projector.project(text).focused.expect("focused");
    assert_eq!(focused.content, "partial conten");
    assert!(focused.streaming);
}

#[test]
fn encoded_stream_hides_cut_entity_in_live_content() {
    let text = r#"&lt;forgeArtifact id="e"&gt;&lt;forgeAction type="file" filePath="src/a.ts"&gt;if (a &amp;&amp; b &l"#;
    let mut projector =
        StreamingProjector::new(Arc::new(ArtifactParser::new(ParserConfig::default()).unwrap()));
    projector.set_focus(Some("src/a.ts"));

    let focused = projector.project(text).focused.expect("focused");
    assert_eq!(focused.content, "if (a && b ");
    assert!(focused.streaming);
}

#[test]
fn shell_commands_keep_source_order() {
    let text = r#"<artifact id="o">
<action type="shell">npm install</action>
<action type="file" filePath="a.ts">x</action>
<action type="shell">npm run build</action>
<action type="command" command="npm run dev"></action>
</artifact>"#;

    let response = parse(text);
    assert_eq!(
        response.shell_commands(),
        ["npm install", "npm run build", "npm run dev"]
    );
    let kinds: Vec<_> = response.steps.iter().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        vec![
            StepKind::CreateFile,
            StepKind::RunCommand,
            StepKind::RunCommand,
            StepKind::RunCommand
        ]
    );
}

#[test]
fn no_envelope_is_plain_narrative() {
    let response = parse("  Here is how Solana accounts work.  ");
    assert!(response.artifact.is_none());
    assert!(response.files.is_empty());
    assert!(response.directories.is_empty());
    assert_eq!(response.narrative, "Here is how Solana accounts work.");
}

#[test]
fn envelope_without_directives_keeps_narrative() {
    let response = parse("Before.\n<forgeArtifact id=\"e\" title=\"Empty\">\n</forgeArtifact>\nAfter.");
    assert!(!response.has_content());
    assert_eq!(response.narrative, "Before.\n\nAfter.");
    assert_eq!(response.artifact.unwrap().title, "Empty");
}

#[test]
fn encoded_response_is_decoded() {
    let text = "&lt;forgeArtifact id=&quot;enc&quot; title=&quot;Encoded&quot;&gt;&lt;forgeAction type=&quot;file&quot; filePath=&quot;src/a.ts&quot;&gt;if (a &amp;&amp; b &lt; c) {}&lt;/forgeAction&gt;&lt;/forgeArtifact&gt;";

    let response = parse(text);
    assert_eq!(response.file("src/a.ts").unwrap().content, "if (a && b < c) {}");
    assert_eq!(response.artifact.unwrap().id, "enc");
}

#[test]
fn declared_directories_and_ancestors_are_merged() {
    let text = r#"<artifact id="d">
<action type="directory" dirPath="/public/"></action>
<action type="directory" dirPath="src/app"></action>
<action type="file" filePath="src/app/page.tsx">x</action>
</artifact>"#;

    let response = parse(text);
    let mut dirs: Vec<_> = response.directories.iter().map(|d| d.path.as_str()).collect();
    dirs.sort_unstable();
    assert_eq!(dirs, vec!["public", "src", "src/app"]);
}
