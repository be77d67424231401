use std::path::Path;

/// Display language of a generated file, used for syntax highlighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    TypeScript,
    Tsx,
    JavaScript,
    Jsx,
    Json,
    Css,
    Scss,
    Html,
    Markdown,
    Rust,
    Toml,
    Yaml,
    Shell,
    Sql,
    Dockerfile,
    PlainText,
}

impl Language {
    /// Detect language from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "ts" | "mts" | "cts" => Language::TypeScript,
            "tsx" => Language::Tsx,
            "js" | "mjs" | "cjs" => Language::JavaScript,
            "jsx" => Language::Jsx,
            "json" | "jsonc" => Language::Json,
            "css" => Language::Css,
            "scss" | "sass" => Language::Scss,
            "html" | "htm" => Language::Html,
            "md" | "mdx" => Language::Markdown,
            "rs" => Language::Rust,
            "toml" => Language::Toml,
            "yml" | "yaml" => Language::Yaml,
            "sh" | "bash" | "zsh" => Language::Shell,
            "sql" => Language::Sql,
            _ => Language::PlainText,
        }
    }

    /// Detect language from file path, falling back to well-known file names
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");

        match file_name {
            "Dockerfile" => return Language::Dockerfile,
            "Makefile" | ".env" | ".env.local" | ".env.example" => return Language::Shell,
            _ => {}
        }

        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Language::PlainText)
    }

    /// Get language tag as string
    pub fn as_str(self) -> &'static str {
        match self {
            Language::TypeScript => "typescript",
            Language::Tsx => "tsx",
            Language::JavaScript => "javascript",
            Language::Jsx => "jsx",
            Language::Json => "json",
            Language::Css => "css",
            Language::Scss => "scss",
            Language::Html => "html",
            Language::Markdown => "markdown",
            Language::Rust => "rust",
            Language::Toml => "toml",
            Language::Yaml => "yaml",
            Language::Shell => "shell",
            Language::Sql => "sql",
            Language::Dockerfile => "dockerfile",
            Language::PlainText => "plaintext",
        }
    }
}
