use std::borrow::Cow;

use crate::parser::ArtifactParser;
use crate::types::ParsedResponse;

const BUILTIN_SOLANA_DAPP: &str = include_str!("../boilerplate/solana-dapp.xml");

/// A pre-authored bundle merged under every generated project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boilerplate {
    text: Cow<'static, str>,
}

impl Boilerplate {
    /// The Next.js + Solana wallet skeleton shipped with the crate
    pub fn builtin() -> Self {
        Self {
            text: Cow::Borrowed(BUILTIN_SOLANA_DAPP),
        }
    }

    /// A custom bundle in the same envelope format
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Cow::Owned(text.into()),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Parse with the default parser
    pub fn parse(&self) -> ParsedResponse {
        crate::parser::default_parser().parse(&self.text)
    }

    /// Parse with a specific parser
    pub fn parse_with(&self, parser: &ArtifactParser) -> ParsedResponse {
        parser.parse(&self.text)
    }
}

impl Default for Boilerplate {
    fn default() -> Self {
        Self::builtin()
    }
}
