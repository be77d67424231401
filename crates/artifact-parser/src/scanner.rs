//! Envelope detection.
//!
//! The envelope is located with four independent attempts, tried in order:
//! a closed tag pair, an entity-encoded closed pair, an open tag running to
//! the end of the text (still streaming), and the entity-encoded open tag.

use std::ops::Range;

use regex::Regex;

use crate::attributes::Attributes;
use crate::error::Result;

/// Attribute substring of an opening tag. Quoted values may contain `>`.
pub(crate) const TAG_ATTRIBUTES: &str = r#"((?:"[^"]*"|'[^']*'|[^'">/]|/[^'">])*)"#;

/// Regex alternation matching any of `tags` literally
pub(crate) fn tag_alternation(tags: &[String]) -> String {
    tags.iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|")
}

/// Which fallback attempt located the envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanTier {
    /// `<tag ...>...</tag>`
    Closed,
    /// `&lt;tag ...&gt;...&lt;/tag&gt;`
    EncodedClosed,
    /// `<tag ...>...` to end of text
    Open,
    /// `&lt;tag ...&gt;...` to end of text
    EncodedOpen,
}

impl ScanTier {
    /// Attempt order
    pub const ORDER: [ScanTier; 4] = [
        ScanTier::Closed,
        ScanTier::EncodedClosed,
        ScanTier::Open,
        ScanTier::EncodedOpen,
    ];

    #[must_use]
    pub const fn is_encoded(self) -> bool {
        matches!(self, ScanTier::EncodedClosed | ScanTier::EncodedOpen)
    }

    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, ScanTier::Closed | ScanTier::EncodedClosed)
    }
}

/// The outermost envelope of a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Raw attribute substring of the opening tag (entity-decoded)
    pub attributes: String,

    /// Inner content (entity-decoded)
    pub content: String,

    /// Byte range of the whole envelope in the scanned text
    pub span: Range<usize>,

    pub tier: ScanTier,
}

impl Envelope {
    /// Whether the closing tag was seen
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.tier.is_closed()
    }

    /// `(id, title)` from the opening tag, falling back to the given defaults
    pub fn metadata(&self, default_id: &str, default_title: &str) -> (String, String) {
        let attrs = Attributes::parse(&self.attributes);
        (
            attrs.non_empty("id").unwrap_or(default_id).to_string(),
            attrs.non_empty("title").unwrap_or(default_title).to_string(),
        )
    }

    /// Text outside the envelope, trimmed
    pub fn narrative(&self, text: &str) -> String {
        let before = text.get(..self.span.start).unwrap_or("").trim();
        let after = text.get(self.span.end..).unwrap_or("").trim();
        [before, after]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Locates the envelope in raw text
#[derive(Debug, Clone)]
pub struct DirectiveScanner {
    open: Regex,
    close: Regex,
    encoded_open: Regex,
    encoded_close: Regex,
}

impl DirectiveScanner {
    /// Build a scanner for the given envelope tag names
    pub fn new(artifact_tags: &[String]) -> Result<Self> {
        let alt = tag_alternation(artifact_tags);
        Ok(Self {
            open: Regex::new(&format!(r"<(?:{alt})\b{TAG_ATTRIBUTES}>"))?,
            close: Regex::new(&format!(r"</(?:{alt})\s*>"))?,
            encoded_open: Regex::new(&format!(r"(?s)&lt;(?:{alt})\b(.*?)&gt;"))?,
            encoded_close: Regex::new(&format!(r"&lt;/(?:{alt})\s*&gt;"))?,
        })
    }

    /// Find the first envelope, or `None` if no opening tag exists yet
    pub fn scan(&self, text: &str) -> Option<Envelope> {
        let found = ScanTier::ORDER
            .iter()
            .find_map(|&tier| self.try_tier(text, tier));

        match &found {
            Some(envelope) => log::trace!(
                "envelope found via {:?} at {:?}",
                envelope.tier,
                envelope.span
            ),
            None => log::trace!("no envelope in {} bytes", text.len()),
        }
        found
    }

    fn try_tier(&self, text: &str, tier: ScanTier) -> Option<Envelope> {
        let (open, close) = if tier.is_encoded() {
            (&self.encoded_open, &self.encoded_close)
        } else {
            (&self.open, &self.close)
        };

        let caps = open.captures(text)?;
        let whole = caps.get(0)?;
        let attributes = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        let body_start = whole.end();

        let (content, span_end) = if tier.is_closed() {
            let end = close.find(&text[body_start..])?;
            (
                &text[body_start..body_start + end.start()],
                body_start + end.end(),
            )
        } else {
            (&text[body_start..], text.len())
        };
        let content = if tier == ScanTier::EncodedOpen {
            strip_partial_entity(content)
        } else {
            content
        };

        let (attributes, content) = if tier.is_encoded() {
            (decode_entities(attributes), decode_entities(content))
        } else {
            (attributes.to_string(), content.to_string())
        };

        Some(Envelope {
            attributes,
            content,
            span: whole.start()..span_end,
            tier,
        })
    }
}

/// Drop an entity cut off at the end of a still-streaming encoded body
fn strip_partial_entity(text: &str) -> &str {
    match text.rfind('&') {
        Some(idx) if text[idx + 1..].chars().all(|c| c == '#' || c.is_ascii_alphanumeric()) => {
            &text[..idx]
        }
        _ => text,
    }
}

/// Decode the HTML entities models emit when escaping tags.
/// `&amp;` is decoded last so `&amp;lt;` stays a literal `&lt;`.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
