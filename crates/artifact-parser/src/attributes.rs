use once_cell::sync::Lazy;
use regex::Regex;

/// `key=value` pairs, with double-, single- or un-quoted values.
static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("attribute pattern is valid")
});

/// Attributes of one tag, in source order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    pairs: Vec<(String, String)>,
}

impl Attributes {
    /// Extract every attribute from a raw attribute substring.
    /// Order does not matter and malformed fragments are skipped.
    pub fn parse(raw: &str) -> Self {
        let pairs = ATTRIBUTE
            .captures_iter(raw)
            .filter_map(|caps| {
                let key = caps.get(1)?.as_str().to_string();
                let value = caps
                    .get(2)
                    .or_else(|| caps.get(3))
                    .or_else(|| caps.get(4))
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default();
                Some((key, value))
            })
            .collect();

        Self { pairs }
    }

    /// First value for `key`, if present
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Trimmed value for `key`, empty when absent
    pub fn value(&self, key: &str) -> &str {
        self.get(key).map(str::trim).unwrap_or("")
    }

    /// Trimmed, non-empty value for `key`
    pub fn non_empty(&self, key: &str) -> Option<&str> {
        Some(self.value(key)).filter(|v| !v.is_empty())
    }
}
