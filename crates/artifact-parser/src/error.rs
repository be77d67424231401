use thiserror::Error;

/// Result type for parser configuration
pub type Result<T> = std::result::Result<T, ParserError>;

/// Errors raised while configuring the parser.
///
/// Parsing model output never fails; malformed input degrades to an empty
/// or partial [`ParsedResponse`](crate::ParsedResponse).
#[derive(Error, Debug)]
pub enum ParserError {
    /// IO error while reading a config file
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Config file is not valid TOML
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A path glob did not compile
    #[error("Invalid path pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A tag pattern did not compile
    #[error("Invalid tag pattern: {0}")]
    InvalidTagPattern(#[from] regex::Error),
}

impl ParserError {
    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create an invalid pattern error
    pub fn invalid_pattern(pattern: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.to_string(),
        }
    }
}
