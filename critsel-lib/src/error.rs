/// Result type for stylesheet profiling.
pub type Result<T> = std::result::Result<T, CritselError>;

/// Errors surfaced to callers of the library.
///
/// Classification itself never fails; these only come from reading CSS text
/// and from building caller-supplied patterns.
#[derive(Debug, thiserror::Error)]
pub enum CritselError {
    #[error("Failed to parse stylesheet: {0}")]
    Parse(String),

    #[error("Invalid regular expression `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported flag `{flag}` in regular expression `{pattern}`")]
    UnsupportedFlag { pattern: String, flag: char },
}
