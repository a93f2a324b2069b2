//! Force-include / force-exclude patterns.
//!
//! A pattern is tested against the rendered, trimmed selector text. Literal
//! patterns compare for equality, regular expressions search anywhere in the
//! text. Regex flags use the ECMAScript letters callers already know from
//! `/source/flags` literals.

use std::collections::HashSet;

use crate::error::{CritselError, Result};
use regex::{Regex, RegexBuilder};

const SUPPORTED_FLAGS: &str = "dgimsuy";

#[derive(Debug, Clone)]
pub enum Pattern {
    /// Exact match against the selector text.
    Literal(String),
    Regexp(RegexpPattern),
}

#[derive(Debug, Clone)]
pub struct RegexpPattern {
    source: String,
    flags: String,
    compiled: Regex,
}

impl RegexpPattern {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn flags(&self) -> &str {
        &self.flags
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Literal(l1), Self::Literal(l2)) => l1 == l2,
            (Self::Regexp(r1), Self::Regexp(r2)) => r1.source == r2.source && r1.flags == r2.flags,
            _ => false,
        }
    }
}

impl Eq for Pattern {}

impl Pattern {
    pub fn literal(value: impl Into<String>) -> Pattern {
        Pattern::Literal(value.into())
    }

    /// Compile a regular expression pattern.
    ///
    /// Supported flags: `i`, `m`, `s`, `u`, `g`, `d` and `y`. `g` and `d` have
    /// no effect because every test starts fresh and only asks whether there
    /// is a match; `y` anchors the match at the start of the selector for the
    /// same reason. `u` is always on.
    pub fn regexp(source: &str, flags: &str) -> Result<Pattern> {
        let mut seen = HashSet::new();
        for flag in flags.chars() {
            if !SUPPORTED_FLAGS.contains(flag) || !seen.insert(flag) {
                return Err(unsupported(source, flag));
            }
        }

        let effective_source = if seen.contains(&'y') {
            format!(r"\A(?:{source})")
        } else {
            source.to_string()
        };
        let compiled = RegexBuilder::new(&effective_source)
            .case_insensitive(seen.contains(&'i'))
            .multi_line(seen.contains(&'m'))
            .dot_matches_new_line(seen.contains(&'s'))
            .build()
            .map_err(|error| CritselError::InvalidPattern {
                pattern: source.to_string(),
                source: error,
            })?;

        Ok(Pattern::Regexp(RegexpPattern {
            source: source.to_string(),
            flags: flags.to_string(),
            compiled,
        }))
    }

    pub fn matches(&self, selector: &str) -> bool {
        match self {
            Pattern::Literal(value) => value == selector,
            Pattern::Regexp(re) => re.compiled.is_match(selector),
        }
    }
}

fn unsupported(source: &str, flag: char) -> CritselError {
    CritselError::UnsupportedFlag {
        pattern: source.to_string(),
        flag,
    }
}

/// True if any pattern matches the selector.
pub fn matches_any(selector: &str, patterns: &[Pattern]) -> bool {
    patterns.iter().any(|pattern| pattern.matches(selector))
}
