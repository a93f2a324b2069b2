//! Selector normalization.
//!
//! Many selectors can't be matched against anything on the page: pseudo
//! elements have no DOM node and vendor pseudo classes are engine specific.
//! Normalization either settles such a selector outright or rewrites it into
//! a simpler selector whose element can be looked up in the critical viewport.

use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use crate::selectors::pattern::{matches_any, Pattern};
use crate::style::owned_css::{NodeId, SelectorArena};

/// Pseudo selectors that hang off an element we can still test for.
/// `:hover`, `:focus` and `:active` would belong here too if interaction
/// states counted as critical, which they don't.
const PSEUDO_SELECTORS_TO_KEEP: &[&str] = &[":before", ":after", ":visited", ":first-letter", ":first-line"];

static SELECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":?:(-moz-)?selection").expect("valid selection regex"));

// One or two colons for each entry; every occurrence gets removed.
static PSEUDO_TO_KEEP_RE: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives = PSEUDO_SELECTORS_TO_KEEP
        .iter()
        .map(|pseudo| format!(":?{pseudo}"))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&alternatives).expect("valid pseudo selector regex")
});

static ANY_PSEUDO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":[:]?[a-zA-Z0-9\-_]*").expect("valid pseudo token regex"));

/// Outcome of normalizing one selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Always kept, never tested on the page.
    ForceKeep,
    /// Always removed, never tested on the page.
    ForceDrop,
    /// Kept only if an element matching this selector is visible.
    Testable(String),
}

impl Classification {
    /// The settled decision, or `None` if the selector still needs testing.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Classification::ForceKeep => Some(true),
            Classification::ForceDrop => Some(false),
            Classification::Testable(_) => None,
        }
    }

    pub fn as_testable(&self) -> Option<&str> {
        match self {
            Classification::Testable(selector) => Some(selector),
            _ => None,
        }
    }
}

/// Normalize a selector node of `arena`.
pub fn normalize_selector(
    arena: &SelectorArena,
    node: NodeId,
    force_include: Option<&[Pattern]>,
    force_exclude: Option<&[Pattern]>,
) -> Classification {
    normalize_selector_text(&arena.render(node), force_include, force_exclude)
}

/// Normalize an already rendered selector.
///
/// Force patterns see the trimmed text before any pseudo selector rewriting.
pub fn normalize_selector_text(
    selector: &str,
    force_include: Option<&[Pattern]>,
    force_exclude: Option<&[Pattern]>,
) -> Classification {
    let modified = selector.trim();

    if force_include.is_some_and(|patterns| matches_any(modified, patterns)) {
        debug!("forceInclude {}", modified);
        return Classification::ForceKeep;
    }

    if force_exclude.is_some_and(|patterns| matches_any(modified, patterns)) {
        debug!("forceExclude {}", modified);
        return Classification::ForceDrop;
    }

    if !modified.contains(':') {
        return Classification::Testable(modified.to_string());
    }

    normalize_pseudo_selector(modified)
}

fn normalize_pseudo_selector(selector: &str) -> Classification {
    if SELECTION_RE.is_match(selector) {
        debug!("dropping selection selector {}", selector);
        return Classification::ForceDrop;
    }

    // Test for the element the pseudo selector attaches to instead.
    let stripped = PSEUDO_TO_KEEP_RE.replace_all(selector, "");

    // Purely pseudo (e.g. `::-moz-placeholder`): nothing on the page to match,
    // but it can still style above the fold content.
    if ANY_PSEUDO_RE.replace_all(&stripped, "").trim().is_empty() {
        debug!("keeping pure pseudo selector {}", selector);
        return Classification::ForceKeep;
    }

    // button::-moz-focus-inner, input[type=number]::-webkit-inner-spin-button
    Classification::Testable(strip_vendor_pseudos(&stripped))
}

/// Remove every `:?:-[a-z-]*` token whose leading colon isn't escaped.
fn strip_vendor_pseudos(selector: &str) -> String {
    let bytes = selector.as_bytes();
    let mut out = String::with_capacity(selector.len());
    let mut copied_to = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b':' && (i == 0 || bytes[i - 1] != b'\\') {
            if let Some(end) = vendor_pseudo_end(bytes, i) {
                out.push_str(&selector[copied_to..i]);
                copied_to = end;
                i = end;
                continue;
            }
        }
        i += 1;
    }

    out.push_str(&selector[copied_to..]);
    out
}

/// End of a vendor pseudo token starting at the colon at `start`, if there is one.
fn vendor_pseudo_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut pos = start + 1;
    if bytes.get(pos) == Some(&b':') {
        pos += 1;
    }
    if bytes.get(pos) != Some(&b'-') {
        return None;
    }
    pos += 1;
    while matches!(bytes.get(pos), Some(b'a'..=b'z' | b'-')) {
        pos += 1;
    }
    Some(pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(selector: &str) -> Classification {
        normalize_selector_text(selector, None, None)
    }

    fn testable(selector: &str) -> Classification {
        Classification::Testable(selector.to_string())
    }

    #[test]
    fn test_plain_selectors_are_trimmed_only() {
        assert_eq!(normalize("  .nav > li a  "), testable(".nav > li a"));
        assert_eq!(normalize("input[type=number]"), testable("input[type=number]"));
    }

    #[test]
    fn test_selection_is_dropped() {
        for selector in ["::selection", ":selection", "::-moz-selection", ":-moz-selection", "p::selection"] {
            assert_eq!(normalize(selector), Classification::ForceDrop, "{selector}");
        }
    }

    #[test]
    fn test_allow_listed_pseudos_are_stripped() {
        for selector in [
            "a:before",
            "a:after",
            "a:visited",
            "a:first-letter",
            "a:first-line",
            "a::before",
            "a::first-line",
        ] {
            assert_eq!(normalize(selector), testable("a"), "{selector}");
        }
        assert_eq!(normalize(".clearfix:before:after"), testable(".clearfix"));
    }

    #[test]
    fn test_pure_pseudo_is_kept() {
        assert_eq!(normalize("::-moz-placeholder"), Classification::ForceKeep);
        assert_eq!(normalize(":root"), Classification::ForceKeep);
        assert_eq!(normalize("::before"), Classification::ForceKeep);
    }

    #[test]
    fn test_vendor_pseudos_are_stripped() {
        assert_eq!(
            normalize("input[type=number]::-webkit-inner-spin-button"),
            testable("input[type=number]")
        );
        assert_eq!(normalize("button::-moz-focus-inner"), testable("button"));
        assert_eq!(normalize("input:-ms-input-placeholder"), testable("input"));
    }

    #[test]
    fn test_allow_list_strip_runs_before_vendor_strip() {
        assert_eq!(normalize("a::-webkit-scrollbar:after"), testable("a"));
    }

    #[test]
    fn test_escaped_colon_is_not_a_vendor_pseudo() {
        assert_eq!(normalize(r".w\:-full:hover"), testable(r".w\:-full:hover"));
        assert_eq!(normalize(r".sm\:-mt-2::-webkit-scrollbar"), testable(r".sm\:-mt-2"));
    }

    #[test]
    fn test_interaction_states_pass_through() {
        assert_eq!(normalize("a:hover"), testable("a:hover"));
        assert_eq!(normalize("button:focus"), testable("button:focus"));
    }

    #[test]
    fn test_force_include_wins_over_everything() {
        let include = [Pattern::literal("::selection")];
        let exclude = [Pattern::literal("::selection")];
        assert_eq!(
            normalize_selector_text("::selection", Some(&include[..]), Some(&exclude[..])),
            Classification::ForceKeep
        );
    }

    #[test]
    fn test_force_exclude_sees_unstripped_text() {
        let exclude = [Pattern::regexp(":before$", "").unwrap()];
        assert_eq!(
            normalize_selector_text(" a:before ", None, Some(&exclude[..])),
            Classification::ForceDrop
        );
        assert_eq!(normalize_selector_text("a", None, Some(&exclude[..])), testable("a"));
    }

    #[test]
    fn test_normalized_output_has_no_known_pseudos_left() {
        for selector in [
            "a:before",
            "input::-webkit-outer-spin-button",
            ".x:first-letter::-moz-thing",
            "ul li:visited",
        ] {
            let Classification::Testable(out) = normalize(selector) else {
                panic!("{selector} should be testable");
            };
            assert!(!PSEUDO_TO_KEEP_RE.is_match(&out), "{out}");
            assert_eq!(strip_vendor_pseudos(&out), out);
        }
    }

    #[test]
    fn test_normalize_selector_renders_node() {
        let mut arena = SelectorArena::new();
        let node = arena.alloc_selector("a:after");
        assert_eq!(normalize_selector(&arena, node, None, None), testable("a"));
    }

    #[test]
    fn test_classification_accessors() {
        assert_eq!(Classification::ForceKeep.as_bool(), Some(true));
        assert_eq!(Classification::ForceDrop.as_bool(), Some(false));
        assert_eq!(testable("a").as_bool(), None);
        assert_eq!(testable("a").as_testable(), Some("a"));
        assert_eq!(Classification::ForceKeep.as_testable(), None);
    }
}
