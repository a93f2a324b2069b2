//! Selector profile: one pass over a stylesheet classifying every selector.

use std::collections::HashSet;

use log::debug;

use crate::error::Result;
use crate::selectors::normalize::{normalize_selector, Classification};
use crate::selectors::pattern::Pattern;
use crate::style::owned_css::{at_rule_basename, NodeId, OwnedRule, OwnedStyleRule, OwnedStylesheet, Prelude};
use crate::style::sheet_css::parse_stylesheet;

/// Result of profiling one stylesheet.
///
/// `selectors` holds each testable string once, in first-seen order.
/// The classification table is indexed by the arena id of the selector
/// node (or of the whole selector list, for `grid-area` rules).
#[derive(Debug, Default)]
pub struct SelectorProfile {
    selectors: Vec<String>,
    classifications: Vec<Option<Classification>>,
}

/// Counts over a profile's classification table.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProfileSummary {
    pub force_kept: usize,
    pub force_dropped: usize,
    pub testable: usize,
    /// Distinct testable strings.
    pub distinct: usize,
}

impl SelectorProfile {
    fn with_capacity(nodes: usize) -> Self {
        SelectorProfile {
            selectors: Vec::new(),
            classifications: vec![None; nodes],
        }
    }

    fn record(&mut self, node: NodeId, classification: Classification, seen: &mut HashSet<String>) {
        if let Classification::Testable(selector) = &classification {
            if seen.insert(selector.clone()) {
                self.selectors.push(selector.clone());
            }
        }
        self.classifications[node.index()] = Some(classification);
    }

    /// Distinct selector strings to look for in the critical viewport.
    pub fn selectors(&self) -> &[String] {
        &self.selectors
    }

    pub fn classification(&self, node: NodeId) -> Option<&Classification> {
        self.classifications.get(node.index()).and_then(Option::as_ref)
    }

    pub fn classifications(&self) -> impl Iterator<Item = (NodeId, &Classification)> + '_ {
        self.classifications
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| entry.as_ref().map(|c| (NodeId::from_index(index), c)))
    }

    /// Number of classified nodes.
    pub fn len(&self) -> usize {
        self.classifications.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Final keep/drop decision for a node, given which testable selectors
    /// matched a visible element. `None` if the node was never classified.
    pub fn should_keep(&self, node: NodeId, is_visible: impl Fn(&str) -> bool) -> Option<bool> {
        self.classification(node).map(|c| match c {
            Classification::ForceKeep => true,
            Classification::ForceDrop => false,
            Classification::Testable(selector) => is_visible(selector),
        })
    }

    pub fn summary(&self) -> ProfileSummary {
        let mut summary = ProfileSummary {
            distinct: self.selectors.len(),
            ..ProfileSummary::default()
        };
        for (_, classification) in self.classifications() {
            match classification {
                Classification::ForceKeep => summary.force_kept += 1,
                Classification::ForceDrop => summary.force_dropped += 1,
                Classification::Testable(_) => summary.testable += 1,
            }
        }
        summary
    }
}

/// Build the selector profile of `sheet`.
pub fn build_selector_profile(
    sheet: &OwnedStylesheet,
    force_include: Option<&[Pattern]>,
    force_exclude: Option<&[Pattern]>,
) -> SelectorProfile {
    debug!("buildSelectorProfile START");
    let mut builder = ProfileBuilder {
        sheet,
        force_include,
        force_exclude,
        profile: SelectorProfile::with_capacity(sheet.arena.len()),
        seen: HashSet::new(),
    };
    builder.visit_rules(&sheet.rules, None);
    debug!("buildSelectorProfile DONE");
    builder.profile
}

struct ProfileBuilder<'a> {
    sheet: &'a OwnedStylesheet,
    force_include: Option<&'a [Pattern]>,
    force_exclude: Option<&'a [Pattern]>,
    profile: SelectorProfile,
    seen: HashSet<String>,
}

impl ProfileBuilder<'_> {
    /// `at_rule` is the name of the nearest enclosing at-rule.
    fn visit_rules(&mut self, rules: &[OwnedRule], at_rule: Option<&str>) {
        for rule in rules {
            match rule {
                OwnedRule::Style(style_rule) => self.visit_style_rule(style_rule, at_rule),
                OwnedRule::AtRule { name, rules } => self.visit_rules(rules, Some(name.as_str())),
            }
        }
    }

    fn visit_style_rule(&mut self, rule: &OwnedStyleRule, at_rule: Option<&str>) {
        // Keyframe selectors (from, to, 50%) aren't page selectors.
        if at_rule.is_some_and(|name| at_rule_basename(name) == "keyframes") {
            return;
        }

        let list = match &rule.prelude {
            Prelude::SelectorList(list) => *list,
            Prelude::Malformed(raw) => {
                debug!("skipping rule with bad selector: {}", raw);
                return;
            }
        };

        // grid-area rules are tested as one unit, never split per selector.
        if rule.has_property("grid-area") {
            let rule_selector_list = self.sheet.arena.render(list);
            debug!("rule contains grid-area, keeping: {}", rule_selector_list);
            self.profile
                .record(list, Classification::Testable(rule_selector_list), &mut self.seen);
            return;
        }

        for &selector_node in self.sheet.arena.children(list) {
            let classification =
                normalize_selector(&self.sheet.arena, selector_node, self.force_include, self.force_exclude);
            self.profile.record(selector_node, classification, &mut self.seen);
        }
    }
}

/// Force patterns applied while profiling.
#[derive(Debug, Default, Clone)]
pub struct ProfileOptions {
    pub force_include: Option<Vec<Pattern>>,
    pub force_exclude: Option<Vec<Pattern>>,
}

impl ProfileOptions {
    pub fn profile(&self, sheet: &OwnedStylesheet) -> SelectorProfile {
        build_selector_profile(sheet, self.force_include.as_deref(), self.force_exclude.as_deref())
    }
}

/// Parse `css` and profile it in one go.
pub fn profile_css(css: &str, options: &ProfileOptions) -> Result<SelectorProfile> {
    let sheet = parse_stylesheet(css)?;
    Ok(options.profile(&sheet))
}
