use crate::error::{CritselError, Result};
use crate::style::owned_css::{
    OwnedDeclaration, OwnedRule, OwnedStyleRule, OwnedStylesheet, Prelude, SelectorArena,
};
use lightningcss::declaration::DeclarationBlock;
use lightningcss::printer::PrinterOptions;
use lightningcss::rules::keyframes::KeyframesRule;
use lightningcss::rules::{style::StyleRule, CssRule};
use lightningcss::selector::SelectorList;
use lightningcss::stylesheet::{ParserOptions, StyleSheet as LightningStyleSheet};
use lightningcss::traits::ToCss;
use lightningcss::vendor_prefix::VendorPrefix;
use log::debug;

/// Parse a raw CSS string (LightningCSS) and convert it to a fully-owned stylesheet.
///
/// Invalid rules are dropped by the parser's error recovery instead of failing
/// the whole sheet; only unrecoverable input yields [`CritselError::Parse`].
pub fn parse_stylesheet(css_text: &str) -> Result<OwnedStylesheet> {
    let parser_opts = ParserOptions {
        error_recovery: true,
        ..ParserOptions::default()
    };
    let sheet = LightningStyleSheet::parse(css_text, parser_opts)
        .map_err(|e| CritselError::Parse(e.to_string()))?;

    let mut arena = SelectorArena::new();
    let rules = convert_rules(&mut arena, &sheet.rules.0, &[]);
    Ok(OwnedStylesheet { arena, rules })
}

/// `parents` are the resolved selectors of the enclosing style rule (or the
/// `@scope` root); nested selectors are resolved against them.
fn convert_rules(arena: &mut SelectorArena, rules: &[CssRule<'_>], parents: &[String]) -> Vec<OwnedRule> {
    let mut owned_rules = Vec::new();
    for rule in rules {
        match rule {
            CssRule::Style(style_rule) => convert_style_rule(arena, style_rule, parents, &mut owned_rules),
            CssRule::Nesting(nesting_rule) => {
                convert_style_rule(arena, &nesting_rule.style, parents, &mut owned_rules)
            }
            CssRule::Media(media_rule) => owned_rules.push(OwnedRule::AtRule {
                name: "media".to_string(),
                rules: convert_rules(arena, &media_rule.rules.0, parents),
            }),
            CssRule::Supports(supports_rule) => owned_rules.push(OwnedRule::AtRule {
                name: "supports".to_string(),
                rules: convert_rules(arena, &supports_rule.rules.0, parents),
            }),
            CssRule::LayerBlock(layer_rule) => owned_rules.push(OwnedRule::AtRule {
                name: "layer".to_string(),
                rules: convert_rules(arena, &layer_rule.rules.0, parents),
            }),
            CssRule::Container(container_rule) => owned_rules.push(OwnedRule::AtRule {
                name: "container".to_string(),
                rules: convert_rules(arena, &container_rule.rules.0, parents),
            }),
            CssRule::StartingStyle(starting_style_rule) => owned_rules.push(OwnedRule::AtRule {
                name: "starting-style".to_string(),
                rules: convert_rules(arena, &starting_style_rule.rules.0, parents),
            }),
            CssRule::MozDocument(document_rule) => owned_rules.push(OwnedRule::AtRule {
                name: "-moz-document".to_string(),
                rules: convert_rules(arena, &document_rule.rules.0, parents),
            }),
            CssRule::Scope(scope_rule) => {
                let scope_root = match &scope_rule.scope_start {
                    Some(start) => resolve_selectors(&render_selectors(start), parents),
                    None => parents.to_vec(),
                };
                owned_rules.push(OwnedRule::AtRule {
                    name: "scope".to_string(),
                    rules: convert_rules(arena, &scope_rule.rules.0, &scope_root),
                })
            }
            CssRule::Keyframes(keyframes_rule) => {
                owned_rules.push(convert_keyframes_rule(arena, keyframes_rule))
            }
            // @font-face, @import, @page and friends carry no selectors.
            _ => debug!("skipping rule without selectors"),
        }
    }
    owned_rules
}

/// Every selector of `list`, or none at all if any of them fails to print.
fn render_selectors(list: &SelectorList<'_>) -> Vec<String> {
    let mut rendered = Vec::new();
    for selector in &list.0 {
        match selector.to_css_string(PrinterOptions::default()) {
            Ok(sel_str) => rendered.push(sel_str),
            Err(err) => {
                debug!("selector failed to print: {}", err);
                return Vec::new();
            }
        }
    }
    rendered
}

/// Copy a single StyleRule's selectors + declarations into an OwnedStyleRule.
/// Nested style rules are flattened right after their parent, with their
/// selectors resolved against the parent's.
fn convert_style_rule(
    arena: &mut SelectorArena,
    style_rule: &StyleRule<'_>,
    parents: &[String],
    out: &mut Vec<OwnedRule>,
) {
    let resolved = resolve_selectors(&render_selectors(&style_rule.selectors), parents);

    let prelude = if resolved.is_empty() {
        // Fall back to whatever printing the whole list gives us, for diagnostics only.
        Prelude::Malformed(
            style_rule
                .selectors
                .to_css_string(PrinterOptions::default())
                .unwrap_or_default(),
        )
    } else {
        let children = resolved.iter().map(|text| arena.alloc_selector(text.as_str())).collect();
        Prelude::SelectorList(arena.alloc_list(children))
    };

    out.push(OwnedRule::Style(OwnedStyleRule {
        prelude,
        declarations: convert_declarations(&style_rule.declarations),
    }));

    out.extend(convert_rules(arena, &style_rule.rules.0, &resolved));
}

/// Resolve nested selectors against their parents: each `&` becomes the
/// parent selector, a selector without `&` becomes a descendant of it. With
/// several parents every combination is produced.
fn resolve_selectors(selectors: &[String], parents: &[String]) -> Vec<String> {
    if parents.is_empty() {
        return selectors.to_vec();
    }
    selectors
        .iter()
        .flat_map(|selector| {
            parents.iter().map(move |parent| {
                substitute_nesting(selector, parent).unwrap_or_else(|| format!("{parent} {selector}"))
            })
        })
        .collect()
}

/// Replace every unescaped `&` outside strings with `parent`; `None` if there was none.
fn substitute_nesting(selector: &str, parent: &str) -> Option<String> {
    let mut out = String::with_capacity(selector.len() + parent.len());
    let mut found = false;
    let mut quote: Option<char> = None;
    let mut chars = selector.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                out.push(ch);
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            '"' | '\'' if quote.is_none() => {
                quote = Some(ch);
                out.push(ch);
            }
            c if Some(c) == quote => {
                quote = None;
                out.push(c);
            }
            '&' if quote.is_none() => {
                found = true;
                out.push_str(parent);
            }
            _ => out.push(ch),
        }
    }

    found.then_some(out)
}

/// `@keyframes` becomes an at-rule whose children are the keyframe blocks,
/// with `from` / `50%` / `to` as their selectors.
fn convert_keyframes_rule(arena: &mut SelectorArena, keyframes_rule: &KeyframesRule<'_>) -> OwnedRule {
    let mut rules = Vec::new();
    for keyframe in &keyframes_rule.keyframes {
        let children = keyframe
            .selectors
            .iter()
            .filter_map(|sel| sel.to_css_string(PrinterOptions::default()).ok())
            .map(|text| arena.alloc_selector(text))
            .collect();
        rules.push(OwnedRule::Style(OwnedStyleRule {
            prelude: Prelude::SelectorList(arena.alloc_list(children)),
            declarations: convert_declarations(&keyframe.declarations),
        }));
    }

    OwnedRule::AtRule {
        name: format!("{}keyframes", vendor_prefix_str(keyframes_rule.vendor_prefix)),
        rules,
    }
}

fn vendor_prefix_str(prefix: VendorPrefix) -> &'static str {
    if prefix.contains(VendorPrefix::WebKit) {
        "-webkit-"
    } else if prefix.contains(VendorPrefix::Moz) {
        "-moz-"
    } else if prefix.contains(VendorPrefix::Ms) {
        "-ms-"
    } else if prefix.contains(VendorPrefix::O) {
        "-o-"
    } else {
        ""
    }
}

/// Normal and `!important` declarations, in that order.
fn convert_declarations(block: &DeclarationBlock<'_>) -> Vec<OwnedDeclaration> {
    block
        .declarations
        .iter()
        .chain(block.important_declarations.iter())
        .map(|property| OwnedDeclaration::new(property.property_id().name()))
        .collect()
}
