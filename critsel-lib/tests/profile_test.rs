use critsel_lib::style::owned_css::{OwnedRule, OwnedStyleRule, Prelude};
use critsel_lib::{parse_stylesheet, profile_css, Classification, CritselError, Pattern, ProfileOptions};
use pretty_assertions::assert_eq;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn profile_selectors(css: &str) -> Vec<String> {
    init_logging();
    profile_css(css, &ProfileOptions::default())
        .expect("stylesheet should parse")
        .selectors()
        .to_vec()
}

#[test]
fn test_pseudo_elements_collapse_to_one_selector() {
    let css = r#"
        a:before { color: red; }
        a:after { color: red; }
    "#;
    assert_eq!(profile_selectors(css), vec!["a".to_string()]);
}

#[test]
fn test_keyframes_are_ignored() {
    init_logging();
    let css = r#"
        @keyframes spin {
            0% { transform: rotate(0deg); }
            100% { transform: rotate(360deg); }
        }
    "#;
    let profile = profile_css(css, &ProfileOptions::default()).unwrap();
    assert!(profile.is_empty());
    assert!(profile.selectors().is_empty());
}

#[test]
fn test_grid_area_rule_stays_whole() {
    assert_eq!(
        profile_selectors(".x, .y { grid-area: header; }"),
        vec![".x, .y".to_string()]
    );
}

#[test]
fn test_mixed_stylesheet() {
    let css = r#"
        html, body { margin: 0; }
        ::selection { background: yellow; }
        ::-moz-placeholder { color: gray; }
        input::-webkit-inner-spin-button { display: none; }
        a:hover { color: blue; }
        @media (min-width: 600px) {
            .sidebar { float: left; }
        }
    "#;
    assert_eq!(
        profile_selectors(css),
        vec![
            "html".to_string(),
            "body".to_string(),
            "input".to_string(),
            "a:hover".to_string(),
            ".sidebar".to_string(),
        ]
    );
}

#[test]
fn test_rules_inside_other_at_rules_are_profiled() {
    let css = r#"
        @starting-style { .fade { opacity: 0; } }
        @-moz-document url-prefix() { .moz { color: red; } }
        @layer base { .btn { color: red; } }
        @container (min-width: 400px) { .card-body { display: flex; } }
    "#;
    assert_eq!(
        profile_selectors(css),
        vec![
            ".fade".to_string(),
            ".moz".to_string(),
            ".btn".to_string(),
            ".card-body".to_string(),
        ]
    );
}

#[test]
fn test_scoped_rules_are_profiled() {
    let selectors = profile_selectors("@scope (.card) { .title { color: red; } }");
    assert_eq!(selectors.len(), 1);
    assert!(selectors[0].starts_with(".card"), "{}", selectors[0]);
    assert!(selectors[0].ends_with(".title"), "{}", selectors[0]);
}

#[test]
fn test_nested_rules_keep_their_parent_scope() {
    let css = r#"
        .nav, .menu {
            display: flex;
            & a:before { content: ""; }
        }
    "#;
    assert_eq!(
        profile_selectors(css),
        vec![
            ".nav".to_string(),
            ".menu".to_string(),
            ".nav a".to_string(),
            ".menu a".to_string(),
        ]
    );
}

#[test]
fn test_every_selector_node_is_classified_once() {
    init_logging();
    let css = r#"
        h1, ::selection, ::-moz-placeholder { color: red; }
        @keyframes fade { from { opacity: 0; } to { opacity: 1; } }
    "#;
    let sheet = parse_stylesheet(css).unwrap();
    let profile = ProfileOptions::default().profile(&sheet);

    let OwnedRule::Style(OwnedStyleRule {
        prelude: Prelude::SelectorList(list),
        ..
    }) = &sheet.rules[0]
    else {
        panic!("expected a style rule first");
    };
    let classes: Vec<_> = sheet
        .arena
        .children(*list)
        .iter()
        .map(|node| profile.classification(*node).cloned())
        .collect();

    assert_eq!(
        classes,
        vec![
            Some(Classification::Testable("h1".to_string())),
            Some(Classification::ForceDrop),
            Some(Classification::ForceKeep),
        ]
    );
    // The keyframe blocks are in the arena but never classified.
    assert_eq!(profile.len(), 3);
}

#[test]
fn test_force_include_and_exclude() {
    init_logging();
    let css = ".modal, .modal-open, .footer, ::selection { color: red; }";
    let options = ProfileOptions {
        force_include: Some(vec![Pattern::literal("::selection")]),
        force_exclude: Some(vec![Pattern::regexp(r"^\.modal", "").unwrap()]),
    };
    let profile = profile_css(css, &options).unwrap();

    assert_eq!(profile.selectors(), &[".footer".to_string()]);
    let summary = profile.summary();
    assert_eq!(summary.force_kept, 1);
    assert_eq!(summary.force_dropped, 2);
    assert_eq!(summary.testable, 1);
}

#[test]
fn test_invalid_force_pattern_is_reported() {
    let err = Pattern::regexp("[a-", "").unwrap_err();
    assert!(matches!(err, CritselError::InvalidPattern { .. }));
    assert!(err.to_string().contains("[a-"));
}
