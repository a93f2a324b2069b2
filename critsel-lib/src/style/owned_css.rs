/// Stable index of a node inside a [`SelectorArena`].
///
/// Two selectors with identical text still get distinct ids, so the id is
/// what identifies "this selector in this rule".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn from_index(index: usize) -> Self {
        NodeId(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
enum SelectorNode {
    /// One complex selector, stored in its canonical rendering.
    Selector(String),
    /// A comma separated selector list.
    List(Vec<NodeId>),
}

/// Owns every selector node of one stylesheet.
#[derive(Debug, Default, Clone)]
pub struct SelectorArena {
    nodes: Vec<SelectorNode>,
}

impl SelectorArena {
    pub fn new() -> Self {
        SelectorArena { nodes: Vec::new() }
    }

    pub fn alloc_selector(&mut self, text: impl Into<String>) -> NodeId {
        self.push(SelectorNode::Selector(text.into()))
    }

    pub fn alloc_list(&mut self, children: Vec<NodeId>) -> NodeId {
        self.push(SelectorNode::List(children))
    }

    fn push(&mut self, node: SelectorNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Render a node back to selector text. Lists are joined with `", "`.
    ///
    /// # Panics
    /// Panics if `id` was allocated by a different arena and is out of range.
    pub fn render(&self, id: NodeId) -> String {
        match &self.nodes[id.0] {
            SelectorNode::Selector(text) => text.clone(),
            SelectorNode::List(children) => children
                .iter()
                .map(|child| self.render(*child))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// Children of a selector list; a single selector has none.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match &self.nodes[id.0] {
            SelectorNode::List(children) => children,
            SelectorNode::Selector(_) => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A fully-owned stylesheet: the selector arena plus the rule tree pointing into it.
#[derive(Debug, Default)]
pub struct OwnedStylesheet {
    pub arena: SelectorArena,
    pub rules: Vec<OwnedRule>,
}

#[derive(Debug, Clone)]
pub enum OwnedRule {
    Style(OwnedStyleRule),
    /// A block at-rule such as `@media` or `@keyframes`, with its nested rules.
    AtRule { name: String, rules: Vec<OwnedRule> },
}

#[derive(Debug, Clone)]
pub struct OwnedStyleRule {
    pub prelude: Prelude,
    /// Declared property names, e.g. "color", "grid-area".
    pub declarations: Vec<OwnedDeclaration>,
}

impl OwnedStyleRule {
    pub fn has_property(&self, property: &str) -> bool {
        self.declarations.iter().any(|decl| decl.property == property)
    }
}

/// What sits in front of a rule's declaration block.
#[derive(Debug, Clone)]
pub enum Prelude {
    SelectorList(NodeId),
    /// Text the parser could not turn into a selector list.
    Malformed(String),
}

#[derive(Debug, Clone)]
pub struct OwnedDeclaration {
    pub property: String,
}

impl OwnedDeclaration {
    pub fn new(property: impl Into<String>) -> Self {
        OwnedDeclaration {
            property: property.into(),
        }
    }
}

/// Lowercase an at-rule name and drop its vendor prefix, so
/// `-WebKit-Keyframes` and `keyframes` compare equal.
pub fn at_rule_basename(name: &str) -> String {
    let lower = name.to_ascii_lowercase();
    if lower.starts_with('-') && !lower.starts_with("--") {
        if let Some(pos) = lower[1..].find('-') {
            return lower[pos + 2..].to_string();
        }
    }
    lower
}

/// Builds an [`OwnedStylesheet`] by hand, assigning arena ids as rules are added.
#[derive(Debug, Default)]
pub struct StylesheetBuilder {
    arena: SelectorArena,
    rules: Vec<OwnedRule>,
}

impl StylesheetBuilder {
    pub fn new() -> Self {
        StylesheetBuilder::default()
    }

    pub fn style_rule(mut self, selectors: &[&str], declarations: &[&str]) -> Self {
        let rule = Self::make_style_rule(&mut self.arena, selectors, declarations);
        self.rules.push(rule);
        self
    }

    pub fn malformed_rule(mut self, prelude: &str, declarations: &[&str]) -> Self {
        self.rules.push(OwnedRule::Style(OwnedStyleRule {
            prelude: Prelude::Malformed(prelude.to_string()),
            declarations: Self::make_declarations(declarations),
        }));
        self
    }

    /// Add a block at-rule; `body` fills in its nested rules.
    pub fn at_rule(mut self, name: &str, body: impl FnOnce(StylesheetBuilder) -> StylesheetBuilder) -> Self {
        let nested = body(StylesheetBuilder {
            arena: std::mem::take(&mut self.arena),
            rules: Vec::new(),
        });
        self.arena = nested.arena;
        self.rules.push(OwnedRule::AtRule {
            name: name.to_string(),
            rules: nested.rules,
        });
        self
    }

    pub fn build(self) -> OwnedStylesheet {
        OwnedStylesheet {
            arena: self.arena,
            rules: self.rules,
        }
    }

    fn make_style_rule(arena: &mut SelectorArena, selectors: &[&str], declarations: &[&str]) -> OwnedRule {
        let children = selectors.iter().map(|sel| arena.alloc_selector(*sel)).collect();
        OwnedRule::Style(OwnedStyleRule {
            prelude: Prelude::SelectorList(arena.alloc_list(children)),
            declarations: Self::make_declarations(declarations),
        })
    }

    fn make_declarations(declarations: &[&str]) -> Vec<OwnedDeclaration> {
        declarations
            .iter()
            .map(|property| OwnedDeclaration::new(*property))
            .collect()
    }
}
