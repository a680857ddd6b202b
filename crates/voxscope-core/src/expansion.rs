//! The expansion algebra: the right-hand-side tree of a grammar rule.
//!
//! An [`Expansion`] is a tagged tree with roughly ten construct kinds —
//! literals, sequencing, alternation, grouping, repetition, rule references,
//! and free-form dictation slots. Compilation ([`crate::compile_expansion`])
//! and matching ([`crate::rule::Rule::matches`]) are single recursive
//! functions over [`ExpansionKind`], so variant coverage is checked by the
//! compiler rather than spread across virtual methods.
//!
//! Parent links are never stored. Traversals that need ancestor context
//! (dictation placement validation, the matcher's look-ahead reserve) pass it
//! down the recursion instead, which keeps the tree free of reference cycles.

use crate::error::{validate_rule_name, GrammarError};
use crate::rule::{Rule, RuleData};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// One node of a rule's right-hand-side tree.
///
/// Every node carries its construct kind plus an optional JSGF tag. Tags are
/// preserved syntactically in compile output; no tag semantics are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Expansion {
    kind: ExpansionKind,
    tag: Option<String>,
}

/// The construct kinds an expansion node can take.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpansionKind {
    /// A fixed, whitespace-normalised lowercase token sequence.
    Literal(Vec<String>),
    /// Children matched left to right.
    Sequence(Vec<Expansion>),
    /// First matching child wins.
    AlternativeSet(Vec<Expansion>),
    /// Sequence semantics, parenthesised when compiled.
    RequiredGrouping(Vec<Expansion>),
    /// The child or nothing; compiled as `[…]`.
    OptionalGrouping(Box<Expansion>),
    /// One or more repetitions; compiled as `…+`.
    Repeat(Box<Expansion>),
    /// Zero or more repetitions; compiled as `…*`.
    KleeneStar(Box<Expansion>),
    /// A resolved reference to another rule.
    RuleRef(RuleRef),
    /// An unresolved reference, linked up at grammar insertion time.
    NamedRuleRef(String),
    /// A slot matching any non-empty word sequence; empty compile.
    Dictation,
}

/// A weak, name-carrying reference to another rule.
///
/// The referenced rule is held by `Weak` handle: the reference never keeps a
/// rule alive and never forms an ownership cycle. Equality compares the
/// referenced name only.
#[derive(Debug, Clone)]
pub struct RuleRef {
    name: String,
    target: Weak<RefCell<RuleData>>,
}

impl RuleRef {
    /// Creates a reference to `rule`.
    pub fn new(rule: &Rule) -> Self {
        Self {
            name: rule.name(),
            target: rule.downgrade(),
        }
    }

    pub(crate) fn from_parts(name: String, target: Weak<RefCell<RuleData>>) -> Self {
        Self { name, target }
    }

    /// Name of the referenced rule.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Upgrades the weak handle, if the referenced rule is still alive.
    pub(crate) fn target(&self) -> Option<Rc<RefCell<RuleData>>> {
        self.target.upgrade()
    }
}

impl PartialEq for RuleRef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// Conversion into an expansion, promoting bare strings to literals.
///
/// Implemented for `&str` and `String` (literal promotion with whitespace
/// normalisation; empty text fails) and for [`Expansion`] itself, so
/// constructors accept either form.
pub trait IntoExpansion {
    /// Performs the conversion.
    fn into_expansion(self) -> Result<Expansion, GrammarError>;
}

impl IntoExpansion for Expansion {
    fn into_expansion(self) -> Result<Expansion, GrammarError> {
        Ok(self)
    }
}

impl IntoExpansion for &Expansion {
    fn into_expansion(self) -> Result<Expansion, GrammarError> {
        Ok(self.clone())
    }
}

impl IntoExpansion for &str {
    fn into_expansion(self) -> Result<Expansion, GrammarError> {
        Expansion::literal(self)
    }
}

impl IntoExpansion for String {
    fn into_expansion(self) -> Result<Expansion, GrammarError> {
        Expansion::literal(&self)
    }
}

/// Lowercases and whitespace-normalises `text` into tokens.
pub(crate) fn normalize_words(text: &str) -> Vec<String> {
    text.split_whitespace().map(|word| word.to_lowercase()).collect()
}

impl Expansion {
    fn from_kind(kind: ExpansionKind) -> Self {
        Self { kind, tag: None }
    }

    /// A literal token sequence. Whitespace runs collapse to single spaces;
    /// text that is empty after normalisation is rejected.
    pub fn literal(text: impl AsRef<str>) -> Result<Self, GrammarError> {
        let words = normalize_words(text.as_ref());
        if words.is_empty() {
            return Err(GrammarError::EmptyLiteral);
        }
        Ok(Self::from_kind(ExpansionKind::Literal(words)))
    }

    /// Children matched in order, left to right.
    pub fn sequence<I>(children: I) -> Result<Self, GrammarError>
    where
        I: IntoIterator,
        I::Item: IntoExpansion,
    {
        Ok(Self::from_kind(ExpansionKind::Sequence(collect_children(children)?)))
    }

    /// Alternation: the first child that matches wins.
    pub fn alternative_set<I>(children: I) -> Result<Self, GrammarError>
    where
        I: IntoIterator,
        I::Item: IntoExpansion,
    {
        Ok(Self::from_kind(ExpansionKind::AlternativeSet(collect_children(children)?)))
    }

    /// Sequence semantics, wrapped in parentheses when compiled.
    pub fn required_grouping<I>(children: I) -> Result<Self, GrammarError>
    where
        I: IntoIterator,
        I::Item: IntoExpansion,
    {
        Ok(Self::from_kind(ExpansionKind::RequiredGrouping(collect_children(children)?)))
    }

    /// The child or the empty string.
    pub fn optional(child: impl IntoExpansion) -> Result<Self, GrammarError> {
        Ok(Self::from_kind(ExpansionKind::OptionalGrouping(Box::new(
            child.into_expansion()?,
        ))))
    }

    /// One or more repetitions of the child.
    pub fn repeat(child: impl IntoExpansion) -> Result<Self, GrammarError> {
        Ok(Self::from_kind(ExpansionKind::Repeat(Box::new(child.into_expansion()?))))
    }

    /// Zero or more repetitions of the child.
    pub fn kleene_star(child: impl IntoExpansion) -> Result<Self, GrammarError> {
        Ok(Self::from_kind(ExpansionKind::KleeneStar(Box::new(
            child.into_expansion()?,
        ))))
    }

    /// A reference to `rule`, carried weakly.
    pub fn rule_ref(rule: &Rule) -> Self {
        Self::from_kind(ExpansionKind::RuleRef(RuleRef::new(rule)))
    }

    /// A by-name reference, resolved when the holding rule joins a grammar.
    pub fn named_rule_ref(name: impl Into<String>) -> Result<Self, GrammarError> {
        let name = name.into();
        validate_rule_name(&name)?;
        Ok(Self::from_kind(ExpansionKind::NamedRuleRef(name)))
    }

    /// A free-form dictation slot.
    pub fn dictation() -> Self {
        Self::from_kind(ExpansionKind::Dictation)
    }

    /// Attaches a JSGF tag, replacing any existing one.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// The node's tag, if any.
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// The node's construct kind.
    pub fn kind(&self) -> &ExpansionKind {
        &self.kind
    }

    pub(crate) fn kind_mut(&mut self) -> &mut ExpansionKind {
        &mut self.kind
    }

    /// The node's ordered children (empty for leaves).
    pub fn children(&self) -> &[Expansion] {
        match &self.kind {
            ExpansionKind::Sequence(children)
            | ExpansionKind::AlternativeSet(children)
            | ExpansionKind::RequiredGrouping(children) => children,
            ExpansionKind::OptionalGrouping(child)
            | ExpansionKind::Repeat(child)
            | ExpansionKind::KleeneStar(child) => std::slice::from_ref(&**child),
            _ => &[],
        }
    }

    /// Pre-order visit of this node and all descendants.
    pub fn walk(&self, f: &mut dyn FnMut(&Expansion)) {
        f(self);
        for child in self.children() {
            child.walk(f);
        }
    }

    /// Post-order visit of this node and all descendants.
    pub fn walk_post(&self, f: &mut dyn FnMut(&Expansion)) {
        for child in self.children() {
            child.walk_post(f);
        }
        f(self);
    }

    pub(crate) fn walk_mut(&mut self, f: &mut dyn FnMut(&mut Expansion)) {
        f(self);
        match &mut self.kind {
            ExpansionKind::Sequence(children)
            | ExpansionKind::AlternativeSet(children)
            | ExpansionKind::RequiredGrouping(children) => {
                for child in children {
                    child.walk_mut(f);
                }
            }
            ExpansionKind::OptionalGrouping(child)
            | ExpansionKind::Repeat(child)
            | ExpansionKind::KleeneStar(child) => child.walk_mut(f),
            _ => {}
        }
    }

    /// The first node (pre-order) satisfying `predicate`.
    pub fn find_first(&self, predicate: &dyn Fn(&Expansion) -> bool) -> Option<&Expansion> {
        if predicate(self) {
            return Some(self);
        }
        self.children().iter().find_map(|child| child.find_first(predicate))
    }

    /// All nodes (pre-order) satisfying `predicate`.
    pub fn collect_matching(&self, predicate: &dyn Fn(&Expansion) -> bool) -> Vec<&Expansion> {
        let mut found = Vec::new();
        collect_into(self, predicate, &mut found);
        found
    }

    /// True when any descendant (or this node) is a dictation slot.
    pub fn contains_dictation(&self) -> bool {
        self.find_first(&|node| matches!(node.kind, ExpansionKind::Dictation))
            .is_some()
    }

    /// True when no descendant (nor this node) is a dictation slot.
    pub fn is_dictation_free(&self) -> bool {
        !self.contains_dictation()
    }

    /// True when the tree has at least one dictation leaf and no other kind
    /// of leaf (literal or rule reference).
    pub(crate) fn is_dictation_only(&self) -> bool {
        let mut has_dictation = false;
        let mut has_other_leaf = false;
        self.walk(&mut |node| match node.kind {
            ExpansionKind::Dictation => has_dictation = true,
            ExpansionKind::Literal(_)
            | ExpansionKind::RuleRef(_)
            | ExpansionKind::NamedRuleRef(_) => has_other_leaf = true,
            _ => {}
        });
        has_dictation && !has_other_leaf
    }
}

fn collect_children<I>(children: I) -> Result<Vec<Expansion>, GrammarError>
where
    I: IntoIterator,
    I::Item: IntoExpansion,
{
    children
        .into_iter()
        .map(IntoExpansion::into_expansion)
        .collect()
}

fn collect_into<'a>(
    node: &'a Expansion,
    predicate: &dyn Fn(&Expansion) -> bool,
    found: &mut Vec<&'a Expansion>,
) {
    if predicate(node) {
        found.push(node);
    }
    for child in node.children() {
        collect_into(child, predicate, found);
    }
}
