//! Named grammar rules.
//!
//! A [`Rule`] is a cheap-to-clone shared handle: clones and
//! [`crate::expansion::RuleRef`]s all observe the same name, visibility, and
//! enabled state. That sharing is what makes `enable`/`disable` through a
//! grammar visible to every caller-held copy, and what lets a reference to a
//! disabled rule fail to match without the grammar re-walking its rules.

use crate::compile;
use crate::error::{validate_rule_name, GrammarError};
use crate::expansion::{Expansion, ExpansionKind, IntoExpansion};
use crate::matcher;
use crate::types::RuleMatch;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::{Rc, Weak};

#[derive(Debug)]
pub(crate) struct RuleData {
    pub(crate) name: String,
    pub(crate) visible: bool,
    pub(crate) active: bool,
    pub(crate) expansion: Expansion,
}

/// A named, typed (public or hidden), enable-able expansion holder.
#[derive(Debug, Clone)]
pub struct Rule {
    inner: Rc<RefCell<RuleData>>,
}

impl Rule {
    /// Creates a rule. `visible` selects public (exported entry point) or
    /// hidden (only reachable through references). Rules start enabled.
    pub fn new(
        name: impl Into<String>,
        visible: bool,
        expansion: impl IntoExpansion,
    ) -> Result<Self, GrammarError> {
        let name = name.into();
        validate_rule_name(&name)?;
        let expansion = expansion.into_expansion()?;
        Ok(Self {
            inner: Rc::new(RefCell::new(RuleData {
                name,
                visible,
                active: true,
                expansion,
            })),
        })
    }

    /// A public rule: exported to the recogniser as an entry point.
    pub fn public(name: impl Into<String>, expansion: impl IntoExpansion) -> Result<Self, GrammarError> {
        Self::new(name, true, expansion)
    }

    /// A hidden rule: reachable only via references from other rules.
    pub fn hidden(name: impl Into<String>, expansion: impl IntoExpansion) -> Result<Self, GrammarError> {
        Self::new(name, false, expansion)
    }

    /// The rule's name.
    pub fn name(&self) -> String {
        self.inner.borrow().name.clone()
    }

    /// True for public rules.
    pub fn is_visible(&self) -> bool {
        self.inner.borrow().visible
    }

    /// True while the rule is enabled.
    pub fn is_active(&self) -> bool {
        self.inner.borrow().active
    }

    /// Enables the rule. Idempotent.
    pub fn enable(&self) {
        self.set_active(true);
    }

    /// Disables the rule: it is suppressed in compile output (an empty line)
    /// and match lookups, but retained for reference. Idempotent.
    pub fn disable(&self) {
        self.set_active(false);
    }

    pub(crate) fn set_active(&self, active: bool) {
        self.inner.borrow_mut().active = active;
    }

    /// A structural copy of the rule's expansion tree.
    pub fn expansion(&self) -> Expansion {
        self.inner.borrow().expansion.clone()
    }

    pub(crate) fn with_data<R>(&self, f: impl FnOnce(&RuleData) -> R) -> R {
        f(&self.inner.borrow())
    }

    pub(crate) fn with_data_mut<R>(&self, f: impl FnOnce(&mut RuleData) -> R) -> R {
        f(&mut self.inner.borrow_mut())
    }

    pub(crate) fn downgrade(&self) -> Weak<RefCell<RuleData>> {
        Rc::downgrade(&self.inner)
    }

    pub(crate) fn same_handle(&self, other: &Rule) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// True when the whole of `speech` is producible by this rule.
    pub fn matches(&self, speech: &str) -> bool {
        self.find_match(speech).is_some()
    }

    /// Matches `speech` and returns the span trace, or `None` on failure.
    pub fn find_match(&self, speech: &str) -> Option<RuleMatch> {
        let data = self.inner.borrow();
        matcher::match_rule(&data.name, &data.expansion, speech)
    }

    /// The rule's canonical JSGF line, or the empty string while disabled.
    pub fn compile(&self) -> String {
        let data = self.inner.borrow();
        compile::compile_rule_parts(&data.name, data.visible, data.active, &data.expansion)
    }

    /// Names of all rules referenced transitively from this rule's
    /// expansion.
    pub fn dependencies(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.with_data(|data| collect_dependencies(&data.expansion, &mut names));
        names
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        if self.same_handle(other) {
            return true;
        }
        let a = self.inner.borrow();
        let b = other.inner.borrow();
        a.name == b.name && a.visible == b.visible && a.expansion == b.expansion
    }
}

fn collect_dependencies(expansion: &Expansion, names: &mut BTreeSet<String>) {
    expansion.walk(&mut |node| match node.kind() {
        ExpansionKind::RuleRef(rule_ref) => {
            if names.insert(rule_ref.name().to_string()) {
                if let Some(target) = rule_ref.target() {
                    collect_dependencies(&target.borrow().expansion, names);
                }
            }
        }
        ExpansionKind::NamedRuleRef(name) => {
            names.insert(name.clone());
        }
        _ => {}
    });
}

/// A grammar lookup argument: either a rule name or a rule object.
///
/// Grammar operations that locate a stored rule accept
/// `impl Into<RuleQuery>` so callers can pass `"greet"` or `&rule`
/// interchangeably.
#[derive(Debug, Clone, Copy)]
pub enum RuleQuery<'a> {
    /// Look up by name.
    Name(&'a str),
    /// Look up by the rule object's name.
    Rule(&'a Rule),
}

impl RuleQuery<'_> {
    /// The name this query resolves through.
    pub fn name(&self) -> String {
        match self {
            RuleQuery::Name(name) => (*name).to_string(),
            RuleQuery::Rule(rule) => rule.name(),
        }
    }
}

impl<'a> From<&'a str> for RuleQuery<'a> {
    fn from(name: &'a str) -> Self {
        RuleQuery::Name(name)
    }
}

impl<'a> From<&'a String> for RuleQuery<'a> {
    fn from(name: &'a String) -> Self {
        RuleQuery::Name(name.as_str())
    }
}

impl<'a> From<&'a Rule> for RuleQuery<'a> {
    fn from(rule: &'a Rule) -> Self {
        RuleQuery::Rule(rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_enabled_state() {
        let a = Rule::public("greet", "hello").unwrap();
        let b = Rule::public("greet", "hello").unwrap();
        b.disable();
        assert_eq!(a, b);

        let hidden = Rule::hidden("greet", "hello").unwrap();
        assert_ne!(a, hidden);
    }

    #[test]
    fn clones_share_state() {
        let rule = Rule::public("greet", "hello").unwrap();
        let copy = rule.clone();
        rule.disable();
        assert!(!copy.is_active());
        copy.enable();
        assert!(rule.is_active());
    }

    #[test]
    fn invalid_names_are_rejected() {
        assert!(matches!(
            Rule::public("", "hello"),
            Err(GrammarError::InvalidRuleName(_))
        ));
        assert!(Rule::public("bad name", "hello").is_err());
    }

    #[test]
    fn dependencies_are_transitive() {
        let word = Rule::hidden("word", "hello").unwrap();
        let phrase = Rule::hidden(
            "phrase",
            Expansion::sequence([Expansion::rule_ref(&word), Expansion::literal("there").unwrap()])
                .unwrap(),
        )
        .unwrap();
        let outer = Rule::public("outer", Expansion::rule_ref(&phrase)).unwrap();

        let names: Vec<String> = outer.dependencies().into_iter().collect();
        assert_eq!(names, vec!["phrase".to_string(), "word".to_string()]);
    }
}
