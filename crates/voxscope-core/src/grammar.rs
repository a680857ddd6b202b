//! Grammar containers: named rule collections and JSGF document emission.
//!
//! A [`Grammar`] owns an ordered, name-indexed set of rules and emits the
//! full JSGF document (header line, `grammar` line, one line per rule).
//! [`RootGrammar`] wraps a grammar so the exported document always has
//! exactly one public entry point: a synthetic `<root>` rule alternating
//! over the enabled public rules, with the user's public rules demoted to
//! hidden form.

use crate::compile::compile_rule_parts;
use crate::error::GrammarError;
use crate::expansion::{ExpansionKind, RuleRef};
use crate::rule::{Rule, RuleQuery};
use std::collections::{HashMap, HashSet};
#[cfg(feature = "tracing")]
use tracing::debug;

/// The rule name reserved for the synthetic entry point of a
/// [`RootGrammar`].
pub const ROOT_RULE_NAME: &str = "root";

const DEFAULT_JSGF_VERSION: &str = "1.0";
const DEFAULT_CHARSET_NAME: &str = "UTF-8";
const DEFAULT_LANGUAGE_NAME: &str = "en";

/// An ordered collection of uniquely named rules plus the JSGF header
/// fields.
#[derive(Debug, Clone)]
pub struct Grammar {
    name: String,
    jsgf_version: String,
    charset_name: String,
    language_name: String,
    rules: Vec<Rule>,
    index: HashMap<String, usize>,
}

impl Grammar {
    /// An empty grammar with default header fields (`V1.0 UTF-8 en`).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            jsgf_version: DEFAULT_JSGF_VERSION.to_string(),
            charset_name: DEFAULT_CHARSET_NAME.to_string(),
            language_name: DEFAULT_LANGUAGE_NAME.to_string(),
            rules: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// The grammar's name, as emitted on the `grammar` line.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// JSGF version emitted in the header.
    pub fn jsgf_version(&self) -> &str {
        &self.jsgf_version
    }

    /// Sets the JSGF version emitted in the header.
    pub fn set_jsgf_version(&mut self, version: impl Into<String>) {
        self.jsgf_version = version.into();
    }

    /// Charset name emitted in the header.
    pub fn charset_name(&self) -> &str {
        &self.charset_name
    }

    /// Sets the charset name emitted in the header.
    pub fn set_charset_name(&mut self, charset: impl Into<String>) {
        self.charset_name = charset.into();
    }

    /// Language name emitted in the header.
    pub fn language_name(&self) -> &str {
        &self.language_name
    }

    /// Sets the language name emitted in the header.
    pub fn set_language_name(&mut self, language: impl Into<String>) {
        self.language_name = language.into();
    }

    /// The stored rules in insertion order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Rule names in insertion order.
    pub fn rule_names(&self) -> Vec<String> {
        self.rules.iter().map(Rule::name).collect()
    }

    /// The stored rule with the given name, if any.
    pub fn get_rule(&self, name: &str) -> Option<&Rule> {
        self.index.get(name).map(|&position| &self.rules[position])
    }

    /// Appends a rule, rejecting duplicates by name regardless of
    /// visibility or structural equality. Unresolved by-name references are
    /// linked in both directions on insertion.
    pub fn add_rule(&mut self, rule: Rule) -> Result<(), GrammarError> {
        let name = rule.name();
        if self.index.contains_key(&name) {
            return Err(GrammarError::DuplicateRuleName(name));
        }
        self.link_named_refs(&rule);
        #[cfg(feature = "tracing")]
        debug!(grammar = %self.name, rule = %name, "adding rule");
        self.index.insert(name, self.rules.len());
        self.rules.push(rule);
        Ok(())
    }

    /// Adds several rules atomically: name uniqueness (against the grammar
    /// and within the batch) is checked before any rule is inserted.
    pub fn add_rules(&mut self, rules: impl IntoIterator<Item = Rule>) -> Result<(), GrammarError> {
        let rules: Vec<Rule> = rules.into_iter().collect();
        let mut batch: HashSet<String> = HashSet::new();
        for rule in &rules {
            let name = rule.name();
            if self.index.contains_key(&name) || !batch.insert(name.clone()) {
                return Err(GrammarError::DuplicateRuleName(name));
            }
        }
        for rule in rules {
            self.add_rule(rule)?;
        }
        Ok(())
    }

    /// Removes a rule by name or by rule object (compared by name) and
    /// returns it. Fails while any other stored rule still references the
    /// target.
    pub fn remove_rule<'a>(&mut self, query: impl Into<RuleQuery<'a>>) -> Result<Rule, GrammarError> {
        let name = query.into().name();
        let Some(&position) = self.index.get(&name) else {
            return Err(GrammarError::NoSuchRule(name));
        };
        for (other_position, other) in self.rules.iter().enumerate() {
            if other_position != position && other.dependencies().contains(&name) {
                return Err(GrammarError::RuleHasDependents {
                    name,
                    dependent: other.name(),
                });
            }
        }
        #[cfg(feature = "tracing")]
        debug!(grammar = %self.name, rule = %name, "removing rule");
        let removed = self.rules.remove(position);
        self.rebuild_index();
        Ok(removed)
    }

    /// Enables a stored rule, located by name or by rule object. A passed
    /// duplicate rule object is flipped along with the stored rule so both
    /// views stay consistent. Idempotent.
    pub fn enable_rule<'a>(&mut self, query: impl Into<RuleQuery<'a>>) -> Result<(), GrammarError> {
        self.set_rule_active(query.into(), true)
    }

    /// Disables a stored rule: its line compiles empty and it no longer
    /// participates in match lookups. Same lookup and aliasing behaviour as
    /// [`Self::enable_rule`]. Idempotent.
    pub fn disable_rule<'a>(&mut self, query: impl Into<RuleQuery<'a>>) -> Result<(), GrammarError> {
        self.set_rule_active(query.into(), false)
    }

    fn set_rule_active(&mut self, query: RuleQuery<'_>, active: bool) -> Result<(), GrammarError> {
        let name = query.name();
        let Some(&position) = self.index.get(&name) else {
            return Err(GrammarError::NoSuchRule(name));
        };
        self.rules[position].set_active(active);
        if let RuleQuery::Rule(passed) = query {
            passed.set_active(active);
        }
        Ok(())
    }

    /// The public rules in insertion order.
    pub fn visible_rules(&self) -> Vec<Rule> {
        self.rules.iter().filter(|rule| rule.is_visible()).cloned().collect()
    }

    /// All enabled public rules whose expansion produces `speech`, in
    /// insertion order.
    pub fn find_matching_rules(&self, speech: &str) -> Vec<Rule> {
        self.rules
            .iter()
            .filter(|rule| rule.is_visible() && rule.is_active() && rule.matches(speech))
            .cloned()
            .collect()
    }

    /// Compiles the full JSGF document. Disabled rules keep their line as an
    /// empty placeholder, preserving the document's line count.
    pub fn compile_grammar(&self) -> String {
        let mut document = self.header();
        for rule in &self.rules {
            document.push_str(&rule.compile());
            document.push('\n');
        }
        document
    }

    fn header(&self) -> String {
        format!(
            "#JSGF V{} {} {};\ngrammar {};\n",
            self.jsgf_version, self.charset_name, self.language_name, self.name
        )
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .rules
            .iter()
            .enumerate()
            .map(|(position, rule)| (rule.name(), position))
            .collect();
    }

    /// Rewrites by-name references between the new rule and the stored
    /// rules into resolved weak references.
    fn link_named_refs(&self, new_rule: &Rule) {
        for existing in &self.rules {
            resolve_refs_against(new_rule, existing);
            resolve_refs_against(existing, new_rule);
        }
    }
}

fn resolve_refs_against(holder: &Rule, target: &Rule) {
    if holder.same_handle(target) {
        return;
    }
    let target_name = target.name();
    let weak = target.downgrade();
    holder.with_data_mut(|data| {
        data.expansion.walk_mut(&mut |node| {
            let is_match = matches!(node.kind(), ExpansionKind::NamedRuleRef(name) if *name == target_name);
            if is_match {
                *node.kind_mut() =
                    ExpansionKind::RuleRef(RuleRef::from_parts(target_name.clone(), weak.clone()));
            }
        });
    });
}

/// A grammar whose compiled document exposes a single public entry point.
///
/// The synthetic rule `public <root> = (<a>|<b>|…);` is produced at compile
/// time from the currently enabled public rules; the user's public rules are
/// emitted in hidden form. Matching still dispatches to the original public
/// rules, never to the synthetic root.
#[derive(Debug, Clone)]
pub struct RootGrammar {
    grammar: Grammar,
}

impl RootGrammar {
    /// An empty root grammar named `root`.
    pub fn new() -> Self {
        Self::named(ROOT_RULE_NAME)
    }

    /// An empty root grammar with an explicit grammar name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            grammar: Grammar::new(name),
        }
    }

    /// A root grammar pre-populated with `rules`; fails on duplicate or
    /// reserved names without storing anything.
    pub fn with_rules(
        name: impl Into<String>,
        rules: impl IntoIterator<Item = Rule>,
    ) -> Result<Self, GrammarError> {
        let mut root = Self::named(name);
        root.add_rules(rules)?;
        Ok(root)
    }

    /// The grammar's name.
    pub fn name(&self) -> &str {
        self.grammar.name()
    }

    /// The stored rules in insertion order. The synthetic `<root>` rule is
    /// not stored; it exists only in compiled output.
    pub fn rules(&self) -> &[Rule] {
        self.grammar.rules()
    }

    /// Rule names in insertion order (the synthetic `root` excluded).
    pub fn rule_names(&self) -> Vec<String> {
        self.grammar.rule_names()
    }

    /// The stored rule with the given name, if any.
    pub fn get_rule(&self, name: &str) -> Option<&Rule> {
        self.grammar.get_rule(name)
    }

    /// The public rules in insertion order.
    pub fn visible_rules(&self) -> Vec<Rule> {
        self.grammar.visible_rules()
    }

    /// Adds a rule; the name `root` is reserved and rejected.
    pub fn add_rule(&mut self, rule: Rule) -> Result<(), GrammarError> {
        if rule.name() == ROOT_RULE_NAME {
            return Err(GrammarError::ReservedRuleName);
        }
        self.grammar.add_rule(rule)
    }

    /// Adds several rules atomically, rejecting the reserved name `root`.
    pub fn add_rules(&mut self, rules: impl IntoIterator<Item = Rule>) -> Result<(), GrammarError> {
        let rules: Vec<Rule> = rules.into_iter().collect();
        if rules.iter().any(|rule| rule.name() == ROOT_RULE_NAME) {
            return Err(GrammarError::ReservedRuleName);
        }
        self.grammar.add_rules(rules)
    }

    /// Removes a rule by name or object. The synthetic `root` rule cannot be
    /// removed.
    pub fn remove_rule<'a>(&mut self, query: impl Into<RuleQuery<'a>>) -> Result<Rule, GrammarError> {
        let query = query.into();
        if query.name() == ROOT_RULE_NAME {
            return Err(GrammarError::ReservedRuleName);
        }
        self.grammar.remove_rule(query)
    }

    /// Enables a stored rule; see [`Grammar::enable_rule`].
    pub fn enable_rule<'a>(&mut self, query: impl Into<RuleQuery<'a>>) -> Result<(), GrammarError> {
        self.grammar.enable_rule(query)
    }

    /// Disables a stored rule; see [`Grammar::disable_rule`].
    pub fn disable_rule<'a>(&mut self, query: impl Into<RuleQuery<'a>>) -> Result<(), GrammarError> {
        self.grammar.disable_rule(query)
    }

    /// All enabled public rules matching `speech` — the originals, not the
    /// synthetic root.
    pub fn find_matching_rules(&self, speech: &str) -> Vec<Rule> {
        self.grammar.find_matching_rules(speech)
    }

    /// Compiles the document with the synthetic entry point first. Fails
    /// when no enabled public rule remains to alternate over.
    pub fn compile_grammar(&self) -> Result<String, GrammarError> {
        let alternatives: Vec<String> = self
            .grammar
            .rules()
            .iter()
            .filter(|rule| rule.is_visible() && rule.is_active())
            .map(|rule| format!("<{}>", rule.name()))
            .collect();
        if alternatives.is_empty() {
            return Err(GrammarError::NoEnabledPublicRules);
        }

        let mut document = self.grammar.header();
        document.push_str(&format!(
            "public <{}> = ({});\n",
            ROOT_RULE_NAME,
            alternatives.join("|")
        ));
        for rule in self.grammar.rules() {
            let line = rule.with_data(|data| {
                compile_rule_parts(&data.name, false, data.active, &data.expansion)
            });
            document.push_str(&line);
            document.push('\n');
        }
        Ok(document)
    }
}

impl Default for RootGrammar {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expansion::Expansion;

    #[test]
    fn named_refs_resolve_in_both_directions() {
        let mut grammar = Grammar::new("test");
        // Forward reference: <greet> mentions <name> before it exists.
        let greet = Rule::public(
            "greet",
            Expansion::sequence([
                Expansion::literal("hello").unwrap(),
                Expansion::named_rule_ref("name").unwrap(),
            ])
            .unwrap(),
        )
        .unwrap();
        grammar.add_rule(greet.clone()).unwrap();
        assert!(!greet.matches("hello john"), "unresolved reference cannot match");

        let name = Rule::hidden("name", Expansion::alternative_set(["john", "mary"]).unwrap()).unwrap();
        grammar.add_rule(name).unwrap();
        assert!(greet.matches("hello john"));
        assert!(!greet.matches("hello bob"));
    }

    #[test]
    fn header_fields_are_configurable() {
        let mut grammar = Grammar::new("test");
        grammar.set_jsgf_version("2.0");
        grammar.set_charset_name("ISO-8859-1");
        grammar.set_language_name("de");
        assert_eq!(
            grammar.compile_grammar(),
            "#JSGF V2.0 ISO-8859-1 de;\ngrammar test;\n"
        );
    }

    #[test]
    fn remove_rebuilds_the_name_index() {
        let mut grammar = Grammar::new("test");
        grammar
            .add_rules([
                Rule::public("one", "one").unwrap(),
                Rule::public("two", "two").unwrap(),
                Rule::public("three", "three").unwrap(),
            ])
            .unwrap();
        grammar.remove_rule("one").unwrap();
        assert_eq!(grammar.rule_names(), vec!["two".to_string(), "three".to_string()]);
        assert!(grammar.get_rule("two").is_some());
        assert!(grammar.get_rule("one").is_none());
    }
}
