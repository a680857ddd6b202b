//! Stepwise matching of rules that contain dictation slots.
//!
//! Dictation has no JSGF surface, so a rule that mixes dictation with fixed
//! structure cannot be exported as one grammar line. A [`SequenceRule`]
//! splits such a rule into an ordered list of dictation-free fragments with
//! dictation slots between them, and the caller then drives matching one
//! chunk of speech at a time:
//!
//! ```
//! use voxscope_core::{Expansion, SequenceRule};
//!
//! let expansion = Expansion::sequence([
//!     Expansion::literal("take note")?,
//!     Expansion::dictation(),
//! ])?;
//! let mut rule = SequenceRule::public("note", expansion)?;
//!
//! assert!(rule.matches("take note"));
//! rule.set_next()?;
//! assert!(rule.matches("buy more coffee"));
//! assert_eq!(rule.entire_match(), Some("take note buy more coffee".into()));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Fragments compile under derived names (`<note_0>`, `<note_1>`, …);
//! dictation fragments compile to the empty string so the exporter skips
//! them and the external dictation recogniser handles those steps.

use crate::compile::compile_rule_parts;
use crate::error::{validate_rule_name, GrammarError, OutOfRange};
use crate::expansion::{Expansion, ExpansionKind, IntoExpansion};
use crate::matcher::{self, MatchMode};
use crate::rule::Rule;
use crate::types::RuleMatch;

#[derive(Debug, Clone)]
struct Fragment {
    expansion: Expansion,
    dictation_only: bool,
}

/// A rule split into dictation-free fragments, matched step by step.
#[derive(Debug, Clone)]
pub struct SequenceRule {
    name: String,
    visible: bool,
    original: Expansion,
    fragments: Vec<Fragment>,
    index: usize,
    step_matches: Vec<Option<String>>,
}

impl SequenceRule {
    /// Splits `expansion` around its dictation slots.
    ///
    /// Fails with [`GrammarError::InvalidDictationPlacement`] when a
    /// dictation slot sits somewhere the transformer cannot split around:
    /// inside an alternative set, optional grouping, or kleene star, or
    /// inside a repeat that is not itself the whole expansion.
    pub fn new(
        name: impl Into<String>,
        visible: bool,
        expansion: impl IntoExpansion,
    ) -> Result<Self, GrammarError> {
        let name = name.into();
        validate_rule_name(&name)?;
        let original = expansion.into_expansion()?;
        validate_dictation_placement(&original)?;
        let fragments = split_fragments(&original);
        let step_count = fragments.len();
        Ok(Self {
            name,
            visible,
            original,
            fragments,
            index: 0,
            step_matches: vec![None; step_count],
        })
    }

    /// A public sequence rule.
    pub fn public(name: impl Into<String>, expansion: impl IntoExpansion) -> Result<Self, GrammarError> {
        Self::new(name, true, expansion)
    }

    /// A hidden sequence rule.
    pub fn hidden(name: impl Into<String>, expansion: impl IntoExpansion) -> Result<Self, GrammarError> {
        Self::new(name, false, expansion)
    }

    /// Builds a sequence rule from an existing rule's name, visibility, and
    /// expansion.
    pub fn from_rule(rule: &Rule) -> Result<Self, GrammarError> {
        let (name, visible, expansion) =
            rule.with_data(|data| (data.name.clone(), data.visible, data.expansion.clone()));
        Self::new(name, visible, expansion)
    }

    /// The base rule name (derived fragment names append `_<index>`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True for public sequence rules.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// The unsplit expansion the rule was built from.
    pub fn original_expansion(&self) -> &Expansion {
        &self.original
    }

    /// Number of fragments the expansion was split into.
    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    /// Index of the current fragment; equals [`Self::fragment_count`] once
    /// the sequence has been stepped past its last fragment.
    pub fn current_index(&self) -> usize {
        self.index
    }

    /// True once `set_next` has been called on the last fragment.
    pub fn is_done(&self) -> bool {
        self.index >= self.fragments.len()
    }

    /// True while fragments remain after the current one.
    pub fn has_next_expansion(&self) -> bool {
        self.index + 1 < self.fragments.len()
    }

    /// True when the current fragment has at least one dictation slot and no
    /// fixed leaves. Such steps carry no grammar text; the external
    /// dictation recogniser supplies their words.
    pub fn current_is_dictation_only(&self) -> bool {
        self.fragments
            .get(self.index)
            .is_some_and(|fragment| fragment.dictation_only)
    }

    /// The current fragment's expansion, if the sequence is not done.
    pub fn current_expansion(&self) -> Option<&Expansion> {
        self.fragments.get(self.index).map(|fragment| &fragment.expansion)
    }

    /// Matches one chunk of speech against the current fragment, recording
    /// it for [`Self::entire_match`] on success.
    pub fn matches(&mut self, speech: &str) -> bool {
        self.find_match(speech).is_some()
    }

    /// Like [`Self::matches`] but returns the span trace.
    pub fn find_match(&mut self, speech: &str) -> Option<RuleMatch> {
        let fragment = self.fragments.get(self.index)?;
        let derived = format!("{}_{}", self.name, self.index);
        let matched =
            matcher::match_with_mode(&derived, &fragment.expansion, speech, MatchMode::SequenceStep);
        self.step_matches[self.index] = matched.as_ref().map(|m| m.words.join(" "));
        matched
    }

    /// Advances to the next fragment. Stepping off the last fragment parks
    /// the rule in its terminal state; stepping again fails.
    pub fn set_next(&mut self) -> Result<(), OutOfRange> {
        if self.is_done() {
            return Err(OutOfRange {
                fragment_count: self.fragments.len(),
            });
        }
        self.index += 1;
        Ok(())
    }

    /// Returns to the first fragment and clears recorded step matches.
    pub fn reset(&mut self) {
        self.index = 0;
        for step in &mut self.step_matches {
            *step = None;
        }
    }

    /// The whole utterance reassembled from the per-step matches, once every
    /// step has matched.
    pub fn entire_match(&self) -> Option<String> {
        if self.step_matches.iter().any(Option::is_none) {
            return None;
        }
        let phrases: Vec<&str> = self
            .step_matches
            .iter()
            .flatten()
            .map(String::as_str)
            .filter(|phrase| !phrase.is_empty())
            .collect();
        Some(phrases.join(" "))
    }

    /// Compiles the current fragment under its derived name
    /// (`<name>_<index>`). Dictation fragments, and the terminal state,
    /// compile to the empty string.
    pub fn compile(&self) -> String {
        let Some(fragment) = self.fragments.get(self.index) else {
            return String::new();
        };
        if fragment.dictation_only {
            return String::new();
        }
        let derived = format!("{}_{}", self.name, self.index);
        compile_rule_parts(&derived, self.visible, true, &fragment.expansion)
    }
}

/// Checks that every dictation slot sits at a position the splitter can cut
/// around: at the top level or under sequence-like containers only. The one
/// degenerate exception is `Repeat(Dictation)` as the entire expansion,
/// which becomes a single dictation fragment. `KleeneStar(Dictation)` is
/// rejected even at the top level: a slot that can match nothing has no
/// fixed position in the step sequence.
fn validate_dictation_placement(expansion: &Expansion) -> Result<(), GrammarError> {
    if let ExpansionKind::Repeat(child) = expansion.kind() {
        if matches!(child.kind(), ExpansionKind::Dictation) {
            return Ok(());
        }
    }
    check_placement(expansion, None)
}

fn check_placement(
    expansion: &Expansion,
    banned_by: Option<&'static str>,
) -> Result<(), GrammarError> {
    match expansion.kind() {
        ExpansionKind::Dictation => match banned_by {
            Some(container) => Err(GrammarError::InvalidDictationPlacement(container)),
            None => Ok(()),
        },
        ExpansionKind::Sequence(children) | ExpansionKind::RequiredGrouping(children) => children
            .iter()
            .try_for_each(|child| check_placement(child, banned_by)),
        ExpansionKind::AlternativeSet(children) => children
            .iter()
            .try_for_each(|child| check_placement(child, Some("an alternative set"))),
        ExpansionKind::OptionalGrouping(child) => {
            check_placement(child, Some("an optional grouping"))
        }
        ExpansionKind::Repeat(child) => check_placement(child, Some("a repeat")),
        ExpansionKind::KleeneStar(child) => check_placement(child, Some("a kleene star")),
        _ => Ok(()),
    }
}

/// Splits an expansion into fragments: maximal runs of dictation-free
/// children become fixed fragments, each dictation slot becomes its own
/// dictation fragment. An expansion without dictation is one fragment,
/// unchanged.
fn split_fragments(original: &Expansion) -> Vec<Fragment> {
    if original.is_dictation_free() {
        return vec![Fragment {
            expansion: original.clone(),
            dictation_only: false,
        }];
    }

    let mut stream = Vec::new();
    flatten_into(original, &mut stream);

    let mut fragments = Vec::new();
    let mut run: Vec<Expansion> = Vec::new();
    for child in stream {
        if child.is_dictation_only() {
            flush_run(&mut run, &mut fragments);
            fragments.push(Fragment {
                expansion: child,
                dictation_only: true,
            });
        } else {
            run.push(child);
        }
    }
    flush_run(&mut run, &mut fragments);
    fragments
}

/// Flattens sequence-like spines that contain dictation into a flat child
/// stream; everything else stays atomic.
fn flatten_into(expansion: &Expansion, stream: &mut Vec<Expansion>) {
    match expansion.kind() {
        ExpansionKind::Sequence(children) | ExpansionKind::RequiredGrouping(children)
            if expansion.contains_dictation() =>
        {
            for child in children {
                flatten_into(child, stream);
            }
        }
        _ => stream.push(expansion.clone()),
    }
}

fn flush_run(run: &mut Vec<Expansion>, fragments: &mut Vec<Fragment>) {
    if run.is_empty() {
        return;
    }
    let expansion = if run.len() == 1 {
        run.pop().expect("run has one element")
    } else {
        Expansion::sequence(std::mem::take(run)).expect("children are already expansions")
    };
    run.clear();
    fragments.push(Fragment {
        expansion,
        dictation_only: false,
    });
}
