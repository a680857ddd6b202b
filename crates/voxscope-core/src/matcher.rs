//! Greedy recursive-descent matching of speech against expansion trees.
//!
//! The matcher normalises the input (lowercase, whitespace-collapsed),
//! tokenises it on spaces, and walks the expansion tree computing for each
//! node the token span it consumes. Consumption is greedy with rightward
//! commitment: alternative sets commit to their first matching child and
//! repetitions never give tokens back.
//!
//! Dictation semantics depend on the matching mode, which is threaded
//! explicitly through the recursion:
//!
//! - [`MatchMode::WholeRule`]: a dictation slot consumes the longest span
//!   that still leaves the summed minimum widths of the expansions after it,
//!   and always at least one token.
//! - [`MatchMode::SequenceStep`]: a dictation slot consumes the entire
//!   remaining chunk (a sequence-rule step feeds it one chunk at a time),
//!   again at least one token.

use crate::expansion::{Expansion, ExpansionKind};
use crate::types::{NodeSpan, RuleMatch, Span};
#[cfg(feature = "tracing")]
use tracing::trace;

/// Maximum recursion depth for expansion traversal, bounding pathologically
/// nested trees and reference chains.
pub(crate) const MAX_RECURSION_DEPTH: usize = 100;

/// Selects how dictation slots consume input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// The input is a complete utterance for the rule.
    WholeRule,
    /// The input is one chunk of a stepwise sequence-rule match.
    SequenceStep,
}

/// Normalises speech the way the matcher sees it: lowercased, trimmed, with
/// whitespace runs collapsed to single spaces.
pub fn normalize_speech(speech: &str) -> String {
    tokenize(speech).join(" ")
}

pub(crate) fn tokenize(speech: &str) -> Vec<String> {
    speech.split_whitespace().map(|word| word.to_lowercase()).collect()
}

struct MatchState<'a> {
    words: &'a [String],
    mode: MatchMode,
    path: Vec<usize>,
    spans: Vec<NodeSpan>,
    depth: usize,
}

/// Matches a whole utterance against `expansion`, requiring full
/// consumption.
pub(crate) fn match_rule(rule_name: &str, expansion: &Expansion, speech: &str) -> Option<RuleMatch> {
    match_with_mode(rule_name, expansion, speech, MatchMode::WholeRule)
}

pub(crate) fn match_with_mode(
    rule_name: &str,
    expansion: &Expansion,
    speech: &str,
    mode: MatchMode,
) -> Option<RuleMatch> {
    let words = tokenize(speech);
    #[cfg(feature = "tracing")]
    trace!(rule = rule_name, tokens = words.len(), ?mode, "matching speech");
    let spans = {
        let mut state = MatchState {
            words: &words,
            mode,
            path: Vec::new(),
            spans: Vec::new(),
            depth: 0,
        };
        let end = match_expansion(expansion, 0, 0, &mut state)?;
        if end != words.len() {
            return None;
        }
        state.spans
    };
    Some(RuleMatch {
        rule_name: rule_name.to_string(),
        words,
        spans,
    })
}

/// Matches `expansion` at token `pos`, keeping `reserve` trailing tokens
/// untouched for the expansions that follow it. Returns the new position.
fn match_expansion(
    expansion: &Expansion,
    pos: usize,
    reserve: usize,
    state: &mut MatchState<'_>,
) -> Option<usize> {
    if state.depth >= MAX_RECURSION_DEPTH {
        return None;
    }
    state.depth += 1;
    let checkpoint = state.spans.len();
    let result = match_kind(expansion, pos, reserve, state);
    state.depth -= 1;

    match result {
        Some(end) => {
            state.spans.push(NodeSpan {
                path: state.path.clone(),
                span: Span::new(pos, end),
                dictation: matches!(expansion.kind(), ExpansionKind::Dictation),
                rule: match expansion.kind() {
                    ExpansionKind::RuleRef(rule_ref) => Some(rule_ref.name().to_string()),
                    ExpansionKind::NamedRuleRef(name) => Some(name.clone()),
                    _ => None,
                },
            });
            Some(end)
        }
        None => {
            state.spans.truncate(checkpoint);
            None
        }
    }
}

fn match_kind(
    expansion: &Expansion,
    pos: usize,
    reserve: usize,
    state: &mut MatchState<'_>,
) -> Option<usize> {
    match expansion.kind() {
        ExpansionKind::Literal(words) => {
            let end = pos.checked_add(words.len())?;
            if end > state.words.len() {
                return None;
            }
            if state.words[pos..end].iter().zip(words).all(|(a, b)| a == b) {
                Some(end)
            } else {
                None
            }
        }

        ExpansionKind::Sequence(children) | ExpansionKind::RequiredGrouping(children) => {
            match_sequence(children, pos, reserve, state)
        }

        ExpansionKind::AlternativeSet(children) => {
            for (index, child) in children.iter().enumerate() {
                state.path.push(index);
                let attempt = match_expansion(child, pos, reserve, state);
                state.path.pop();
                if attempt.is_some() {
                    return attempt;
                }
            }
            None
        }

        ExpansionKind::OptionalGrouping(child) => {
            state.path.push(0);
            let attempt = match_expansion(child, pos, reserve, state);
            state.path.pop();
            Some(attempt.unwrap_or(pos))
        }

        ExpansionKind::Repeat(child) => {
            let (end, count) = match_repetitions(child, pos, reserve, state);
            if count >= 1 {
                Some(end)
            } else {
                None
            }
        }

        ExpansionKind::KleeneStar(child) => {
            let (end, _) = match_repetitions(child, pos, reserve, state);
            Some(end)
        }

        ExpansionKind::RuleRef(rule_ref) => {
            let target = rule_ref.target()?;
            let data = target.borrow();
            if !data.active {
                return None;
            }
            state.path.push(0);
            let end = match_expansion(&data.expansion, pos, reserve, state);
            state.path.pop();
            end
        }

        // Unresolved references never match; resolution happens when the
        // holding rule joins a grammar.
        ExpansionKind::NamedRuleRef(_) => None,

        ExpansionKind::Dictation => {
            let available = state.words.len().saturating_sub(pos);
            let consume = match state.mode {
                MatchMode::WholeRule => available.saturating_sub(reserve),
                MatchMode::SequenceStep => available,
            };
            if consume == 0 {
                None
            } else {
                Some(pos + consume)
            }
        }
    }
}

/// Greedily matches repetitions of `child` until it fails. Returns the
/// position after the last repetition and the repetition count. A
/// zero-width success counts once and terminates the loop.
fn match_repetitions(
    child: &Expansion,
    pos: usize,
    reserve: usize,
    state: &mut MatchState<'_>,
) -> (usize, usize) {
    let mut cursor = pos;
    let mut count = 0;
    loop {
        state.path.push(0);
        let attempt = match_expansion(child, cursor, reserve, state);
        state.path.pop();
        match attempt {
            Some(end) if end > cursor => {
                cursor = end;
                count += 1;
            }
            Some(_) => return (cursor, count + 1),
            None => return (cursor, count),
        }
    }
}

/// Matches sequence children left to right. Each child keeps back enough
/// tokens for the minimum widths of the children after it, which is what
/// stops a greedy dictation slot from starving its fixed siblings.
fn match_sequence(
    children: &[Expansion],
    pos: usize,
    reserve: usize,
    state: &mut MatchState<'_>,
) -> Option<usize> {
    let mut cursor = pos;
    for (index, child) in children.iter().enumerate() {
        let trailing: usize = children[index + 1..].iter().map(min_width).sum();
        state.path.push(index);
        let attempt = match_expansion(child, cursor, reserve + trailing, state);
        state.path.pop();
        cursor = attempt?;
    }
    Some(cursor)
}

/// The minimum number of tokens an expansion can consume.
pub(crate) fn min_width(expansion: &Expansion) -> usize {
    match expansion.kind() {
        ExpansionKind::Literal(words) => words.len(),
        ExpansionKind::Sequence(children) | ExpansionKind::RequiredGrouping(children) => {
            children.iter().map(min_width).sum()
        }
        ExpansionKind::AlternativeSet(children) => {
            children.iter().map(min_width).min().unwrap_or(0)
        }
        ExpansionKind::OptionalGrouping(_) | ExpansionKind::KleeneStar(_) => 0,
        ExpansionKind::Repeat(child) => min_width(child),
        ExpansionKind::RuleRef(rule_ref) => rule_ref
            .target()
            .map(|target| min_width(&target.borrow().expansion))
            .unwrap_or(0),
        ExpansionKind::NamedRuleRef(_) => 0,
        ExpansionKind::Dictation => 1,
    }
}
