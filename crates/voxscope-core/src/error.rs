//! Error types for grammar construction and matching.
//!
//! # Error Handling Strategy
//!
//! This crate uses two complementary error kinds:
//!
//! - [`GrammarError`]: structural and containment errors raised while building
//!   expansions, mutating a grammar, or constructing a sequence rule. These are
//!   validated before any mutation commits, so a failed operation leaves the
//!   grammar unchanged.
//!
//! - [`OutOfRange`]: raised by [`crate::SequenceRule::set_next`] when the rule
//!   has already consumed its last expansion. Kept separate from
//!   [`GrammarError`] because it signals a caller-side stepping mistake rather
//!   than an invalid grammar.

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Error raised for invalid grammar structure or containment operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    /// Literal text was empty (or only whitespace) after normalisation.
    #[error("literal text is empty after whitespace normalisation")]
    EmptyLiteral,

    /// A rule or rule reference used a name that is not a valid identifier.
    #[error("invalid rule name: {0:?}")]
    InvalidRuleName(String),

    /// An insert collided with a rule already stored under the same name.
    #[error("a rule named <{0}> is already in the grammar")]
    DuplicateRuleName(String),

    /// A removal target is still referenced by another rule.
    #[error("cannot remove rule <{name}>: rule <{dependent}> depends on it")]
    RuleHasDependents {
        /// Name of the rule that was to be removed.
        name: String,
        /// Name of a rule whose expansion still references it.
        dependent: String,
    },

    /// The named rule is not present in the grammar.
    #[error("no rule named <{0}> in the grammar")]
    NoSuchRule(String),

    /// Dictation appeared somewhere the sequence transformer cannot split
    /// around.
    #[error("dictation must occupy a fixed position: not allowed inside {0}")]
    InvalidDictationPlacement(&'static str),

    /// A root grammar was compiled while no enabled public rule remained.
    #[error("root grammar has no enabled public rules to export")]
    NoEnabledPublicRules,

    /// The name `root` is reserved for the synthetic entry-point rule.
    #[error("the rule name <root> is reserved by the root grammar")]
    ReservedRuleName,
}

/// Error raised when stepping a sequence rule past its terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("sequence rule has already consumed all {fragment_count} expansions")]
pub struct OutOfRange {
    /// Total number of expansion fragments in the sequence rule.
    pub fragment_count: usize,
}

/// Validates a rule name against the JSGF identifier shape.
///
/// Accepts ASCII identifiers with `.` and `-` allowed after the first
/// character, which covers every name the compiler can emit inside `<…>`.
pub(crate) fn validate_rule_name(name: &str) -> Result<(), GrammarError> {
    static RULE_NAME: OnceLock<Regex> = OnceLock::new();
    let pattern = RULE_NAME
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]*$").expect("static pattern is valid"));
    if pattern.is_match(name) {
        Ok(())
    } else {
        Err(GrammarError::InvalidRuleName(name.to_string()))
    }
}
