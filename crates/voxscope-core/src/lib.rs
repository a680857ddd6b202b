//! # voxscope-core
//!
//! Construction, compilation, and matching of speech-recognition grammars in
//! the JSpeech Grammar Format (JSGF), extended with free-form *dictation*
//! slots.
//!
//! Grammars are built programmatically from an [`Expansion`] algebra, wrapped
//! in named [`Rule`]s, and collected in a [`Grammar`] (or a [`RootGrammar`],
//! which exports a single synthetic entry point). From there a caller either
//! compiles the grammar to canonical JSGF text or tests speech strings for
//! membership:
//!
//! ```
//! use voxscope_core::{Expansion, Grammar, Rule};
//!
//! let word = Rule::hidden("greetWord", Expansion::alternative_set(["hello", "hi"])?)?;
//! let greet = Rule::public(
//!     "greet",
//!     Expansion::sequence([Expansion::rule_ref(&word), Expansion::literal("world")?])?,
//! )?;
//!
//! let mut grammar = Grammar::new("demo");
//! grammar.add_rules([greet.clone(), word])?;
//!
//! assert!(greet.matches("Hello  WORLD"));
//! assert_eq!(grammar.find_matching_rules("hi world"), vec![greet]);
//! assert!(grammar.compile_grammar().starts_with("#JSGF V1.0 UTF-8 en;\n"));
//! # Ok::<(), voxscope_core::GrammarError>(())
//! ```
//!
//! Rules whose expansion mixes dictation with fixed structure cannot be
//! exported as a single JSGF line; [`SequenceRule`] splits them into
//! dictation-free fragments matched stepwise (see the [`sequence`] module
//! docs for the full lifecycle).
//!
//! ## Features
//!
//! - `tracing`: emit `tracing` events from the matcher and grammar mutation
//!   paths.

pub mod compile;
pub mod error;
pub mod expansion;
pub mod grammar;
pub mod matcher;
pub mod rule;
pub mod sequence;
pub mod types;

// Re-export main types and functions
pub use compile::compile_expansion;
pub use error::{GrammarError, OutOfRange};
pub use expansion::{Expansion, ExpansionKind, IntoExpansion, RuleRef};
pub use grammar::{Grammar, RootGrammar, ROOT_RULE_NAME};
pub use matcher::{normalize_speech, MatchMode};
pub use rule::{Rule, RuleQuery};
pub use sequence::SequenceRule;
pub use types::{NodeSpan, RuleMatch, Span};
