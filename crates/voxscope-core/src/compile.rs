//! One-way compilation of expansions, rules, and grammars to JSGF text.
//!
//! Compilation is a pure function of the tree, the enable bits, and the
//! grammar header fields. There is no parser back from JSGF text.

use crate::expansion::{Expansion, ExpansionKind};

/// Compiles an expansion tree to its canonical JSGF form.
///
/// Dictation slots compile to the empty string: they have no JSGF surface
/// and are instead handled by splitting the containing rule (see
/// [`crate::SequenceRule`]). A tag, when present, is appended as `{tag}`.
pub fn compile_expansion(expansion: &Expansion) -> String {
    let body = match expansion.kind() {
        ExpansionKind::Literal(words) => words.join(" "),
        ExpansionKind::Sequence(children) => join_sequence(children),
        ExpansionKind::RequiredGrouping(children) => format!("({})", join_sequence(children)),
        ExpansionKind::AlternativeSet(children) => format!(
            "({})",
            children.iter().map(compile_expansion).collect::<Vec<_>>().join("|")
        ),
        ExpansionKind::OptionalGrouping(child) => format!("[{}]", compile_expansion(child)),
        ExpansionKind::Repeat(child) => format!("{}+", compile_expansion(child)),
        ExpansionKind::KleeneStar(child) => format!("{}*", compile_expansion(child)),
        ExpansionKind::RuleRef(rule_ref) => format!("<{}>", rule_ref.name()),
        ExpansionKind::NamedRuleRef(name) => format!("<{name}>"),
        ExpansionKind::Dictation => String::new(),
    };
    match expansion.tag() {
        Some(tag) if !body.is_empty() => format!("{body} {{{tag}}}"),
        _ => body,
    }
}

/// Child compiles joined by single spaces, empty results omitted.
fn join_sequence(children: &[Expansion]) -> String {
    children
        .iter()
        .map(compile_expansion)
        .filter(|compiled| !compiled.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Compiles one rule line: `public <name> = body;` for public rules,
/// `<name> = body;` for hidden ones, and the empty string while disabled
/// (so the grammar document keeps its line count).
pub(crate) fn compile_rule_parts(
    name: &str,
    visible: bool,
    active: bool,
    expansion: &Expansion,
) -> String {
    if !active {
        return String::new();
    }
    let body = compile_expansion(expansion);
    if visible {
        format!("public <{name}> = {body};")
    } else {
        format!("<{name}> = {body};")
    }
}
