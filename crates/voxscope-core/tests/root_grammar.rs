use voxscope_core::{Expansion, GrammarError, RootGrammar, Rule};

mod common;
use common::greeting_rules;

fn greeting_root() -> (RootGrammar, common::GreetingRules) {
    let rules = greeting_rules();
    let root = RootGrammar::with_rules(
        "root",
        [rules.greet.clone(), rules.greet_word.clone(), rules.name.clone()],
    )
    .unwrap();
    (root, rules)
}

/// `<greetWord> there` with its own copy of the greeting word vocabulary.
fn there_rules() -> (Rule, Rule) {
    let greet_word = Rule::hidden(
        "greetWord",
        Expansion::alternative_set(["hello", "hi"]).unwrap(),
    )
    .unwrap();
    let greet = Rule::public(
        "greet",
        Expansion::sequence([
            Expansion::rule_ref(&greet_word),
            Expansion::literal("there").unwrap(),
        ])
        .unwrap(),
    )
    .unwrap();
    (greet_word, greet)
}

fn parting_rule() -> Rule {
    Rule::public(
        "partingPhrase",
        Expansion::alternative_set(["goodbye", "see you"]).unwrap(),
    )
    .unwrap()
}

#[test]
fn compile_synthesises_the_root_rule() {
    let (root, _) = greeting_root();
    let expected = "#JSGF V1.0 UTF-8 en;\n\
                    grammar root;\n\
                    public <root> = (<greet>);\n\
                    <greet> = (<greetWord> <name>);\n\
                    <greetWord> = (hello|hi);\n\
                    <name> = (peter|john|mary|anna);\n";
    assert_eq!(root.compile_grammar().unwrap(), expected);
}

#[test]
fn compile_tracks_added_and_removed_public_rules() {
    let (greet_word, greet) = there_rules();
    let mut root = RootGrammar::with_rules("root", [greet_word, greet]).unwrap();

    let expected_without = "#JSGF V1.0 UTF-8 en;\n\
                            grammar root;\n\
                            public <root> = (<greet>);\n\
                            <greetWord> = (hello|hi);\n\
                            <greet> = <greetWord> there;\n";

    let expected_with = "#JSGF V1.0 UTF-8 en;\n\
                         grammar root;\n\
                         public <root> = (<greet>|<partingPhrase>);\n\
                         <greetWord> = (hello|hi);\n\
                         <greet> = <greetWord> there;\n\
                         <partingPhrase> = (goodbye|see you);\n";

    assert_eq!(root.compile_grammar().unwrap(), expected_without);

    let parting = parting_rule();
    root.add_rule(parting.clone()).unwrap();
    assert_eq!(root.compile_grammar().unwrap(), expected_with);

    // Remove by name…
    root.remove_rule("partingPhrase").unwrap();
    assert_eq!(root.compile_grammar().unwrap(), expected_without);

    // …and again by rule object.
    root.add_rule(parting.clone()).unwrap();
    assert_eq!(root.compile_grammar().unwrap(), expected_with);
    root.remove_rule(&parting).unwrap();
    assert_eq!(root.compile_grammar().unwrap(), expected_without);
}

#[test]
fn matching_returns_the_original_public_rules() {
    let (root, rules) = greeting_root();
    assert_eq!(root.find_matching_rules("Hello John"), vec![rules.greet.clone()]);
    assert_eq!(root.find_matching_rules("HELLO mary"), vec![rules.greet.clone()]);
    assert_eq!(root.find_matching_rules("hello ANNA"), vec![rules.greet]);

    // Hidden rules stay invisible to match dispatch.
    assert!(root.find_matching_rules("hello").is_empty());
}

#[test]
fn matching_tracks_added_and_removed_rules() {
    let (greet_word, greet) = there_rules();
    let mut root = RootGrammar::with_rules("root", [greet_word, greet.clone()]).unwrap();
    assert_eq!(root.find_matching_rules("Hello there"), vec![greet.clone()]);
    assert_eq!(root.find_matching_rules("Hi there"), vec![greet]);

    let parting = parting_rule();
    root.add_rule(parting.clone()).unwrap();
    assert_eq!(root.find_matching_rules("Goodbye"), vec![parting.clone()]);
    assert_eq!(root.find_matching_rules("See you"), vec![parting.clone()]);

    root.remove_rule("partingPhrase").unwrap();
    assert!(root.find_matching_rules("Goodbye").is_empty());
    assert!(root.find_matching_rules("See you").is_empty());

    root.add_rule(parting.clone()).unwrap();
    assert_eq!(root.find_matching_rules("Goodbye"), vec![parting.clone()]);
    root.remove_rule(&parting).unwrap();
    assert!(root.find_matching_rules("Goodbye").is_empty());
}

#[test]
fn compile_without_public_rules_fails() {
    let (greet_word, greet) = there_rules();
    let mut root = RootGrammar::with_rules("root", [greet_word, greet.clone()]).unwrap();

    root.remove_rule("greet").unwrap();
    assert!(!root.rule_names().contains(&"greet".to_string()));
    assert_eq!(root.compile_grammar(), Err(GrammarError::NoEnabledPublicRules));
    assert!(root.find_matching_rules("hello").is_empty());

    // Same through the rule object.
    let (greet_word, greet) = there_rules();
    let mut root = RootGrammar::with_rules("root", [greet_word, greet.clone()]).unwrap();
    root.remove_rule(&greet).unwrap();
    assert!(!root.rules().contains(&greet));
    assert_eq!(root.compile_grammar(), Err(GrammarError::NoEnabledPublicRules));
}

#[test]
fn the_root_rule_cannot_be_removed() {
    let (greet_word, greet) = there_rules();
    let mut root = RootGrammar::with_rules("root", [greet_word, greet]).unwrap();

    assert_eq!(root.remove_rule("root"), Err(GrammarError::ReservedRuleName));
}

#[test]
fn taken_and_reserved_names_are_rejected() {
    let (mut root, _) = greeting_root();

    assert!(matches!(
        root.add_rule(Rule::public("name", "bob").unwrap()),
        Err(GrammarError::DuplicateRuleName(_))
    ));
    assert!(matches!(
        root.add_rule(Rule::hidden("name", "bob").unwrap()),
        Err(GrammarError::DuplicateRuleName(_))
    ));
    assert!(root
        .add_rules([
            Rule::hidden("name", "bob").unwrap(),
            Rule::public("name", "bob").unwrap(),
        ])
        .is_err());

    assert_eq!(
        root.add_rule(Rule::public("root", "test").unwrap()),
        Err(GrammarError::ReservedRuleName)
    );
}

#[test]
fn construction_rejects_name_conflicts() {
    let conflicts: Vec<Vec<Rule>> = vec![
        vec![
            Rule::public("test", "test").unwrap(),
            Rule::public("test", "test").unwrap(),
        ],
        vec![
            Rule::public("test", "testing").unwrap(),
            Rule::public("test", "test").unwrap(),
        ],
        vec![
            Rule::public("test", "test").unwrap(),
            Rule::hidden("test", "test").unwrap(),
        ],
        vec![
            Rule::public("test", "testing").unwrap(),
            Rule::hidden("test", "test").unwrap(),
        ],
    ];
    for rules in conflicts {
        assert!(matches!(
            RootGrammar::with_rules("root", rules),
            Err(GrammarError::DuplicateRuleName(_))
        ));
    }
}

#[test]
fn enable_disable_flips_caller_copies_too() {
    let (mut root, rules) = greeting_root();

    root.disable_rule(&rules.greet).unwrap();
    assert!(!rules.greet.is_active());
    root.enable_rule(&rules.greet).unwrap();
    assert!(rules.greet.is_active());

    root.disable_rule("greetWord").unwrap();
    assert!(!rules.greet_word.is_active());
    root.enable_rule("greetWord").unwrap();
    assert!(rules.greet_word.is_active());

    assert!(root.disable_rule("hello").is_err());
    assert!(root.enable_rule("hello").is_err());

    let duplicate = Rule::hidden(
        "greetWord",
        Expansion::alternative_set(["hello", "hi"]).unwrap(),
    )
    .unwrap();
    root.disable_rule(&duplicate).unwrap();
    assert!(!duplicate.is_active());
    assert!(!rules.greet_word.is_active());
    root.enable_rule(&duplicate).unwrap();
    assert!(duplicate.is_active());
    assert!(rules.greet_word.is_active());
}

// Disabling a public rule removes it from the synthetic alternation and
// leaves an empty line where its hidden form was; the other public rules
// keep the grammar exportable.
#[test]
fn disabled_rules_leave_empty_lines_and_exit_the_root() {
    let (greet_word, greet) = there_rules();
    let mut root =
        RootGrammar::with_rules("root", [greet_word, greet, parting_rule()]).unwrap();

    root.disable_rule("greet").unwrap();
    let expected = "#JSGF V1.0 UTF-8 en;\n\
                    grammar root;\n\
                    public <root> = (<partingPhrase>);\n\
                    <greetWord> = (hello|hi);\n\
                    \n\
                    <partingPhrase> = (goodbye|see you);\n";
    assert_eq!(root.compile_grammar().unwrap(), expected);

    // Disabling the last enabled public rule makes compilation fail…
    root.disable_rule("partingPhrase").unwrap();
    assert_eq!(root.compile_grammar(), Err(GrammarError::NoEnabledPublicRules));

    // …and re-enabling restores the full document.
    root.enable_rule("greet").unwrap();
    root.enable_rule("partingPhrase").unwrap();
    let restored = "#JSGF V1.0 UTF-8 en;\n\
                    grammar root;\n\
                    public <root> = (<greet>|<partingPhrase>);\n\
                    <greetWord> = (hello|hi);\n\
                    <greet> = <greetWord> there;\n\
                    <partingPhrase> = (goodbye|see you);\n";
    assert_eq!(root.compile_grammar().unwrap(), restored);
}

#[test]
fn disabled_public_rules_do_not_match() {
    let (greet_word, greet) = there_rules();
    let mut root = RootGrammar::with_rules("root", [greet_word, greet.clone()]).unwrap();

    root.disable_rule("greet").unwrap();
    assert!(root.find_matching_rules("hello there").is_empty());

    root.enable_rule("greet").unwrap();
    assert_eq!(root.find_matching_rules("hello there"), vec![greet]);
}
