#![allow(dead_code)]

use voxscope_core::{Expansion, Grammar, Rule};

/// The three-rule greeting vocabulary used across the suites.
pub struct GreetingRules {
    pub greet: Rule,
    pub greet_word: Rule,
    pub name: Rule,
}

pub fn greeting_rules() -> GreetingRules {
    let greet_word = Rule::hidden(
        "greetWord",
        Expansion::alternative_set(["hello", "hi"]).unwrap(),
    )
    .unwrap();
    let name = Rule::hidden(
        "name",
        Expansion::alternative_set(["peter", "john", "mary", "anna"]).unwrap(),
    )
    .unwrap();
    let greet = Rule::public(
        "greet",
        Expansion::required_grouping([
            Expansion::rule_ref(&greet_word),
            Expansion::rule_ref(&name),
        ])
        .unwrap(),
    )
    .unwrap();
    GreetingRules {
        greet,
        greet_word,
        name,
    }
}

/// A grammar named `test` holding the greeting rules.
pub fn greeting_grammar() -> (Grammar, GreetingRules) {
    let rules = greeting_rules();
    let mut grammar = Grammar::new("test");
    grammar
        .add_rules([
            rules.greet.clone(),
            rules.greet_word.clone(),
            rules.name.clone(),
        ])
        .unwrap();
    (grammar, rules)
}

/// Uppercases `speech`, standing in for the original suite's `swapcase`.
pub fn shouted(speech: &str) -> String {
    speech.to_uppercase()
}
