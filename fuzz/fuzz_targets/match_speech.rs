#![no_main]

use libfuzzer_sys::fuzz_target;
use voxscope_core::{Expansion, Grammar, Rule, SequenceRule};

fuzz_target!(|data: &[u8]| {
    if let Ok(speech) = std::str::from_utf8(data) {
        let word = Rule::hidden(
            "greetWord",
            Expansion::alternative_set(["hello", "hi"]).unwrap(),
        )
        .unwrap();
        let greet = Rule::public(
            "greet",
            Expansion::sequence([
                Expansion::rule_ref(&word),
                Expansion::optional("there").unwrap(),
            ])
            .unwrap(),
        )
        .unwrap();
        let note = Rule::public(
            "note",
            Expansion::sequence([
                Expansion::literal("take note").unwrap(),
                Expansion::dictation(),
            ])
            .unwrap(),
        )
        .unwrap();

        let mut grammar = Grammar::new("fuzz");
        grammar.add_rules([greet, word, note.clone()]).unwrap();
        let _ = grammar.find_matching_rules(speech);
        let _ = grammar.compile_grammar();

        let mut sequence = SequenceRule::from_rule(&note).unwrap();
        while {
            let _ = sequence.matches(speech);
            let _ = sequence.compile();
            sequence.set_next().is_ok()
        } {}
    }
});
