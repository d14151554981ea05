use crate::examples::arithmetic::arithmetic_grammar;
use crate::{
    Grammar, GrammarError, ParserCreationError, ProductionPattern, ProductionPatternAlternative,
    ProductionPatternElement, TokenPattern,
};

fn token_element(id: usize) -> ProductionPatternElement {
    ProductionPatternElement::token(id, 1, 1).unwrap()
}

#[test]
fn ambiguity_detection_test() {
    // A = "x" | "x" ; must fail preparation naming A.
    let mut grammar = Grammar::new();
    grammar
        .add_token(TokenPattern::literal(1001, "X", "x").unwrap())
        .unwrap();
    let mut production = ProductionPattern::new(2001, "A");
    production.add_alternative(ProductionPatternAlternative::new(vec![token_element(1001)]));
    production.add_alternative(ProductionPatternAlternative::new(vec![token_element(1001)]));
    grammar.add_production(production).unwrap();

    match grammar.prepare() {
        Err(ParserCreationError::Ambiguity { production, tokens }) => {
            assert_eq!(production, "A");
            assert_eq!(tokens, vec!["X".to_string()]);
        }
        other => panic!("expected an ambiguity error, got {:?}", other),
    }
}

#[test]
fn left_recursion_test() {
    // L = L "a" | "a" ; must fail preparation naming L.
    let mut grammar = Grammar::new();
    grammar
        .add_token(TokenPattern::literal(1001, "A", "a").unwrap())
        .unwrap();
    let mut production = ProductionPattern::new(2001, "L");
    production.add_alternative(ProductionPatternAlternative::new(vec![
        ProductionPatternElement::production(2001, 1, 1).unwrap(),
        token_element(1001),
    ]));
    production.add_alternative(ProductionPatternAlternative::new(vec![token_element(1001)]));
    grammar.add_production(production).unwrap();

    match grammar.prepare() {
        Err(ParserCreationError::LeftRecursion(production)) => assert_eq!(production, "L"),
        other => panic!("expected a left recursion error, got {:?}", other),
    }
}

#[test]
fn indirect_left_recursion_test() {
    let mut grammar = Grammar::new();
    grammar
        .add_token(TokenPattern::literal(1001, "A", "a").unwrap())
        .unwrap();
    let mut first = ProductionPattern::new(2001, "First");
    first.add_alternative(ProductionPatternAlternative::new(vec![
        ProductionPatternElement::production(2002, 1, 1).unwrap(),
        token_element(1001),
    ]));
    let mut second = ProductionPattern::new(2002, "Second");
    second.add_alternative(ProductionPatternAlternative::new(vec![
        ProductionPatternElement::production(2001, 1, 1).unwrap(),
        token_element(1001),
    ]));
    grammar.add_production(first).unwrap();
    grammar.add_production(second).unwrap();

    match grammar.prepare() {
        Err(ParserCreationError::LeftRecursion(production)) => {
            assert!(production == "First" || production == "Second");
        }
        other => panic!("expected a left recursion error, got {:?}", other),
    }
}

#[test]
fn lookahead_grows_to_two_test() {
    // S = A B | A C ; conflicts at k = 1 and resolves at k = 2.
    let mut grammar = Grammar::new();
    grammar
        .add_token(TokenPattern::literal(1001, "A", "a").unwrap())
        .unwrap();
    grammar
        .add_token(TokenPattern::literal(1002, "B", "b").unwrap())
        .unwrap();
    grammar
        .add_token(TokenPattern::literal(1003, "C", "c").unwrap())
        .unwrap();
    let mut production = ProductionPattern::new(2001, "S");
    production.add_alternative(ProductionPatternAlternative::new(vec![
        token_element(1001),
        token_element(1002),
    ]));
    production.add_alternative(ProductionPatternAlternative::new(vec![
        token_element(1001),
        token_element(1003),
    ]));
    grammar.add_production(production).unwrap();

    grammar.prepare().unwrap();
    {
        let production = grammar.production_by_id(2001).unwrap();
        assert_eq!(production.lookahead_length(), 2);
        let first = production.alternatives()[0].lookahead().unwrap();
        let second = production.alternatives()[1].lookahead().unwrap();
        assert_eq!(first.sequences().to_vec(), vec![vec![1001, 1002]]);
        assert_eq!(second.sequences().to_vec(), vec![vec![1001, 1003]]);
        assert!(!first.intersects(second));
    }

    // Two tokens of look-ahead select the second alternative.
    let grammar = std::sync::Arc::new(grammar);
    let mut parser = crate::Parser::new(&grammar, "ac").unwrap();
    let tree = parser.parse().unwrap();
    assert_eq!(tree.child_at(0).unwrap().name(), "A");
    assert_eq!(tree.child_at(1).unwrap().name(), "C");
}

#[test]
fn lookahead_disjointness_test() {
    let grammar = arithmetic_grammar();
    grammar.prepare().unwrap();
    for production in grammar.production_patterns() {
        let alternatives = production.alternatives();
        for (index, alternative) in alternatives.iter().enumerate() {
            let set = alternative.lookahead().unwrap();
            assert!(!set.is_empty(), "{} has an empty look-ahead", production.name());
            for other in &alternatives[index + 1..] {
                assert!(
                    !set.intersects(other.lookahead().unwrap()),
                    "{} has overlapping alternatives",
                    production.name()
                );
            }
        }
    }
}

#[test]
fn name_uniqueness_test() {
    let mut grammar = Grammar::new();
    grammar
        .add_token(TokenPattern::literal(1001, "Foo_Bar", "x").unwrap())
        .unwrap();
    // Canonicalization strips non-alphanumerics and upper-cases.
    let duplicate = TokenPattern::literal(1002, "FOOBAR", "y").unwrap();
    assert_eq!(
        grammar.add_token(duplicate),
        Err(GrammarError::DuplicateName("FOOBAR".into()))
    );
    let same_id = TokenPattern::literal(1001, "OTHER", "z").unwrap();
    assert_eq!(grammar.add_token(same_id), Err(GrammarError::DuplicateId(1001)));
}

#[test]
fn unknown_reference_test() {
    let mut grammar = Grammar::new();
    grammar
        .add_token(TokenPattern::literal(1001, "A", "a").unwrap())
        .unwrap();
    let mut production = ProductionPattern::new(2001, "P");
    production.add_alternative(ProductionPatternAlternative::new(vec![
        ProductionPatternElement::token(9999, 1, 1).unwrap(),
    ]));
    grammar.add_production(production).unwrap();

    match grammar.prepare() {
        Err(ParserCreationError::Grammar(GrammarError::UnknownReference {
            production,
            reference,
        })) => {
            assert_eq!(production, "P");
            assert_eq!(reference, "9999");
        }
        other => panic!("expected an unknown reference error, got {:?}", other),
    }
}

#[test]
fn unsupported_grammar_type_test() {
    let mut grammar = Grammar::new();
    grammar.set_declaration("GRAMMARTYPE", "LR").unwrap();
    grammar
        .add_token(TokenPattern::literal(1001, "A", "a").unwrap())
        .unwrap();
    let mut production = ProductionPattern::new(2001, "P");
    production.add_alternative(ProductionPatternAlternative::new(vec![token_element(1001)]));
    grammar.add_production(production).unwrap();

    assert_eq!(
        grammar.prepare(),
        Err(ParserCreationError::Grammar(
            GrammarError::UnsupportedGrammarType("LR".into())
        ))
    );
}

#[test]
fn frozen_after_preparation_test() {
    let grammar = arithmetic_grammar();
    grammar.prepare().unwrap();
    // Preparation is idempotent.
    grammar.prepare().unwrap();
    assert!(grammar.is_prepared());

    let mut grammar = Grammar::new();
    grammar
        .add_token(TokenPattern::literal(1001, "A", "a").unwrap())
        .unwrap();
    let mut production = ProductionPattern::new(2001, "P");
    production.add_alternative(ProductionPatternAlternative::new(vec![token_element(1001)]));
    grammar.add_production(production).unwrap();
    grammar.prepare().unwrap();
    assert_eq!(
        grammar.add_token(TokenPattern::literal(1002, "B", "b").unwrap()),
        Err(GrammarError::Frozen)
    );
}

#[test]
fn empty_production_test() {
    let mut grammar = Grammar::new();
    let production = ProductionPattern::new(2001, "P");
    assert_eq!(
        grammar.add_production(production),
        Err(GrammarError::EmptyProduction("P".into()))
    );
    assert_eq!(
        ProductionPatternElement::token(1001, 2, 1).unwrap_err(),
        GrammarError::InvalidQuantifier { min: 2, max: 1 }
    );
}
