use crate::examples::arithmetic::arithmetic_grammar;
use crate::examples::json::json_grammar;
use crate::{
    Grammar, Node, ParseErrorKind, Parser, ProductionPattern, ProductionPatternAlternative,
    ProductionPatternElement, TokenPattern,
};
use std::sync::Arc;

#[test]
fn arithmetic_tree_shape_test() {
    let grammar = arithmetic_grammar();
    let mut parser = Parser::new(&grammar, "1 + 2 * 3").unwrap();
    let tree = match parser.parse() {
        Ok(tree) => tree,
        Err(log) => panic!("{}", log),
    };

    assert_eq!(tree.name(), "Expr");
    assert_eq!(tree.children().len(), 3);
    assert_eq!(tree.child_at(0).unwrap().name(), "Term");
    assert_eq!(tree.child_at(1).unwrap().name(), "PLUS");
    let product = tree.child_at(2).unwrap();
    assert_eq!(product.name(), "Term");
    assert_eq!(product.children().len(), 3);

    let expected = "\
Expr
  Term
    Factor
      NUMBER (\"1\", 1, 1)
  PLUS (\"+\", 1, 3)
  Term
    Factor
      NUMBER (\"2\", 1, 5)
    TIMES (\"*\", 1, 7)
    Factor
      NUMBER (\"3\", 1, 9)
";
    assert_eq!(format!("{}", tree), expected);
}

#[test]
fn parenthesized_expression_test() {
    let grammar = arithmetic_grammar();
    let mut parser = Parser::new(&grammar, "(1 + 2) * 3").unwrap();
    let tree = parser.parse().unwrap();

    assert_eq!(tree.children().len(), 1);
    let term = tree.child_at(0).unwrap();
    assert_eq!(term.children().len(), 3);
    let factor = term.child_at(0).unwrap();
    assert_eq!(factor.child_at(0).unwrap().name(), "LP");
    assert_eq!(factor.child_at(1).unwrap().name(), "Expr");
    assert_eq!(factor.child_at(2).unwrap().name(), "RP");
}

fn token_images(node: &Node, images: &mut Vec<String>) {
    match node {
        Node::Token(token) => images.push(token.image().to_string()),
        Node::Production(_) => {
            for child in node.children() {
                token_images(child, images);
            }
        }
    }
}

#[test]
fn roundtrip_identity_test() {
    let grammar = arithmetic_grammar();
    let input = "1 + 2 * ( 3 + 4 )";
    let mut parser = Parser::new(&grammar, input).unwrap();
    let tree = parser.parse().unwrap();

    // Reassembling the token images reproduces the input, so re-parsing it must yield an
    // equal tree.
    let mut images = Vec::new();
    token_images(&tree, &mut images);
    let rebuilt = images.join(" ");
    assert_eq!(rebuilt, input);

    parser.reset(rebuilt.as_str());
    let reparsed = parser.parse().unwrap();
    assert_eq!(tree, reparsed);
}

#[test]
fn reset_idempotence_test() {
    let grammar = arithmetic_grammar();
    let mut parser = Parser::new(&grammar, "1 + 2").unwrap();
    let first = parser.parse().unwrap();

    parser.reset("1 + 2");
    let second = parser.parse().unwrap();
    assert_eq!(first, second);

    // Failing inputs report the same log after a reset too.
    parser.reset("1 + +");
    let first_log = parser.parse().unwrap_err();
    parser.reset("1 + +");
    let second_log = parser.parse().unwrap_err();
    assert_eq!(first_log, second_log);
}

#[test]
fn error_recovery_collects_multiple_errors_test() {
    let grammar = arithmetic_grammar();
    let mut parser = Parser::new(&grammar, "1 + + 2 * * 3").unwrap();
    let log = parser.parse().unwrap_err();

    assert_eq!(log.len(), 2);
    for error in log.iter() {
        match error.kind() {
            ParseErrorKind::UnexpectedToken { expected, .. } => {
                assert!(expected.contains(&"NUMBER".to_string()));
            }
            other => panic!("expected an unexpected-token error, got {:?}", other),
        }
    }
}

#[test]
fn unexpected_eof_test() {
    let grammar = arithmetic_grammar();
    let mut parser = Parser::new(&grammar, "1 +").unwrap();
    let log = parser.parse().unwrap_err();

    assert_eq!(log.len(), 1);
    match log.first().unwrap().kind() {
        ParseErrorKind::UnexpectedEof { expected } => {
            assert!(expected.contains(&"NUMBER".to_string()));
        }
        other => panic!("expected an end-of-input error, got {:?}", other),
    }
}

#[test]
fn trailing_input_test() {
    let grammar = arithmetic_grammar();
    let mut parser = Parser::new(&grammar, "1 2").unwrap();
    let log = parser.parse().unwrap_err();

    assert_eq!(log.len(), 1);
    match log.first().unwrap().kind() {
        ParseErrorKind::UnexpectedToken { found, expected } => {
            assert!(found.contains("NUMBER"));
            assert_eq!(expected, &vec!["end of input".to_string()]);
        }
        other => panic!("expected a trailing-input error, got {:?}", other),
    }
}

#[test]
fn empty_input_test() {
    let grammar = arithmetic_grammar();
    let mut parser = Parser::new(&grammar, "").unwrap();
    let log = parser.parse().unwrap_err();
    assert!(matches!(
        log.first().unwrap().kind(),
        ParseErrorKind::UnexpectedEof { .. }
    ));
}

#[test]
fn concurrent_parsers_test() {
    let grammar = arithmetic_grammar();
    grammar.prepare().unwrap();
    let input = "1 + 2 * 3 + (4 + 5)";

    let mut baseline_parser = Parser::new(&grammar, input).unwrap();
    let baseline = baseline_parser.parse().unwrap();

    std::thread::scope(|scope| {
        let mut handles = Vec::new();
        for _ in 0..4 {
            let grammar = grammar.clone();
            handles.push(scope.spawn(move || {
                let mut parser = Parser::new(&grammar, input).unwrap();
                parser.parse().unwrap()
            }));
        }
        for handle in handles {
            assert_eq!(handle.join().unwrap(), baseline);
        }
    });
}

/// Opt = A? B? ; — a single alternative whose every element is optional, so the FIRST set
/// of any element referencing Opt contains the empty sequence.
fn nullable_grammar(opt_min: usize) -> Arc<Grammar> {
    let mut grammar = Grammar::new();
    grammar
        .add_token(TokenPattern::literal(1001, "A", "a").unwrap())
        .unwrap();
    grammar
        .add_token(TokenPattern::literal(1002, "B", "b").unwrap())
        .unwrap();
    grammar
        .add_token(TokenPattern::literal(1003, "X", "x").unwrap())
        .unwrap();
    let mut root = ProductionPattern::new(2001, "Root");
    root.add_alternative(ProductionPatternAlternative::new(vec![
        ProductionPatternElement::production(2002, opt_min, 1).unwrap(),
        ProductionPatternElement::token(1003, 1, 1).unwrap(),
    ]));
    let mut opt = ProductionPattern::new(2002, "Opt");
    opt.add_alternative(ProductionPatternAlternative::new(vec![
        ProductionPatternElement::token(1001, 0, 1).unwrap(),
        ProductionPatternElement::token(1002, 0, 1).unwrap(),
    ]));
    grammar.add_production(root).unwrap();
    grammar.add_production(opt).unwrap();
    Arc::new(grammar)
}

#[test]
fn optional_nullable_production_is_skipped_test() {
    let grammar = nullable_grammar(0);

    // Neither of Opt's tokens is upcoming: the optional element is skipped instead of
    // emitting a spurious empty node.
    let mut parser = Parser::new(&grammar, "x").unwrap();
    let tree = parser.parse().unwrap();
    assert_eq!(tree.children().len(), 1);
    assert_eq!(tree.child_at(0).unwrap().name(), "X");

    // With one of its tokens upcoming the element is entered as usual.
    parser.reset("bx");
    let tree = parser.parse().unwrap();
    assert_eq!(tree.children().len(), 2);
    let opt = tree.child_at(0).unwrap();
    assert_eq!(opt.name(), "Opt");
    assert_eq!(opt.children().len(), 1);
    assert_eq!(opt.child_at(0).unwrap().name(), "B");
}

#[test]
fn mandatory_nullable_production_matches_nothing_test() {
    let grammar = nullable_grammar(1);

    // A mandatory reference to a nullable production still produces its node, empty.
    let mut parser = Parser::new(&grammar, "x").unwrap();
    let tree = parser.parse().unwrap();
    assert_eq!(tree.children().len(), 2);
    let opt = tree.child_at(0).unwrap();
    assert_eq!(opt.name(), "Opt");
    assert_eq!(opt.children().len(), 0);
    assert_eq!(tree.child_at(1).unwrap().name(), "X");

    parser.reset("abx");
    let tree = parser.parse().unwrap();
    let opt = tree.child_at(0).unwrap();
    assert_eq!(opt.children().len(), 2);
}

#[test]
fn json_tree_test() {
    let grammar = json_grammar();
    let mut parser = Parser::new(&grammar, r#"{"a": [1, true], "b": null}"#).unwrap();
    let tree = parser.parse().unwrap();

    assert_eq!(tree.name(), "Value");
    let object = tree.child_at(0).unwrap();
    assert_eq!(object.name(), "Object");
    // The optional member list is flattened into the object node.
    let member_id = grammar.production_by_name("Member").unwrap().id();
    assert_eq!(object.children_with_id(member_id).len(), 2);
    let first_member = object.child_with_id(member_id).unwrap();
    assert_eq!(first_member.child_at(0).unwrap().token().unwrap().image(), r#""a""#);
}

#[test]
fn json_serde_agreement_test() {
    let grammar = json_grammar();
    let documents = [
        (r#"{"a": 1, "b": [true, false, null]}"#, true),
        (r#"[]"#, true),
        (r#"{}"#, true),
        (r#""text with \"escape\"""#, true),
        (r#"3.25"#, true),
        (r#"-12"#, true),
        (r#"1e6"#, true),
        (r#"[[1, 2], {"x": "y"}]"#, true),
        (r#"[1, 2"#, false),
        (r#"{"a" 1}"#, false),
        (r#"[1,,2]"#, false),
        (r#"{"a": }"#, false),
        (r#"tru"#, false),
        (r#""#, false),
    ];
    for (document, valid) in documents {
        let mut parser = Parser::new(&grammar, document).unwrap();
        let ours = parser.parse().is_ok();
        let oracle = serde_json::from_str::<serde_json::Value>(document).is_ok();
        assert_eq!(oracle, valid, "oracle disagrees on {:?}", document);
        assert_eq!(ours, oracle, "we disagree with serde_json on {:?}", document);
    }
}
