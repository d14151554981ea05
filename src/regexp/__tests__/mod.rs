use crate::regexp::{parse, Nfa};

fn compile(pattern: &str) -> Nfa {
    Nfa::compile(&parse(pattern).unwrap(), true)
}

#[test]
fn sequence_test() {
    let nfa = compile("abc");
    assert_eq!(nfa.match_length("abc"), Some(3));
    assert_eq!(nfa.match_length("abcdef"), Some(3));
    assert_eq!(nfa.match_length("ab"), None);
    assert_eq!(nfa.match_length("xabc"), None);
}

#[test]
fn longest_overall_alternation_test() {
    // The engine reports the longest prefix over all branches, not the first branch.
    let nfa = compile("ab|abc");
    assert_eq!(nfa.match_length("abcd"), Some(3));
    assert_eq!(nfa.match_length("abd"), Some(2));
}

#[test]
fn quantifier_test() {
    let nfa = compile("a+");
    assert_eq!(nfa.match_length("aaab"), Some(3));
    assert_eq!(nfa.match_length("b"), None);

    let nfa = compile("a?b");
    assert_eq!(nfa.match_length("ab"), Some(2));
    assert_eq!(nfa.match_length("b"), Some(1));

    let nfa = compile("(ab)*");
    assert_eq!(nfa.match_length("ababab"), Some(6));
    assert_eq!(nfa.match_length("aba"), Some(2));
    assert_eq!(nfa.match_length("x"), Some(0));
}

#[test]
fn bounds_test() {
    let nfa = compile("a{2,3}");
    assert_eq!(nfa.match_length("a"), None);
    assert_eq!(nfa.match_length("aa"), Some(2));
    assert_eq!(nfa.match_length("aaaa"), Some(3));

    let nfa = compile("a{2}");
    assert_eq!(nfa.match_length("aaa"), Some(2));

    let nfa = compile("a{2,}");
    assert_eq!(nfa.match_length("aaaaa"), Some(5));
    assert_eq!(nfa.match_length("a"), None);
}

#[test]
fn class_test() {
    let nfa = compile("[a-z_][a-z0-9_]*");
    assert_eq!(nfa.match_length("snake_case3 rest"), Some(11));
    assert_eq!(nfa.match_length("3d"), None);

    let nfa = compile("[^0-9]+");
    assert_eq!(nfa.match_length("ab3"), Some(2));

    let nfa = compile(r"[+-]?[0-9]+");
    assert_eq!(nfa.match_length("-42;"), Some(3));
    assert_eq!(nfa.match_length("+7"), Some(2));
    assert_eq!(nfa.match_length("9"), Some(1));
}

#[test]
fn meta_escape_test() {
    let nfa = compile(r"\d+");
    assert_eq!(nfa.match_length("123abc"), Some(3));

    let nfa = compile(r"\s+");
    assert_eq!(nfa.match_length(" \t\n x"), Some(4));

    let nfa = compile(r"\w+");
    assert_eq!(nfa.match_length("a_b9-"), Some(4));

    let nfa = compile(r"\D\S\W");
    assert_eq!(nfa.match_length("a,;"), Some(3));
    assert_eq!(nfa.match_length("1,;"), None);
    assert_eq!(nfa.match_length("abc"), None);
}

#[test]
fn wildcard_stays_on_the_line_test() {
    let nfa = compile("//.*");
    assert_eq!(nfa.match_length("// hi\nmore"), Some(5));
}

#[test]
fn case_folding_test() {
    // Patterns are folded at compile time; the tokenizer folds input on read, so folded
    // input is matched here directly.
    let nfa = Nfa::compile(&parse("while").unwrap(), false);
    assert_eq!(nfa.match_length("WHILE"), Some(5));

    let nfa = Nfa::compile(&parse("[a-z]+").unwrap(), false);
    assert_eq!(nfa.match_length("MIXED"), Some(5));
}

#[test]
fn nullable_detection_test() {
    assert!(parse("a*").unwrap().is_nullable());
    assert!(parse("a?|b").unwrap().is_nullable());
    assert!(parse("(a|b{0,2})").unwrap().is_nullable());
    assert!(!parse("a+").unwrap().is_nullable());
    assert!(!parse("ab?").unwrap().is_nullable());
}

#[test]
fn invalid_pattern_test() {
    for pattern in ["(a", "[abc", "a{", "a{2,1}", "*", "+a|*", "a\\", "[z-a]", "[]a"] {
        match parse(pattern) {
            Ok(expr) => panic!("pattern '{}' should be rejected, got {:?}", pattern, expr),
            Err(err) => println!("'{}': {}", pattern, err),
        }
    }
}

#[test]
fn block_comment_pattern_test() {
    let nfa = compile(r"/\*([^*]|\*+[^*/])*\*+/");
    assert_eq!(nfa.match_length("/* a * b */ rest"), Some(11));
    assert_eq!(nfa.match_length("/**/"), Some(4));
    assert_eq!(nfa.match_length("/* open"), None);
}

#[test]
fn oracle_agreement_test() {
    // Cross-check against the regex crate on dialect patterns both engines accept and
    // where leftmost-greedy and longest-overall coincide.
    let patterns = [
        r"[0-9]+",
        r"[a-z]+[0-9]*",
        r"(foo|bar)+",
        r"\d{2,4}",
        r"[A-Za-z_][A-Za-z0-9_]*",
        r"-?[0-9]+(\.[0-9]+)?",
        r"'[^'\n]*'",
    ];
    let inputs = [
        "1234x",
        "abc123",
        "foobarfoo!",
        "12345",
        "ident_9 more",
        "-12.5e",
        "'quoted' tail",
        "",
        "   ",
        "x",
    ];
    for pattern in patterns {
        let ours = compile(pattern);
        let oracle = regex::Regex::new(&format!("^(?:{})", pattern)).unwrap();
        for input in inputs {
            let expected = oracle.find(input).map(|m| m.end());
            let expected = match expected {
                // The engine rejects empty matches as no match at all.
                Some(0) => None,
                other => other,
            };
            let found = match ours.match_length(input) {
                Some(0) => None,
                other => other,
            };
            assert_eq!(
                found, expected,
                "pattern '{}' disagrees with the oracle on '{}'",
                pattern, input
            );
        }
    }
}
