use crate::{ParseErrorKind, TokenPattern, Tokenizer};
use std::sync::Arc;

fn literal(id: usize, name: &str, image: &str) -> Arc<TokenPattern> {
    Arc::new(TokenPattern::literal(id, name, image).unwrap())
}

fn regexp(id: usize, name: &str, image: &str) -> Arc<TokenPattern> {
    Arc::new(TokenPattern::regexp(id, name, image).unwrap())
}

#[test]
fn longest_match_test() {
    let mut tokenizer = Tokenizer::new("a+++b", true);
    tokenizer.add_pattern(regexp(1001, "ID", "[a-z]+")).unwrap();
    tokenizer.add_pattern(literal(1002, "PLUS", "+")).unwrap();
    tokenizer
        .add_pattern(literal(1003, "PLUSPLUS", "++"))
        .unwrap();

    let mut names = Vec::new();
    while let Some(token) = tokenizer.next().unwrap() {
        names.push(format!("{}:{}", token.name(), token.image()));
    }
    assert_eq!(names, vec!["ID:a", "PLUSPLUS:++", "PLUS:+", "ID:b"]);
}

#[test]
fn registration_order_tie_break_test() {
    // Keyword first: the keyword wins the tie on "while".
    let mut tokenizer = Tokenizer::new("while x", true);
    tokenizer.add_pattern(literal(1001, "WHILE", "while")).unwrap();
    tokenizer.add_pattern(regexp(1002, "ID", "[a-z]+")).unwrap();
    tokenizer.add_pattern(regexp(1003, "WS", r"\s+")).unwrap();
    let first = tokenizer.next().unwrap().unwrap();
    assert_eq!(first.name(), "WHILE");

    // Identifier first: the identifier wins instead.
    let mut tokenizer = Tokenizer::new("while x", true);
    tokenizer.add_pattern(regexp(1002, "ID", "[a-z]+")).unwrap();
    tokenizer.add_pattern(literal(1001, "WHILE", "while")).unwrap();
    tokenizer.add_pattern(regexp(1003, "WS", r"\s+")).unwrap();
    let first = tokenizer.next().unwrap().unwrap();
    assert_eq!(first.name(), "ID");
}

#[test]
fn ignore_and_error_flags_test() {
    let mut comment = TokenPattern::regexp(1001, "COMMENT", "//.*").unwrap();
    comment.set_ignore(None).unwrap();
    let mut bad = TokenPattern::regexp(1002, "BAD", "@").unwrap();
    bad.set_error(Some("illegal".into())).unwrap();
    let mut whitespace = TokenPattern::regexp(1003, "WS", r"\s+").unwrap();
    whitespace.set_ignore(None).unwrap();

    let mut tokenizer = Tokenizer::new("// hi\n@", true);
    tokenizer.add_pattern(Arc::new(comment)).unwrap();
    tokenizer.add_pattern(Arc::new(bad)).unwrap();
    tokenizer.add_pattern(Arc::new(whitespace)).unwrap();

    let error = tokenizer.next().unwrap_err();
    assert_eq!(error.kind(), &ParseErrorKind::InvalidToken("illegal".into()));
    assert_eq!((error.line(), error.column()), (2, 1));
    assert_eq!(tokenizer.next().unwrap(), None);
}

#[test]
fn conflicting_flags_test() {
    let mut pattern = TokenPattern::literal(1001, "X", "x").unwrap();
    pattern.set_ignore(None).unwrap();
    assert!(pattern.set_error(None).is_err());
}

#[test]
fn unexpected_character_test() {
    let mut tokenizer = Tokenizer::new("1a2", true);
    tokenizer.add_pattern(regexp(1001, "NUMBER", "[0-9]+")).unwrap();

    let first = tokenizer.next().unwrap().unwrap();
    assert_eq!(first.image(), "1");
    let error = tokenizer.next().unwrap_err();
    assert_eq!(error.kind(), &ParseErrorKind::UnexpectedChar('a'));
    // The offending character was consumed, so scanning continues behind it.
    let next = tokenizer.next().unwrap().unwrap();
    assert_eq!(next.image(), "2");
    assert_eq!(tokenizer.next().unwrap(), None);
}

#[test]
fn case_insensitive_test() {
    let mut tokenizer = Tokenizer::new("WHILE While", false);
    tokenizer.add_pattern(literal(1001, "KW", "while")).unwrap();
    tokenizer.add_pattern(regexp(1002, "WS", r"\s+")).unwrap();

    let first = tokenizer.next().unwrap().unwrap();
    assert_eq!(first.name(), "KW");
    // The image keeps the original spelling.
    assert_eq!(first.image(), "WHILE");
    let second = tokenizer.next().unwrap().unwrap();
    assert_eq!(second.image(), "While");
}

#[test]
fn peek_does_not_consume_test() {
    let mut tokenizer = Tokenizer::new("1 2 3", true);
    tokenizer.add_pattern(regexp(1001, "NUMBER", "[0-9]+")).unwrap();
    let mut whitespace = TokenPattern::regexp(1002, "WS", r"\s+").unwrap();
    whitespace.set_ignore(None).unwrap();
    tokenizer.add_pattern(Arc::new(whitespace)).unwrap();

    assert_eq!(tokenizer.peek(2).unwrap().image(), "2");
    assert_eq!(tokenizer.peek(3).unwrap().image(), "3");
    assert_eq!(tokenizer.peek(4), None);
    assert_eq!(tokenizer.peek(1).unwrap().image(), "1");

    let mut images = Vec::new();
    while let Some(token) = tokenizer.next().unwrap() {
        images.push(token.image().to_string());
    }
    assert_eq!(images, vec!["1", "2", "3"]);
}

#[test]
fn position_monotonicity_test() {
    let mut tokenizer = Tokenizer::new("one two\nthree\n  four", true);
    tokenizer.add_pattern(regexp(1001, "WORD", "[a-z]+")).unwrap();
    let mut whitespace = TokenPattern::regexp(1002, "WS", r"\s+").unwrap();
    whitespace.set_ignore(None).unwrap();
    tokenizer.add_pattern(Arc::new(whitespace)).unwrap();

    let mut previous = (0, 0);
    let mut count = 0;
    while let Some(token) = tokenizer.next().unwrap() {
        let position = (token.line(), token.column());
        assert!(
            previous < position,
            "token {:?} does not advance past {:?}",
            position,
            previous
        );
        previous = position;
        count += 1;
    }
    assert_eq!(count, 4);
    assert_eq!(previous, (3, 3));
}

#[test]
fn crlf_counts_once_test() {
    let mut tokenizer = Tokenizer::new("a\r\nb", true);
    tokenizer.add_pattern(regexp(1001, "WORD", "[a-z]+")).unwrap();
    let mut whitespace = TokenPattern::regexp(1002, "WS", r"\s+").unwrap();
    whitespace.set_ignore(None).unwrap();
    tokenizer.add_pattern(Arc::new(whitespace)).unwrap();

    let first = tokenizer.next().unwrap().unwrap();
    assert_eq!((first.line(), first.column()), (1, 1));
    let second = tokenizer.next().unwrap().unwrap();
    assert_eq!((second.line(), second.column()), (2, 1));
}

#[test]
fn reset_test() {
    let mut tokenizer = Tokenizer::new("abc", true);
    tokenizer.add_pattern(regexp(1001, "WORD", "[a-z]+")).unwrap();

    assert_eq!(tokenizer.next().unwrap().unwrap().image(), "abc");
    assert_eq!(tokenizer.next().unwrap(), None);

    tokenizer.reset("xyz");
    let token = tokenizer.next().unwrap().unwrap();
    assert_eq!(token.image(), "xyz");
    assert_eq!((token.line(), token.column()), (1, 1));
}

#[test]
fn duplicate_literal_test() {
    let mut tokenizer = Tokenizer::new("x", true);
    tokenizer.add_pattern(literal(1001, "A", "x")).unwrap();
    let error = tokenizer.add_pattern(literal(1002, "B", "x")).unwrap_err();
    println!("{}", error);
}

#[test]
fn empty_literal_rejected_test() {
    assert!(TokenPattern::literal(1001, "EMPTY", "").is_err());
    assert!(TokenPattern::regexp(1002, "NULLABLE", "a*").is_err());
    assert!(TokenPattern::regexp(1003, "BROKEN", "(a").is_err());
}
