use crate::Grammar;
use std::sync::Arc;

/// An arithmetic expression grammar with the usual precedence encoded in the productions.
pub const ARITHMETIC_GRAMMAR: &str = r#"
%header%
GRAMMARTYPE = "LL"
DESCRIPTION = "Arithmetic expressions"

%tokens%
NUMBER = <<[0-9]+>>
PLUS = "+"
TIMES = "*"
LP = "("
RP = ")"
WHITESPACE = <<\s+>> ignore

%productions%
Expr = Term {PLUS Term} ;
Term = Factor {TIMES Factor} ;
Factor = NUMBER | LP Expr RP ;
"#;

/// The arithmetic grammar, parsed from [ARITHMETIC_GRAMMAR].
pub fn arithmetic_grammar() -> Arc<Grammar> {
    Arc::new(Grammar::parse(ARITHMETIC_GRAMMAR).expect("the arithmetic grammar is well formed"))
}
