use crate::Grammar;
use std::sync::Arc;

/// A JSON grammar. Punctuation is referenced from the productions by its quoted image,
/// which resolves through the literal pattern index.
pub const JSON_GRAMMAR: &str = r#"
%header%
GRAMMARTYPE = "LL"
DESCRIPTION = "JSON data"

%tokens%
LBRACE = "{"
RBRACE = "}"
LBRACKET = "["
RBRACKET = "]"
COMMA = ","
COLON = ":"
TRUE = "true"
FALSE = "false"
NULL = "null"
STRING = <<"([^"\\]|\\.)*">>
NUMBER = <<-?[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?>>
WHITESPACE = <<\s+>> ignore

%productions%
Value = STRING | NUMBER | Object | Array | TRUE | FALSE | NULL ;
Object = "{" [Member {"," Member}] "}" ;
Member = STRING ":" Value ;
Array = "[" [Value {"," Value}] "]" ;
"#;

/// The JSON grammar, parsed from [JSON_GRAMMAR].
pub fn json_grammar() -> Arc<Grammar> {
    Arc::new(Grammar::parse(JSON_GRAMMAR).expect("the JSON grammar is well formed"))
}
