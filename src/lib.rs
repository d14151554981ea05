//! Language parsing tool (lang_llk) is a library to build tokenizers and LL(k) recursive descent
//! parsers from a grammar description, and to parse text into a parse tree ([Node]).
//!
//! # Overview
//! A parser is usually developed either by writing custom code by hand or using a parser generator
//! tool. With a parser generator, the grammar for the language is written in a small grammar
//! language describing tokens and productions, and the tool turns it into a working parser.
//! This library is the runtime of such a tool: it ingests a grammar — either assembled through the
//! [Grammar] API or read from a grammar source file — checks that the grammar is deterministic for
//! top-down parsing with k tokens of look-ahead, and then tokenizes and parses inputs with it.
//!
//! # Design
//!
//! A [Grammar] owns a set of [TokenPattern]s (literal strings or regular expressions) and a set of
//! [ProductionPattern]s (alternatives of quantified elements referencing other patterns by id).
//! Preparing the grammar computes a [LookaheadSet] for every production alternative — the token
//! sequences of length at most k that select it — and rejects the grammar if two alternatives
//! overlap or if a production is left recursive. The [Parser] then drives a longest-match
//! [Tokenizer] and selects alternatives by peeking at upcoming tokens, never backtracking.
//! Tree construction is delegated to an [IAnalyzer]: a visitor receiving `enter`, `child` and
//! `exit` callbacks which may build the tree verbatim, transform nodes, or discard them.
//!
//! # Example
//!
//! Following is an arithmetic expression parser implemented with lang_llk.
//! ```
//! use lang_llk::{Grammar, Parser, PatternKind, ProductionPattern, ProductionPatternAlternative,
//!     ProductionPatternElement, TokenPattern};
//! use std::sync::Arc;
//!
//! // # Tokens
//!
//! let mut grammar = Grammar::new();
//! grammar
//!     .add_token(TokenPattern::new(1001, "NUMBER", PatternKind::Regexp, "[0-9]+").unwrap())
//!     .unwrap();
//! grammar
//!     .add_token(TokenPattern::new(1002, "PLUS", PatternKind::Literal, "+").unwrap())
//!     .unwrap();
//! grammar
//!     .add_token(TokenPattern::new(1003, "TIMES", PatternKind::Literal, "*").unwrap())
//!     .unwrap();
//! let mut whitespace = TokenPattern::new(1004, "WS", PatternKind::Regexp, r"\s+").unwrap();
//! whitespace.set_ignore(None).unwrap();
//! grammar.add_token(whitespace).unwrap();
//!
//! // # Productions
//! //
//! // Expr = Term {PLUS Term} ;
//! // Term = NUMBER {TIMES NUMBER} ;
//!
//! let mut expr = ProductionPattern::new(2001, "Expr");
//! expr.add_alternative(ProductionPatternAlternative::new(vec![
//!     ProductionPatternElement::production(2002, 1, 1).unwrap(),
//!     ProductionPatternElement::production(3001, 0, usize::MAX).unwrap(),
//! ]));
//! let mut expr_rest = ProductionPattern::synthetic(3001, "Expr#1");
//! expr_rest.add_alternative(ProductionPatternAlternative::new(vec![
//!     ProductionPatternElement::token(1002, 1, 1).unwrap(),
//!     ProductionPatternElement::production(2002, 1, 1).unwrap(),
//! ]));
//! let mut term = ProductionPattern::new(2002, "Term");
//! term.add_alternative(ProductionPatternAlternative::new(vec![
//!     ProductionPatternElement::token(1001, 1, 1).unwrap(),
//!     ProductionPatternElement::production(3002, 0, usize::MAX).unwrap(),
//! ]));
//! let mut term_rest = ProductionPattern::synthetic(3002, "Term#1");
//! term_rest.add_alternative(ProductionPatternAlternative::new(vec![
//!     ProductionPatternElement::token(1003, 1, 1).unwrap(),
//!     ProductionPatternElement::token(1001, 1, 1).unwrap(),
//! ]));
//! grammar.add_production(expr).unwrap();
//! grammar.add_production(term).unwrap();
//! grammar.add_production(expr_rest).unwrap();
//! grammar.add_production(term_rest).unwrap();
//!
//! // # Parsing
//!
//! let grammar = Arc::new(grammar);
//! let mut parser = Parser::new(&grammar, "1 + 2 * 3").unwrap();
//! let tree = parser.parse().unwrap();
//!
//! assert_eq!(tree.name(), "Expr");
//! assert_eq!(tree.children().len(), 3);
//! ```
//!
//! The same grammar can also be written in grammar source form and loaded with
//! [Grammar::parse] — see the [examples] module.

mod analyzer;
mod buffer;
mod error;
pub mod examples;
mod grammar;
mod log;
mod lookahead;
mod node;
mod parser;
mod pattern;
mod position;
mod reader;
mod regexp;
mod tokenizer;
mod trie;

use once_cell::sync::OnceCell;
use once_cell::unsync::OnceCell as UnsyncOnceCell;
use std::collections::{HashMap, VecDeque};
use std::io::Read;
use std::sync::Arc;

/// First token pattern id assigned by convention when reading a grammar source file.
pub const TOKEN_PATTERN_BASE: usize = 1001;
/// First production pattern id assigned by convention when reading a grammar source file.
pub const PRODUCTION_PATTERN_BASE: usize = 2001;
/// First synthetic production id, used for `(…)`, `[…]` and `{…}` sub-expressions.
pub const SYNTHETIC_PATTERN_BASE: usize = 3001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// The two kinds of token pattern text: an exact string or a regular expression.
pub enum PatternKind {
    Literal,
    Regexp,
}

/// A token pattern matched by the [Tokenizer].
///
/// A pattern is identified by a unique id and a unique name, and carries either a literal
/// string or a regular expression in the dialect documented on [Tokenizer]. The optional
/// *ignore* flag discards matches (whitespace, comments), while the *error* flag turns a
/// match into a parse error carrying the attached message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPattern {
    id: usize,
    name: String,
    kind: PatternKind,
    image: String,
    ignore: bool,
    ignore_message: Option<String>,
    error: bool,
    error_message: Option<String>,
}

/// A production pattern: one or more alternatives of quantified elements.
///
/// The *synthetic* flag marks productions generated for parenthesized, optional or repeated
/// sub-expressions; the parser flattens their children into the enclosing node.
#[derive(Debug, PartialEq, Eq)]
pub struct ProductionPattern {
    id: usize,
    name: String,
    synthetic: bool,
    alternatives: Vec<ProductionPatternAlternative>,
}

/// One alternative of a [ProductionPattern]: an ordered, non-empty element sequence.
///
/// The look-ahead set is attached by grammar preparation and selects this alternative
/// during parsing.
#[derive(Debug, PartialEq, Eq)]
pub struct ProductionPatternAlternative {
    elements: Vec<ProductionPatternElement>,
    lookahead: OnceCell<LookaheadSet>,
}

/// A quantified reference to a token or production pattern inside an alternative.
///
/// `max == usize::MAX` encodes an unbounded repetition. The usual quantifier combinations
/// are `(1,1)`, `(0,1)`, `(0,∞)` and `(1,∞)`, but any `min <= max` with `max > 0` is
/// accepted.
#[derive(Debug, PartialEq, Eq)]
pub struct ProductionPatternElement {
    id: usize,
    token: bool,
    min: usize,
    max: usize,
    lookahead: OnceCell<LookaheadSet>,
}

/// A grammar: token patterns, production patterns and header declarations.
///
/// A grammar is assembled with [add_token](Grammar::add_token) and
/// [add_production](Grammar::add_production), or read from grammar source text with
/// [Grammar::parse], and is frozen by [prepare](Grammar::prepare), which computes the
/// look-ahead tables. A prepared grammar is immutable and may be shared between threads
/// behind an [Arc]; every [Parser] created from it reuses the same tables. The first added
/// production is the start symbol.
#[derive(Debug, Default, PartialEq)]
pub struct Grammar {
    declarations: Vec<(String, String)>,
    tokens: Vec<Arc<TokenPattern>>,
    productions: Vec<Arc<ProductionPattern>>,
    ids: HashMap<usize, PatternEntry>,
    names: HashMap<String, usize>,
    literals: HashMap<String, usize>,
    prepared: OnceCell<()>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PatternEntry {
    Token(usize),
    Production(usize),
}

/// A token produced by the [Tokenizer]: the matched pattern, its image and its position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pattern: Arc<TokenPattern>,
    image: String,
    line: usize,
    column: usize,
}

/// A parse tree node: either a [Token] leaf or an inner production node.
///
/// The tree is a strict arborescence: every node owns its children and holds no
/// back-pointers. Tokens own their image; production nodes own an ordered child list and a
/// list of [NodeValue] slots written by analyzers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Token(Token),
    Production(ProductionNode),
}

/// The inner-node variant of [Node], created for every production invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductionNode {
    pattern: Arc<ProductionPattern>,
    line: usize,
    column: usize,
    children: Vec<Node>,
    values: Vec<NodeValue>,
}

/// A typed value stored in a node value slot by an analyzer.
///
/// Reading a slot with the wrong accessor is a contract violation and raises an
/// internal-error [ParseError].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeValue {
    Str(String),
    Int(i64),
    Node(Box<Node>),
    Raw(String, Vec<u8>),
}

/// A set of token-id sequences of bounded length, computed by grammar preparation.
///
/// For k = 1 the set degenerates to a set of single token ids; for larger k the sequences
/// keep the disjointness test between alternatives cheap. A sequence that is a prefix of a
/// sequence in another set counts as an overlap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookaheadSet {
    max_length: usize,
    sequences: Vec<Vec<usize>>,
}

/// A rewindable character window over an input source.
///
/// Characters are read lazily in chunks as peeks demand them; consuming advances the
/// tracked line and column (1-based, `\r\n` counts as a single line break).
pub struct CharBuffer {
    source: Option<Box<dyn Read>>,
    chars: VecDeque<char>,
    pending: Vec<u8>,
    eof: bool,
    failed: bool,
    line: usize,
    column: usize,
}

/// A longest-match tokenizer over a set of [TokenPattern]s.
///
/// At every position all registered patterns are attempted in a single left-to-right pass;
/// the longest match wins and ties go to the pattern registered first. Ignored patterns are
/// skipped silently, error patterns produce a parse error, and an unmatched character is
/// consumed and reported so that scanning always makes progress.
///
/// # Regular expression dialect
///
/// Character literals with `\` escapes, classes `[...]` with ranges and negation, `.`,
/// alternation `|`, grouping `()`, quantifiers `?`, `*`, `+`, `{m}`, `{m,n}`, `{m,}` and the
/// meta escapes `\d \D \s \S \w \W \n \r \t`. Matching is anchored at the current position
/// and reports the longest matching prefix.
pub struct Tokenizer {
    patterns: Vec<Arc<TokenPattern>>,
    automata: Vec<(usize, regexp::Nfa)>,
    literals: trie::LiteralTrie,
    case_sensitive: bool,
    buffer: CharBuffer,
    queue: VecDeque<Result<Token, ParseError>>,
    finished: bool,
    log: UnsyncOnceCell<Log<&'static str>>,
}

/// A table-driven recursive descent parser over a prepared [Grammar].
///
/// The parser owns a [Tokenizer] for its current input and delegates tree shaping to an
/// [IAnalyzer]. Parse errors are collected in a log so that a single run can report several
/// of them; the log is returned as the `Err` value when non-empty.
pub struct Parser {
    grammar: Arc<Grammar>,
    tokenizer: Tokenizer,
    errors: Vec<ParseError>,
    consumed: usize,
    halted: bool,
    log: UnsyncOnceCell<Log<&'static str>>,
}

/// The tree shaping mode of an [IAnalyzer].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Children are attached to their parent as returned; the full tree is built.
    Build,
    /// Like [Build](Strategy::Build), but `exit` is expected to substitute nodes.
    Transform,
    /// No tree is retained; callbacks are used for their side effects only.
    Analyze,
}

/// A visitor invoked during parse tree construction.
///
/// For every production node the parser calls [enter](IAnalyzer::enter) once, then
/// [child](IAnalyzer::child) once per produced child in left-to-right order (with `None`
/// when a sub-analyzer dropped the child), then [exit](IAnalyzer::exit) once. Token leaves
/// receive `enter` and `exit` only. Errors returned from callbacks are collected in the
/// parser's error log and parsing continues.
pub trait IAnalyzer {
    /// The tree shaping mode; the default implementations of `child` and `exit` honor it.
    fn strategy(&self) -> Strategy {
        Strategy::Build
    }

    /// Called before any child of `node` is visited.
    fn enter(&mut self, node: &Node) -> Result<(), ParseError> {
        let _ = node;
        Ok(())
    }

    /// Called once per child; the default attaches the child to the parent.
    fn child(&mut self, parent: &mut ProductionNode, child: Option<Node>) -> Result<(), ParseError> {
        if let Strategy::Analyze = self.strategy() {
            return Ok(());
        }
        if let Some(node) = child {
            parent.add_child(node);
        }
        Ok(())
    }

    /// Called after all children; returning `None` drops the node from the tree.
    fn exit(&mut self, node: Node) -> Result<Option<Node>, ParseError> {
        match self.strategy() {
            Strategy::Analyze => Ok(None),
            _ => Ok(Some(node)),
        }
    }
}

/// The default analyzer: builds the parse tree verbatim.
#[derive(Debug, Default)]
pub struct TreeBuilder;

/// An [Analyze](Strategy::Analyze) analyzer writing the text serialization of the visited
/// tree, one node per line with two spaces of indentation per level.
#[derive(Debug, Default)]
pub struct TreePrinter {
    depth: usize,
    output: String,
}

/// An error raised while assembling a [Grammar].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    /// A pattern id is already taken.
    DuplicateId(usize),
    /// A pattern name is already taken under canonicalization.
    DuplicateName(String),
    /// An element references an id or name not defined in the grammar.
    UnknownReference { production: String, reference: String },
    /// A production was added without alternatives, or with an empty alternative.
    EmptyProduction(String),
    /// An element quantifier with `min > max`, or `max == 0`.
    InvalidQuantifier { min: usize, max: usize },
    /// The grammar declares a `GRAMMARTYPE` other than `"LL"`.
    UnsupportedGrammarType(String),
    /// The grammar defines no production.
    MissingProduction,
    /// The grammar was already prepared and can no longer be modified.
    Frozen,
    /// A syntax or semantic error in grammar source text.
    Syntax { line: usize, column: usize, message: String },
    /// The grammar source file could not be read.
    Io(String),
}

/// An error raised while preparing a grammar for parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParserCreationError {
    /// A token pattern is invalid: empty literal, invalid or empty-matching regex,
    /// conflicting flags, or a duplicate literal image.
    InvalidPattern { name: String, message: String },
    /// Two alternatives of a production share a look-ahead sequence at every tried k.
    Ambiguity { production: String, tokens: Vec<String> },
    /// A production is left recursive, directly or indirectly.
    LeftRecursion(String),
    /// A grammar-level validation failure detected during preparation.
    Grammar(GrammarError),
}

/// The kind payload of a [ParseError].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// No token pattern matched; the offending character was consumed.
    UnexpectedChar(char),
    /// No production alternative or mandatory element matched the upcoming token.
    UnexpectedToken { found: String, expected: Vec<String> },
    /// The input ended where more tokens were required.
    UnexpectedEof { expected: Vec<String> },
    /// An error-flagged token pattern matched; carries the pattern message or the image.
    InvalidToken(String),
    /// An error raised from an [IAnalyzer] callback.
    Analysis(String),
    /// A contract violation in a node accessor; never caused by input text.
    Internal(String),
    /// The input source failed to deliver characters.
    Io(String),
}

/// An error raised during tokenization or parsing, with its input position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    kind: ParseErrorKind,
    position: Position,
}

/// The collected parse errors of a single run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseLog {
    errors: Vec<ParseError>,
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
/// The line and column information at an input position, both 1-based.
pub struct Position {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
/// A enum structure to assign multiple level debugging to the tokenizer and the parser.
pub enum Log<T> {
    None,
    Default(T),
    Success(T),
    Result(T),
    Verbose(T),
}
