//! The grammar source-file reader.
//!
//! The grammar language is itself an LL(1) grammar, so it is parsed with this very
//! runtime: a bootstrap [Grammar] describes the three-section file format, and a
//! [GrammarReader] walks the resulting parse tree to assemble the target grammar,
//! generating synthetic productions for `(…)`, `[…]` and `{…}` sub-expressions.

use crate::{
    Grammar, GrammarError, Node, ParseError, ParseLog, Parser, ParserCreationError,
    ProductionPattern, ProductionPatternAlternative, ProductionPatternElement, PatternKind,
    TokenPattern, PRODUCTION_PATTERN_BASE, SYNTHETIC_PATTERN_BASE, TOKEN_PATTERN_BASE,
};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;

/// Pattern ids of the bootstrap grammar. Literal keywords precede `IDENTIFIER` so that the
/// registration-order tie break keeps them from being read as plain identifiers.
mod ids {
    pub const WHITESPACE: usize = 1001;
    pub const LINE_COMMENT: usize = 1002;
    pub const BLOCK_COMMENT: usize = 1003;
    pub const HEADER: usize = 1004;
    pub const TOKENS: usize = 1005;
    pub const PRODUCTIONS: usize = 1006;
    pub const IGNORE: usize = 1007;
    pub const ERROR: usize = 1008;
    pub const EQUALS: usize = 1009;
    pub const SEMICOLON: usize = 1010;
    pub const PIPE: usize = 1011;
    pub const LPAREN: usize = 1012;
    pub const RPAREN: usize = 1013;
    pub const LBRACKET: usize = 1014;
    pub const RBRACKET: usize = 1015;
    pub const LBRACE: usize = 1016;
    pub const RBRACE: usize = 1017;
    pub const QUESTION: usize = 1018;
    pub const STAR: usize = 1019;
    pub const PLUS: usize = 1020;
    pub const IDENTIFIER: usize = 1021;
    pub const QUOTED: usize = 1022;
    pub const REGEXP: usize = 1023;
    pub const UNTERMINATED: usize = 1024;

    pub const GRAMMAR: usize = 2001;
    pub const HEADER_PART: usize = 2002;
    pub const HEADER_DECL: usize = 2003;
    pub const TOKEN_PART: usize = 2004;
    pub const TOKEN_DECL: usize = 2005;
    pub const TOKEN_VALUE: usize = 2006;
    pub const TOKEN_HANDLING: usize = 2007;
    pub const PRODUCTION_PART: usize = 2008;
    pub const PRODUCTION_DECL: usize = 2009;
    pub const PRODUCTION_RHS: usize = 2010;
    pub const PRODUCTION_ALT: usize = 2011;
    pub const PRODUCTION_ATOM: usize = 2012;

    pub const RHS_TAIL: usize = 3001;
    pub const QUANTIFIER: usize = 3002;
}

static BOOTSTRAP: Lazy<Arc<Grammar>> = Lazy::new(|| {
    Arc::new(build_bootstrap().expect("the grammar language grammar is well formed"))
});

fn build_bootstrap() -> Result<Grammar, ParserCreationError> {
    let mut grammar = Grammar::new();

    let mut whitespace = TokenPattern::regexp(ids::WHITESPACE, "WHITESPACE", r"\s+")?;
    whitespace.set_ignore(None)?;
    grammar.add_token(whitespace)?;
    let mut line_comment = TokenPattern::regexp(ids::LINE_COMMENT, "LINE_COMMENT", "//.*")?;
    line_comment.set_ignore(None)?;
    grammar.add_token(line_comment)?;
    let mut block_comment = TokenPattern::regexp(
        ids::BLOCK_COMMENT,
        "BLOCK_COMMENT",
        r"/\*([^*]|\*+[^*/])*\*+/",
    )?;
    block_comment.set_ignore(None)?;
    grammar.add_token(block_comment)?;

    grammar.add_token(TokenPattern::literal(ids::HEADER, "HEADER", "%header%")?)?;
    grammar.add_token(TokenPattern::literal(ids::TOKENS, "TOKENS", "%tokens%")?)?;
    grammar.add_token(TokenPattern::literal(
        ids::PRODUCTIONS,
        "PRODUCTIONS",
        "%productions%",
    )?)?;
    grammar.add_token(TokenPattern::literal(ids::IGNORE, "IGNORE", "ignore")?)?;
    grammar.add_token(TokenPattern::literal(ids::ERROR, "ERROR", "error")?)?;
    grammar.add_token(TokenPattern::literal(ids::EQUALS, "EQUALS", "=")?)?;
    grammar.add_token(TokenPattern::literal(ids::SEMICOLON, "SEMICOLON", ";")?)?;
    grammar.add_token(TokenPattern::literal(ids::PIPE, "PIPE", "|")?)?;
    grammar.add_token(TokenPattern::literal(ids::LPAREN, "LPAREN", "(")?)?;
    grammar.add_token(TokenPattern::literal(ids::RPAREN, "RPAREN", ")")?)?;
    grammar.add_token(TokenPattern::literal(ids::LBRACKET, "LBRACKET", "[")?)?;
    grammar.add_token(TokenPattern::literal(ids::RBRACKET, "RBRACKET", "]")?)?;
    grammar.add_token(TokenPattern::literal(ids::LBRACE, "LBRACE", "{")?)?;
    grammar.add_token(TokenPattern::literal(ids::RBRACE, "RBRACE", "}")?)?;
    grammar.add_token(TokenPattern::literal(ids::QUESTION, "QUESTION", "?")?)?;
    grammar.add_token(TokenPattern::literal(ids::STAR, "STAR", "*")?)?;
    grammar.add_token(TokenPattern::literal(ids::PLUS, "PLUS", "+")?)?;
    grammar.add_token(TokenPattern::regexp(
        ids::IDENTIFIER,
        "IDENTIFIER",
        "[A-Za-z][A-Za-z0-9_]*",
    )?)?;
    grammar.add_token(TokenPattern::regexp(
        ids::QUOTED,
        "QUOTED",
        r#""[^"\n]*"|'[^'\n]*'"#,
    )?)?;
    grammar.add_token(TokenPattern::regexp(
        ids::REGEXP,
        "REGEXP",
        "<<([^>]|>[^>])*>?>>",
    )?)?;
    let mut unterminated =
        TokenPattern::regexp(ids::UNTERMINATED, "UNTERMINATED", "%[A-Za-z]*%?")?;
    unterminated.set_error(Some("unterminated directive".into()))?;
    grammar.add_token(unterminated)?;

    let one = |id: usize| ProductionPatternElement::production(id, 1, 1);
    let tok = |id: usize| ProductionPatternElement::token(id, 1, 1);

    let mut root = ProductionPattern::new(ids::GRAMMAR, "Grammar");
    root.add_alternative(ProductionPatternAlternative::new(vec![
        ProductionPatternElement::production(ids::HEADER_PART, 0, 1)?,
        one(ids::TOKEN_PART)?,
        one(ids::PRODUCTION_PART)?,
    ]));
    grammar.add_production(root)?;

    let mut header_part = ProductionPattern::new(ids::HEADER_PART, "HeaderPart");
    header_part.add_alternative(ProductionPatternAlternative::new(vec![
        tok(ids::HEADER)?,
        ProductionPatternElement::production(ids::HEADER_DECL, 0, usize::MAX)?,
    ]));
    grammar.add_production(header_part)?;

    let mut header_decl = ProductionPattern::new(ids::HEADER_DECL, "HeaderDeclaration");
    header_decl.add_alternative(ProductionPatternAlternative::new(vec![
        tok(ids::IDENTIFIER)?,
        tok(ids::EQUALS)?,
        tok(ids::QUOTED)?,
    ]));
    grammar.add_production(header_decl)?;

    let mut token_part = ProductionPattern::new(ids::TOKEN_PART, "TokenPart");
    token_part.add_alternative(ProductionPatternAlternative::new(vec![
        tok(ids::TOKENS)?,
        ProductionPatternElement::production(ids::TOKEN_DECL, 0, usize::MAX)?,
    ]));
    grammar.add_production(token_part)?;

    let mut token_decl = ProductionPattern::new(ids::TOKEN_DECL, "TokenDeclaration");
    token_decl.add_alternative(ProductionPatternAlternative::new(vec![
        tok(ids::IDENTIFIER)?,
        tok(ids::EQUALS)?,
        one(ids::TOKEN_VALUE)?,
        ProductionPatternElement::production(ids::TOKEN_HANDLING, 0, 1)?,
    ]));
    grammar.add_production(token_decl)?;

    let mut token_value = ProductionPattern::new(ids::TOKEN_VALUE, "TokenValue");
    token_value.add_alternative(ProductionPatternAlternative::new(vec![tok(ids::QUOTED)?]));
    token_value.add_alternative(ProductionPatternAlternative::new(vec![tok(ids::REGEXP)?]));
    grammar.add_production(token_value)?;

    let mut token_handling = ProductionPattern::new(ids::TOKEN_HANDLING, "TokenHandling");
    token_handling.add_alternative(ProductionPatternAlternative::new(vec![
        tok(ids::IGNORE)?,
        ProductionPatternElement::token(ids::QUOTED, 0, 1)?,
    ]));
    token_handling.add_alternative(ProductionPatternAlternative::new(vec![
        tok(ids::ERROR)?,
        ProductionPatternElement::token(ids::QUOTED, 0, 1)?,
    ]));
    grammar.add_production(token_handling)?;

    let mut production_part = ProductionPattern::new(ids::PRODUCTION_PART, "ProductionPart");
    production_part.add_alternative(ProductionPatternAlternative::new(vec![
        tok(ids::PRODUCTIONS)?,
        ProductionPatternElement::production(ids::PRODUCTION_DECL, 0, usize::MAX)?,
    ]));
    grammar.add_production(production_part)?;

    let mut production_decl =
        ProductionPattern::new(ids::PRODUCTION_DECL, "ProductionDeclaration");
    production_decl.add_alternative(ProductionPatternAlternative::new(vec![
        tok(ids::IDENTIFIER)?,
        tok(ids::EQUALS)?,
        one(ids::PRODUCTION_RHS)?,
        tok(ids::SEMICOLON)?,
    ]));
    grammar.add_production(production_decl)?;

    let mut production_rhs = ProductionPattern::new(ids::PRODUCTION_RHS, "ProductionRhs");
    production_rhs.add_alternative(ProductionPatternAlternative::new(vec![
        one(ids::PRODUCTION_ALT)?,
        ProductionPatternElement::production(ids::RHS_TAIL, 0, usize::MAX)?,
    ]));
    grammar.add_production(production_rhs)?;

    let mut rhs_tail = ProductionPattern::synthetic(ids::RHS_TAIL, "ProductionRhs#1");
    rhs_tail.add_alternative(ProductionPatternAlternative::new(vec![
        tok(ids::PIPE)?,
        one(ids::PRODUCTION_ALT)?,
    ]));
    grammar.add_production(rhs_tail)?;

    let mut production_alt = ProductionPattern::new(ids::PRODUCTION_ALT, "ProductionAlternative");
    production_alt.add_alternative(ProductionPatternAlternative::new(vec![
        ProductionPatternElement::production(ids::PRODUCTION_ATOM, 1, usize::MAX)?,
    ]));
    grammar.add_production(production_alt)?;

    let mut production_atom = ProductionPattern::new(ids::PRODUCTION_ATOM, "ProductionAtom");
    production_atom.add_alternative(ProductionPatternAlternative::new(vec![
        tok(ids::IDENTIFIER)?,
        ProductionPatternElement::production(ids::QUANTIFIER, 0, 1)?,
    ]));
    production_atom.add_alternative(ProductionPatternAlternative::new(vec![
        tok(ids::QUOTED)?,
        ProductionPatternElement::production(ids::QUANTIFIER, 0, 1)?,
    ]));
    production_atom.add_alternative(ProductionPatternAlternative::new(vec![
        tok(ids::LPAREN)?,
        one(ids::PRODUCTION_RHS)?,
        tok(ids::RPAREN)?,
        ProductionPatternElement::production(ids::QUANTIFIER, 0, 1)?,
    ]));
    production_atom.add_alternative(ProductionPatternAlternative::new(vec![
        tok(ids::LBRACKET)?,
        one(ids::PRODUCTION_RHS)?,
        tok(ids::RBRACKET)?,
        ProductionPatternElement::production(ids::QUANTIFIER, 0, 1)?,
    ]));
    production_atom.add_alternative(ProductionPatternAlternative::new(vec![
        tok(ids::LBRACE)?,
        one(ids::PRODUCTION_RHS)?,
        tok(ids::RBRACE)?,
        ProductionPatternElement::production(ids::QUANTIFIER, 0, 1)?,
    ]));
    grammar.add_production(production_atom)?;

    let mut quantifier = ProductionPattern::synthetic(ids::QUANTIFIER, "ProductionAtom#1");
    quantifier.add_alternative(ProductionPatternAlternative::new(vec![tok(ids::QUESTION)?]));
    quantifier.add_alternative(ProductionPatternAlternative::new(vec![tok(ids::STAR)?]));
    quantifier.add_alternative(ProductionPatternAlternative::new(vec![tok(ids::PLUS)?]));
    grammar.add_production(quantifier)?;

    Ok(grammar)
}

/// Parse grammar source text into a [Grammar].
pub(crate) fn parse_grammar(text: &str) -> Result<Grammar, GrammarError> {
    let mut parser =
        Parser::new(&BOOTSTRAP, text).expect("the grammar language grammar is well formed");
    let tree = parser.parse().map_err(syntax_error)?;
    GrammarReader::new().read(&tree)
}

fn syntax_error(log: ParseLog) -> GrammarError {
    match log.first() {
        Some(error) => GrammarError::Syntax {
            line: error.line(),
            column: error.column(),
            message: error.message(),
        },
        None => GrammarError::Syntax {
            line: 0,
            column: 0,
            message: "unreadable grammar".into(),
        },
    }
}

fn node_error(error: ParseError) -> GrammarError {
    GrammarError::Syntax {
        line: error.line(),
        column: error.column(),
        message: error.message(),
    }
}

fn leaf_image(node: &Node) -> &str {
    match node {
        Node::Token(token) => token.image(),
        Node::Production(_) => "",
    }
}

/// Strip the surrounding quotes of a QUOTED image.
fn unquote(image: &str) -> &str {
    if image.len() >= 2 {
        &image[1..image.len() - 1]
    } else {
        image
    }
}

/// Strip the `<<` and `>>` of a REGEXP image.
fn unwrap_regexp(image: &str) -> &str {
    if image.len() >= 4 {
        &image[2..image.len() - 2]
    } else {
        image
    }
}

/// Assembles the target grammar from the parse tree of a grammar source file.
struct GrammarReader {
    grammar: Grammar,
    next_token_id: usize,
    next_production_id: usize,
    next_synthetic_id: usize,
    declared: HashMap<String, usize>,
    synthetics: Vec<ProductionPattern>,
}

impl GrammarReader {
    fn new() -> Self {
        Self {
            grammar: Grammar::new(),
            next_token_id: TOKEN_PATTERN_BASE,
            next_production_id: PRODUCTION_PATTERN_BASE,
            next_synthetic_id: SYNTHETIC_PATTERN_BASE,
            declared: HashMap::new(),
            synthetics: Vec::new(),
        }
    }

    fn read(mut self, tree: &Node) -> Result<Grammar, GrammarError> {
        for part in tree.children() {
            match part.id() {
                ids::HEADER_PART => self.read_header(part)?,
                ids::TOKEN_PART => self.read_tokens(part)?,
                ids::PRODUCTION_PART => self.read_productions(part)?,
                _ => {}
            }
        }
        Ok(self.grammar)
    }

    fn read_header(&mut self, part: &Node) -> Result<(), GrammarError> {
        for declaration in part.children_with_id(ids::HEADER_DECL) {
            let name = leaf_image(declaration.child_at(0).map_err(node_error)?);
            let value = unquote(leaf_image(declaration.child_at(2).map_err(node_error)?));
            if name.eq_ignore_ascii_case("GRAMMARTYPE") && !value.eq_ignore_ascii_case("LL") {
                return Err(GrammarError::UnsupportedGrammarType(value.to_string()));
            }
            self.grammar.set_declaration(name, value)?;
        }
        Ok(())
    }

    fn read_tokens(&mut self, part: &Node) -> Result<(), GrammarError> {
        for declaration in part.children_with_id(ids::TOKEN_DECL) {
            let name_node = declaration.child_at(0).map_err(node_error)?;
            let name = leaf_image(name_node).to_string();
            let value = declaration
                .child_with_id(ids::TOKEN_VALUE)
                .and_then(|node| node.child_at(0))
                .map_err(node_error)?;
            let (kind, image) = match value.id() {
                ids::REGEXP => (PatternKind::Regexp, unwrap_regexp(leaf_image(value))),
                _ => (PatternKind::Literal, unquote(leaf_image(value))),
            };
            let mut pattern = TokenPattern::new(self.next_token_id, &name, kind, image)
                .map_err(|err| GrammarError::Syntax {
                    line: name_node.line(),
                    column: name_node.column(),
                    message: err.to_string(),
                })?;
            if let Some(handling) = declaration.find_child(ids::TOKEN_HANDLING) {
                let message = handling
                    .find_child(ids::QUOTED)
                    .map(|node| unquote(leaf_image(node)).to_string());
                let result = match handling.children().first().map(Node::id) {
                    Some(ids::ERROR) => pattern.set_error(message),
                    _ => pattern.set_ignore(message),
                };
                result.map_err(|err| GrammarError::Syntax {
                    line: name_node.line(),
                    column: name_node.column(),
                    message: err.to_string(),
                })?;
            }
            self.grammar.add_token(pattern)?;
            self.next_token_id += 1;
        }
        Ok(())
    }

    fn read_productions(&mut self, part: &Node) -> Result<(), GrammarError> {
        let declarations = part.children_with_id(ids::PRODUCTION_DECL);
        // Productions may reference productions declared further down, so their ids are
        // assigned in a first pass before any right-hand side is read.
        for declaration in &declarations {
            let name = leaf_image(declaration.child_at(0).map_err(node_error)?);
            let canonical = crate::grammar::canonical_name(name);
            if self.declared.contains_key(&canonical)
                || self.grammar.pattern_by_name(name).is_some()
            {
                return Err(GrammarError::DuplicateName(name.to_string()));
            }
            self.declared.insert(canonical, self.next_production_id);
            self.next_production_id += 1;
        }
        for declaration in declarations {
            let name = leaf_image(declaration.child_at(0).map_err(node_error)?).to_string();
            let id = self.declared[&crate::grammar::canonical_name(&name)];
            let rhs = declaration
                .child_with_id(ids::PRODUCTION_RHS)
                .map_err(node_error)?;
            let production = self.read_rhs(rhs, &name, ProductionPattern::new(id, &name))?;
            self.grammar.add_production(production)?;
        }
        // Synthetic productions are appended behind the declared ones so that the first
        // declared production stays the start symbol.
        for synthetic in std::mem::take(&mut self.synthetics) {
            self.grammar.add_production(synthetic)?;
        }
        Ok(())
    }

    /// Read the alternatives of a right-hand side into `production`.
    fn read_rhs(
        &mut self,
        rhs: &Node,
        owner: &str,
        mut production: ProductionPattern,
    ) -> Result<ProductionPattern, GrammarError> {
        for alternative in rhs.children_with_id(ids::PRODUCTION_ALT) {
            let mut elements = Vec::new();
            for atom in alternative.children_with_id(ids::PRODUCTION_ATOM) {
                elements.push(self.read_atom(atom, owner)?);
            }
            production.add_alternative(ProductionPatternAlternative::new(elements));
        }
        Ok(production)
    }

    fn read_atom(
        &mut self,
        atom: &Node,
        owner: &str,
    ) -> Result<ProductionPatternElement, GrammarError> {
        let head = atom.child_at(0).map_err(node_error)?;
        let quantifier = atom.children().iter().rev().find_map(|child| match child.id() {
            ids::QUESTION => Some('?'),
            ids::STAR => Some('*'),
            ids::PLUS => Some('+'),
            _ => None,
        });
        let (id, token, min, max) = match head.id() {
            ids::IDENTIFIER => {
                let name = leaf_image(head);
                match self.grammar.token_by_name(name) {
                    Some(pattern) => (pattern.id(), true, 1, 1),
                    None => match self.declared.get(&crate::grammar::canonical_name(name)) {
                        Some(id) => (*id, false, 1, 1),
                        None => {
                            return Err(GrammarError::UnknownReference {
                                production: owner.to_string(),
                                reference: name.to_string(),
                            })
                        }
                    },
                }
            }
            ids::QUOTED => {
                let image = unquote(leaf_image(head));
                match self.grammar.token_by_image(image) {
                    Some(pattern) => (pattern.id(), true, 1, 1),
                    None => {
                        return Err(GrammarError::UnknownReference {
                            production: owner.to_string(),
                            reference: format!("\"{}\"", image),
                        })
                    }
                }
            }
            ids::LPAREN => (self.read_group(atom, owner)?, false, 1, 1),
            ids::LBRACKET => (self.read_group(atom, owner)?, false, 0, 1),
            _ => (self.read_group(atom, owner)?, false, 0, usize::MAX),
        };
        let (min, max) = match quantifier {
            Some('?') => (0, max),
            Some('*') => (0, usize::MAX),
            Some('+') => (min, usize::MAX),
            _ => (min, max),
        };
        let element = if token {
            ProductionPatternElement::token(id, min, max)?
        } else {
            ProductionPatternElement::production(id, min, max)?
        };
        Ok(element)
    }

    /// Turn a grouped sub-expression into a synthetic production and return its id.
    fn read_group(&mut self, atom: &Node, owner: &str) -> Result<usize, GrammarError> {
        let rhs = atom.child_with_id(ids::PRODUCTION_RHS).map_err(node_error)?;
        let id = self.next_synthetic_id;
        self.next_synthetic_id += 1;
        let name = format!("{}#{}", owner, id - SYNTHETIC_PATTERN_BASE + 1);
        let production = self.read_rhs(rhs, owner, ProductionPattern::synthetic(id, &name))?;
        self.synthetics.push(production);
        Ok(id)
    }
}
