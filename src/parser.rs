use crate::grammar::PatternRef;
use crate::{
    CharBuffer, Grammar, IAnalyzer, Log, Node, ParseError, ParseErrorKind, ParseLog, Parser,
    ParserCreationError, Position, ProductionNode, ProductionPattern, ProductionPatternElement,
    Token, TreeBuilder,
};
use once_cell::unsync::OnceCell;
use std::sync::Arc;

impl Parser {
    /// Create a parser over `source`, preparing the grammar if it is not prepared yet.
    ///
    /// Preparation is idempotent, so any number of parsers can be created from the same
    /// grammar; they share the computed look-ahead tables.
    pub fn new<S: Into<CharBuffer>>(
        grammar: &Arc<Grammar>,
        source: S,
    ) -> Result<Self, ParserCreationError> {
        grammar.prepare()?;
        let tokenizer = grammar.create_tokenizer(source)?;
        Ok(Self {
            grammar: grammar.clone(),
            tokenizer,
            errors: Vec::new(),
            consumed: 0,
            halted: false,
            log: OnceCell::new(),
        })
    }

    pub fn grammar(&self) -> &Arc<Grammar> {
        &self.grammar
    }

    /// Set a log label to debug the parser based on the level of [Log].
    pub fn set_log(&self, log: Log<&'static str>) -> Result<(), String> {
        self.log
            .set(log)
            .map_err(|err| format!("Log label {} is already assigned.", err))
    }

    /// Rewind to a new input, keeping the prepared grammar and the registered patterns.
    pub fn reset<S: Into<CharBuffer>>(&mut self, source: S) {
        self.tokenizer.reset(source);
        self.errors.clear();
        self.consumed = 0;
        self.halted = false;
    }

    /// Parse the input into a tree with the default building analyzer.
    pub fn parse(&mut self) -> Result<Node, ParseLog> {
        let mut builder = TreeBuilder;
        match self.parse_with(&mut builder)? {
            Some(tree) => Ok(tree),
            None => Err(ParseLog::from(ParseError::internal(
                "the building analyzer returned no tree".into(),
                self.tokenizer.position(),
            ))),
        }
    }

    /// Parse the input, delegating tree construction to `analyzer`.
    ///
    /// Errors are collected while parsing continues past them where possible; a non-empty
    /// log is returned as `Err` at the end. `Ok(None)` means the analyzer dropped the root
    /// node (the [Analyze](crate::Strategy::Analyze) strategy always does).
    pub fn parse_with(
        &mut self,
        analyzer: &mut dyn IAnalyzer,
    ) -> Result<Option<Node>, ParseLog> {
        self.errors.clear();
        self.consumed = 0;
        self.halted = false;
        let start = match self.grammar.start_production() {
            Some(production) => production.clone(),
            None => {
                return Err(ParseLog::from(ParseError::internal(
                    "grammar has no start production".into(),
                    self.tokenizer.position(),
                )))
            }
        };
        let tree = self.parse_production(&start, analyzer);
        if !self.halted {
            self.drain_tokenizer_errors();
            if let Some(token) = self.tokenizer.peek(1) {
                let error = ParseError::new(
                    ParseErrorKind::UnexpectedToken {
                        found: describe(token),
                        expected: vec!["end of input".into()],
                    },
                    token.position(),
                );
                self.errors.push(error);
            }
        }
        if self.errors.is_empty() {
            Ok(tree)
        } else {
            Err(ParseLog::from(std::mem::take(&mut self.errors)))
        }
    }

    /// Parse one production: select an alternative by look-ahead, match its elements and
    /// let the analyzer shape the resulting node.
    fn parse_production(
        &mut self,
        pattern: &Arc<ProductionPattern>,
        analyzer: &mut dyn IAnalyzer,
    ) -> Option<Node> {
        self.log_enter(pattern);
        self.drain_tokenizer_errors();
        let position = self.next_position();
        let node = Node::Production(ProductionNode::new(
            pattern.clone(),
            position.line,
            position.column,
        ));
        if let Err(error) = analyzer.enter(&node) {
            self.errors.push(error);
        }
        let mut inner = match node {
            Node::Production(inner) => inner,
            Node::Token(_) => panic!("a production node was just constructed"),
        };
        if let Some(index) = self.select_alternative(pattern) {
            let alternative = &pattern.alternatives()[index];
            for element in alternative.elements() {
                if self.halted {
                    break;
                }
                self.parse_element(&mut inner, element, analyzer);
            }
        }
        match analyzer.exit(Node::Production(inner)) {
            Ok(result) => {
                self.log_exit(pattern, result.is_some());
                result
            }
            Err(error) => {
                self.errors.push(error);
                None
            }
        }
    }

    /// Pick the alternative whose look-ahead sequences match the upcoming tokens. On no
    /// match, report the expected tokens and skip input until one of them (or the end of
    /// the stream) comes up.
    fn select_alternative(&mut self, pattern: &Arc<ProductionPattern>) -> Option<usize> {
        let peeked = self.peek_sequence(pattern.lookahead_length());
        // A nullable alternative (its set contains the empty sequence) can always be
        // selected; disjointness guarantees it is the only alternative in that case.
        let chosen = pattern.alternatives().iter().position(|alternative| {
            alternative
                .lookahead()
                .map_or(false, |set| set.matches(&peeked) || set.contains_empty())
        });
        if chosen.is_some() {
            return chosen;
        }
        let expected = expected_tokens(pattern);
        self.push_unexpected(&expected);
        if !self.recover(&expected) {
            self.halted = true;
            return None;
        }
        // Recovery stopped at a token from one of the first sets; commit to that branch
        // and let element matching report anything still wrong behind it.
        let id = self.tokenizer.peek_id(1)?;
        pattern.alternatives().iter().position(|alternative| {
            alternative
                .lookahead()
                .map_or(false, |set| set.first_tokens().contains(&id))
        })
    }

    /// Match one quantified element, consuming tokens or recursing into productions until
    /// the element's FIRST set no longer matches or the maximum count is reached.
    fn parse_element(
        &mut self,
        parent: &mut ProductionNode,
        element: &ProductionPatternElement,
        analyzer: &mut dyn IAnalyzer,
    ) {
        let first = match element.lookahead() {
            Some(set) => set,
            None => {
                self.errors.push(ParseError::internal(
                    "grammar element carries no look-ahead table".into(),
                    self.tokenizer.position(),
                ));
                return;
            }
        };
        let grammar = self.grammar.clone();
        let mut count = 0;
        while count < element.max() {
            if self.halted {
                return;
            }
            self.drain_tokenizer_errors();
            let peeked = self.peek_sequence(first.max_length());
            let matched = first.matches(&peeked);
            if count >= element.min() && !matched {
                break;
            }
            match grammar.pattern_by_id(element.id()) {
                Some(PatternRef::Token(_)) => {
                    if matched {
                        match self.next_token() {
                            Some(token) => {
                                let child = self.token_node(token, analyzer);
                                self.attach_child(parent, child, analyzer);
                                count += 1;
                            }
                            None => {
                                self.halted = true;
                                return;
                            }
                        }
                    } else {
                        // A mandatory token is missing; report it and skip ahead to it.
                        self.push_unexpected(&[element.id()]);
                        if !self.recover(&[element.id()]) {
                            self.halted = true;
                            return;
                        }
                    }
                }
                Some(PatternRef::Production(production)) => {
                    let before = self.consumed;
                    let child = self.parse_production(production, analyzer);
                    self.attach_child(parent, child, analyzer);
                    count += 1;
                    if self.consumed == before {
                        // The occurrence matched no tokens; repeating it would loop.
                        break;
                    }
                }
                None => {
                    self.errors.push(ParseError::internal(
                        format!("element references unknown pattern {}", element.id()),
                        self.tokenizer.position(),
                    ));
                    return;
                }
            }
        }
    }

    /// Run the enter/exit callbacks for a token leaf.
    fn token_node(&mut self, token: Token, analyzer: &mut dyn IAnalyzer) -> Option<Node> {
        let node = Node::Token(token);
        if let Err(error) = analyzer.enter(&node) {
            self.errors.push(error);
        }
        match analyzer.exit(node) {
            Ok(result) => result,
            Err(error) => {
                self.errors.push(error);
                None
            }
        }
    }

    /// Hand a produced child to the analyzer; children of synthetic productions are
    /// spliced into the enclosing node in order instead of adding a tree level.
    fn attach_child(
        &mut self,
        parent: &mut ProductionNode,
        child: Option<Node>,
        analyzer: &mut dyn IAnalyzer,
    ) {
        match child {
            Some(Node::Production(node)) if node.pattern().is_synthetic() => {
                for grandchild in node.into_children() {
                    self.call_child(parent, Some(grandchild), analyzer);
                }
            }
            other => self.call_child(parent, other, analyzer),
        }
    }

    fn call_child(
        &mut self,
        parent: &mut ProductionNode,
        child: Option<Node>,
        analyzer: &mut dyn IAnalyzer,
    ) {
        if let Err(error) = analyzer.child(parent, child) {
            self.errors.push(error);
        }
    }

    /// Log the tokenizer errors queued ahead of the next token, keeping input order.
    fn drain_tokenizer_errors(&mut self) {
        for error in self.tokenizer.take_leading_errors() {
            self.errors.push(error);
        }
    }

    /// The next non-ignored token; queued tokenizer errors are logged on the way.
    fn next_token(&mut self) -> Option<Token> {
        loop {
            match self.tokenizer.next() {
                Ok(Some(token)) => {
                    self.consumed += 1;
                    return Some(token);
                }
                Ok(None) => return None,
                Err(error) => self.errors.push(error),
            }
        }
    }

    /// Skip tokens until one of `expected` or the end of the stream.
    fn recover(&mut self, expected: &[usize]) -> bool {
        loop {
            match self.tokenizer.peek_id(1) {
                None => return false,
                Some(id) if expected.contains(&id) => return true,
                Some(_) => {
                    self.next_token();
                }
            }
        }
    }

    fn peek_sequence(&mut self, length: usize) -> Vec<Option<usize>> {
        (1..=length).map(|k| self.tokenizer.peek_id(k)).collect()
    }

    fn next_position(&mut self) -> Position {
        match self.tokenizer.peek(1) {
            Some(token) => token.position(),
            None => self.tokenizer.position(),
        }
    }

    fn push_unexpected(&mut self, expected: &[usize]) {
        let names: Vec<String> = expected
            .iter()
            .map(|id| match self.grammar.pattern_name(*id) {
                Some(name) => name.to_string(),
                None => id.to_string(),
            })
            .collect();
        let error = match self.tokenizer.peek(1) {
            Some(token) => ParseError::new(
                ParseErrorKind::UnexpectedToken {
                    found: describe(token),
                    expected: names,
                },
                token.position(),
            ),
            None => ParseError::new(
                ParseErrorKind::UnexpectedEof { expected: names },
                self.tokenizer.position(),
            ),
        };
        self.log_error(&error);
        self.errors.push(error);
    }

    fn log_enter(&self, _pattern: &Arc<ProductionPattern>) {
        #[cfg(debug_assertions)]
        if let Some(log) = self.log.get() {
            if log.order() >= Log::Verbose(()).order() {
                println!("[{}; ParserEnter]: {}", log, _pattern.name());
            }
        }
    }

    fn log_exit(&self, _pattern: &Arc<ProductionPattern>, _kept: bool) {
        #[cfg(debug_assertions)]
        if let Some(log) = self.log.get() {
            if log.order() >= Log::Success(()).order() {
                println!(
                    "[{}; ParserExit]: {} {}",
                    log,
                    _pattern.name(),
                    if _kept { "kept" } else { "dropped" }
                );
            }
        }
    }

    fn log_error(&self, _error: &ParseError) {
        #[cfg(debug_assertions)]
        if let Some(log) = self.log.get() {
            if log.order() >= Log::Default(()).order() {
                println!("[{}; ParserError]: {}", log, _error);
            }
        }
    }
}

/// The distinct first tokens over all alternatives of a production, in grammar order.
fn expected_tokens(pattern: &Arc<ProductionPattern>) -> Vec<usize> {
    let mut expected = Vec::new();
    for alternative in pattern.alternatives() {
        if let Some(set) = alternative.lookahead() {
            for id in set.first_tokens() {
                if !expected.contains(&id) {
                    expected.push(id);
                }
            }
        }
    }
    expected
}

fn describe(token: &Token) -> String {
    format!("{} \"{}\"", token.name(), token.image())
}
