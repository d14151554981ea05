use crate::{
    regexp, CharBuffer, Log, ParseError, ParseErrorKind, ParserCreationError, PatternKind,
    Position, Token, TokenPattern, Tokenizer,
};
use once_cell::unsync::OnceCell;
use std::collections::VecDeque;
use std::sync::Arc;

impl Tokenizer {
    /// Create a tokenizer without patterns over the given source.
    pub fn new<S: Into<CharBuffer>>(source: S, case_sensitive: bool) -> Self {
        Self {
            patterns: Vec::new(),
            automata: Vec::new(),
            literals: crate::trie::LiteralTrie::new(),
            case_sensitive,
            buffer: source.into(),
            queue: VecDeque::new(),
            finished: false,
            log: OnceCell::new(),
        }
    }

    /// Set a log label to debug the tokenizer based on the level of [Log].
    pub fn set_log(&self, log: Log<&'static str>) -> Result<(), String> {
        self.log
            .set(log)
            .map_err(|err| format!("Log label {} is already assigned.", err))
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// The registered patterns in registration order.
    pub fn patterns(&self) -> &[Arc<TokenPattern>] {
        &self.patterns
    }

    /// Register a token pattern. Literal images are folded when matching is case
    /// insensitive and indexed in a trie; regular expressions are compiled to an automaton
    /// that is never mutated afterwards.
    pub fn add_pattern(&mut self, pattern: Arc<TokenPattern>) -> Result<(), ParserCreationError> {
        let index = self.patterns.len();
        match pattern.kind() {
            PatternKind::Literal => {
                let image: Vec<char> = if self.case_sensitive {
                    pattern.image().chars().collect()
                } else {
                    pattern.image().chars().map(regexp::fold).collect()
                };
                if let Err(existing) = self.literals.insert(&image, index) {
                    return Err(ParserCreationError::InvalidPattern {
                        name: pattern.name().to_string(),
                        message: format!(
                            "literal \"{}\" is already matched by pattern '{}'",
                            pattern.image(),
                            self.patterns[existing].name()
                        ),
                    });
                }
            }
            PatternKind::Regexp => {
                let expr = regexp::parse(pattern.image()).map_err(|message| {
                    ParserCreationError::InvalidPattern {
                        name: pattern.name().to_string(),
                        message,
                    }
                })?;
                let nfa = regexp::Nfa::compile(&expr, self.case_sensitive);
                if nfa.matches_empty() {
                    return Err(ParserCreationError::InvalidPattern {
                        name: pattern.name().to_string(),
                        message: "regular expression must not match the empty string".into(),
                    });
                }
                self.automata.push((index, nfa));
            }
        }
        self.patterns.push(pattern);
        Ok(())
    }

    /// Rewind to a new input, keeping the registered patterns.
    pub fn reset<S: Into<CharBuffer>>(&mut self, source: S) {
        self.buffer = source.into();
        self.queue.clear();
        self.finished = false;
    }

    /// The position of the next unscanned character.
    pub fn position(&self) -> Position {
        self.buffer.position()
    }

    /// The next non-ignored token, or `None` at the end of the stream.
    ///
    /// An error-flagged pattern match, an unexpected character and a failing input source
    /// all surface as `Err`; except for source failures the input is consumed, so calling
    /// again continues behind the offending text.
    pub fn next(&mut self) -> Result<Option<Token>, ParseError> {
        if let Some(entry) = self.queue.pop_front() {
            return entry.map(Some);
        }
        if self.finished {
            return Ok(None);
        }
        match self.scan() {
            Ok(Some(token)) => Ok(Some(token)),
            Ok(None) => {
                self.finished = true;
                Ok(None)
            }
            Err(error) => {
                if matches!(error.kind(), ParseErrorKind::Io(_)) {
                    self.finished = true;
                }
                Err(error)
            }
        }
    }

    /// Peek at the k-th upcoming non-ignored token (k >= 1) without consuming anything.
    ///
    /// Tokens are lexed ahead into a queue as needed; errors encountered on the way stay
    /// queued and surface from [next](Tokenizer::next) in input order.
    pub fn peek(&mut self, k: usize) -> Option<&Token> {
        if k == 0 {
            return None;
        }
        self.fill(k);
        self.queue
            .iter()
            .filter_map(|entry| entry.as_ref().ok())
            .nth(k - 1)
    }

    /// The pattern id of the k-th upcoming token, if any.
    pub fn peek_id(&mut self, k: usize) -> Option<usize> {
        self.peek(k).map(Token::id)
    }

    /// Take the errors queued ahead of the next token, in input order.
    pub(crate) fn take_leading_errors(&mut self) -> Vec<ParseError> {
        self.fill(1);
        let mut errors = Vec::new();
        while matches!(self.queue.front(), Some(Err(_))) {
            if let Some(Err(error)) = self.queue.pop_front() {
                errors.push(error);
            }
        }
        errors
    }

    fn fill(&mut self, count: usize) {
        while !self.finished
            && self.queue.iter().filter(|entry| entry.is_ok()).count() < count
        {
            match self.scan() {
                Ok(Some(token)) => self.queue.push_back(Ok(token)),
                Ok(None) => self.finished = true,
                Err(error) => {
                    if matches!(error.kind(), ParseErrorKind::Io(_)) {
                        self.finished = true;
                    }
                    self.queue.push_back(Err(error));
                }
            }
        }
    }

    /// Scan one token at the current buffer position, skipping ignored matches.
    fn scan(&mut self) -> Result<Option<Token>, ParseError> {
        let case_sensitive = self.case_sensitive;
        loop {
            let first = match self.buffer.peek(0)? {
                Some(c) => c,
                None => return Ok(None),
            };
            let position = self.buffer.position();

            // A single pass over the input drives the literal trie and all automata at
            // once; `best` keeps (pattern index, length) with longer matches winning and
            // ties going to the earlier registration.
            let mut best: Option<(usize, usize)> = None;
            let mut trie = Some(&self.literals);
            let mut simulations: Vec<Vec<usize>> = self
                .automata
                .iter()
                .map(|(_, nfa)| nfa.start_states())
                .collect();
            let mut offset = 0;
            loop {
                let c = match self.buffer.peek(offset)? {
                    Some(c) => c,
                    None => break,
                };
                let c = if case_sensitive { c } else { regexp::fold(c) };
                trie = trie.and_then(|node| node.step(c));
                if let Some(pattern) = trie.and_then(|node| node.pattern()) {
                    best = prefer(best, (pattern, offset + 1));
                }
                let mut alive = trie.is_some();
                for (simulation, (pattern, nfa)) in
                    simulations.iter_mut().zip(&self.automata)
                {
                    if simulation.is_empty() {
                        continue;
                    }
                    *simulation = nfa.step(simulation, c);
                    if nfa.is_accepting(simulation) {
                        best = prefer(best, (*pattern, offset + 1));
                    }
                    if !simulation.is_empty() {
                        alive = true;
                    }
                }
                if !alive {
                    break;
                }
                offset += 1;
            }

            match best {
                None => {
                    self.buffer.consume(1);
                    self.log_failure(first, position);
                    return Err(ParseError::new(
                        ParseErrorKind::UnexpectedChar(first),
                        position,
                    ));
                }
                Some((index, length)) => {
                    let image = self.buffer.consume(length);
                    let pattern = self.patterns[index].clone();
                    if pattern.is_error() {
                        let message = match pattern.error_message() {
                            Some(message) => message.to_string(),
                            None => image,
                        };
                        return Err(ParseError::new(
                            ParseErrorKind::InvalidToken(message),
                            position,
                        ));
                    }
                    if pattern.is_ignore() {
                        continue;
                    }
                    let token = Token::new(pattern, image, position.line, position.column);
                    self.log_success(&token);
                    return Ok(Some(token));
                }
            }
        }
    }

    fn log_success(&self, _token: &Token) {
        #[cfg(debug_assertions)]
        if let Some(log) = self.log.get() {
            if log.order() >= Log::Success(()).order() {
                println!(
                    "[{}; TokenizerSuccess]: {} at {}",
                    log,
                    _token,
                    _token.position()
                );
            }
        }
    }

    fn log_failure(&self, _c: char, _position: Position) {
        #[cfg(debug_assertions)]
        if let Some(log) = self.log.get() {
            if log.order() >= Log::Result(()).order() {
                println!(
                    "[{}; TokenizerError]: unexpected character '{}' at {}",
                    log, _c, _position
                );
            }
        }
    }
}

fn prefer(best: Option<(usize, usize)>, candidate: (usize, usize)) -> Option<(usize, usize)> {
    match best {
        None => Some(candidate),
        Some((index, length)) => {
            if candidate.1 > length || (candidate.1 == length && candidate.0 < index) {
                Some(candidate)
            } else {
                Some((index, length))
            }
        }
    }
}
