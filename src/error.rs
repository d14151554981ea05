use crate::{GrammarError, ParseError, ParseErrorKind, ParseLog, ParserCreationError, Position};
use std::fmt::{Display, Formatter};

impl Display for GrammarError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GrammarError::DuplicateId(id) => {
                write!(f, "GrammarError: pattern id {} is already defined", id)
            }
            GrammarError::DuplicateName(name) => {
                write!(f, "GrammarError: pattern name '{}' is already defined", name)
            }
            GrammarError::UnknownReference { production, reference } => {
                write!(
                    f,
                    "GrammarError: production '{}' references undefined pattern '{}'",
                    production, reference
                )
            }
            GrammarError::EmptyProduction(name) => {
                write!(
                    f,
                    "GrammarError: production '{}' must contain at least one non-empty alternative",
                    name
                )
            }
            GrammarError::InvalidQuantifier { min, max } => {
                write!(f, "GrammarError: invalid element quantifier ({}, {})", min, max)
            }
            GrammarError::UnsupportedGrammarType(value) => {
                write!(f, "GrammarError: grammar type '{}' is not supported", value)
            }
            GrammarError::MissingProduction => {
                write!(f, "GrammarError: grammar does not define any production")
            }
            GrammarError::Frozen => {
                write!(f, "GrammarError: grammar is prepared and can no longer be modified")
            }
            GrammarError::Syntax { line, column, message } => {
                write!(
                    f,
                    "GrammarError: {} at {{ line: {}, column: {} }}",
                    message, line, column
                )
            }
            GrammarError::Io(message) => write!(f, "GrammarError: {}", message),
        }
    }
}

impl std::error::Error for GrammarError {}

impl Display for ParserCreationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ParserCreationError::InvalidPattern { name, message } => {
                write!(f, "ParserCreationError: token pattern '{}': {}", name, message)
            }
            ParserCreationError::Ambiguity { production, tokens } => {
                write!(
                    f,
                    "ParserCreationError: ambiguity in production '{}', alternatives overlap on [{}]",
                    production,
                    tokens.join(" ")
                )
            }
            ParserCreationError::LeftRecursion(production) => {
                write!(
                    f,
                    "ParserCreationError: production '{}' is left recursive",
                    production
                )
            }
            ParserCreationError::Grammar(err) => write!(f, "ParserCreationError: {}", err),
        }
    }
}

impl std::error::Error for ParserCreationError {}

impl From<GrammarError> for ParserCreationError {
    fn from(err: GrammarError) -> Self {
        ParserCreationError::Grammar(err)
    }
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, position: Position) -> Self {
        Self { kind, position }
    }

    pub(crate) fn internal(message: String, position: Position) -> Self {
        ParseError::new(ParseErrorKind::Internal(message), position)
    }

    pub(crate) fn io(message: String, position: Position) -> Self {
        ParseError::new(ParseErrorKind::Io(message), position)
    }

    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn line(&self) -> usize {
        self.position.line
    }

    pub fn column(&self) -> usize {
        self.position.column
    }

    /// Whether the error is a contract violation rather than an input error.
    pub fn is_internal(&self) -> bool {
        matches!(self.kind, ParseErrorKind::Internal(_))
    }

    /// The human readable message without the position suffix.
    pub fn message(&self) -> String {
        let mut message = String::new();
        match &self.kind {
            ParseErrorKind::UnexpectedChar(c) => {
                message.push_str("unexpected character '");
                message.extend(c.escape_default());
                message.push('\'');
            }
            ParseErrorKind::UnexpectedToken { found, expected } => {
                message.push_str("unexpected token ");
                message.push_str(found);
                push_expected(&mut message, expected);
            }
            ParseErrorKind::UnexpectedEof { expected } => {
                message.push_str("unexpected end of input");
                push_expected(&mut message, expected);
            }
            ParseErrorKind::InvalidToken(text)
            | ParseErrorKind::Analysis(text)
            | ParseErrorKind::Io(text) => message.push_str(text),
            ParseErrorKind::Internal(text) => {
                message.push_str("internal error: ");
                message.push_str(text);
            }
        }
        message
    }
}

fn push_expected(message: &mut String, expected: &[String]) {
    match expected.len() {
        0 => {}
        1 => {
            message.push_str(", expected ");
            message.push_str(&expected[0]);
        }
        _ => {
            message.push_str(", expected one of ");
            message.push_str(&expected.join(", "));
        }
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SyntaxError: {} at {}", self.message(), self.position)
    }
}

impl std::error::Error for ParseError {}

impl ParseLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn first(&self) -> Option<&ParseError> {
        self.errors.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ParseError> {
        self.errors.iter()
    }
}

impl From<Vec<ParseError>> for ParseLog {
    fn from(errors: Vec<ParseError>) -> Self {
        Self { errors }
    }
}

impl From<ParseError> for ParseLog {
    fn from(error: ParseError) -> Self {
        Self { errors: vec![error] }
    }
}

impl Display for ParseLog {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for error in &self.errors {
            writeln!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseLog {}
