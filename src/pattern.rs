use crate::{
    regexp, GrammarError, LookaheadSet, ParserCreationError, PatternKind, ProductionPattern,
    ProductionPatternAlternative, ProductionPatternElement, TokenPattern,
};
use once_cell::sync::OnceCell;
use std::fmt::{Display, Formatter};

impl TokenPattern {
    /// Create a new token pattern.
    /// ## Arguments
    /// * `id` - An unique pattern id.
    /// * `name` - An unique pattern name.
    /// * `kind` - Whether `image` is an exact string or a regular expression.
    /// * `image` - The pattern text.
    ///
    /// A literal image must be non-empty and a regular expression must be well formed and
    /// must not match the empty string; otherwise pattern creation fails.
    pub fn new(
        id: usize,
        name: &str,
        kind: PatternKind,
        image: &str,
    ) -> Result<Self, ParserCreationError> {
        match kind {
            PatternKind::Literal => {
                if image.is_empty() {
                    return Err(ParserCreationError::InvalidPattern {
                        name: name.to_string(),
                        message: "literal pattern must not be empty".into(),
                    });
                }
            }
            PatternKind::Regexp => {
                let expr = regexp::parse(image).map_err(|message| {
                    ParserCreationError::InvalidPattern {
                        name: name.to_string(),
                        message,
                    }
                })?;
                if expr.is_nullable() {
                    return Err(ParserCreationError::InvalidPattern {
                        name: name.to_string(),
                        message: "regular expression must not match the empty string".into(),
                    });
                }
            }
        }
        Ok(Self {
            id,
            name: name.to_string(),
            kind,
            image: image.to_string(),
            ignore: false,
            ignore_message: None,
            error: false,
            error_message: None,
        })
    }

    /// Create a literal string pattern.
    pub fn literal(id: usize, name: &str, image: &str) -> Result<Self, ParserCreationError> {
        TokenPattern::new(id, name, PatternKind::Literal, image)
    }

    /// Create a regular expression pattern.
    pub fn regexp(id: usize, name: &str, image: &str) -> Result<Self, ParserCreationError> {
        TokenPattern::new(id, name, PatternKind::Regexp, image)
    }

    /// Mark matches of this pattern as discarded, with an optional message.
    pub fn set_ignore(&mut self, message: Option<String>) -> Result<(), ParserCreationError> {
        if self.error {
            return Err(ParserCreationError::InvalidPattern {
                name: self.name.clone(),
                message: "pattern cannot be both ignore and error".into(),
            });
        }
        self.ignore = true;
        self.ignore_message = message;
        Ok(())
    }

    /// Mark matches of this pattern as parse errors, with an optional message.
    pub fn set_error(&mut self, message: Option<String>) -> Result<(), ParserCreationError> {
        if self.ignore {
            return Err(ParserCreationError::InvalidPattern {
                name: self.name.clone(),
                message: "pattern cannot be both ignore and error".into(),
            });
        }
        self.error = true;
        self.error_message = message;
        Ok(())
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PatternKind {
        self.kind
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn is_ignore(&self) -> bool {
        self.ignore
    }

    pub fn ignore_message(&self) -> Option<&str> {
        self.ignore_message.as_deref()
    }

    pub fn is_error(&self) -> bool {
        self.error
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}

impl Display for TokenPattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            PatternKind::Literal => write!(f, "{} = \"{}\"", self.name, self.image)?,
            PatternKind::Regexp => write!(f, "{} = <<{}>>", self.name, self.image)?,
        }
        if self.ignore {
            write!(f, " ignore")?;
        }
        if self.error {
            write!(f, " error")?;
        }
        Ok(())
    }
}

impl ProductionPattern {
    /// Create a new production pattern without alternatives.
    /// ## Arguments
    /// * `id` - An unique pattern id.
    /// * `name` - An unique pattern name.
    pub fn new(id: usize, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            synthetic: false,
            alternatives: Vec::new(),
        }
    }

    /// Create a synthetic production generated for a grouped sub-expression.
    pub fn synthetic(id: usize, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            synthetic: true,
            alternatives: Vec::new(),
        }
    }

    /// Append an alternative; declaration order decides ties during parsing.
    pub fn add_alternative(&mut self, alternative: ProductionPatternAlternative) {
        self.alternatives.push(alternative);
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    pub fn alternatives(&self) -> &[ProductionPatternAlternative] {
        &self.alternatives
    }

    /// The look-ahead length chosen for this production by grammar preparation.
    pub fn lookahead_length(&self) -> usize {
        self.alternatives
            .iter()
            .filter_map(|alt| alt.lookahead().map(LookaheadSet::max_length))
            .max()
            .unwrap_or(1)
    }
}

impl Display for ProductionPattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl ProductionPatternAlternative {
    /// Create an alternative from its ordered element sequence.
    pub fn new(elements: Vec<ProductionPatternElement>) -> Self {
        Self {
            elements,
            lookahead: OnceCell::new(),
        }
    }

    pub fn elements(&self) -> &[ProductionPatternElement] {
        &self.elements
    }

    /// The look-ahead set attached by grammar preparation.
    pub fn lookahead(&self) -> Option<&LookaheadSet> {
        self.lookahead.get()
    }

    pub(crate) fn attach_lookahead(&self, set: LookaheadSet) {
        let _ = self.lookahead.set(set);
    }
}

impl ProductionPatternElement {
    /// Create an element referencing a token pattern.
    pub fn token(id: usize, min: usize, max: usize) -> Result<Self, GrammarError> {
        Self::reference(id, true, min, max)
    }

    /// Create an element referencing a production pattern.
    pub fn production(id: usize, min: usize, max: usize) -> Result<Self, GrammarError> {
        Self::reference(id, false, min, max)
    }

    fn reference(id: usize, token: bool, min: usize, max: usize) -> Result<Self, GrammarError> {
        if min > max || max == 0 {
            return Err(GrammarError::InvalidQuantifier { min, max });
        }
        Ok(Self {
            id,
            token,
            min,
            max,
            lookahead: OnceCell::new(),
        })
    }

    /// The referenced pattern id.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Whether the reference names a token pattern rather than a production.
    pub fn is_token(&self) -> bool {
        self.token
    }

    pub fn min(&self) -> usize {
        self.min
    }

    /// The maximum repetition count; `usize::MAX` means unbounded.
    pub fn max(&self) -> usize {
        self.max
    }

    /// The FIRST set of the referenced pattern, attached by grammar preparation and used
    /// for quantifier decisions during parsing.
    pub fn lookahead(&self) -> Option<&LookaheadSet> {
        self.lookahead.get()
    }

    pub(crate) fn attach_lookahead(&self, set: LookaheadSet) {
        let _ = self.lookahead.set(set);
    }
}
