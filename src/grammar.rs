use crate::{
    lookahead, reader, CharBuffer, Grammar, GrammarError, ParserCreationError, PatternEntry,
    PatternKind, ProductionPattern, ProductionPatternElement, Tokenizer, TokenPattern,
};
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::Arc;

/// A pattern looked up by id or name: either side of the token/production split.
#[derive(Debug, Clone, Copy)]
pub(crate) enum PatternRef<'a> {
    Token(&'a Arc<TokenPattern>),
    Production(&'a Arc<ProductionPattern>),
}

/// Canonical form used for name uniqueness: upper case, non-alphanumerics stripped.
pub(crate) fn canonical_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_uppercase)
        .collect()
}

impl Grammar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a grammar from grammar source text. See the [reader](crate::Grammar::read)
    /// documentation for the file format.
    pub fn parse(text: &str) -> Result<Grammar, GrammarError> {
        reader::parse_grammar(text)
    }

    /// Read a grammar from a grammar source file.
    ///
    /// The file has up to three sections: an optional `%header%` with `name = "value"`
    /// declarations, a `%tokens%` section declaring `NAME = value` patterns (a quoted
    /// literal or a `<<regex>>`, optionally flagged `ignore` or `error` with an optional
    /// message), and a `%productions%` section with `name = alternatives ;` rules in EBNF.
    /// `//` and `/* */` comments are allowed anywhere.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Grammar, GrammarError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| {
            GrammarError::Io(format!(
                "failed to read grammar file '{}': {}",
                path.display(),
                err
            ))
        })?;
        reader::parse_grammar(&text)
    }

    fn ensure_mutable(&self) -> Result<(), GrammarError> {
        if self.prepared.get().is_some() {
            Err(GrammarError::Frozen)
        } else {
            Ok(())
        }
    }

    /// Add a token pattern. Fails on a duplicate id or canonicalized name.
    pub fn add_token(&mut self, pattern: TokenPattern) -> Result<(), GrammarError> {
        self.ensure_mutable()?;
        let canonical = canonical_name(pattern.name());
        if self.ids.contains_key(&pattern.id()) {
            return Err(GrammarError::DuplicateId(pattern.id()));
        }
        if self.names.contains_key(&canonical) {
            return Err(GrammarError::DuplicateName(pattern.name().to_string()));
        }
        let id = pattern.id();
        self.ids.insert(id, PatternEntry::Token(self.tokens.len()));
        self.names.insert(canonical, id);
        if pattern.kind() == PatternKind::Literal {
            // Quoted-string references resolve through literal patterns only; the first
            // registration of an image wins.
            self.literals
                .entry(pattern.image().to_string())
                .or_insert(id);
        }
        self.tokens.push(Arc::new(pattern));
        Ok(())
    }

    /// Add a production pattern. The first added production is the start symbol.
    pub fn add_production(&mut self, pattern: ProductionPattern) -> Result<(), GrammarError> {
        self.ensure_mutable()?;
        if pattern.alternatives().is_empty()
            || pattern
                .alternatives()
                .iter()
                .any(|alt| alt.elements().is_empty())
        {
            return Err(GrammarError::EmptyProduction(pattern.name().to_string()));
        }
        let canonical = canonical_name(pattern.name());
        if self.ids.contains_key(&pattern.id()) {
            return Err(GrammarError::DuplicateId(pattern.id()));
        }
        if self.names.contains_key(&canonical) {
            return Err(GrammarError::DuplicateName(pattern.name().to_string()));
        }
        let id = pattern.id();
        self.ids
            .insert(id, PatternEntry::Production(self.productions.len()));
        self.names.insert(canonical, id);
        self.productions.push(Arc::new(pattern));
        Ok(())
    }

    /// Set a header declaration, replacing any previous value for the same name.
    pub fn set_declaration(&mut self, name: &str, value: &str) -> Result<(), GrammarError> {
        self.ensure_mutable()?;
        match self
            .declarations
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            Some(entry) => entry.1 = value.to_string(),
            None => self.declarations.push((name.to_string(), value.to_string())),
        }
        Ok(())
    }

    pub fn declaration(&self, name: &str) -> Option<&str> {
        self.declarations
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The header declarations in insertion order.
    pub fn declarations(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.declarations.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Set the `CASESENSITIVE` declaration.
    pub fn set_case_sensitive(&mut self, case_sensitive: bool) -> Result<(), GrammarError> {
        self.set_declaration("CASESENSITIVE", if case_sensitive { "yes" } else { "no" })
    }

    /// Matching is case sensitive unless `CASESENSITIVE` is declared `"no"` or `"false"`.
    pub fn case_sensitive(&self) -> bool {
        match self.declaration("CASESENSITIVE") {
            Some(value) => {
                !(value.eq_ignore_ascii_case("no") || value.eq_ignore_ascii_case("false"))
            }
            None => true,
        }
    }

    pub fn token_patterns(&self) -> &[Arc<TokenPattern>] {
        &self.tokens
    }

    pub fn production_patterns(&self) -> &[Arc<ProductionPattern>] {
        &self.productions
    }

    /// The start symbol: the first added production.
    pub fn start_production(&self) -> Option<&Arc<ProductionPattern>> {
        self.productions.first()
    }

    pub(crate) fn pattern_by_id(&self, id: usize) -> Option<PatternRef<'_>> {
        match self.ids.get(&id)? {
            PatternEntry::Token(index) => Some(PatternRef::Token(&self.tokens[*index])),
            PatternEntry::Production(index) => {
                Some(PatternRef::Production(&self.productions[*index]))
            }
        }
    }

    pub fn token_by_id(&self, id: usize) -> Option<&Arc<TokenPattern>> {
        match self.pattern_by_id(id) {
            Some(PatternRef::Token(pattern)) => Some(pattern),
            _ => None,
        }
    }

    pub fn production_by_id(&self, id: usize) -> Option<&Arc<ProductionPattern>> {
        match self.pattern_by_id(id) {
            Some(PatternRef::Production(pattern)) => Some(pattern),
            _ => None,
        }
    }

    /// Look up a pattern by name under canonicalization.
    pub(crate) fn pattern_by_name(&self, name: &str) -> Option<PatternRef<'_>> {
        let id = *self.names.get(&canonical_name(name))?;
        self.pattern_by_id(id)
    }

    pub fn token_by_name(&self, name: &str) -> Option<&Arc<TokenPattern>> {
        match self.pattern_by_name(name) {
            Some(PatternRef::Token(pattern)) => Some(pattern),
            _ => None,
        }
    }

    pub fn production_by_name(&self, name: &str) -> Option<&Arc<ProductionPattern>> {
        match self.pattern_by_name(name) {
            Some(PatternRef::Production(pattern)) => Some(pattern),
            _ => None,
        }
    }

    /// Look up a literal token pattern by its exact image.
    pub fn token_by_image(&self, image: &str) -> Option<&Arc<TokenPattern>> {
        let id = *self.literals.get(image)?;
        self.token_by_id(id)
    }

    /// The display name of any pattern id.
    pub fn pattern_name(&self, id: usize) -> Option<&str> {
        match self.pattern_by_id(id)? {
            PatternRef::Token(pattern) => Some(pattern.name()),
            PatternRef::Production(pattern) => Some(pattern.name()),
        }
    }

    /// Validate the grammar and compute the look-ahead tables.
    ///
    /// Preparation is idempotent and freezes the grammar: mutation afterwards fails with
    /// [Frozen](GrammarError::Frozen). A prepared grammar can be shared between threads.
    pub fn prepare(&self) -> Result<(), ParserCreationError> {
        self.prepared
            .get_or_try_init(|| {
                self.validate()?;
                lookahead::prepare(self)
            })
            .map(|_| ())
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared.get().is_some()
    }

    fn validate(&self) -> Result<(), ParserCreationError> {
        if let Some(value) = self.declaration("GRAMMARTYPE") {
            if !value.eq_ignore_ascii_case("LL") {
                return Err(GrammarError::UnsupportedGrammarType(value.to_string()).into());
            }
        }
        if self.productions.is_empty() {
            return Err(GrammarError::MissingProduction.into());
        }
        for production in &self.productions {
            for alternative in production.alternatives() {
                for element in alternative.elements() {
                    if !self.ids.contains_key(&element.id()) {
                        return Err(GrammarError::UnknownReference {
                            production: production.name().to_string(),
                            reference: element.id().to_string(),
                        }
                        .into());
                    }
                }
            }
        }
        Ok(())
    }

    /// Create a tokenizer over `source` from the grammar's token patterns, registered in
    /// declaration order and honoring the `CASESENSITIVE` declaration.
    pub fn create_tokenizer<S: Into<CharBuffer>>(
        &self,
        source: S,
    ) -> Result<Tokenizer, ParserCreationError> {
        let mut tokenizer = Tokenizer::new(source.into(), self.case_sensitive());
        for pattern in &self.tokens {
            tokenizer.add_pattern(pattern.clone())?;
        }
        Ok(tokenizer)
    }

    fn write_element(&self, f: &mut Formatter<'_>, element: &ProductionPatternElement) -> std::fmt::Result {
        match self.pattern_name(element.id()) {
            Some(name) => write!(f, "{}", name)?,
            None => write!(f, "#{}", element.id())?,
        }
        match (element.min(), element.max()) {
            (1, 1) => Ok(()),
            (0, 1) => write!(f, "?"),
            (0, usize::MAX) => write!(f, "*"),
            (1, usize::MAX) => write!(f, "+"),
            (min, usize::MAX) => write!(f, "{{{},}}", min),
            (min, max) => write!(f, "{{{},{}}}", min, max),
        }
    }
}

impl Display for Grammar {
    /// Write the grammar back in grammar source form.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if !self.declarations.is_empty() {
            writeln!(f, "%header%")?;
            for (name, value) in &self.declarations {
                writeln!(f, "{} = \"{}\"", name, value)?;
            }
            writeln!(f)?;
        }
        writeln!(f, "%tokens%")?;
        for token in &self.tokens {
            writeln!(f, "{}", token)?;
        }
        writeln!(f)?;
        writeln!(f, "%productions%")?;
        for production in &self.productions {
            write!(f, "{} =", production.name())?;
            for (index, alternative) in production.alternatives().iter().enumerate() {
                if index > 0 {
                    write!(f, " |")?;
                }
                for element in alternative.elements() {
                    write!(f, " ")?;
                    self.write_element(f, element)?;
                }
            }
            writeln!(f, " ;")?;
        }
        Ok(())
    }
}
