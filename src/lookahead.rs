use crate::grammar::PatternRef;
use crate::{
    Grammar, GrammarError, LookaheadSet, ParserCreationError, ProductionPattern,
    ProductionPatternElement,
};

/// Largest k tried before a production is reported as ambiguous.
pub(crate) const MAX_LOOKAHEAD: usize = 8;

impl LookaheadSet {
    pub(crate) fn new(max_length: usize) -> Self {
        Self {
            max_length,
            sequences: Vec::new(),
        }
    }

    pub(crate) fn with_empty(max_length: usize) -> Self {
        let mut set = Self::new(max_length);
        set.add_sequence(Vec::new());
        set
    }

    pub(crate) fn with_token(max_length: usize, id: usize) -> Self {
        let mut set = Self::new(max_length);
        set.add_sequence(vec![id]);
        set
    }

    /// The bound the sequences were truncated to: the k chosen for the production.
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// The token-id sequences, sorted lexicographically.
    pub fn sequences(&self) -> &[Vec<usize>] {
        &self.sequences
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Whether the empty sequence is present: the construct can match no tokens at all.
    pub fn contains_empty(&self) -> bool {
        self.sequences.first().map_or(false, Vec::is_empty)
    }

    pub(crate) fn add_sequence(&mut self, mut sequence: Vec<usize>) {
        sequence.truncate(self.max_length);
        if let Err(index) = self.sequences.binary_search(&sequence) {
            self.sequences.insert(index, sequence);
        }
    }

    pub(crate) fn union_with(&mut self, other: &Self) {
        for sequence in &other.sequences {
            self.add_sequence(sequence.clone());
        }
    }

    /// Concatenate every sequence of `self` with every sequence of `other`, truncating at
    /// this set's bound. Sequences already at the bound are kept as they are.
    pub(crate) fn concat(&self, other: &Self) -> Self {
        let mut result = Self::new(self.max_length);
        for head in &self.sequences {
            if head.len() >= self.max_length {
                result.add_sequence(head.clone());
                continue;
            }
            for tail in &other.sequences {
                let mut sequence = head.clone();
                sequence.extend_from_slice(tail);
                result.add_sequence(sequence);
            }
        }
        result
    }

    /// Whether the sets overlap; a sequence that is a prefix of a sequence in the other
    /// set counts as an overlap.
    pub fn intersects(&self, other: &Self) -> bool {
        self.overlap(other).is_some()
    }

    /// A sample overlapping sequence, used for ambiguity reports.
    pub(crate) fn overlap(&self, other: &Self) -> Option<Vec<usize>> {
        for a in &self.sequences {
            for b in &other.sequences {
                if a.starts_with(b) || b.starts_with(a) {
                    return Some(if a.len() <= b.len() { a.clone() } else { b.clone() });
                }
            }
        }
        None
    }

    /// Whether some non-empty sequence matches the peeked token ids (`None` marks end of
    /// stream). The empty sequence is not a token match; callers consult
    /// [contains_empty](LookaheadSet::contains_empty) where matching nothing is an option,
    /// so that a nullable FIRST set never forces a quantifier loop to run.
    pub(crate) fn matches(&self, peeked: &[Option<usize>]) -> bool {
        self.sequences.iter().any(|sequence| {
            !sequence.is_empty()
                && sequence
                    .iter()
                    .enumerate()
                    .all(|(index, id)| peeked.get(index).copied().flatten() == Some(*id))
        })
    }

    /// The distinct token ids the sequences start with.
    pub(crate) fn first_tokens(&self) -> Vec<usize> {
        let mut tokens = Vec::new();
        for sequence in &self.sequences {
            if let Some(&first) = sequence.first() {
                if !tokens.contains(&first) {
                    tokens.push(first);
                }
            }
        }
        tokens
    }
}

struct CallStack {
    entries: Vec<(usize, usize)>,
}

impl CallStack {
    fn new() -> Self {
        Self { entries: Vec::new() }
    }

    fn contains(&self, id: usize, budget: usize) -> bool {
        self.entries.contains(&(id, budget))
    }

    fn push(&mut self, id: usize, budget: usize) {
        self.entries.push((id, budget));
    }

    fn pop(&mut self) {
        self.entries.pop();
    }
}

/// Compute and attach the look-ahead tables for every production of the grammar.
///
/// Per production, the alternative sets are computed at k = 1 and recomputed at growing k
/// while any two of them overlap; a conflict remaining at `MAX_LOOKAHEAD` rejects the
/// grammar. Element FIRST sets are attached at the same k for quantifier decisions.
pub(crate) fn prepare(grammar: &Grammar) -> Result<(), ParserCreationError> {
    for production in grammar.production_patterns() {
        prepare_production(grammar, production)?;
    }
    Ok(())
}

fn prepare_production(
    grammar: &Grammar,
    production: &ProductionPattern,
) -> Result<(), ParserCreationError> {
    let mut conflict = Vec::new();
    for length in 1..=MAX_LOOKAHEAD {
        let mut sets = Vec::with_capacity(production.alternatives().len());
        for alternative in production.alternatives() {
            let mut stack = CallStack::new();
            stack.push(production.id(), length);
            sets.push(first_of_elements(
                grammar,
                production.name(),
                alternative.elements(),
                0,
                length,
                &mut stack,
            )?);
        }
        match find_conflict(&sets) {
            None => {
                for (alternative, set) in production.alternatives().iter().zip(sets) {
                    alternative.attach_lookahead(set);
                }
                for alternative in production.alternatives() {
                    for element in alternative.elements() {
                        let mut stack = CallStack::new();
                        let set = first_of_pattern(
                            grammar,
                            production.name(),
                            element.id(),
                            length,
                            &mut stack,
                        )?;
                        element.attach_lookahead(set);
                    }
                }
                return Ok(());
            }
            Some(overlap) => {
                conflict = overlap
                    .iter()
                    .map(|id| match grammar.pattern_name(*id) {
                        Some(name) => name.to_string(),
                        None => id.to_string(),
                    })
                    .collect();
            }
        }
    }
    Err(ParserCreationError::Ambiguity {
        production: production.name().to_string(),
        tokens: conflict,
    })
}

fn find_conflict(sets: &[LookaheadSet]) -> Option<Vec<usize>> {
    for (index, set) in sets.iter().enumerate() {
        for other in &sets[index + 1..] {
            if let Some(overlap) = set.overlap(other) {
                return Some(overlap);
            }
        }
    }
    None
}

/// FIRST of the element sequence starting at `position`, bounded by `budget` tokens.
fn first_of_elements(
    grammar: &Grammar,
    owner: &str,
    elements: &[ProductionPatternElement],
    position: usize,
    budget: usize,
    stack: &mut CallStack,
) -> Result<LookaheadSet, ParserCreationError> {
    let mut result = LookaheadSet::new(budget);
    if budget == 0 || position >= elements.len() {
        result.add_sequence(Vec::new());
        return Ok(result);
    }
    let first = first_of_element(grammar, owner, &elements[position], budget, stack)?;
    for head in first.sequences() {
        if head.len() >= budget {
            result.add_sequence(head.clone());
            continue;
        }
        let rest = first_of_elements(
            grammar,
            owner,
            elements,
            position + 1,
            budget - head.len(),
            stack,
        )?;
        for tail in rest.sequences() {
            let mut sequence = head.clone();
            sequence.extend_from_slice(tail);
            result.add_sequence(sequence);
        }
    }
    Ok(result)
}

/// FIRST of a single quantified element, including the empty sequence when it may be
/// skipped entirely.
fn first_of_element(
    grammar: &Grammar,
    owner: &str,
    element: &ProductionPatternElement,
    budget: usize,
    stack: &mut CallStack,
) -> Result<LookaheadSet, ParserCreationError> {
    let one = first_of_pattern(grammar, owner, element.id(), budget, stack)?;
    let mut result = LookaheadSet::new(budget);
    if element.min() == 0 {
        result.add_sequence(Vec::new());
    }
    let mut occurrences = one.clone();
    let mut count = 1;
    loop {
        if count >= element.min() {
            result.union_with(&occurrences);
        }
        if count >= element.max() {
            break;
        }
        let next = occurrences.concat(&one);
        if next == occurrences {
            // Repetition reached a fixpoint within the budget; further occurrences
            // contribute nothing new.
            if count < element.min() {
                result.union_with(&occurrences);
            }
            break;
        }
        occurrences = next;
        count += 1;
    }
    Ok(result)
}

/// FIRST of a referenced pattern: the token itself, or the union over a production's
/// alternatives. Re-entering a production with an unchanged budget means no token was
/// consumed on the way, which is exactly a left-recursion cycle.
fn first_of_pattern(
    grammar: &Grammar,
    owner: &str,
    id: usize,
    budget: usize,
    stack: &mut CallStack,
) -> Result<LookaheadSet, ParserCreationError> {
    if budget == 0 {
        return Ok(LookaheadSet::with_empty(0));
    }
    match grammar.pattern_by_id(id) {
        Some(PatternRef::Token(pattern)) => Ok(LookaheadSet::with_token(budget, pattern.id())),
        Some(PatternRef::Production(pattern)) => {
            if stack.contains(pattern.id(), budget) {
                return Err(ParserCreationError::LeftRecursion(pattern.name().to_string()));
            }
            stack.push(pattern.id(), budget);
            let mut result = LookaheadSet::new(budget);
            for alternative in pattern.alternatives() {
                result.union_with(&first_of_elements(
                    grammar,
                    pattern.name(),
                    alternative.elements(),
                    0,
                    budget,
                    stack,
                )?);
            }
            stack.pop();
            Ok(result)
        }
        None => Err(GrammarError::UnknownReference {
            production: owner.to_string(),
            reference: id.to_string(),
        }
        .into()),
    }
}
