/// A character trie over the registered literal token patterns.
///
/// Each node stores the index of the pattern whose image ends there; walking the trie
/// character by character yields every literal match at the current input position, so the
/// longest one falls out of the same single pass that feeds the regex automata.
#[derive(Debug, Clone, Default)]
pub(crate) struct LiteralTrie {
    pattern: Option<usize>,
    children: Vec<(char, LiteralTrie)>,
}

impl LiteralTrie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a literal image for the pattern at `index`. Returns the previously
    /// registered pattern index when the image is already taken.
    pub fn insert(&mut self, image: &[char], index: usize) -> Result<(), usize> {
        if let Some((first, rest)) = image.split_first() {
            match self.children.binary_search_by_key(first, |child| child.0) {
                Ok(i) => self.children[i].1.insert(rest, index),
                Err(i) => {
                    let mut node = LiteralTrie::new();
                    node.insert(rest, index)?;
                    self.children.insert(i, (*first, node));
                    Ok(())
                }
            }
        } else {
            match self.pattern.replace(index) {
                Some(existing) => {
                    self.pattern = Some(existing);
                    Err(existing)
                }
                None => Ok(()),
            }
        }
    }

    /// Follow the edge for `c`, if any.
    pub fn step(&self, c: char) -> Option<&LiteralTrie> {
        match self.children.binary_search_by_key(&c, |child| child.0) {
            Ok(i) => Some(&self.children[i].1),
            Err(_) => None,
        }
    }

    /// The pattern index of the literal ending at this node.
    pub fn pattern(&self) -> Option<usize> {
        self.pattern
    }
}
