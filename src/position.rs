use super::Position;
use std::fmt::{Display, Formatter};

impl Position {
    /// Create a new Position object based on the line and column number.
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::new(1, 1)
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("")
            .field("line", &self.line)
            .field("column", &self.column)
            .finish()
    }
}
