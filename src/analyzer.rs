use crate::{IAnalyzer, Node, ParseError, Strategy, TreeBuilder, TreePrinter};

impl TreeBuilder {
    pub fn new() -> Self {
        Self
    }
}

// The trait defaults already build the tree verbatim.
impl IAnalyzer for TreeBuilder {}

impl TreePrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The text collected so far.
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn into_output(self) -> String {
        self.output
    }
}

impl IAnalyzer for TreePrinter {
    fn strategy(&self) -> Strategy {
        Strategy::Analyze
    }

    fn enter(&mut self, node: &Node) -> Result<(), ParseError> {
        for _ in 0..self.depth {
            self.output.push_str("  ");
        }
        match node {
            Node::Token(token) => {
                self.output.push_str(&token.to_string());
                self.output.push('\n');
            }
            Node::Production(production) => {
                self.output.push_str(production.name());
                self.output.push('\n');
                self.depth += 1;
            }
        }
        Ok(())
    }

    fn exit(&mut self, node: Node) -> Result<Option<Node>, ParseError> {
        if node.is_production() {
            self.depth -= 1;
        }
        Ok(None)
    }
}
