use crate::{Node, NodeValue, ParseError, Position, ProductionNode, ProductionPattern, Token, TokenPattern};
use ptree::TreeItem;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

impl Token {
    pub(crate) fn new(pattern: Arc<TokenPattern>, image: String, line: usize, column: usize) -> Self {
        Self {
            pattern,
            image,
            line,
            column,
        }
    }

    pub fn pattern(&self) -> &Arc<TokenPattern> {
        &self.pattern
    }

    pub fn id(&self) -> usize {
        self.pattern.id()
    }

    pub fn name(&self) -> &str {
        self.pattern.name()
    }

    /// The matched input text.
    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (\"{}\", {}, {})",
            self.name(),
            self.image,
            self.line,
            self.column
        )
    }
}

impl ProductionNode {
    pub(crate) fn new(pattern: Arc<ProductionPattern>, line: usize, column: usize) -> Self {
        Self {
            pattern,
            line,
            column,
            children: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn pattern(&self) -> &Arc<ProductionPattern> {
        &self.pattern
    }

    pub fn id(&self) -> usize {
        self.pattern.id()
    }

    pub fn name(&self) -> &str {
        self.pattern.name()
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Attach a child at the end of the child list.
    pub fn add_child(&mut self, child: Node) {
        self.children.push(child);
    }

    /// Consume the node and take ownership of its children, e.g. to substitute a child for
    /// the node itself in a transforming analyzer.
    pub fn into_children(self) -> Vec<Node> {
        self.children
    }

    /// Append a value slot.
    pub fn add_value(&mut self, value: NodeValue) {
        self.values.push(value);
    }

    pub fn values(&self) -> &[NodeValue] {
        &self.values
    }
}

impl Node {
    pub fn id(&self) -> usize {
        match self {
            Node::Token(token) => token.id(),
            Node::Production(production) => production.id(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Node::Token(token) => token.name(),
            Node::Production(production) => production.name(),
        }
    }

    pub fn line(&self) -> usize {
        match self {
            Node::Token(token) => token.line(),
            Node::Production(production) => production.line,
        }
    }

    pub fn column(&self) -> usize {
        match self {
            Node::Token(token) => token.column(),
            Node::Production(production) => production.column,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.line(), self.column())
    }

    pub fn is_token(&self) -> bool {
        matches!(self, Node::Token(_))
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Node::Production(_))
    }

    /// The token of a leaf node.
    pub fn token(&self) -> Option<&Token> {
        match self {
            Node::Token(token) => Some(token),
            Node::Production(_) => None,
        }
    }

    /// The children of a production node; a token leaf has none.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Token(_) => &[],
            Node::Production(production) => production.children(),
        }
    }

    /// The child at `index`. A missing child is a contract violation and raises an
    /// internal-error parse error.
    pub fn child_at(&self, index: usize) -> Result<&Node, ParseError> {
        self.children().get(index).ok_or_else(|| {
            ParseError::internal(
                format!("node '{}' has no child at index {}", self.name(), index),
                self.position(),
            )
        })
    }

    /// The first child with the given pattern id; its absence is a contract violation.
    pub fn child_with_id(&self, id: usize) -> Result<&Node, ParseError> {
        self.find_child(id).ok_or_else(|| {
            ParseError::internal(
                format!("node '{}' has no child with id {}", self.name(), id),
                self.position(),
            )
        })
    }

    /// The first child with the given pattern id, if any.
    pub fn find_child(&self, id: usize) -> Option<&Node> {
        self.children().iter().find(|child| child.id() == id)
    }

    /// All children with the given pattern id, in order.
    pub fn children_with_id(&self, id: usize) -> Vec<&Node> {
        self.children()
            .iter()
            .filter(|child| child.id() == id)
            .collect()
    }

    pub fn values(&self) -> &[NodeValue] {
        match self {
            Node::Token(_) => &[],
            Node::Production(production) => production.values(),
        }
    }

    /// Append a value slot; token leaves carry no values, writing one is a contract
    /// violation.
    pub fn add_value(&mut self, value: NodeValue) -> Result<(), ParseError> {
        match self {
            Node::Token(_) => Err(ParseError::internal(
                format!("token node '{}' cannot carry values", self.name()),
                self.position(),
            )),
            Node::Production(production) => {
                production.add_value(value);
                Ok(())
            }
        }
    }

    /// The value at `slot`; a missing slot is a contract violation.
    pub fn value_at(&self, slot: usize) -> Result<&NodeValue, ParseError> {
        self.values().get(slot).ok_or_else(|| {
            ParseError::internal(
                format!("node '{}' has no value at slot {}", self.name(), slot),
                self.position(),
            )
        })
    }

    /// The string value at `slot`; a different value type is a contract violation.
    pub fn str_value_at(&self, slot: usize) -> Result<&str, ParseError> {
        match self.value_at(slot)? {
            NodeValue::Str(value) => Ok(value),
            other => Err(self.value_type_error(slot, "a string", other)),
        }
    }

    /// The integer value at `slot`; a different value type is a contract violation.
    pub fn int_value_at(&self, slot: usize) -> Result<i64, ParseError> {
        match self.value_at(slot)? {
            NodeValue::Int(value) => Ok(*value),
            other => Err(self.value_type_error(slot, "an integer", other)),
        }
    }

    /// The node value at `slot`; a different value type is a contract violation.
    pub fn node_value_at(&self, slot: usize) -> Result<&Node, ParseError> {
        match self.value_at(slot)? {
            NodeValue::Node(value) => Ok(value),
            other => Err(self.value_type_error(slot, "a node", other)),
        }
    }

    fn value_type_error(&self, slot: usize, wanted: &str, found: &NodeValue) -> ParseError {
        let found = match found {
            NodeValue::Str(_) => "a string",
            NodeValue::Int(_) => "an integer",
            NodeValue::Node(_) => "a node",
            NodeValue::Raw(tag, _) => tag.as_str(),
        };
        ParseError::internal(
            format!(
                "value slot {} of node '{}' holds {}, not {}",
                slot,
                self.name(),
                found,
                wanted
            ),
            self.position(),
        )
    }

    fn write_level(&self, f: &mut Formatter<'_>, level: usize) -> std::fmt::Result {
        for _ in 0..level {
            write!(f, "  ")?;
        }
        match self {
            Node::Token(token) => writeln!(f, "{}", token),
            Node::Production(production) => {
                writeln!(f, "{}", production.name())?;
                for child in production.children() {
                    child.write_level(f, level + 1)?;
                }
                Ok(())
            }
        }
    }
}

impl Display for Node {
    /// The text serialization of the tree: one node per line, two spaces of indentation
    /// per level; token lines carry the image and position in parentheses.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.write_level(f, 0)
    }
}

impl TreeItem for Node {
    type Child = Self;

    fn write_self<W: std::io::Write>(&self, f: &mut W, _: &ptree::Style) -> std::io::Result<()> {
        match self {
            Node::Token(token) => write!(f, "{}", token),
            Node::Production(production) => write!(f, "{}", production.name()),
        }
    }

    fn children(&self) -> std::borrow::Cow<[Self::Child]> {
        std::borrow::Cow::from(self.children())
    }
}

impl Node {
    /// Pretty print the tree to standard output.
    pub fn print(&self) -> Result<(), std::io::Error> {
        ptree::print_tree(self)
    }
}

impl From<Token> for Node {
    fn from(token: Token) -> Self {
        Node::Token(token)
    }
}

impl From<ProductionNode> for Node {
    fn from(node: ProductionNode) -> Self {
        Node::Production(node)
    }
}
