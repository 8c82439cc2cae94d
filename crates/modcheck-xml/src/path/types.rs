//! XPath-subset syntax tree.

/// Which nodes a step looks at relative to each context node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// `/name`: direct children.
    Child,
    /// `//name`: children of the context node or of any of its descendants.
    Descendant,
}

/// What a step keeps out of the nodes its axis visits.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeTest {
    /// Elements with this tag.
    Name(String),
    /// `*`: every element.
    AnyElement,
    /// `text()`: text nodes.
    Text,
}

/// One condition inside a `[...]` filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `@attr` or `@attr="value"`
    Attribute { name: String, value: Option<String> },
    /// `child` or `child="value"` (compared against the child's text content)
    Child { name: String, value: Option<String> },
    /// `text()` or `text()="value"`
    Text { value: Option<String> },
}

/// A `[...]` predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `[n]`: keeps the n-th (1-based) node for each context node.
    Position(usize),
    /// `[a and b ...]`: keeps nodes satisfying every condition.
    Filter(Vec<Condition>),
}

/// One location step.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub axis: Axis,
    pub test: NodeTest,
    pub predicates: Vec<Predicate>,
}

impl Step {
    pub fn new(axis: Axis, test: NodeTest) -> Self {
        Self {
            axis,
            test,
            predicates: Vec::new(),
        }
    }
}

/// A parsed absolute location path.
#[derive(Debug, Clone, PartialEq)]
pub struct XPath {
    pub steps: Vec<Step>,
}

impl XPath {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }
}
