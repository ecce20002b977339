use std::fmt::{self, Display};
use std::mem;

/// Labels of nodes produced by unnamed composites.
pub const NODE_GROUPING: &str = "grouping";
pub const NODE_REPETITION: &str = "repetition";
pub const NODE_OPTIONAL: &str = "optional";

/// Half-open range of input offsets covered by a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub begin: usize,
    pub end: usize,
}

impl Span {
    pub fn new(begin: usize, end: usize) -> Self {
        Span { begin, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.begin
    }

    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Content<E> {
    /// Elements matched by a terminal.
    Leaf(Vec<E>),
    Branch(Vec<SNode<E>>),
}

/// A node of the parse tree.
///
/// Terminals produce leaves labeled with their pattern, non-terminals produce
/// a branch labeled with the rule name, groupings, repetitions and optionals
/// produce branches labeled `grouping`, `repetition` and `optional`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SNode<E> {
    label: String,
    content: Content<E>,
    span: Span,
}

impl<E> SNode<E> {
    pub fn leaf(label: &str, elements: Vec<E>, span: Span) -> Self {
        SNode {
            label: label.to_owned(),
            content: Content::Leaf(elements),
            span,
        }
    }

    pub fn branch(label: &str, children: Vec<SNode<E>>, span: Span) -> Self {
        SNode {
            label: label.to_owned(),
            content: Content::Branch(children),
            span,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.content, Content::Leaf(_))
    }

    /// Child nodes, empty for leaves.
    pub fn children(&self) -> &[SNode<E>] {
        match &self.content {
            Content::Branch(children) => children,
            Content::Leaf(_) => &[],
        }
    }

    /// Matched elements, empty for branches.
    pub fn elements(&self) -> &[E] {
        match &self.content {
            Content::Leaf(elements) => elements,
            Content::Branch(_) => &[],
        }
    }

    /// Iterate over this node and all its descendants in depth-first
    /// pre-order.
    pub fn iter(&self) -> DfsParseTreeIterator<'_, E> {
        DfsParseTreeIterator {
            pending: vec![(0, self)],
        }
    }

    /// Descendants (and possibly this node) with the given label.
    pub fn find_all<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a SNode<E>> + 'a {
        self.iter()
            .map(|(_, node)| node)
            .filter(move |node| node.label == label)
    }
}

impl SNode<char> {
    /// All matched characters below this node, in input order.
    pub fn text(&self) -> String {
        self.iter()
            .flat_map(|(_, node)| node.elements().iter())
            .collect()
    }
}

/// Frees descendants from a worklist, so dropping a deep tree does not recurse
/// once per level.
impl<E> Drop for SNode<E> {
    fn drop(&mut self) {
        let mut pending = match &mut self.content {
            Content::Branch(children) => mem::take(children),
            Content::Leaf(_) => return,
        };
        while let Some(mut node) = pending.pop() {
            if let Content::Branch(children) = &mut node.content {
                pending.append(children);
            }
        }
    }
}

/// Depth-first pre-order walk over a parse tree, yielding each node with its
/// depth below the starting node.
pub struct DfsParseTreeIterator<'a, E> {
    pending: Vec<(usize, &'a SNode<E>)>,
}

impl<'a, E> Iterator for DfsParseTreeIterator<'a, E> {
    type Item = (usize, &'a SNode<E>);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.pending.pop()?;
        self.pending
            .extend(node.children().iter().rev().map(|child| (depth + 1, child)));
        Some((depth, node))
    }
}

/// Indented tree, one node per line.
impl<E: Display> Display for SNode<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (depth, node) in self.iter() {
            write!(
                f,
                "{:indent$}{} {}..{}",
                "",
                node.label,
                node.span.begin,
                node.span.end,
                indent = depth * 2
            )?;
            if let Content::Leaf(elements) = &node.content {
                write!(f, " ")?;
                for elem in elements {
                    write!(f, "{}", elem)?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
