use std::fmt::{self, Display};

use ebnf::MetaVal;

use crate::node::SNode;

/// How the most recently finished child of a frame went.
#[derive(Debug)]
pub(crate) enum Outcome<E> {
    /// Matched, possibly without producing a node (an optional whose operand
    /// failed).
    Matched(Option<SNode<E>>),
    Failed,
}

/// Node kind of a frame together with its matching progress.
#[derive(Debug)]
pub(crate) enum State<'s, E, U> {
    Terminal {
        pattern: &'s str,
        units: Vec<U>,
        matched: Vec<E>,
    },
    NonTerminal {
        name: &'s str,
    },
    Alternation {
        alts: &'s [MetaVal],
        next: usize,
    },
    Optional {
        item: &'s MetaVal,
    },
    Repetition {
        item: &'s MetaVal,
        children: Vec<SNode<E>>,
        /// Cursor at the start of the current iteration.
        iteration: usize,
    },
    Grouping {
        items: &'s [MetaVal],
        next: usize,
        children: Vec<SNode<E>>,
    },
}

impl<'s, E, U> Display for State<'s, E, U> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            State::Terminal { pattern, .. } => write!(f, "\"{}\"", pattern),
            State::NonTerminal { name } => write!(f, "<{}>", name),
            State::Alternation { next, .. } => write!(f, "alternation#{}", next),
            State::Optional { .. } => write!(f, "optional"),
            State::Repetition { children, .. } => write!(f, "repetition#{}", children.len()),
            State::Grouping { next, .. } => write!(f, "grouping#{}", next),
        }
    }
}

/// One entry of the control stack.
#[derive(Debug)]
pub(crate) struct Frame<'s, E, U> {
    pub state: State<'s, E, U>,
    /// Cursor when this frame started matching. Failure rewinds to it.
    pub entry: usize,
    /// Set when a child frame finishes, taken on the next visit.
    pub outcome: Option<Outcome<E>>,
}

impl<'s, E, U> Frame<'s, E, U> {
    pub fn new(state: State<'s, E, U>, entry: usize) -> Self {
        Frame {
            state,
            entry,
            outcome: None,
        }
    }

    /// Whether this frame is the expansion of rule `name` begun at `entry`.
    pub fn expands(&self, name: &str, entry: usize) -> bool {
        match self.state {
            State::NonTerminal { name: expanding } => expanding == name && self.entry == entry,
            _ => false,
        }
    }
}
