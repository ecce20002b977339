use std::fmt::{self, Display};

/// A 1-based line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Offsets at which each line of some input begins, computed once so that
/// offsets can be mapped back to line and column.
#[derive(Debug, Clone)]
pub struct LineTable {
    starts: Vec<usize>,
}

impl LineTable {
    /// Build the table for already newline-normalized input.
    pub fn new(input: &[char]) -> Self {
        let mut starts = vec![0];
        starts.extend(
            input
                .iter()
                .enumerate()
                .filter(|(_, c)| **c == '\n')
                .map(|(idx, _)| idx + 1),
        );
        LineTable { starts }
    }

    /// Position of `offset`. Offsets past the end of the input continue
    /// counting columns on the last line.
    pub fn position(&self, offset: usize) -> Position {
        // `starts[0]` is 0, so at least one line always qualifies.
        let line = self.starts.partition_point(|start| *start <= offset);
        let column = offset - self.starts[line - 1] + 1;
        Position { line, column }
    }

    pub fn lines(&self) -> usize {
        self.starts.len()
    }
}
