use std::fmt::{self, Display};

use thiserror::Error;

use crate::position::Position;

/// One entry of a parse run's error log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    /// The grammar itself is broken. Not tied to any input position.
    #[error("[schema error] {message}")]
    Schema { message: String },
    #[error("[error] {message} @ {position}")]
    Input {
        message: String,
        offset: usize,
        position: Position,
    },
}

impl Diagnostic {
    pub fn message(&self) -> &str {
        match self {
            Diagnostic::Schema { message } | Diagnostic::Input { message, .. } => message,
        }
    }

    /// Input offset the diagnostic refers to, if any.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Diagnostic::Schema { .. } => None,
            Diagnostic::Input { offset, .. } => Some(*offset),
        }
    }
}

/// Append-only log of diagnostics for a single parse run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorLog {
    entries: Vec<Diagnostic>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.entries.iter()
    }

    /// Rendered diagnostics, in the order they were logged.
    pub fn messages(&self) -> Vec<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }
}

impl Display for ErrorLog {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{}", entry)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ErrorLog {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// A parse run that produced no tree or logged diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse failed:\n{errors}")]
pub struct ParseFailure {
    pub errors: ErrorLog,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_format() {
        let schema = Diagnostic::Schema {
            message: "non-terminal \"x\" is not defined".to_owned(),
        };
        let input = Diagnostic::Input {
            message: "unexpected 'd'".to_owned(),
            offset: 1,
            position: Position { line: 1, column: 2 },
        };
        assert_eq!(
            schema.to_string(),
            "[schema error] non-terminal \"x\" is not defined"
        );
        assert_eq!(input.to_string(), "[error] unexpected 'd' @ 1:2");
        assert_eq!(input.offset(), Some(1));
        assert_eq!(schema.offset(), None);

        let mut log = ErrorLog::new();
        log.push(schema);
        log.push(input);
        assert_eq!(log.len(), 2);
        assert_eq!(
            log.to_string(),
            "[schema error] non-terminal \"x\" is not defined\n[error] unexpected 'd' @ 1:2\n"
        );
    }
}
