//! Interpret EBNF grammars directly against text.
//!
//! Grammars are `ebnf::Schema` values, either built with the `ebnf` builders or
//! loaded from EBNF text. The `interp` crate matches them against a
//! `SourceArray` with a backtracking control stack.

mod bootstrap;

pub use bootstrap::{eebnf_schema, BOOTSTRAP_EBNF};
pub use ebnf::{self, Schema};
pub use interp::{self, Diagnostic, ErrorLog, ParseFailure, ParseOutput, Parser, SNode};

use interp::CharArray;

/// Interpret `input` against `schema`.
pub fn parse_str(schema: &Schema, input: &str) -> ParseOutput<char> {
    interp::parse(schema, &CharArray::new(input))
}

/// Check `text` against the grammar notation itself.
pub fn check_grammar(text: &str) -> ParseOutput<char> {
    parse_str(&eebnf_schema(), text)
}
