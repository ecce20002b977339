//! A backtracking interpreter that matches `ebnf::Schema` grammars directly
//! against input, without generating a parser first.

mod diagnostic;
mod frame;
mod node;
mod parser;
mod position;
mod source;

pub use diagnostic::{Diagnostic, ErrorLog, ParseFailure};
pub use node::{DfsParseTreeIterator, SNode, Span, NODE_GROUPING, NODE_OPTIONAL, NODE_REPETITION};
pub use parser::{parse, ParseOutput, Parser, Phase, StopHandle};
pub use position::{LineTable, Position};
pub use source::{CharArray, CharClass, SourceArray, Unit};

