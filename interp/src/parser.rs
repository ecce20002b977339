use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ebnf::{Meta, MetaVal, Schema};
use tracing::{debug, trace, warn};

use crate::diagnostic::{Diagnostic, ErrorLog, ParseFailure};
use crate::frame::{Frame, Outcome, State};
use crate::node::{SNode, Span, NODE_GROUPING, NODE_OPTIONAL, NODE_REPETITION};
use crate::source::SourceArray;

/// Externally visible state of a parse run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Frames remain on the control stack.
    Running,
    /// The control stack resolved. Any leftover input or failure of the entry
    /// rule has been logged.
    Exhausted,
    /// Halted by a schema error, a stop request or the step limit.
    Stopped,
}

/// Cooperative cancellation for a running parse. Cloned handles share the
/// same flag; the driver checks it before every step.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// Result of a parse run.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutput<E> {
    /// Tree built by the entry rule, `None` if it failed or the run halted.
    pub root: Option<SNode<E>>,
    pub errors: ErrorLog,
}

impl<E> ParseOutput<E> {
    /// The tree, provided the run produced one and logged nothing.
    pub fn into_result(self) -> Result<SNode<E>, ParseFailure> {
        match self.root {
            Some(root) if self.errors.is_empty() => Ok(root),
            _ => Err(ParseFailure {
                errors: self.errors,
            }),
        }
    }
}

/// Control directive returned by a frame visit.
enum Flow<'s, E, U> {
    /// Visit the same frame again.
    Stay,
    /// Keep the frame and start matching a child above it.
    Descend(Frame<'s, E, U>),
    /// Pop the frame, handing its node to the parent.
    Return(Option<SNode<E>>),
    /// Pop the frame, rewind to its entry and report failure to the parent.
    Back,
    /// Stop the run.
    Halt,
}

/// Interprets a `Schema` against a `SourceArray` using an explicit control
/// stack and backtracking.
///
/// Each step visits the frame on top of the stack once. A visit consumes at
/// most one input element, and either keeps the frame, pushes a child, or pops
/// the frame and reports to its parent, which decides what to do on its next
/// visit. A failing frame rewinds the cursor to where it began.
///
/// ```
/// use ebnf::{grouping, non_terminal, alternation, Schema};
/// use interp::{CharArray, Parser};
///
/// let schema = Schema::new(vec![
///     ("ENTRY", grouping(vec!["a".into(), non_terminal("B").into()])),
///     ("B", alternation(vec!["b".into(), "c".into()])),
/// ])
/// .unwrap();
/// let source = CharArray::new("ac");
/// let output = Parser::new(&schema, &source).run();
/// assert!(output.errors.is_empty());
/// assert_eq!(output.root.unwrap().text(), "ac");
/// ```
pub struct Parser<'s, S: SourceArray> {
    schema: &'s Schema,
    source: &'s S,
    stack: Vec<Frame<'s, S::Elem, S::Unit>>,
    /// Offset of the next element to be considered.
    cursor: usize,
    /// Furthest offset a terminal failed at.
    furthest: usize,
    /// What the outermost frame reported when it finished.
    resolved: Option<Outcome<S::Elem>>,
    root: Option<SNode<S::Elem>>,
    errors: ErrorLog,
    phase: Phase,
    steps: usize,
    step_limit: Option<usize>,
    stop: StopHandle,
}

impl<'s, S: SourceArray> Parser<'s, S> {
    pub fn new(schema: &'s Schema, source: &'s S) -> Self {
        let mut parser = Parser {
            schema,
            source,
            stack: Vec::new(),
            cursor: 0,
            furthest: 0,
            resolved: None,
            root: None,
            errors: ErrorLog::new(),
            phase: Phase::Running,
            steps: 0,
            step_limit: None,
            stop: StopHandle::default(),
        };
        parser.init();
        parser
    }

    /// Halt the run once `limit` steps have been taken.
    pub fn with_step_limit(mut self, limit: usize) -> Self {
        self.step_limit = Some(limit);
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Reset to the start of the input with only the entry rule on the stack.
    pub fn init(&mut self) {
        self.stack.clear();
        self.stack
            .push(Frame::new(Self::meta_state(self.schema.entry()), 0));
        self.cursor = 0;
        self.furthest = 0;
        self.resolved = None;
        self.root = None;
        self.errors = ErrorLog::new();
        self.phase = Phase::Running;
        self.steps = 0;
        self.stop.reset();
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Number of frames currently on the control stack.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn errors(&self) -> &ErrorLog {
        &self.errors
    }

    /// Drive the run to completion and hand over the tree and the log.
    pub fn run(&mut self) -> ParseOutput<S::Elem> {
        while self.step() == Phase::Running {}
        ParseOutput {
            root: self.root.take(),
            errors: mem::take(&mut self.errors),
        }
    }

    /// Visit the top frame once.
    pub fn step(&mut self) -> Phase {
        if self.phase != Phase::Running {
            return self.phase;
        }
        if self.stop.is_stopped() || self.step_limit.map_or(false, |limit| self.steps >= limit) {
            self.halt();
            return self.phase;
        }

        let mut frame = match self.stack.pop() {
            Some(frame) => frame,
            None => {
                self.finish();
                return self.phase;
            }
        };
        self.steps += 1;

        let source = self.source;
        let elem = if self.cursor < source.size() {
            Some(source.element_at(self.cursor))
        } else {
            None
        };
        trace!(
            step = self.steps,
            offset = self.cursor,
            elem = %elem.map_or_else(|| "<end>".to_owned(), |e| source.display(e)),
            frame = %frame.state,
            "visit"
        );

        let outcome = frame.outcome.take();
        let entry = frame.entry;
        let (consumed, flow) = match &mut frame.state {
            State::Terminal {
                pattern,
                units,
                matched,
            } => self.visit_terminal(entry, *pattern, units, matched, elem),
            State::NonTerminal { name } => (false, self.visit_non_terminal(entry, *name, outcome)),
            State::Alternation { alts, next } => {
                (false, self.visit_alternation(*alts, next, outcome))
            }
            State::Optional { item } => (false, self.visit_optional(entry, *item, outcome)),
            State::Repetition {
                item,
                children,
                iteration,
            } => (
                false,
                self.visit_repetition(entry, *item, children, iteration, outcome),
            ),
            State::Grouping {
                items,
                next,
                children,
            } => (
                false,
                self.visit_grouping(entry, *items, next, children, outcome),
            ),
        };
        if consumed {
            self.cursor += 1;
        }

        match flow {
            Flow::Stay => self.stack.push(frame),
            Flow::Descend(child) => {
                debug!(offset = self.cursor, child = %child.state, "push");
                self.stack.push(frame);
                self.stack.push(child);
            }
            Flow::Return(node) => {
                debug!(offset = self.cursor, frame = %frame.state, "return");
                self.deliver(Outcome::Matched(node));
            }
            Flow::Back => {
                debug!(offset = self.cursor, rewind = frame.entry, frame = %frame.state, "back");
                self.cursor = frame.entry;
                self.deliver(Outcome::Failed);
            }
            Flow::Halt => {
                self.stack.clear();
                self.phase = Phase::Stopped;
                return self.phase;
            }
        }

        if self.stack.is_empty() {
            self.finish();
        }
        self.phase
    }

    fn deliver(&mut self, outcome: Outcome<S::Elem>) {
        match self.stack.last_mut() {
            Some(parent) => parent.outcome = Some(outcome),
            None => self.resolved = Some(outcome),
        }
    }

    fn error(&mut self, message: String, offset: usize) {
        let diagnostic = Diagnostic::Input {
            message,
            offset,
            position: self.source.position(offset),
        };
        debug!("{}", diagnostic);
        self.errors.push(diagnostic);
    }

    fn describe(&self, offset: usize) -> String {
        if offset < self.source.size() {
            self.source.display(self.source.element_at(offset))
        } else {
            "end of input".to_owned()
        }
    }

    /// The stack emptied: report leftover input or a failed entry rule.
    fn finish(&mut self) {
        self.phase = Phase::Exhausted;
        match self.resolved.take() {
            Some(Outcome::Matched(node)) => {
                let root = node.unwrap_or_else(|| {
                    SNode::branch(self.schema.entry().kind(), Vec::new(), Span::new(0, self.cursor))
                });
                self.root = Some(root);
                if self.cursor < self.source.size() {
                    let got = self.describe(self.cursor);
                    self.error(format!("expected end of input, got: {}", got), self.cursor);
                }
            }
            Some(Outcome::Failed) | None => {
                let got = self.describe(self.furthest);
                self.error(format!("unexpected {}", got), self.furthest);
            }
        }
    }

    /// Abandon the run from outside the grammar (stop request or step limit).
    fn halt(&mut self) {
        warn!(steps = self.steps, depth = self.stack.len(), "parse halted");
        let message = format!(
            "parse halted after {} steps with {} pending frames",
            self.steps,
            self.stack.len()
        );
        self.error(message, self.cursor);
        self.stack.clear();
        self.phase = Phase::Stopped;
    }

    fn meta_state(meta: &'s Meta) -> State<'s, S::Elem, S::Unit> {
        match meta {
            Meta::NonTerminal(name) => State::NonTerminal { name },
            Meta::Alternation(alts) => State::Alternation { alts, next: 0 },
            Meta::Optional(item) => State::Optional { item },
            Meta::Repetition(item) => State::Repetition {
                item,
                children: Vec::new(),
                iteration: 0,
            },
            Meta::Grouping(items) => State::Grouping {
                items,
                next: 0,
                children: Vec::new(),
            },
        }
    }

    /// A new frame for `val`, starting at the cursor.
    fn open(&self, val: &'s MetaVal) -> Frame<'s, S::Elem, S::Unit> {
        let state = match val {
            MetaVal::Terminal(pattern) => State::Terminal {
                pattern,
                units: self.source.split(pattern),
                matched: Vec::new(),
            },
            MetaVal::Meta(meta) => Self::meta_state(meta),
        };
        Frame::new(state, self.cursor)
    }

    fn visit_terminal(
        &mut self,
        entry: usize,
        pattern: &'s str,
        units: &[S::Unit],
        matched: &mut Vec<S::Elem>,
        elem: Option<&'s S::Elem>,
    ) -> (bool, Flow<'s, S::Elem, S::Unit>) {
        let unit = match units.get(matched.len()) {
            Some(unit) => unit,
            // Empty pattern.
            None => {
                let leaf = SNode::leaf(pattern, Vec::new(), Span::new(entry, entry));
                return (false, Flow::Return(Some(leaf)));
            }
        };
        let elem = match elem {
            Some(elem) if self.source.matches(unit, elem) => elem,
            _ => {
                self.furthest = self.furthest.max(self.cursor);
                return (false, Flow::Back);
            }
        };
        matched.push(elem.clone());
        if matched.len() == units.len() {
            let leaf = SNode::leaf(pattern, mem::take(matched), Span::new(entry, self.cursor + 1));
            (true, Flow::Return(Some(leaf)))
        } else {
            (true, Flow::Stay)
        }
    }

    fn visit_non_terminal(
        &mut self,
        entry: usize,
        name: &'s str,
        outcome: Option<Outcome<S::Elem>>,
    ) -> Flow<'s, S::Elem, S::Unit> {
        match outcome {
            None => {
                if self.stack.iter().any(|frame| frame.expands(name, entry)) {
                    debug!(rule = name, offset = entry, "left recursion rejected");
                    return Flow::Back;
                }
                match self.schema.get(name) {
                    Some(meta) => Flow::Descend(Frame::new(Self::meta_state(meta), self.cursor)),
                    None => {
                        warn!(rule = name, "undefined non-terminal");
                        self.errors.push(Diagnostic::Schema {
                            message: format!("non-terminal \"{}\" is not defined", name),
                        });
                        Flow::Halt
                    }
                }
            }
            Some(Outcome::Matched(node)) => Flow::Return(Some(SNode::branch(
                name,
                node.into_iter().collect(),
                Span::new(entry, self.cursor),
            ))),
            Some(Outcome::Failed) => Flow::Back,
        }
    }

    fn visit_alternation(
        &mut self,
        alts: &'s [MetaVal],
        next: &mut usize,
        outcome: Option<Outcome<S::Elem>>,
    ) -> Flow<'s, S::Elem, S::Unit> {
        if let Some(Outcome::Matched(node)) = outcome {
            return Flow::Return(node);
        }
        match alts.get(*next) {
            Some(alt) => {
                *next += 1;
                Flow::Descend(self.open(alt))
            }
            None => Flow::Back,
        }
    }

    fn visit_optional(
        &mut self,
        entry: usize,
        item: &'s MetaVal,
        outcome: Option<Outcome<S::Elem>>,
    ) -> Flow<'s, S::Elem, S::Unit> {
        match outcome {
            None => Flow::Descend(self.open(item)),
            Some(Outcome::Matched(node)) => Flow::Return(node.map(|child| {
                SNode::branch(NODE_OPTIONAL, vec![child], Span::new(entry, self.cursor))
            })),
            Some(Outcome::Failed) => Flow::Return(None),
        }
    }

    fn visit_repetition(
        &mut self,
        entry: usize,
        item: &'s MetaVal,
        children: &mut Vec<SNode<S::Elem>>,
        iteration: &mut usize,
        outcome: Option<Outcome<S::Elem>>,
    ) -> Flow<'s, S::Elem, S::Unit> {
        match outcome {
            None => {
                *iteration = self.cursor;
                Flow::Descend(self.open(item))
            }
            // An iteration that consumed nothing would repeat forever, so it
            // ends the loop instead.
            Some(Outcome::Matched(node)) if self.cursor > *iteration => {
                children.extend(node);
                *iteration = self.cursor;
                Flow::Descend(self.open(item))
            }
            Some(_) => Flow::Return(Some(SNode::branch(
                NODE_REPETITION,
                mem::take(children),
                Span::new(entry, self.cursor),
            ))),
        }
    }

    fn visit_grouping(
        &mut self,
        entry: usize,
        items: &'s [MetaVal],
        next: &mut usize,
        children: &mut Vec<SNode<S::Elem>>,
        outcome: Option<Outcome<S::Elem>>,
    ) -> Flow<'s, S::Elem, S::Unit> {
        match outcome {
            Some(Outcome::Failed) => return Flow::Back,
            Some(Outcome::Matched(node)) => children.extend(node),
            None => {}
        }
        match items.get(*next) {
            Some(item) => {
                *next += 1;
                Flow::Descend(self.open(item))
            }
            None => Flow::Return(Some(SNode::branch(
                NODE_GROUPING,
                mem::take(children),
                Span::new(entry, self.cursor),
            ))),
        }
    }
}

/// Interpret `source` against `schema` from start to finish.
pub fn parse<S: SourceArray>(schema: &Schema, source: &S) -> ParseOutput<S::Elem> {
    Parser::new(schema, source).run()
}
