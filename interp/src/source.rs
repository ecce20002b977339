use std::fmt::Debug;

use crate::position::{LineTable, Position};

/// Input the engine matches terminal patterns against.
///
/// Implementations are fully materialized before parsing starts; the engine
/// only ever reads from them.
pub trait SourceArray {
    /// A single input element.
    type Elem: Clone + Debug;
    /// One atomic piece of a terminal pattern, matched against one element.
    type Unit: Debug;

    /// Element at `offset`. `offset` must be less than `size()`.
    fn element_at(&self, offset: usize) -> &Self::Elem;

    fn size(&self) -> usize;

    /// Decompose a terminal pattern into the units matched one element at a
    /// time.
    fn split(&self, pattern: &str) -> Vec<Self::Unit>;

    fn matches(&self, unit: &Self::Unit, elem: &Self::Elem) -> bool;

    fn position(&self, offset: usize) -> Position;

    /// Human readable rendering of an element for diagnostics.
    fn display(&self, elem: &Self::Elem) -> String;
}

/// The character sets behind the `\x` class codes of a terminal pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    /// `\a`: ASCII letter or underscore.
    Alpha,
    /// `\A`
    NotAlpha,
    /// `\w`: ASCII letter, digit or underscore.
    Word,
    /// `\W`
    NotWord,
    /// `\s`: Unicode whitespace.
    Space,
    /// `\S`
    NotSpace,
    /// `\d`: ASCII digit.
    Digit,
    /// `\D`
    NotDigit,
    /// `\n`
    Newline,
    /// `\N`
    NotNewline,
    /// `\t`
    Tab,
}

impl CharClass {
    pub fn from_code(code: char) -> Option<Self> {
        let class = match code {
            'a' => CharClass::Alpha,
            'A' => CharClass::NotAlpha,
            'w' => CharClass::Word,
            'W' => CharClass::NotWord,
            's' => CharClass::Space,
            'S' => CharClass::NotSpace,
            'd' => CharClass::Digit,
            'D' => CharClass::NotDigit,
            'n' => CharClass::Newline,
            'N' => CharClass::NotNewline,
            't' => CharClass::Tab,
            _ => return None,
        };
        Some(class)
    }

    pub fn contains(self, c: char) -> bool {
        match self {
            CharClass::Alpha => is_alpha(c),
            CharClass::NotAlpha => !is_alpha(c),
            CharClass::Word => is_word(c),
            CharClass::NotWord => !is_word(c),
            CharClass::Space => is_space(c),
            CharClass::NotSpace => !is_space(c),
            CharClass::Digit => c.is_ascii_digit(),
            CharClass::NotDigit => !c.is_ascii_digit(),
            CharClass::Newline => c == '\n',
            CharClass::NotNewline => c != '\n',
            CharClass::Tab => c == '\t',
        }
    }
}

fn is_alpha(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_space(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n'
            | '\u{000B}'
            | '\u{000C}'
            | '\r'
            | ' '
            | '\u{00A0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
            | '\u{FEFF}'
    )
}

/// One unit of a decomposed terminal pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Char(char),
    Class(CharClass),
}

impl Unit {
    /// Split `pattern` left to right. `\\` and `\"` collapse to the escaped
    /// character, class codes become `Unit::Class`, any other escaped
    /// character stands for itself and a trailing `\` is a literal backslash.
    pub fn split(pattern: &str) -> Vec<Unit> {
        let mut units = Vec::new();
        let mut chars = pattern.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                units.push(Unit::Char(c));
                continue;
            }
            let unit = match chars.next() {
                Some(code) => match CharClass::from_code(code) {
                    Some(class) => Unit::Class(class),
                    None => Unit::Char(code),
                },
                None => Unit::Char('\\'),
            };
            units.push(unit);
        }
        units
    }

    pub fn matches(self, c: char) -> bool {
        match self {
            Unit::Char(expected) => expected == c,
            Unit::Class(class) => class.contains(c),
        }
    }
}

/// Text input as a sequence of chars, with line endings normalized to `\n`.
#[derive(Debug, Clone)]
pub struct CharArray {
    chars: Vec<char>,
    lines: LineTable,
}

impl CharArray {
    pub fn new(source: &str) -> Self {
        let mut chars = Vec::with_capacity(source.len());
        let mut iter = source.chars().peekable();
        while let Some(c) = iter.next() {
            if c == '\r' {
                if iter.peek() == Some(&'\n') {
                    iter.next();
                }
                chars.push('\n');
            } else {
                chars.push(c);
            }
        }
        let lines = LineTable::new(&chars);
        CharArray { chars, lines }
    }

    pub fn as_slice(&self) -> &[char] {
        &self.chars
    }
}

impl From<&str> for CharArray {
    fn from(s: &str) -> Self {
        CharArray::new(s)
    }
}

impl SourceArray for CharArray {
    type Elem = char;
    type Unit = Unit;

    fn element_at(&self, offset: usize) -> &char {
        &self.chars[offset]
    }

    fn size(&self) -> usize {
        self.chars.len()
    }

    fn split(&self, pattern: &str) -> Vec<Unit> {
        Unit::split(pattern)
    }

    fn matches(&self, unit: &Unit, elem: &char) -> bool {
        unit.matches(*elem)
    }

    fn position(&self, offset: usize) -> Position {
        self.lines.position(offset)
    }

    fn display(&self, elem: &char) -> String {
        format!("{:?}", elem)
    }
}
