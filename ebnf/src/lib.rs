use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::str::FromStr;

use nom::combinator::all_consuming;

mod error;
pub use error::Error;
mod parser;

/// Name of the rule every parse starts from.
pub const ENTRY: &str = "ENTRY";

/// A grammar node. Either a literal terminal pattern or a composite `Meta`.
///
/// Terminal patterns are stored verbatim: escape sequences such as `\"` or
/// class codes such as `\w` are only decomposed when the pattern is matched.
#[derive(PartialEq, Eq, Debug, Clone)]
pub enum MetaVal {
    Terminal(String),
    Meta(Meta),
}

impl From<&str> for MetaVal {
    fn from(s: &str) -> Self {
        MetaVal::Terminal(s.to_owned())
    }
}

impl From<String> for MetaVal {
    fn from(s: String) -> Self {
        MetaVal::Terminal(s)
    }
}

impl From<Meta> for MetaVal {
    fn from(meta: Meta) -> Self {
        MetaVal::Meta(meta)
    }
}

impl Display for MetaVal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MetaVal::Terminal(pattern) => {
                // Single quotes keep a bare `"` unescaped.
                let quote = if has_bare(pattern, '"') && !has_bare(pattern, '\'') {
                    '\''
                } else {
                    '"'
                };
                write!(f, "{}", quote)?;
                let mut chars = pattern.chars();
                while let Some(c) = chars.next() {
                    match c {
                        '\\' => {
                            write!(f, "\\")?;
                            match chars.next() {
                                Some('\n') => write!(f, "n")?,
                                Some(escaped) => write!(f, "{}", escaped)?,
                                // A lone trailing `\` is a literal backslash.
                                None => write!(f, "\\")?,
                            }
                        }
                        '\n' => write!(f, "\\n")?,
                        '\t' => write!(f, "\\t")?,
                        c if c == quote || !parser::is_bare(c) => write!(f, "\\{}", c)?,
                        c => write!(f, "{}", c)?,
                    }
                }
                write!(f, "{}", quote)
            }
            MetaVal::Meta(meta) => write!(f, "{}", meta),
        }
    }
}

/// Whether `pattern` contains `c` outside of an escape sequence.
fn has_bare(pattern: &str, c: char) -> bool {
    let mut chars = pattern.chars();
    while let Some(next) = chars.next() {
        if next == '\\' {
            chars.next();
        } else if next == c {
            return true;
        }
    }
    false
}

impl FromStr for MetaVal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (_, rhs) = all_consuming(parser::rhs)(s)?;
        Ok(rhs)
    }
}

/// A composite grammar node.
#[derive(PartialEq, Eq, Debug, Clone)]
pub enum Meta {
    /// Reference to another named rule.
    NonTerminal(String),
    /// Ordered choice, first match wins.
    Alternation(Vec<MetaVal>),
    /// Zero or one.
    Optional(Box<MetaVal>),
    /// Zero or more.
    Repetition(Box<MetaVal>),
    /// Ordered sequence, every item required.
    Grouping(Vec<MetaVal>),
}

impl Meta {
    /// Short name of the node kind, used when logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Meta::NonTerminal(_) => "non-terminal",
            Meta::Alternation(_) => "alternation",
            Meta::Optional(_) => "optional",
            Meta::Repetition(_) => "repetition",
            Meta::Grouping(_) => "grouping",
        }
    }
}

/// Write an item nested inside a sequence or a choice, parenthesizing the
/// composites that would otherwise bind differently.
fn fmt_nested(item: &MetaVal, f: &mut fmt::Formatter) -> fmt::Result {
    match item {
        MetaVal::Meta(Meta::Alternation(items)) | MetaVal::Meta(Meta::Grouping(items))
            if items.len() > 1 =>
        {
            write!(f, "( {} )", item)
        }
        _ => write!(f, "{}", item),
    }
}

fn fmt_separated(items: &[MetaVal], sep: &str, f: &mut fmt::Formatter) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, " {} ", sep)?;
        }
        fmt_nested(item, f)?;
    }
    Ok(())
}

impl Display for Meta {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Meta::NonTerminal(name) => write!(f, "{}", name),
            Meta::Alternation(items) => fmt_separated(items, "|", f),
            Meta::Optional(item) => write!(f, "[ {} ]", item),
            Meta::Repetition(item) => write!(f, "{{ {} }}", item),
            Meta::Grouping(items) if items.len() == 1 => {
                write!(f, "( ")?;
                fmt_nested(&items[0], f)?;
                write!(f, " )")
            }
            Meta::Grouping(items) => fmt_separated(items, ",", f),
        }
    }
}

/// Reference to the rule called `name`.
pub fn non_terminal(name: &str) -> Meta {
    Meta::NonTerminal(name.to_owned())
}

/// Ordered choice over `items`.
///
/// # Panics
///
/// Panics if `items` is empty.
pub fn alternation(items: Vec<MetaVal>) -> Meta {
    assert!(!items.is_empty(), "alternation needs at least one item");
    Meta::Alternation(items)
}

/// Zero or one of `items`. Several items are grouped first.
///
/// # Panics
///
/// Panics if `items` is empty.
pub fn optional(items: Vec<MetaVal>) -> Meta {
    Meta::Optional(Box::new(single(items, "optional")))
}

/// Zero or more of `items`. Several items are grouped first.
///
/// # Panics
///
/// Panics if `items` is empty.
pub fn repetition(items: Vec<MetaVal>) -> Meta {
    Meta::Repetition(Box::new(single(items, "repetition")))
}

/// Sequence of `items`, all of which must match.
///
/// # Panics
///
/// Panics if `items` is empty.
pub fn grouping(items: Vec<MetaVal>) -> Meta {
    assert!(!items.is_empty(), "grouping needs at least one item");
    Meta::Grouping(items)
}

fn single(mut items: Vec<MetaVal>, what: &str) -> MetaVal {
    assert!(!items.is_empty(), "{} needs at least one item", what);
    if items.len() == 1 {
        items.remove(0)
    } else {
        Meta::Grouping(items).into()
    }
}

/// A set of named rules, one of which is `ENTRY`.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Schema {
    rules: BTreeMap<String, Meta>,
}

impl Schema {
    /// Build a schema from `(name, definition)` pairs.
    pub fn new<I, S>(rules: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (S, Meta)>,
        S: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (name, meta) in rules {
            let name = name.into();
            if map.contains_key(&name) {
                return Err(Error::DuplicateRule(name));
            }
            map.insert(name, meta);
        }
        if !map.contains_key(ENTRY) {
            return Err(Error::MissingEntry);
        }
        Ok(Schema { rules: map })
    }

    /// The definition a parse starts from.
    pub fn entry(&self) -> &Meta {
        // Presence checked in `new`.
        &self.rules[ENTRY]
    }

    pub fn get(&self, name: &str) -> Option<&Meta> {
        self.rules.get(name)
    }

    /// Rules in name order.
    pub fn rules(&self) -> impl Iterator<Item = (&str, &Meta)> {
        self.rules.iter().map(|(name, meta)| (name.as_str(), meta))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Names referenced by some non-terminal but not defined by any rule,
    /// sorted and without duplicates.
    pub fn undefined_references(&self) -> Vec<&str> {
        let mut missing = Vec::new();
        let mut pending: Vec<&Meta> = self.rules.values().collect();
        while let Some(meta) = pending.pop() {
            let items: &[MetaVal] = match meta {
                Meta::NonTerminal(name) => {
                    if !self.rules.contains_key(name) {
                        missing.push(name.as_str());
                    }
                    continue;
                }
                Meta::Alternation(items) | Meta::Grouping(items) => items,
                Meta::Optional(item) | Meta::Repetition(item) => {
                    std::slice::from_ref(item.as_ref())
                }
            };
            for item in items {
                if let MetaVal::Meta(inner) = item {
                    pending.push(inner);
                }
            }
        }
        missing.sort_unstable();
        missing.dedup();
        missing
    }
}

impl Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (name, meta) in &self.rules {
            writeln!(f, "{} = {} ;", name, meta)?;
        }
        Ok(())
    }
}

impl FromStr for Schema {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (_, rules) = parser::grammar(s)?;
        Schema::new(rules)
    }
}
