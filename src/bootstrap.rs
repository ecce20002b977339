use ebnf::{alternation, grouping, non_terminal, repetition, Meta, MetaVal, Schema};

/// The grammar notation accepted by `Schema::from_str`, written in itself.
pub const BOOTSTRAP_EBNF: &str = r##"// Grammar of the grammar notation.
ENTRY = _ , { rule , _ } ;

// Whitespace and line comments.
_ = { " " | "\t" | "\n" | comment } ;
comment = "//" , { "\N" } ;

rule = name , _ , "=" , list , ";" ;
list = sequence , { "|" , sequence } ;
sequence = item , { "," , item } ;
item = _ , ( name | term | group | option | repeat ) , _ ;

name = "\a" , { "\w" } ;
term = "\"" , { dchar } , "\"" | "'" , { schar } , "'" ;
dchar = "\\" , "\N" | "\w" | " "
      | "!" | "#" | "$" | "%" | "&" | "'" | "(" | ")" | "*" | "+"
      | "," | "-" | "." | "/" | ":" | ";" | "<" | "=" | ">" | "?"
      | "@" | "[" | "]" | "^" | "`" | "{" | "|" | "}" | "~" ;
schar = '\\' , '\N' | '\w' | ' '
      | '!' | '"' | '#' | '$' | '%' | '&' | '(' | ')' | '*' | '+'
      | ',' | '-' | '.' | '/' | ':' | ';' | '<' | '=' | '>' | '?'
      | '@' | '[' | ']' | '^' | '`' | '{' | '|' | '}' | '~' ;

group = "(" , list , ")" ;
option = "[" , list , "]" ;
repeat = "{" , list , "}" ;
"##;

/// Printable ASCII allowed inside a quoted terminal, apart from letters,
/// digits, the underscore and the backslash.
const PUNCTUATION: &str = "!\"#$%&'()*+,-./:;<=>?@[]^`{|}~";

fn nt(name: &str) -> MetaVal {
    non_terminal(name).into()
}

/// One character of a terminal quoted with `quote`.
fn quoted_char(quote: char) -> Meta {
    let mut alts: Vec<MetaVal> = vec![
        grouping(vec![r"\\".into(), r"\N".into()]).into(),
        r"\w".into(),
        " ".into(),
    ];
    alts.extend(
        PUNCTUATION
            .chars()
            .filter(|&c| c != quote)
            .map(|c| MetaVal::Terminal(c.to_string())),
    );
    alternation(alts)
}

/// Surrounds `list` with the `open` and `close` brackets.
fn bracketed(open: &str, close: &str) -> Meta {
    grouping(vec![open.into(), nt("list"), close.into()])
}

/// Schema of the grammar notation, built with the builders. Loading
/// `BOOTSTRAP_EBNF` yields an equal schema.
pub fn eebnf_schema() -> Schema {
    let rules = vec![
        (
            "ENTRY",
            grouping(vec![nt("_"), repetition(vec![nt("rule"), nt("_")]).into()]),
        ),
        (
            "_",
            repetition(vec![alternation(vec![
                " ".into(),
                r"\t".into(),
                r"\n".into(),
                nt("comment"),
            ])
            .into()]),
        ),
        (
            "comment",
            grouping(vec!["//".into(), repetition(vec![r"\N".into()]).into()]),
        ),
        (
            "rule",
            grouping(vec![nt("name"), nt("_"), "=".into(), nt("list"), ";".into()]),
        ),
        (
            "list",
            grouping(vec![
                nt("sequence"),
                repetition(vec!["|".into(), nt("sequence")]).into(),
            ]),
        ),
        (
            "sequence",
            grouping(vec![
                nt("item"),
                repetition(vec![",".into(), nt("item")]).into(),
            ]),
        ),
        (
            "item",
            grouping(vec![
                nt("_"),
                alternation(vec![
                    nt("name"),
                    nt("term"),
                    nt("group"),
                    nt("option"),
                    nt("repeat"),
                ])
                .into(),
                nt("_"),
            ]),
        ),
        (
            "name",
            grouping(vec![r"\a".into(), repetition(vec![r"\w".into()]).into()]),
        ),
        (
            "term",
            alternation(vec![
                grouping(vec![
                    r#"\""#.into(),
                    repetition(vec![nt("dchar")]).into(),
                    r#"\""#.into(),
                ])
                .into(),
                grouping(vec![
                    "'".into(),
                    repetition(vec![nt("schar")]).into(),
                    "'".into(),
                ])
                .into(),
            ]),
        ),
        ("dchar", quoted_char('"')),
        ("schar", quoted_char('\'')),
        ("group", bracketed("(", ")")),
        ("option", bracketed("[", "]")),
        ("repeat", bracketed("{", "}")),
    ];
    Schema::new(rules).expect("bootstrap rules are unique and define ENTRY")
}
