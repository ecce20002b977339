use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{alpha1, alphanumeric1, char, multispace1, satisfy},
    combinator::{all_consuming, map, recognize},
    multi::{many0, separated_list1},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

use crate::{Meta, MetaVal};

/// Whitespace and `//` line comments.
fn sp(input: &str) -> IResult<&str, &str> {
    recognize(many0(alt((
        multispace1,
        recognize(pair(tag("//"), take_while(|c: char| c != '\n' && c != '\r'))),
    ))))(input)
}

/// Characters a quoted terminal may hold without an escape, apart from its
/// own quote: printable ASCII other than the backslash.
pub(crate) fn is_bare(c: char) -> bool {
    c == ' ' || c.is_ascii_alphanumeric() || (c.is_ascii_punctuation() && c != '\\')
}

/// Body of a quoted terminal. Escapes are kept verbatim so that `\"` does not
/// end the literal.
fn quoted_body<'a>(quote: char) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    recognize(many0(alt((
        recognize(pair(char('\\'), satisfy(|c| c != '\n' && c != '\r'))),
        recognize(satisfy(move |c| c != quote && is_bare(c))),
    ))))
}

pub fn terminal(input: &str) -> IResult<&str, String> {
    let (rem, matched) = alt((
        delimited(char('"'), quoted_body('"'), char('"')),
        delimited(char('\''), quoted_body('\''), char('\'')),
    ))(input)?;
    Ok((rem, matched.to_owned()))
}

pub fn identifier(input: &str) -> IResult<&str, String> {
    let (rem, matched) = recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))(input)?;
    Ok((rem, matched.to_owned()))
}

/// Alternatives separated by `|`, each a sequence of items separated by `,`.
fn choices(input: &str) -> IResult<&str, Vec<Vec<MetaVal>>> {
    separated_list1(char('|'), separated_list1(char(','), term))(input)
}

fn sequence(mut items: Vec<MetaVal>) -> MetaVal {
    if items.len() == 1 {
        items.remove(0)
    } else {
        Meta::Grouping(items).into()
    }
}

fn choice(mut alts: Vec<Vec<MetaVal>>) -> MetaVal {
    if alts.len() == 1 {
        sequence(alts.remove(0))
    } else {
        Meta::Alternation(alts.into_iter().map(sequence).collect()).into()
    }
}

pub fn rhs(input: &str) -> IResult<&str, MetaVal> {
    map(choices, choice)(input)
}

fn term(input: &str) -> IResult<&str, MetaVal> {
    delimited(
        sp,
        alt((
            rhs_group,
            rhs_optional,
            rhs_repetition,
            map(terminal, MetaVal::Terminal),
            map(identifier, |name| MetaVal::Meta(Meta::NonTerminal(name))),
        )),
        sp,
    )(input)
}

/// Parentheses around a single item make a one-item grouping.
fn rhs_group(input: &str) -> IResult<&str, MetaVal> {
    let (rem, mut alts) = delimited(char('('), choices, char(')'))(input)?;
    if alts.len() == 1 && alts[0].len() == 1 {
        Ok((rem, Meta::Grouping(alts.remove(0)).into()))
    } else {
        Ok((rem, choice(alts)))
    }
}

fn rhs_optional(input: &str) -> IResult<&str, MetaVal> {
    let (rem, inner) = delimited(char('['), rhs, char(']'))(input)?;
    Ok((rem, Meta::Optional(Box::new(inner)).into()))
}

fn rhs_repetition(input: &str) -> IResult<&str, MetaVal> {
    let (rem, inner) = delimited(char('{'), rhs, char('}'))(input)?;
    Ok((rem, Meta::Repetition(Box::new(inner)).into()))
}

/// A bare terminal body becomes a one-item alternation, which adds no node of
/// its own.
pub fn rule(input: &str) -> IResult<&str, (String, Meta)> {
    let (rem, (name, _, _, body, _)) =
        tuple((preceded(sp, identifier), sp, char('='), rhs, char(';')))(input)?;
    let body = match body {
        MetaVal::Meta(meta) => meta,
        terminal @ MetaVal::Terminal(_) => Meta::Alternation(vec![terminal]),
    };
    Ok((rem, (name, body)))
}

pub fn grammar(input: &str) -> IResult<&str, Vec<(String, Meta)>> {
    all_consuming(terminated(many0(rule), sp))(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Debug;

    struct TestCase<T> {
        input: &'static str,
        // Some indicates success, None indicates error.
        out: Option<IResult<&'static str, T>>,
    }

    fn assert_test_cases<T, F>(f: F, tests: Vec<TestCase<T>>)
    where
        T: Debug + Eq,
        F: Fn(&'static str) -> IResult<&'static str, T>,
    {
        for t in tests {
            let res = f(t.input);
            match t.out {
                Some(out) => assert_eq!(res, out, "input: {}", t.input),
                None => assert!(res.is_err(), "expected error: {:?}", res),
            }
        }
    }

    fn nt(name: &str) -> MetaVal {
        Meta::NonTerminal(name.to_owned()).into()
    }

    #[test]
    fn parse_terminal() {
        let tests = vec![
            TestCase {
                input: "\"hello\"",
                out: Some(Ok(("", "hello".to_owned()))),
            },
            TestCase {
                input: "\"hello\" world",
                out: Some(Ok((" world", "hello".to_owned()))),
            },
            TestCase {
                input: "'hello' world",
                out: Some(Ok((" world", "hello".to_owned()))),
            },
            TestCase {
                input: r#""a\"b" c"#,
                out: Some(Ok((" c", r#"a\"b"#.to_owned()))),
            },
            TestCase {
                input: r#"'"' x"#,
                out: Some(Ok((" x", "\"".to_owned()))),
            },
            TestCase {
                input: r#""\\""#,
                out: Some(Ok(("", r#"\\"#.to_owned()))),
            },
            TestCase {
                input: "'hello\" world",
                out: None,
            },
            TestCase {
                input: r#""\é" x"#,
                out: Some(Ok((" x", r#"\é"#.to_owned()))),
            },
            TestCase {
                input: "\"é\"",
                out: None,
            },
            TestCase {
                input: "\"a\tb\"",
                out: None,
            },
            TestCase {
                input: "\"a\\\nb\"",
                out: None,
            },
        ];

        assert_test_cases(terminal, tests);
    }

    #[test]
    fn parse_identifier() {
        let tests = vec![
            TestCase {
                input: "hello",
                out: Some(Ok(("", "hello".to_owned()))),
            },
            TestCase {
                input: "hello world",
                out: Some(Ok((" world", "hello".to_owned()))),
            },
            TestCase {
                input: "_=world",
                out: Some(Ok(("=world", "_".to_owned()))),
            },
            TestCase {
                input: "9lives",
                out: None,
            },
        ];

        assert_test_cases(identifier, tests);
    }

    #[test]
    fn parse_rhs() {
        let tests: Vec<TestCase<MetaVal>> = vec![
            TestCase {
                input: "[ test ]",
                out: Some(Ok(("", Meta::Optional(Box::new(nt("test"))).into()))),
            },
            TestCase {
                input: "{ test }",
                out: Some(Ok(("", Meta::Repetition(Box::new(nt("test"))).into()))),
            },
            TestCase {
                input: "( test )",
                out: Some(Ok(("", Meta::Grouping(vec![nt("test")]).into()))),
            },
            TestCase {
                input: "( ( a | b ) ) , ( c , d )",
                out: Some(Ok((
                    "",
                    Meta::Grouping(vec![
                        Meta::Grouping(vec![
                            Meta::Alternation(vec![nt("a"), nt("b")]).into(),
                        ])
                        .into(),
                        Meta::Grouping(vec![nt("c"), nt("d")]).into(),
                    ])
                    .into(),
                ))),
            },
            TestCase {
                input: "a | b | c",
                out: Some(Ok((
                    "",
                    Meta::Alternation(vec![nt("a"), nt("b"), nt("c")]).into(),
                ))),
            },
            TestCase {
                input: "hello , \"world\"",
                out: Some(Ok((
                    "",
                    Meta::Grouping(vec![nt("hello"), "world".into()]).into(),
                ))),
            },
            TestCase {
                input: "a | b , c",
                out: Some(Ok((
                    "",
                    Meta::Alternation(vec![
                        nt("a"),
                        Meta::Grouping(vec![nt("b"), nt("c")]).into(),
                    ])
                    .into(),
                ))),
            },
            TestCase {
                input: "hello | ( \"hello\" | world )",
                out: Some(Ok((
                    "",
                    Meta::Alternation(vec![
                        nt("hello"),
                        Meta::Alternation(vec!["hello".into(), nt("world")]).into(),
                    ])
                    .into(),
                ))),
            },
            TestCase {
                input: "[ ]",
                out: None,
            },
        ];

        assert_test_cases(rhs, tests);
    }

    #[test]
    fn parse_rule() {
        let tests = vec![
            TestCase {
                input: "a = b;",
                out: Some(Ok(("", ("a".to_owned(), Meta::NonTerminal("b".to_owned()))))),
            },
            TestCase {
                input: "a = \"b\" ;",
                out: Some(Ok((
                    "",
                    ("a".to_owned(), Meta::Alternation(vec!["b".into()])),
                ))),
            },
            TestCase {
                input: "a = ( \"b\" ) ;",
                out: Some(Ok((
                    "",
                    ("a".to_owned(), Meta::Grouping(vec!["b".into()])),
                ))),
            },
            TestCase {
                input: "a = b; c = d;",
                out: Some(Ok((
                    " c = d;",
                    ("a".to_owned(), Meta::NonTerminal("b".to_owned())),
                ))),
            },
        ];

        assert_test_cases(rule, tests);
    }

    #[test]
    fn parse_grammar() {
        let tests = vec![
            TestCase {
                input: "a = b;",
                out: Some(Ok((
                    "",
                    vec![("a".to_owned(), Meta::NonTerminal("b".to_owned()))],
                ))),
            },
            TestCase {
                input: "// digits\na = b; // trailing\n  c = { d };\n",
                out: Some(Ok((
                    "",
                    vec![
                        ("a".to_owned(), Meta::NonTerminal("b".to_owned())),
                        ("c".to_owned(), Meta::Repetition(Box::new(nt("d")))),
                    ],
                ))),
            },
            TestCase {
                input: "a = b; junk",
                out: None,
            },
            TestCase {
                input: "a = b; // comment\rjunk",
                out: None,
            },
        ];

        assert_test_cases(grammar, tests);
    }
}
