use eebnf::ebnf::{alternation, grouping, non_terminal, repetition};
use eebnf::{check_grammar, eebnf_schema, parse_str, SNode, Schema, BOOTSTRAP_EBNF};

#[test]
fn bootstrap_text_loads_as_bootstrap_schema() {
    let loaded: Schema = BOOTSTRAP_EBNF.parse().unwrap();
    assert_eq!(loaded, eebnf_schema());
}

#[test]
fn bootstrap_display_reloads() {
    let schema = eebnf_schema();
    let reloaded: Schema = schema.to_string().parse().unwrap();
    assert_eq!(reloaded, schema);
}

#[test]
fn bootstrap_accepts_itself() {
    let root = check_grammar(BOOTSTRAP_EBNF).into_result().unwrap();
    assert_eq!(root.span().end, BOOTSTRAP_EBNF.chars().count());
    assert_eq!(root.find_all("rule").count(), eebnf_schema().len());
}

#[test]
fn small_grammar_rules() {
    let text = "ENTRY = a , { b } ;\na = \"x\" | 'y' ; // trailing\nb = [ a ] ;\n";
    let root = check_grammar(text).into_result().unwrap();

    let names: Vec<String> = root
        .find_all("rule")
        .map(|rule| rule.children()[0].children()[0].text())
        .collect();
    assert_eq!(names, vec!["ENTRY", "a", "b"]);
    assert_eq!(root.find_all("term").count(), 2);
    assert_eq!(root.find_all("comment").count(), 1);
}

#[test]
fn empty_rule_body_is_rejected() {
    let output = check_grammar("a = ;");
    assert_eq!(
        output.errors.messages(),
        vec!["[error] expected end of input, got: 'a' @ 1:1"]
    );
}

#[test]
fn unterminated_rule_is_rejected() {
    let output = check_grammar("a = b\n");
    assert!(output.root.is_some());
    let messages = output.errors.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("[error] expected end of input"));
}

#[test]
fn loaded_grammar_interprets_input() {
    let schema: Schema = r#"
        ENTRY = greeting , { " " , greeting } ;
        greeting = "hi" | "hello" ;
    "#
    .parse()
    .unwrap();

    let root: SNode<char> = parse_str(&schema, "hello hi").into_result().unwrap();
    let greetings: Vec<String> = root.find_all("greeting").map(SNode::text).collect();
    assert_eq!(greetings, vec!["hello", "hi"]);

    let output = parse_str(&schema, "hey");
    assert!(output.root.is_none());
    assert_eq!(
        output.errors.messages(),
        vec!["[error] unexpected 'y' @ 1:3"]
    );
}

#[test]
fn loader_agrees_with_notation() {
    let cases = [
        ("ENTRY = \"abc\" ;", true),
        ("ENTRY = \"é\" ;", false),
        ("ENTRY = \"\\é\" ;", true),
        ("ENTRY = \"a\tb\" ;", false),
        ("ENTRY = \"a\\tb\" ;", true),
        ("ENTRY = 'say \"hi\"' , \"it's\" ;", true),
        ("ENTRY = \"\\\"\" ;", true),
        ("ENTRY = \"\\\n\" ;", false),
        ("ENTRY = x ; // ünïcödé\nx = ( a ) ;", true),
        ("ENTRY = a ; // comment\rjunk", false),
        ("ENTRY = ;", false),
        ("ENTRY = ( a | b ) , [ c ] , { d } ;", true),
        ("ENTRY = \"unterminated ;", false),
        ("\r\nENTRY\t=\ta ;\r\n", true),
    ];

    for (text, accepted) in cases.iter() {
        let loaded = text.parse::<Schema>();
        assert_eq!(loaded.is_ok(), *accepted, "loader on {:?}: {:?}", text, loaded);

        let output = check_grammar(text);
        assert_eq!(
            output.root.is_some() && output.errors.is_empty(),
            *accepted,
            "notation on {:?}:\n{}",
            text,
            output.errors
        );
    }
}

#[test]
fn one_item_alternation_reloads_to_same_trees() {
    let schema = Schema::new(vec![
        (
            "ENTRY",
            grouping(vec![
                alternation(vec![non_terminal("word").into()]).into(),
                "!".into(),
            ]),
        ),
        (
            "word",
            alternation(vec![repetition(vec![r"\a".into()]).into()]),
        ),
    ])
    .unwrap();
    let reloaded: Schema = schema.to_string().parse().unwrap();
    assert_ne!(reloaded, schema);

    for input in ["hey!", "!", "hey"].iter() {
        assert_eq!(
            parse_str(&schema, input),
            parse_str(&reloaded, input),
            "input: {:?}",
            input
        );
    }
}
