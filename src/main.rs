use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use eebnf::interp::{CharArray, ParseOutput};
use eebnf::{eebnf_schema, Parser, Schema};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Interpret an EBNF grammar against an input file.
///
/// With only a grammar, the grammar text itself is checked against the
/// grammar notation.
#[derive(ClapParser)]
#[command(version, about)]
struct Cli {
    /// EBNF grammar file. Must define an `ENTRY` rule.
    grammar: PathBuf,
    /// Input to interpret. `-` reads stdin.
    input: Option<PathBuf>,
    /// Halt after this many interpreter steps.
    #[arg(long)]
    max_steps: Option<usize>,
    /// Print the parse tree.
    #[arg(long)]
    tree: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(err) => {
            eprintln!("error: {:#}", err);
            process::exit(2);
        }
    }
}

/// Returns whether the input was accepted.
fn run(cli: Cli) -> Result<bool> {
    let grammar_text = fs::read_to_string(&cli.grammar)
        .with_context(|| format!("failed to read grammar {}", cli.grammar.display()))?;

    let output = match &cli.input {
        None => {
            info!(grammar = %cli.grammar.display(), "checking grammar notation");
            interpret(&eebnf_schema(), &grammar_text, cli.max_steps)
        }
        Some(path) => {
            let schema: Schema = grammar_text
                .parse()
                .with_context(|| format!("failed to load grammar {}", cli.grammar.display()))?;
            for name in schema.undefined_references() {
                warn!(rule = name, "reference to undefined rule");
            }
            let input = read_input(path)?;
            interpret(&schema, &input, cli.max_steps)
        }
    };

    if cli.tree {
        if let Some(root) = &output.root {
            print!("{}", root);
        }
    }
    for diagnostic in &output.errors {
        eprintln!("{}", diagnostic);
    }
    Ok(output.root.is_some() && output.errors.is_empty())
}

fn interpret(schema: &Schema, text: &str, max_steps: Option<usize>) -> ParseOutput<char> {
    let source = CharArray::new(text);
    let parser = Parser::new(schema, &source);
    let mut parser = match max_steps {
        Some(limit) => parser.with_step_limit(limit),
        None => parser,
    };
    let output = parser.run();
    info!(steps = parser.steps(), "done");
    output
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut input = String::new();
        io::stdin()
            .read_to_string(&mut input)
            .context("failed to read stdin")?;
        return Ok(input);
    }
    fs::read_to_string(path).with_context(|| format!("failed to read input {}", path.display()))
}
