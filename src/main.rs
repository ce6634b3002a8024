use std::fs;
use std::path::PathBuf;

use arith_interpreter::eval::EvalError;
use arith_interpreter::lex::{DanglingOperatorError, SingleTokenError};
use arith_interpreter::{Interpreter, Lexer, Mode};
use clap::Parser;
use clap::Subcommand;
use miette::IntoDiagnostic;
use miette::WrapErr;

const DEMO: &[&str] = &["2+3", "10-4", "6/2", "7", "(1+2)", "2*3+1", "(13-4)-(12+1)"];

#[derive(Parser, Debug)]
#[command(version, about = "Binary integer arithmetic: tokenize, parse and evaluate")]
struct Args {
    /// How quirks of the flat grammar are handled.
    #[arg(long, value_enum, default_value_t = Mode::Strict, global = true)]
    mode: Mode,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Tokenize(Input),
    Parse(Input),
    Evaluate(Input),
    /// Evaluate the built-in sample expressions.
    Demo,
}

#[derive(Debug, clap::Args)]
#[group(required = true, multiple = false)]
struct Input {
    expression: Option<String>,

    #[arg(short, long)]
    file: Option<PathBuf>,
}

impl Input {
    fn read(&self) -> miette::Result<(Option<String>, String)> {
        match (&self.expression, &self.file) {
            (Some(expression), _) => Ok((None, expression.clone())),
            (None, Some(filename)) => {
                let contents = fs::read_to_string(filename)
                    .into_diagnostic()
                    .wrap_err_with(|| format!("reading `{}` failed", filename.display()))?;
                Ok((Some(filename.display().to_string()), contents))
            }
            (None, None) => Err(miette::miette!("no expression given")),
        }
    }
}

fn main() -> miette::Result<()> {
    let args = Args::parse();

    match args.command {
        Commands::Tokenize(input) => {
            let (filename, contents) = input.read()?;
            let tokens = match Lexer::new(filename.as_deref(), &contents).tokenize() {
                Ok(tokens) => tokens,
                Err(e) => fail(e),
            };
            for token in tokens {
                println!("{token}");
            }
            println!("EOF  null");
        }
        Commands::Parse(input) => {
            let (filename, contents) = input.read()?;
            let parser = arith_interpreter::Parser::new(filename.as_deref(), &contents, args.mode);
            match parser.parse() {
                Ok(tree) => println!("{tree}"),
                Err(e) => fail(e),
            }
        }
        Commands::Evaluate(input) => {
            let (filename, contents) = input.read()?;
            match Interpreter::new(filename.as_deref(), &contents, args.mode).evaluate() {
                Ok(value) => println!("{value}"),
                Err(e) => fail(e),
            }
        }
        Commands::Demo => {
            for expression in DEMO {
                match Interpreter::new(None, expression, args.mode).evaluate() {
                    Ok(value) => println!("{expression} = {value}"),
                    Err(e) => fail(e),
                }
            }
        }
    }
    Ok(())
}

/// Reports a pipeline error and exits: 65 for bad input, 70 for a failed
/// evaluation.
fn fail(e: miette::Error) -> ! {
    if let Some(error) = e.downcast_ref::<SingleTokenError>() {
        eprintln!(
            "[line {}] Error: Unexpected character: {}",
            error.line(),
            error.token
        );
    } else if let Some(error) = e.downcast_ref::<DanglingOperatorError>() {
        eprintln!(
            "[line {}] Error: Missing left operand for: {}",
            error.line(),
            error.operator
        );
    }
    eprintln!("{e:?}");

    if e.downcast_ref::<EvalError>().is_some() {
        std::process::exit(70);
    }
    std::process::exit(65);
}
