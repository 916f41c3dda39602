//! Schemelet CLI entry point.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use schemelet::{
    dump_ast, ErrorMode, InterpreterConfig, LispEvaluator, RunReport, SExprParser, SExprScanner,
};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schemelet")]
#[command(version, about = "Run Scheme source files or start an interactive prompt")]
struct Cli {
    /// Source files, evaluated in order in one global environment
    files: Vec<String>,

    /// Start the interactive prompt (after running any files)
    #[arg(long)]
    repl: bool,

    /// Report failing forms and keep evaluating the rest
    #[arg(long)]
    keep_going: bool,

    /// Print the node tree of every parsed form before evaluating it
    #[arg(long)]
    dump_ast: bool,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Frames allocated between collections (0 disables collection)
    #[arg(long)]
    gc_threshold: Option<usize>,
}

fn main() -> anyhow::Result<ExitCode> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("schemelet=warn".parse()?))
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => InterpreterConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path))?,
        None => InterpreterConfig::default(),
    };
    if cli.keep_going {
        config.error_mode = ErrorMode::Continue;
    }
    if let Some(threshold) = cli.gc_threshold {
        config.gc_threshold = threshold;
    }
    debug!(?config, "starting");

    let mut evaluator = LispEvaluator::with_config(config.clone());
    let mut failed = false;

    for file in &cli.files {
        let source =
            std::fs::read_to_string(file).with_context(|| format!("reading {}", file))?;
        if cli.dump_ast {
            print_ast(&source);
        }

        let report = evaluator.run_source(&source);
        report_errors(file, &report);
        if !report.is_ok() {
            failed = true;
            if config.error_mode == ErrorMode::Halt {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    if cli.repl || cli.files.is_empty() {
        evaluator.set_config(InterpreterConfig {
            error_mode: ErrorMode::Continue,
            echo_results: true,
            ..config
        });
        repl(&mut evaluator, cli.dump_ast)?;
        return Ok(ExitCode::SUCCESS);
    }

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn report_errors(origin: &str, report: &RunReport) {
    for error in &report.errors {
        eprintln!("{}: {}: {}", origin, error.kind_name(), error);
    }
}

fn print_ast(source: &str) {
    let forms = SExprScanner::new(source)
        .scan_tokens()
        .and_then(|tokens| SExprParser::new(tokens).parse());
    match forms {
        Ok(forms) => {
            for form in &forms {
                print!("{}", dump_ast(form));
            }
        }
        Err(e) => warn!(error = %e, "cannot dump syntax tree"),
    }
}

/// Line-oriented prompt; input accumulates until its parentheses balance
fn repl(evaluator: &mut LispEvaluator, dump: bool) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut buffer = String::new();

    loop {
        print!("{}", if buffer.is_empty() { "> " } else { ". " });
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!();
            return Ok(());
        }
        buffer.push_str(&line);

        if paren_depth(&buffer) > 0 {
            continue;
        }
        if dump {
            print_ast(&buffer);
        }
        let report = evaluator.run_source(&buffer);
        report_errors("repl", &report);
        buffer.clear();
    }
}

/// Open parentheses not yet closed, ignoring strings and comments
fn paren_depth(source: &str) -> i64 {
    let mut depth = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut in_comment = false;

    for c in source.chars() {
        if in_comment {
            in_comment = c != '\n';
        } else if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else {
            match c {
                '(' => depth += 1,
                ')' => depth -= 1,
                '"' => in_string = true,
                ';' => in_comment = true,
                _ => {}
            }
        }
    }

    // An unterminated string also needs more input
    if in_string {
        depth.max(1)
    } else {
        depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paren_depth() {
        assert_eq!(paren_depth("(define x"), 1);
        assert_eq!(paren_depth("(+ 1 2)"), 0);
        assert_eq!(paren_depth("(display \")(\")"), 0);
        assert_eq!(paren_depth("(a ; comment (\n"), 1);
        assert_eq!(paren_depth("\"open"), 1);
        assert_eq!(paren_depth(")"), -1);
    }
}
