//! Schemelet Parser Module
//!
//! Parses S-expressions straight into runtime [`Value`]s; there is no
//! separate syntax tree.

mod sexpr_parser;

use std::fmt::Write;

use crate::runtime::Value;

pub use sexpr_parser::SExprParser;

/// Renders a parsed form as an indented node tree, one node per line
pub fn dump_ast(form: &Value) -> String {
    let mut out = String::new();
    dump_node(&mut out, form, 0);
    out
}

fn dump_node(out: &mut String, value: &Value, indent: usize) {
    let pad = "  ".repeat(indent);
    match value {
        Value::Application(app) => {
            let _ = writeln!(out, "{}Application", pad);
            dump_node(out, &app.operator, indent + 1);
            dump_node(out, &app.arguments, indent + 1);
        }
        Value::Pair(_) => {
            let _ = writeln!(out, "{}List", pad);
            let mut items = value.iter();
            for item in items.by_ref() {
                dump_node(out, item, indent + 1);
            }
            if !items.remainder().is_null() {
                let _ = writeln!(out, "{}  Tail", pad);
                dump_node(out, items.remainder(), indent + 2);
            }
        }
        Value::Null => {
            let _ = writeln!(out, "{}Null", pad);
        }
        Value::SpecialForm(form) => {
            let _ = writeln!(out, "{}SpecialForm({})", pad, form.name());
        }
        Value::Variable(name) => {
            let _ = writeln!(out, "{}Variable({})", pad, name);
        }
        Value::Symbol(name) => {
            let _ = writeln!(out, "{}Symbol({})", pad, name);
        }
        other => {
            let _ = writeln!(out, "{}{}({})", pad, capitalize(other.type_name()), other);
        }
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::SExprScanner;

    #[test]
    fn test_dump_application() {
        let tokens = SExprScanner::new("(define x '(a 1))").scan_tokens().unwrap();
        let form = SExprParser::new(tokens).parse().unwrap().remove(0);
        let dump = dump_ast(&form);
        let expected = "\
Application
  SpecialForm(define)
  List
    Variable(x)
    Application
      SpecialForm(quote)
      List
        List
          Symbol(a)
          Number(1)
";
        assert_eq!(dump, expected);
    }
}
