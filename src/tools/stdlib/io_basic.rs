//! Basic I/O for Schemelet
//!
//! Output goes to the evaluator's output sink rather than straight to
//! stdout, so embedders and tests can capture it with [`CapturedOutput`].
//! `load` runs another source file in the global frame.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use crate::error::Result;
use crate::runtime::{LispEvaluator, Value};
use crate::tools::{Arity, Tool, ToolRegistry};

/// Register all I/O tools
pub fn register(registry: &mut ToolRegistry) {
    registry.register(PrintTool);
    registry.register(WriteTool);
    registry.register(DisplayTool);
    registry.register(NewlineTool);
    registry.register(LoadTool);
}

/// Human-oriented text: strings without quotes or escapes
fn display_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.to_string(),
        other => other.to_string(),
    }
}

// ============================================================================
// OUTPUT FUNCTIONS
// ============================================================================

/// print - Display the arguments separated by spaces, then a newline
pub struct PrintTool;

impl Tool for PrintTool {
    fn name(&self) -> &str {
        "print"
    }

    fn description(&self) -> &str {
        "Display values followed by a newline"
    }

    fn arity(&self) -> Arity {
        Arity::AtLeast(1)
    }

    fn execute(&self, evaluator: &mut LispEvaluator, args: &[Value]) -> Result<Value> {
        let mut line = args.iter().map(display_text).collect::<Vec<_>>().join(" ");
        line.push('\n');
        evaluator.write_output(&line)?;
        Ok(Value::Undefined)
    }
}

/// write - Canonical representation, no newline
pub struct WriteTool;

impl Tool for WriteTool {
    fn name(&self) -> &str {
        "write"
    }

    fn description(&self) -> &str {
        "Write the canonical representation of a value"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn execute(&self, evaluator: &mut LispEvaluator, args: &[Value]) -> Result<Value> {
        evaluator.write_output(&args[0].to_string())?;
        Ok(Value::Undefined)
    }
}

/// display - Like write, but strings are written without quotes
pub struct DisplayTool;

impl Tool for DisplayTool {
    fn name(&self) -> &str {
        "display"
    }

    fn description(&self) -> &str {
        "Write a value for humans"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn execute(&self, evaluator: &mut LispEvaluator, args: &[Value]) -> Result<Value> {
        evaluator.write_output(&display_text(&args[0]))?;
        Ok(Value::Undefined)
    }
}

/// newline
pub struct NewlineTool;

impl Tool for NewlineTool {
    fn name(&self) -> &str {
        "newline"
    }

    fn description(&self) -> &str {
        "Write a line break"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(0)
    }

    fn execute(&self, evaluator: &mut LispEvaluator, _: &[Value]) -> Result<Value> {
        evaluator.write_output("\n")?;
        Ok(Value::Undefined)
    }
}

// ============================================================================
// FILES
// ============================================================================

/// load - Evaluate every form of a file in the global frame
pub struct LoadTool;

impl Tool for LoadTool {
    fn name(&self) -> &str {
        "load"
    }

    fn description(&self) -> &str {
        "Evaluate a source file, returning its last value"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn execute(&self, evaluator: &mut LispEvaluator, args: &[Value]) -> Result<Value> {
        let path = args[0].as_string()?.to_string();
        evaluator.load_file(&path)
    }
}

/// In-memory output sink that stays readable after being handed to an evaluator
#[derive(Clone, Default)]
pub struct CapturedOutput {
    buffer: Rc<RefCell<Vec<u8>>>,
}

impl CapturedOutput {
    /// Creates an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.borrow()).into_owned()
    }

    /// Discards everything written so far
    pub fn clear(&self) {
        self.buffer.borrow_mut().clear();
    }
}

impl Write for CapturedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn captured() -> (LispEvaluator, CapturedOutput) {
        let output = CapturedOutput::new();
        let mut evaluator = LispEvaluator::new();
        evaluator.set_output(output.clone());
        (evaluator, output)
    }

    #[test]
    fn test_print_displays_with_newline() {
        let (mut evaluator, output) = captured();
        let result = evaluator.execute_source("(print \"a\" 1 '(b \"c\"))").unwrap();
        assert!(result.is_undefined());
        assert_eq!(output.contents(), "a 1 (b \"c\")\n");
    }

    #[test]
    fn test_write_and_display() {
        let (mut evaluator, output) = captured();
        evaluator
            .execute_source("(write \"x\") (newline) (display \"x\") (display '(1 . 2))")
            .unwrap();
        assert_eq!(output.contents(), "\"x\"\nx(1 . 2)");
    }

    #[test]
    fn test_load_missing_file() {
        let (mut evaluator, _) = captured();
        let err = evaluator
            .execute_source("(load \"/nonexistent/schemelet/file.scm\")")
            .unwrap_err();
        assert_eq!(err.kind_name(), "IoError");
    }

    #[test]
    fn test_load_file_defines_globals() {
        let path = std::env::temp_dir().join(format!("schemelet_load_{}.scm", std::process::id()));
        std::fs::write(&path, "(define loaded-value 41)\n(+ loaded-value 1)\n").unwrap();

        let (mut evaluator, _) = captured();
        let source = format!("(load \"{}\")", path.display());
        assert_eq!(evaluator.execute_source(&source).unwrap(), Value::Number(42));
        assert_eq!(evaluator.execute_source("loaded-value").unwrap(), Value::Number(41));

        std::fs::remove_file(&path).unwrap();
    }
}
