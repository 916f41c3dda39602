//! Tool system for Schemelet
//!
//! Builtin procedures are tools: each has a name, a declared [`Arity`] and an
//! `execute` function over already evaluated arguments. The registry installs
//! them into the global frame as procedure values.

pub mod stdlib;

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::runtime::{Environment, FrameId, LispEvaluator, Value};

/// Tool trait - every builtin procedure implements this
pub trait Tool {
    /// Name the tool is bound to in the global frame
    fn name(&self) -> &str;

    /// Tool description
    fn description(&self) -> &str;

    /// Accepted argument counts, checked before `execute` runs
    fn arity(&self) -> Arity {
        Arity::AtLeast(0)
    }

    /// Execute the tool
    fn execute(&self, evaluator: &mut LispEvaluator, args: &[Value]) -> Result<Value>;
}

/// Argument count accepted by a procedure or special form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly `n`
    Exact(usize),
    /// `n` or more
    AtLeast(usize),
    /// Between the bounds, inclusive
    Range(usize, usize),
}

impl Arity {
    /// Checks whether `count` arguments are accepted
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::Exact(n) => count == n,
            Arity::AtLeast(n) => count >= n,
            Arity::Range(min, max) => (min..=max).contains(&count),
        }
    }

    /// Fails with an arity error naming `name` unless `count` is accepted
    pub fn validate(&self, name: &str, count: usize) -> Result<()> {
        if self.accepts(count) {
            Ok(())
        } else {
            Err(Error::arity(name, self, count))
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{}", n),
            Arity::AtLeast(n) => write!(f, "at least {}", n),
            Arity::Range(min, max) => write!(f, "{} to {}", min, max),
        }
    }
}

/// Tool registry
pub struct ToolRegistry {
    tools: HashMap<String, Rc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create new registry with standard library
    pub fn new() -> Self {
        let mut registry = ToolRegistry {
            tools: HashMap::new(),
        };

        // Register all standard library tools
        stdlib::register_all(&mut registry);

        registry
    }

    /// Create empty registry (for testing)
    pub fn empty() -> Self {
        ToolRegistry {
            tools: HashMap::new(),
        }
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let name = tool.name().to_string();
        self.tools.insert(name, Rc::new(tool));
    }

    /// Get tool by name
    pub fn get(&self, name: &str) -> Option<Rc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Check if tool exists
    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// List all tool names
    pub fn list_tools(&self) -> Vec<String> {
        let mut names: Vec<_> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Get tool count
    pub fn count(&self) -> usize {
        self.tools.len()
    }

    /// Binds every tool as a builtin procedure in `frame`
    pub fn install(&self, env: &mut Environment, frame: FrameId) {
        for (name, tool) in &self.tools {
            // Only fails for a dead frame; callers pass a live one
            let _ = env.define(frame, name.as_str(), Value::builtin(tool.clone()));
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestTool;

    impl Tool for TestTool {
        fn name(&self) -> &str {
            "test"
        }

        fn description(&self) -> &str {
            "A test tool"
        }

        fn arity(&self) -> Arity {
            Arity::Range(0, 1)
        }

        fn execute(&self, _evaluator: &mut LispEvaluator, args: &[Value]) -> Result<Value> {
            if args.is_empty() {
                Ok(Value::Number(42))
            } else {
                Ok(args[0].clone())
            }
        }
    }

    #[test]
    fn test_tool_registration() {
        let mut registry = ToolRegistry::empty();
        registry.register(TestTool);

        assert!(registry.has("test"));
        assert!(!registry.has("UNKNOWN"));
        assert_eq!(registry.count(), 1);
        assert!(registry.get("test").is_some());
    }

    #[test]
    fn test_tool_execution() {
        let mut evaluator = LispEvaluator::with_registry(ToolRegistry::empty());
        let tool = TestTool;
        let result = tool.execute(&mut evaluator, &[]).unwrap();
        assert_eq!(result, Value::Number(42));

        let result = tool
            .execute(&mut evaluator, &[Value::string("hello")])
            .unwrap();
        assert_eq!(result, Value::string("hello"));
    }

    #[test]
    fn test_custom_tool_is_callable() {
        let mut registry = ToolRegistry::empty();
        registry.register(TestTool);
        let mut evaluator = LispEvaluator::with_registry(registry);

        assert_eq!(
            evaluator.execute_source("(test 7)").unwrap(),
            Value::Number(7)
        );
        let err = evaluator.execute_source("(test 1 2)").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Wrong number of arguments for test: expected 0 to 1, got 2"
        );
    }

    #[test]
    fn test_arity_validation() {
        assert!(Arity::Exact(2).accepts(2));
        assert!(!Arity::Exact(2).accepts(3));
        assert!(Arity::AtLeast(1).accepts(5));
        assert!(!Arity::AtLeast(1).accepts(0));
        assert!(Arity::Range(1, 2).validate("f", 3).is_err());
        assert_eq!(Arity::AtLeast(2).to_string(), "at least 2");
    }

    #[test]
    fn test_stdlib_registry() {
        let registry = ToolRegistry::new();
        for name in ["+", "car", "cons", "eq?", "equal?", "print", "load", "string->symbol"] {
            assert!(registry.has(name), "missing builtin {}", name);
        }
    }
}
