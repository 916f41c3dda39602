//! Type predicate and equality tools

use crate::error::Result;
use crate::runtime::{LispEvaluator, Value};
use crate::tools::{Arity, Tool, ToolRegistry};

/// Register all type predicate tools
pub fn register(registry: &mut ToolRegistry) {
    registry.register(TypePredicate::new("number?", Value::is_number));
    registry.register(TypePredicate::new("boolean?", Value::is_boolean));
    registry.register(TypePredicate::new("string?", Value::is_string));
    registry.register(TypePredicate::new("symbol?", Value::is_symbol));
    registry.register(TypePredicate::new("procedure?", Value::is_procedure));
    registry.register(TypePredicate::new("pair?", Value::is_pair));
    registry.register(TypePredicate::new("list?", Value::is_list));
    registry.register(TypePredicate::new("null?", Value::is_null));
    registry.register(TypePredicate::new("not", |v| !v.is_truthy()));

    // eqv? is eq? here: numbers are immediate, there are no characters
    registry.register(Equivalence::new("eq?", Value::is_eq));
    registry.register(Equivalence::new("eqv?", Value::is_eq));
    registry.register(Equivalence::new("equal?", Value::is_equal));
}

/// One-argument predicate over a value's kind
pub struct TypePredicate {
    name: &'static str,
    test: fn(&Value) -> bool,
}

impl TypePredicate {
    fn new(name: &'static str, test: fn(&Value) -> bool) -> Self {
        TypePredicate { name, test }
    }
}

impl Tool for TypePredicate {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "Check the kind of a value"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn execute(&self, _: &mut LispEvaluator, args: &[Value]) -> Result<Value> {
        Ok(Value::Boolean((self.test)(&args[0])))
    }
}

/// Two-argument equality predicate
pub struct Equivalence {
    name: &'static str,
    test: fn(&Value, &Value) -> bool,
}

impl Equivalence {
    fn new(name: &'static str, test: fn(&Value, &Value) -> bool) -> Self {
        Equivalence { name, test }
    }
}

impl Tool for Equivalence {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "Compare two values"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(2)
    }

    fn execute(&self, _: &mut LispEvaluator, args: &[Value]) -> Result<Value> {
        Ok(Value::Boolean((self.test)(&args[0], &args[1])))
    }
}
