//! Pair and list tools

use crate::error::{Error, Result};
use crate::runtime::{LispEvaluator, Value};
use crate::tools::{Arity, Tool, ToolRegistry};

/// Register all pair and list tools
pub fn register(registry: &mut ToolRegistry) {
    registry.register(Cxr::new("car", "a"));
    registry.register(Cxr::new("cdr", "d"));
    registry.register(Cxr::new("caar", "aa"));
    registry.register(Cxr::new("cadr", "ad"));
    registry.register(Cxr::new("cdar", "da"));
    registry.register(Cxr::new("cddr", "dd"));

    registry.register(ConsTool);
    registry.register(ListTool);
    registry.register(LengthTool);
    registry.register(AppendTool);
    registry.register(ReverseTool);
    registry.register(ListRefTool);
}

/// car/cdr and their two-level compositions
///
/// `path` spells the accessors between the `c` and `r`, so `cadr` is `"ad"`
/// and applies `cdr` first, then `car`.
pub struct Cxr {
    name: &'static str,
    path: &'static str,
}

impl Cxr {
    fn new(name: &'static str, path: &'static str) -> Self {
        Cxr { name, path }
    }
}

impl Tool for Cxr {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "Pair accessor"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn execute(&self, _: &mut LispEvaluator, args: &[Value]) -> Result<Value> {
        let mut current = args[0].clone();
        for step in self.path.chars().rev() {
            let pair = current.as_pair()?;
            current = if step == 'a' {
                pair.head.clone()
            } else {
                pair.tail.clone()
            };
        }
        Ok(current)
    }
}

/// cons - Build a pair
pub struct ConsTool;

impl Tool for ConsTool {
    fn name(&self) -> &str {
        "cons"
    }

    fn description(&self) -> &str {
        "Create a pair from a head and a tail"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(2)
    }

    fn execute(&self, _: &mut LispEvaluator, args: &[Value]) -> Result<Value> {
        Ok(Value::cons(args[0].clone(), args[1].clone()))
    }
}

/// list - Build a proper list of the arguments
pub struct ListTool;

impl Tool for ListTool {
    fn name(&self) -> &str {
        "list"
    }

    fn description(&self) -> &str {
        "Create a list"
    }

    fn execute(&self, _: &mut LispEvaluator, args: &[Value]) -> Result<Value> {
        Ok(Value::list(args.to_vec()))
    }
}

/// length - Number of elements of a proper list
pub struct LengthTool;

impl Tool for LengthTool {
    fn name(&self) -> &str {
        "length"
    }

    fn description(&self) -> &str {
        "Length of a proper list"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn execute(&self, _: &mut LispEvaluator, args: &[Value]) -> Result<Value> {
        let length = args[0]
            .list_length()
            .ok_or_else(|| Error::type_error("list", args[0].type_name()))?;
        Ok(Value::Number(length as i64))
    }
}

/// append - Concatenate lists; the last argument is shared, not copied
pub struct AppendTool;

impl Tool for AppendTool {
    fn name(&self) -> &str {
        "append"
    }

    fn description(&self) -> &str {
        "Concatenate lists"
    }

    fn execute(&self, _: &mut LispEvaluator, args: &[Value]) -> Result<Value> {
        let Some((last, init)) = args.split_last() else {
            return Ok(Value::Null);
        };

        let mut items = Vec::new();
        for list in init {
            items.extend(list.as_list()?);
        }
        Ok(Value::list_with_tail(items, last.clone()))
    }
}

/// reverse - New list with the elements in reverse order
pub struct ReverseTool;

impl Tool for ReverseTool {
    fn name(&self) -> &str {
        "reverse"
    }

    fn description(&self) -> &str {
        "Reverse a list"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn execute(&self, _: &mut LispEvaluator, args: &[Value]) -> Result<Value> {
        let reversed = args[0]
            .as_list()?
            .into_iter()
            .fold(Value::Null, |acc, item| Value::cons(item, acc));
        Ok(reversed)
    }
}

/// list-ref - Element at a zero-based index
pub struct ListRefTool;

impl Tool for ListRefTool {
    fn name(&self) -> &str {
        "list-ref"
    }

    fn description(&self) -> &str {
        "Element of a list at an index"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(2)
    }

    fn execute(&self, _: &mut LispEvaluator, args: &[Value]) -> Result<Value> {
        let index = args[1].as_number()?;
        let items = args[0].as_list()?;
        usize::try_from(index)
            .ok()
            .and_then(|i| items.get(i).cloned())
            .ok_or_else(|| {
                Error::runtime(format!(
                    "list-ref: index {} out of range for list of length {}",
                    index,
                    items.len()
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(source: &str) -> Result<Value> {
        LispEvaluator::new().execute_source(source)
    }

    fn display(source: &str) -> String {
        eval(source).unwrap().to_string()
    }

    #[test]
    fn test_car_cdr() {
        assert_eq!(display("(car '(1 2 3))"), "1");
        assert_eq!(display("(cdr '(1 2 3))"), "(2 3)");
        assert_eq!(display("(cadr '(1 2 3))"), "2");
        assert_eq!(display("(cddr '(1 2 3))"), "(3)");
        assert_eq!(display("(caar '((1) 2))"), "1");
        assert_eq!(display("(cdar '((1 . 5) 2))"), "5");
    }

    #[test]
    fn test_car_of_non_pair() {
        assert_eq!(eval("(car 5)").unwrap_err(), Error::type_error("pair", "number"));
        assert_eq!(eval("(cdr '())").unwrap_err(), Error::type_error("pair", "null"));
    }

    #[test]
    fn test_cons_and_list() {
        assert_eq!(display("(cons 1 2)"), "(1 . 2)");
        assert_eq!(display("(cons 1 '(2))"), "(1 2)");
        assert_eq!(display("(list 1 (list 2 3))"), "(1 (2 3))");
        assert_eq!(display("(list)"), "()");
    }

    #[test]
    fn test_length_requires_proper_list() {
        assert_eq!(display("(length '(1 2 3))"), "3");
        assert_eq!(display("(length '())"), "0");
        assert_eq!(eval("(length '(1 . 2))").unwrap_err().kind_name(), "TypeError");
    }

    #[test]
    fn test_append_and_reverse() {
        assert_eq!(display("(append '(1 2) '(3) '() '(4 5))"), "(1 2 3 4 5)");
        assert_eq!(display("(append '(1) 2)"), "(1 . 2)");
        assert_eq!(display("(append)"), "()");
        assert_eq!(display("(reverse '(1 2 3))"), "(3 2 1)");
    }

    #[test]
    fn test_list_ref() {
        assert_eq!(display("(list-ref '(a b c) 1)"), "b");
        assert!(eval("(list-ref '(a b c) 3)").is_err());
        assert!(eval("(list-ref '(a b c) -1)").is_err());
    }
}
