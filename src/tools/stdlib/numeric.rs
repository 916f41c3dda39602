//! Integer arithmetic and comparison tools
//!
//! All arithmetic is checked: results outside the `i64` range are runtime
//! errors rather than wrapping. Division truncates toward zero.

use crate::error::{Error, Result};
use crate::runtime::{LispEvaluator, Value};
use crate::tools::{Arity, Tool, ToolRegistry};

/// Register all numeric tools
pub fn register(registry: &mut ToolRegistry) {
    // Arithmetic (variadic)
    registry.register(AddTool);
    registry.register(SubtractTool);
    registry.register(MultiplyTool);
    registry.register(DivideTool);

    // Integer division
    registry.register(IntegerDivision::new("quotient", "Truncated quotient", quotient));
    registry.register(IntegerDivision::new("remainder", "Remainder with the sign of the dividend", remainder));
    registry.register(IntegerDivision::new("modulo", "Modulo with the sign of the divisor", modulo));

    registry.register(AbsTool);
    registry.register(Extremum::new("min", |a, b| a.min(b)));
    registry.register(Extremum::new("max", |a, b| a.max(b)));

    // Comparisons (chained, at least two operands)
    registry.register(Comparison::new("=", |a, b| a == b));
    registry.register(Comparison::new("<", |a, b| a < b));
    registry.register(Comparison::new("<=", |a, b| a <= b));
    registry.register(Comparison::new(">", |a, b| a > b));
    registry.register(Comparison::new(">=", |a, b| a >= b));

    // Single-number predicates
    registry.register(NumberPredicate::new("zero?", |n| n == 0));
    registry.register(NumberPredicate::new("positive?", |n| n > 0));
    registry.register(NumberPredicate::new("negative?", |n| n < 0));
    registry.register(NumberPredicate::new("even?", |n| n % 2 == 0));
    registry.register(NumberPredicate::new("odd?", |n| n % 2 != 0));
}

/// Checks every argument is a number before any arithmetic happens
fn numbers(args: &[Value]) -> Result<Vec<i64>> {
    args.iter().map(Value::as_number).collect()
}

fn overflow(op: &str) -> Error {
    Error::runtime(format!("integer overflow in {}", op))
}

// ============================================================================
// Arithmetic
// ============================================================================

/// + - Sum of all arguments, 0 when there are none
pub struct AddTool;

impl Tool for AddTool {
    fn name(&self) -> &str {
        "+"
    }

    fn description(&self) -> &str {
        "Add numbers"
    }

    fn execute(&self, _: &mut LispEvaluator, args: &[Value]) -> Result<Value> {
        numbers(args)?
            .into_iter()
            .try_fold(0i64, |acc, n| acc.checked_add(n))
            .map(Value::Number)
            .ok_or_else(|| overflow("+"))
    }
}

/// - - Subtract the rest from the first argument
///
/// A single argument is returned unchanged.
pub struct SubtractTool;

impl Tool for SubtractTool {
    fn name(&self) -> &str {
        "-"
    }

    fn description(&self) -> &str {
        "Subtract numbers from the first"
    }

    fn arity(&self) -> Arity {
        Arity::AtLeast(1)
    }

    fn execute(&self, _: &mut LispEvaluator, args: &[Value]) -> Result<Value> {
        let values = numbers(args)?;
        values[1..]
            .iter()
            .try_fold(values[0], |acc, n| acc.checked_sub(*n))
            .map(Value::Number)
            .ok_or_else(|| overflow("-"))
    }
}

/// * - Product of all arguments, 1 when there are none
pub struct MultiplyTool;

impl Tool for MultiplyTool {
    fn name(&self) -> &str {
        "*"
    }

    fn description(&self) -> &str {
        "Multiply numbers"
    }

    fn execute(&self, _: &mut LispEvaluator, args: &[Value]) -> Result<Value> {
        numbers(args)?
            .into_iter()
            .try_fold(1i64, |acc, n| acc.checked_mul(n))
            .map(Value::Number)
            .ok_or_else(|| overflow("*"))
    }
}

/// / - Divide the first argument by the rest, left to right, truncating
pub struct DivideTool;

impl Tool for DivideTool {
    fn name(&self) -> &str {
        "/"
    }

    fn description(&self) -> &str {
        "Truncating integer division"
    }

    fn arity(&self) -> Arity {
        Arity::AtLeast(1)
    }

    fn execute(&self, _: &mut LispEvaluator, args: &[Value]) -> Result<Value> {
        let values = numbers(args)?;
        let mut result = values[0];
        for divisor in &values[1..] {
            result = quotient(result, *divisor)?;
        }
        Ok(Value::Number(result))
    }
}

fn quotient(a: i64, b: i64) -> Result<i64> {
    if b == 0 {
        return Err(Error::DivisionByZero);
    }
    a.checked_div(b).ok_or_else(|| overflow("quotient"))
}

fn remainder(a: i64, b: i64) -> Result<i64> {
    if b == 0 {
        return Err(Error::DivisionByZero);
    }
    // i64::MIN % -1 overflows in Rust but is mathematically 0
    Ok(a.checked_rem(b).unwrap_or(0))
}

fn modulo(a: i64, b: i64) -> Result<i64> {
    let r = remainder(a, b)?;
    if r != 0 && (r < 0) != (b < 0) {
        Ok(r + b)
    } else {
        Ok(r)
    }
}

/// Two-operand integer division family (`quotient`, `remainder`, `modulo`)
pub struct IntegerDivision {
    name: &'static str,
    description: &'static str,
    op: fn(i64, i64) -> Result<i64>,
}

impl IntegerDivision {
    fn new(name: &'static str, description: &'static str, op: fn(i64, i64) -> Result<i64>) -> Self {
        IntegerDivision {
            name,
            description,
            op,
        }
    }
}

impl Tool for IntegerDivision {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn arity(&self) -> Arity {
        Arity::Exact(2)
    }

    fn execute(&self, _: &mut LispEvaluator, args: &[Value]) -> Result<Value> {
        let a = args[0].as_number()?;
        let b = args[1].as_number()?;
        (self.op)(a, b).map(Value::Number)
    }
}

/// abs - Absolute value
pub struct AbsTool;

impl Tool for AbsTool {
    fn name(&self) -> &str {
        "abs"
    }

    fn description(&self) -> &str {
        "Absolute value"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn execute(&self, _: &mut LispEvaluator, args: &[Value]) -> Result<Value> {
        args[0]
            .as_number()?
            .checked_abs()
            .map(Value::Number)
            .ok_or_else(|| overflow("abs"))
    }
}

/// min / max
pub struct Extremum {
    name: &'static str,
    pick: fn(i64, i64) -> i64,
}

impl Extremum {
    fn new(name: &'static str, pick: fn(i64, i64) -> i64) -> Self {
        Extremum { name, pick }
    }
}

impl Tool for Extremum {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "Smallest or largest of the arguments"
    }

    fn arity(&self) -> Arity {
        Arity::AtLeast(1)
    }

    fn execute(&self, _: &mut LispEvaluator, args: &[Value]) -> Result<Value> {
        let values = numbers(args)?;
        let result = values[1..].iter().fold(values[0], |acc, n| (self.pick)(acc, *n));
        Ok(Value::Number(result))
    }
}

// ============================================================================
// Comparisons
// ============================================================================

/// Chained numeric comparison: true when every adjacent pair satisfies `test`
pub struct Comparison {
    name: &'static str,
    test: fn(i64, i64) -> bool,
}

impl Comparison {
    fn new(name: &'static str, test: fn(i64, i64) -> bool) -> Self {
        Comparison { name, test }
    }
}

impl Tool for Comparison {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "Compare numbers pairwise"
    }

    fn arity(&self) -> Arity {
        Arity::AtLeast(2)
    }

    fn execute(&self, _: &mut LispEvaluator, args: &[Value]) -> Result<Value> {
        let values = numbers(args)?;
        let holds = values.windows(2).all(|w| (self.test)(w[0], w[1]));
        Ok(Value::Boolean(holds))
    }
}

/// zero?, positive?, negative?, even?, odd?
pub struct NumberPredicate {
    name: &'static str,
    test: fn(i64) -> bool,
}

impl NumberPredicate {
    fn new(name: &'static str, test: fn(i64) -> bool) -> Self {
        NumberPredicate { name, test }
    }
}

impl Tool for NumberPredicate {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "Test a property of one number"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn execute(&self, _: &mut LispEvaluator, args: &[Value]) -> Result<Value> {
        Ok(Value::Boolean((self.test)(args[0].as_number()?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(source: &str) -> Result<Value> {
        LispEvaluator::new().execute_source(source)
    }

    #[test]
    fn test_identities() {
        assert_eq!(eval("(+)").unwrap(), Value::Number(0));
        assert_eq!(eval("(*)").unwrap(), Value::Number(1));
        assert_eq!(eval("(- 1)").unwrap(), Value::Number(1));
        assert_eq!(eval("(/ 1)").unwrap(), Value::Number(1));
    }

    #[test]
    fn test_variadic_arithmetic() {
        assert_eq!(eval("(+ 1 2 3)").unwrap(), Value::Number(6));
        assert_eq!(eval("(- 10 3 2)").unwrap(), Value::Number(5));
        assert_eq!(eval("(* 2 3 4)").unwrap(), Value::Number(24));
        assert_eq!(eval("(/ 100 (/ 4 2))").unwrap(), Value::Number(50));
        assert_eq!(eval("(/ 100 3 2)").unwrap(), Value::Number(16));
        assert_eq!(eval("(/ -7 2)").unwrap(), Value::Number(-3));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(eval("(/ 1 0)").unwrap_err(), Error::DivisionByZero);
        assert_eq!(eval("(modulo 1 0)").unwrap_err(), Error::DivisionByZero);
    }

    #[test]
    fn test_integer_division_family() {
        assert_eq!(eval("(quotient -7 2)").unwrap(), Value::Number(-3));
        assert_eq!(eval("(remainder -7 2)").unwrap(), Value::Number(-1));
        assert_eq!(eval("(modulo -7 2)").unwrap(), Value::Number(1));
        assert_eq!(eval("(modulo 7 -2)").unwrap(), Value::Number(-1));
    }

    #[test]
    fn test_overflow_is_runtime_error() {
        let err = eval("(* 9223372036854775807 2)").unwrap_err();
        assert_eq!(err.kind_name(), "RuntimeError");
    }

    #[test]
    fn test_type_checked_before_use() {
        assert_eq!(
            eval("(+ 1 \"a\")").unwrap_err(),
            Error::type_error("number", "string")
        );
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(eval("(< 1 2 3)").unwrap(), Value::Boolean(true));
        assert_eq!(eval("(< 1 3 2)").unwrap(), Value::Boolean(false));
        assert_eq!(eval("(= 2 2 2)").unwrap(), Value::Boolean(true));
        assert_eq!(eval("(>= 3 3 1)").unwrap(), Value::Boolean(true));
        assert_eq!(eval("(= 1)").unwrap_err().kind_name(), "ArityError");
    }

    #[test]
    fn test_predicates_and_extrema() {
        assert_eq!(eval("(zero? 0)").unwrap(), Value::Boolean(true));
        assert_eq!(eval("(odd? -3)").unwrap(), Value::Boolean(true));
        assert_eq!(eval("(even? 3)").unwrap(), Value::Boolean(false));
        assert_eq!(eval("(min 4 2 8)").unwrap(), Value::Number(2));
        assert_eq!(eval("(max 4 2 8)").unwrap(), Value::Number(8));
        assert_eq!(eval("(abs -5)").unwrap(), Value::Number(5));
    }
}
