//! String and symbol conversion tools

use crate::error::Result;
use crate::runtime::{LispEvaluator, Value};
use crate::tools::{Arity, Tool, ToolRegistry};

/// Register all string tools
pub fn register(registry: &mut ToolRegistry) {
    registry.register(SymbolToStringTool);
    registry.register(StringToSymbolTool);
    registry.register(NumberToStringTool);
    registry.register(StringToNumberTool);
    registry.register(StringAppendTool);
    registry.register(StringLengthTool);
    registry.register(StringEqualTool);
}

/// symbol->string
pub struct SymbolToStringTool;

impl Tool for SymbolToStringTool {
    fn name(&self) -> &str {
        "symbol->string"
    }

    fn description(&self) -> &str {
        "Name of a symbol as a string"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn execute(&self, _: &mut LispEvaluator, args: &[Value]) -> Result<Value> {
        Ok(Value::string(args[0].as_symbol()?))
    }
}

/// string->symbol
pub struct StringToSymbolTool;

impl Tool for StringToSymbolTool {
    fn name(&self) -> &str {
        "string->symbol"
    }

    fn description(&self) -> &str {
        "Symbol named by a string"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn execute(&self, _: &mut LispEvaluator, args: &[Value]) -> Result<Value> {
        Ok(Value::symbol(args[0].as_string()?))
    }
}

/// number->string
pub struct NumberToStringTool;

impl Tool for NumberToStringTool {
    fn name(&self) -> &str {
        "number->string"
    }

    fn description(&self) -> &str {
        "Decimal representation of a number"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn execute(&self, _: &mut LispEvaluator, args: &[Value]) -> Result<Value> {
        Ok(Value::string(args[0].as_number()?.to_string()))
    }
}

/// string->number - `#f` when the text is not an integer
pub struct StringToNumberTool;

impl Tool for StringToNumberTool {
    fn name(&self) -> &str {
        "string->number"
    }

    fn description(&self) -> &str {
        "Parse a decimal integer, #f on failure"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn execute(&self, _: &mut LispEvaluator, args: &[Value]) -> Result<Value> {
        let text = args[0].as_string()?;
        Ok(text
            .trim()
            .parse::<i64>()
            .map(Value::Number)
            .unwrap_or(Value::Boolean(false)))
    }
}

/// string-append
pub struct StringAppendTool;

impl Tool for StringAppendTool {
    fn name(&self) -> &str {
        "string-append"
    }

    fn description(&self) -> &str {
        "Concatenate strings"
    }

    fn execute(&self, _: &mut LispEvaluator, args: &[Value]) -> Result<Value> {
        let parts = args
            .iter()
            .map(Value::as_string)
            .collect::<Result<Vec<_>>>()?;
        Ok(Value::string(parts.concat()))
    }
}

/// string-length - Length in characters
pub struct StringLengthTool;

impl Tool for StringLengthTool {
    fn name(&self) -> &str {
        "string-length"
    }

    fn description(&self) -> &str {
        "Number of characters in a string"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn execute(&self, _: &mut LispEvaluator, args: &[Value]) -> Result<Value> {
        Ok(Value::Number(args[0].as_string()?.chars().count() as i64))
    }
}

/// string=? - Chained content equality
pub struct StringEqualTool;

impl Tool for StringEqualTool {
    fn name(&self) -> &str {
        "string=?"
    }

    fn description(&self) -> &str {
        "Check if all strings have the same content"
    }

    fn arity(&self) -> Arity {
        Arity::AtLeast(2)
    }

    fn execute(&self, _: &mut LispEvaluator, args: &[Value]) -> Result<Value> {
        let texts = args
            .iter()
            .map(Value::as_string)
            .collect::<Result<Vec<_>>>()?;
        Ok(Value::Boolean(texts.windows(2).all(|w| w[0] == w[1])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(source: &str) -> Result<Value> {
        LispEvaluator::new().execute_source(source)
    }

    #[test]
    fn test_symbol_string_conversion() {
        assert_eq!(eval("(symbol->string 'abc)").unwrap(), Value::string("abc"));
        assert_eq!(eval("(string->symbol \"abc\")").unwrap(), Value::symbol("abc"));
        assert_eq!(
            eval("(eq? (string->symbol \"x\") 'x)").unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(eval("(symbol->string \"abc\")").unwrap_err().kind_name(), "TypeError");
    }

    #[test]
    fn test_number_string_conversion() {
        assert_eq!(eval("(number->string -42)").unwrap(), Value::string("-42"));
        assert_eq!(eval("(string->number \"17\")").unwrap(), Value::Number(17));
        assert_eq!(eval("(string->number \"x\")").unwrap(), Value::Boolean(false));
    }

    #[test]
    fn test_string_operations() {
        assert_eq!(
            eval("(string-append \"foo\" \"bar\" \"\")").unwrap(),
            Value::string("foobar")
        );
        assert_eq!(eval("(string-length \"héllo\")").unwrap(), Value::Number(5));
        assert_eq!(eval("(string=? \"a\" \"a\" \"a\")").unwrap(), Value::Boolean(true));
        assert_eq!(eval("(string=? \"a\" \"b\")").unwrap(), Value::Boolean(false));
    }
}
