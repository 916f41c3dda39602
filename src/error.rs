//! Error types for the Schemelet interpreter

use thiserror::Error;

/// Schemelet interpreter errors
///
/// Every error is unrecoverable at the point of detection: evaluation of the
/// current top-level form aborts and the error propagates to the driver.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // Parse errors
    /// Malformed source text or special-form structure
    ///
    /// **Triggered by:** unbalanced parentheses, `else` before the last `cond`
    /// clause, a `do` iterator with more than three elements, bad characters
    /// **Example:** `(+ 1 2 3` (missing closing parenthesis)
    #[error("Syntax error at line {line}, column {col}: {message}")]
    SyntaxError {
        /// Line number where error occurred
        line: usize,
        /// Column number where error occurred
        col: usize,
        /// Error description
        message: String,
    },

    // Runtime errors
    /// Reference to a variable with no binding in the frame chain
    ///
    /// **Triggered by:** lookup or `set!` of a name that was never defined
    /// **Example:** `(set! never-defined 1)`
    #[error("Unbound variable: {name}")]
    UnboundVariable {
        /// Variable name
        name: String,
    },

    /// Wrong number of arguments for a procedure or fixed-arity special form
    ///
    /// **Example:** `((lambda (x) x) 1 2)`
    #[error("Wrong number of arguments for {name}: expected {expected}, got {got}")]
    ArityError {
        /// Procedure or special form name
        name: String,
        /// Expected count, e.g. `2` or `at least 1`
        expected: String,
        /// Actual count
        got: usize,
    },

    /// A value of the wrong kind reached an operation
    ///
    /// **Triggered by:** applying a non-procedure, `(car 5)`, `(+ "a" 1)`
    #[error("Type error: expected {expected}, got {got}")]
    TypeError {
        /// Expected type
        expected: String,
        /// Actual type
        got: String,
    },

    /// Division by zero error
    #[error("Division by zero")]
    DivisionByZero,

    /// General runtime error
    #[error("Runtime error: {0}")]
    RuntimeError(String),

    /// File could not be read by `load` or the driver
    #[error("I/O error on {path}: {message}")]
    Io {
        /// Path that failed
        path: String,
        /// Underlying error message
        message: String,
    },
}

impl Error {
    /// Create a runtime error with a message
    pub fn runtime(msg: impl Into<String>) -> Self {
        Error::RuntimeError(msg.into())
    }

    /// Create a syntax error at a source position
    pub fn syntax(line: usize, col: usize, message: impl Into<String>) -> Self {
        Error::SyntaxError {
            line,
            col,
            message: message.into(),
        }
    }

    /// Create a syntax error found after parsing, where no position is known
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::syntax(0, 0, message)
    }

    /// Create a type error from expected/actual type names
    pub fn type_error(expected: impl Into<String>, got: impl Into<String>) -> Self {
        Error::TypeError {
            expected: expected.into(),
            got: got.into(),
        }
    }

    /// Create an arity error
    pub fn arity(name: impl Into<String>, expected: impl ToString, got: usize) -> Self {
        Error::ArityError {
            name: name.into(),
            expected: expected.to_string(),
            got,
        }
    }

    /// Short name of the error kind, as reported by the driver
    pub fn kind_name(&self) -> &'static str {
        match self {
            Error::SyntaxError { .. } => "SyntaxError",
            Error::UnboundVariable { .. } => "UnboundVariable",
            Error::ArityError { .. } => "ArityError",
            Error::TypeError { .. } => "TypeError",
            Error::DivisionByZero => "DivisionByZero",
            Error::RuntimeError(_) => "RuntimeError",
            Error::Io { .. } => "IoError",
        }
    }
}

/// Result type for Schemelet operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_message() {
        let err = Error::arity("car", 1, 2);
        assert_eq!(
            err.to_string(),
            "Wrong number of arguments for car: expected 1, got 2"
        );
        assert_eq!(err.kind_name(), "ArityError");
    }

    #[test]
    fn test_type_message() {
        let err = Error::type_error("pair", "number");
        assert_eq!(err.to_string(), "Type error: expected pair, got number");
    }

    #[test]
    fn test_syntax_message() {
        let err = Error::syntax(3, 7, "unexpected `)`");
        assert_eq!(
            err.to_string(),
            "Syntax error at line 3, column 7: unexpected `)`"
        );
    }
}
