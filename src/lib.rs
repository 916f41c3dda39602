//! # Schemelet - A small Scheme interpreter
//!
//! A minimal, embeddable interpreter for a Scheme-like language: integers,
//! booleans, strings, symbols, pairs, closures with lexical scope and
//! mutation, and a fixed set of special forms (`quote`, `if`, `define`,
//! `set!`, `lambda`, `let`, `let*`, `letrec`, `cond`, `do`, `and`, `or`,
//! `begin`).
//!
//! ## Quick Start
//!
//! ### Basic Usage
//!
//! ```rust
//! use schemelet::{Evaluator, Parser, Scanner, Value};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let code = r#"
//!     (define (sum-to n)
//!       (do ((i 1 (+ i 1))
//!            (acc 0 (+ acc i)))
//!           ((> i n) acc)))
//!     (sum-to 10)
//! "#;
//!
//! // Tokenize (scan)
//! let mut scanner = Scanner::new(code);
//! let tokens = scanner.scan_tokens()?;
//!
//! // Parse straight into values
//! let mut parser = Parser::new(tokens);
//! let forms = parser.parse()?;
//!
//! // Execute
//! let mut evaluator = Evaluator::new();
//! let result = evaluator.execute(&forms)?;
//!
//! assert_eq!(result, Value::Number(55));
//! # Ok(())
//! # }
//! ```
//!
//! ### From Source Text
//!
//! ```rust
//! use schemelet::{Evaluator, Value};
//!
//! # fn main() -> schemelet::Result<()> {
//! let mut evaluator = Evaluator::new();
//! evaluator.execute_source("(define counter (let ((n 0)) (lambda () (set! n (+ n 1)))))")?;
//! evaluator.execute_source("(counter)")?;
//!
//! assert_eq!(evaluator.execute_source("(counter)")?, Value::Number(2));
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Source Code → Scanner → Tokens → Parser → Values → Evaluator → Value
//! ```
//!
//! There is no separate syntax tree: the parser produces [`Value`]s. Call
//! sites are `Application` values, quoted data is made of pairs and symbols.
//!
//! - [`Scanner`] - Tokenizes source code
//! - [`Parser`] - Builds values from tokens, checking special-form structure
//! - [`Evaluator`] - Evaluates values against the global frame
//! - [`Environment`] - Frame arena with reachability-based reclamation
//! - [`ToolRegistry`] - Builtin procedures
//!
//! ## Error Handling
//!
//! ```rust
//! use schemelet::{Error, Evaluator};
//!
//! let mut evaluator = Evaluator::new();
//! match evaluator.execute_source("(car 5)") {
//!     Err(Error::TypeError { expected, got }) => {
//!         assert_eq!(expected, "pair");
//!         assert_eq!(got, "number");
//!     }
//!     other => panic!("unexpected result: {:?}", other),
//! }
//! ```
//!
//! ## License
//!
//! Licensed under the [MIT License](https://opensource.org/licenses/MIT).

/// Version of the Schemelet interpreter
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod runtime;
pub mod tools;

// Re-export main types
pub use config::{ErrorMode, InterpreterConfig};
pub use error::{Error, Result};
pub use lexer::{SExprScanner, Token, TokenKind, TokenSource, TokenStream};
pub use parser::{dump_ast, SExprParser};
pub use runtime::{Environment, FrameId, LispEvaluator, Procedure, RunReport, SpecialForm, Value};
pub use tools::stdlib::io_basic::CapturedOutput;
pub use tools::{Arity, Tool, ToolRegistry};

// Convenient type aliases
/// Type alias for the S-expression scanner (lexer).
/// Converts raw source text into tokens for the parser.
pub type Scanner = SExprScanner;

/// Type alias for the S-expression parser.
/// Converts tokens into values ready for evaluation.
pub type Parser = SExprParser;

/// Type alias for the evaluator (interpreter).
pub type Evaluator = LispEvaluator;
