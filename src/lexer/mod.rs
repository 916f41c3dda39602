//! Lexical analysis for Schemelet
//!
//! Converts source text into a stream of tokens and exposes it to the parser
//! through the pull-style [`TokenSource`] interface.

mod sexpr_scanner;
mod stream;
mod token;

pub use sexpr_scanner::SExprScanner;
pub use stream::{TokenSource, TokenStream};
pub use token::{Token, TokenKind};
