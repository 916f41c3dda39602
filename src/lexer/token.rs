use serde::{Deserialize, Serialize};

/// A single token from the source code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// The type of token
    pub kind: TokenKind,
    /// Original text of the token (string literals keep their quotes)
    pub lexeme: String,
    /// Line number where token appears (1-indexed)
    pub line: usize,
    /// Column number where token starts (1-indexed)
    pub column: usize,
}

impl Token {
    /// Creates a new token with the given properties
    pub fn new(kind: TokenKind, lexeme: String, line: usize, column: usize) -> Self {
        Token {
            kind,
            lexeme,
            line,
            column,
        }
    }
}

/// All possible token types in Schemelet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TokenKind {
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `'` quote mark
    Quote,
    /// Integer literal
    Integer(i64),
    /// Identifier (`foo`, `set!`, `+`, `list->string`)
    Identifier(String),
    /// `#t` / `#f`
    Boolean(bool),
    /// String literal with escapes already resolved
    String(String),
    /// End of input
    Eof,
}

impl TokenKind {
    /// Human readable description used in error messages
    pub fn describe(&self) -> String {
        match self {
            TokenKind::LeftParen => "`(`".to_string(),
            TokenKind::RightParen => "`)`".to_string(),
            TokenKind::Quote => "`'`".to_string(),
            TokenKind::Integer(n) => format!("integer {}", n),
            TokenKind::Identifier(name) => format!("identifier `{}`", name),
            TokenKind::Boolean(b) => format!("boolean {}", if *b { "#t" } else { "#f" }),
            TokenKind::String(_) => "string literal".to_string(),
            TokenKind::Eof => "end of input".to_string(),
        }
    }
}
