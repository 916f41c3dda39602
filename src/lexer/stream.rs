use super::token::{Token, TokenKind};

/// Pull interface between the token source and the parser
///
/// Once the end of input is reached, `peek_kind` keeps answering
/// [`TokenKind::Eof`] and `next_token` keeps returning the end-of-input token.
pub trait TokenSource {
    /// Kind of the next token without consuming it
    fn peek_kind(&self) -> &TokenKind;

    /// Source text of the next token without consuming it
    fn peek_text(&self) -> &str;

    /// Consumes and returns the next token
    fn next_token(&mut self) -> Token;

    /// Line and column of the next token
    fn position(&self) -> (usize, usize);
}

/// Token source backed by the output of [`SExprScanner`](super::SExprScanner)
#[derive(Debug, Clone)]
pub struct TokenStream {
    tokens: Vec<Token>,
    current: usize,
}

impl TokenStream {
    /// Creates a stream; an end-of-input token is appended if missing
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !matches!(tokens.last(), Some(t) if t.kind == TokenKind::Eof) {
            let (line, column) = tokens.last().map(|t| (t.line, t.column)).unwrap_or((1, 1));
            tokens.push(Token::new(TokenKind::Eof, String::new(), line, column));
        }
        TokenStream { tokens, current: 0 }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }
}

impl TokenSource for TokenStream {
    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn peek_text(&self) -> &str {
        &self.peek().lexeme
    }

    fn next_token(&mut self) -> Token {
        let token = self.tokens[self.current].clone();
        if self.current + 1 < self.tokens.len() {
            self.current += 1;
        }
        token
    }

    fn position(&self) -> (usize, usize) {
        let token = self.peek();
        (token.line, token.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::SExprScanner;

    #[test]
    fn test_peek_does_not_consume() {
        let tokens = SExprScanner::new("(x)").scan_tokens().unwrap();
        let mut stream = TokenStream::new(tokens);
        assert_eq!(stream.peek_kind(), &TokenKind::LeftParen);
        assert_eq!(stream.peek_text(), "(");
        assert_eq!(stream.next_token().kind, TokenKind::LeftParen);
        assert_eq!(stream.peek_text(), "x");
    }

    #[test]
    fn test_eof_is_sticky() {
        let mut stream = TokenStream::new(Vec::new());
        assert_eq!(stream.next_token().kind, TokenKind::Eof);
        assert_eq!(stream.next_token().kind, TokenKind::Eof);
        assert_eq!(stream.peek_kind(), &TokenKind::Eof);
    }
}
