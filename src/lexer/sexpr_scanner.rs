use super::token::{Token, TokenKind};
use crate::error::{Error, Result};

/// Scanner for Scheme S-expression syntax
pub struct SExprScanner {
    /// Source code as character vector
    source: Vec<char>,
    /// Accumulated tokens
    tokens: Vec<Token>,
    /// Start position of current token
    start: usize,
    /// Current position in source
    current: usize,
    /// Current line number (1-indexed)
    line: usize,
    /// Current column number (1-indexed)
    column: usize,
    /// Line and column where the current token started
    start_line: usize,
    start_column: usize,
}

impl SExprScanner {
    /// Creates a new S-expression scanner from source code
    pub fn new(source: &str) -> Self {
        SExprScanner {
            source: source.chars().collect(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
            column: 1,
            start_line: 1,
            start_column: 1,
        }
    }

    /// Scans all tokens from source code and returns them as a vector
    pub fn scan_tokens(&mut self) -> Result<Vec<Token>> {
        while !self.is_at_end() {
            self.start = self.current;
            self.start_line = self.line;
            self.start_column = self.column;
            self.scan_token()?;
        }

        self.tokens.push(Token::new(
            TokenKind::Eof,
            String::new(),
            self.line,
            self.column,
        ));

        Ok(std::mem::take(&mut self.tokens))
    }

    fn scan_token(&mut self) -> Result<()> {
        let c = self.advance();

        match c {
            ' ' | '\r' | '\t' => {}
            '\n' => {
                self.line += 1;
                self.column = 1;
            }

            ';' => self.skip_line_comment(),

            '(' => self.add_token(TokenKind::LeftParen),
            ')' => self.add_token(TokenKind::RightParen),
            '\'' => self.add_token(TokenKind::Quote),

            '"' => self.scan_string()?,

            '#' => self.scan_boolean()?,

            // A sign only starts a number when a digit follows: `-5` vs `-`
            '+' | '-' if self.peek().is_ascii_digit() => self.scan_number()?,
            c if c.is_ascii_digit() => self.scan_number()?,

            c if is_identifier_char(c) => self.scan_identifier(),

            _ => {
                return Err(Error::syntax(
                    self.start_line,
                    self.start_column,
                    format!("unexpected character '{}'", c),
                ));
            }
        }

        Ok(())
    }

    fn skip_line_comment(&mut self) {
        while !self.is_at_end() && self.peek() != '\n' {
            self.advance();
        }
    }

    fn scan_string(&mut self) -> Result<()> {
        let mut value = String::new();

        while !self.is_at_end() && self.peek() != '"' {
            if self.peek() == '\\' {
                self.advance();
                if self.is_at_end() {
                    break;
                }
                let escaped = self.advance();
                match escaped {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    'r' => value.push('\r'),
                    '\\' => value.push('\\'),
                    '"' => value.push('"'),
                    _ => {
                        return Err(Error::syntax(
                            self.line,
                            self.column,
                            format!("invalid escape sequence \\{}", escaped),
                        ));
                    }
                }
            } else {
                if self.peek() == '\n' {
                    self.line += 1;
                    self.column = 0;
                }
                value.push(self.advance());
            }
        }

        if self.is_at_end() {
            return Err(Error::syntax(
                self.start_line,
                self.start_column,
                "unterminated string",
            ));
        }

        self.advance(); // Closing "

        self.add_token(TokenKind::String(value));
        Ok(())
    }

    fn scan_boolean(&mut self) -> Result<()> {
        while is_identifier_char(self.peek()) {
            self.advance();
        }

        let text: String = self.source[self.start..self.current].iter().collect();
        match text.as_str() {
            "#t" | "#true" => self.add_token(TokenKind::Boolean(true)),
            "#f" | "#false" => self.add_token(TokenKind::Boolean(false)),
            _ => {
                return Err(Error::syntax(
                    self.start_line,
                    self.start_column,
                    format!("unknown literal `{}`", text),
                ));
            }
        }
        Ok(())
    }

    fn scan_number(&mut self) -> Result<()> {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        // `12abc` is neither a number nor an identifier
        if is_identifier_char(self.peek()) {
            while is_identifier_char(self.peek()) {
                self.advance();
            }
            let text: String = self.source[self.start..self.current].iter().collect();
            return Err(Error::syntax(
                self.start_line,
                self.start_column,
                format!("invalid numeric literal `{}`", text),
            ));
        }

        let text: String = self.source[self.start..self.current].iter().collect();
        let value: i64 = text.parse().map_err(|_| {
            Error::syntax(
                self.start_line,
                self.start_column,
                format!("integer literal out of range: {}", text),
            )
        })?;
        self.add_token(TokenKind::Integer(value));

        Ok(())
    }

    fn scan_identifier(&mut self) {
        while is_identifier_char(self.peek()) {
            self.advance();
        }

        let text: String = self.source[self.start..self.current].iter().collect();
        self.add_token(TokenKind::Identifier(text));
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn advance(&mut self) -> char {
        let c = self.source[self.current];
        self.current += 1;
        self.column += 1;
        c
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.source[self.current]
        }
    }

    fn add_token(&mut self, kind: TokenKind) {
        let lexeme: String = self.source[self.start..self.current].iter().collect();
        self.tokens.push(Token::new(
            kind,
            lexeme,
            self.start_line,
            self.start_column,
        ));
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric()
        || matches!(
            c,
            '!' | '$' | '%' | '&' | '*' | '/' | ':' | '<' | '=' | '>' | '?' | '^' | '_' | '~'
                | '+' | '-' | '.'
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        SExprScanner::new(source)
            .scan_tokens()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_simple_sexpr() {
        assert_eq!(
            kinds("(+ 1 2)"),
            vec![
                TokenKind::LeftParen,
                TokenKind::Identifier("+".to_string()),
                TokenKind::Integer(1),
                TokenKind::Integer(2),
                TokenKind::RightParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_quote() {
        let tokens = kinds("'(a b)");
        assert_eq!(tokens[0], TokenKind::Quote);
        assert_eq!(tokens[1], TokenKind::LeftParen);
        assert_eq!(tokens[2], TokenKind::Identifier("a".to_string()));
    }

    #[test]
    fn test_signed_numbers_and_operators() {
        assert_eq!(
            kinds("-5 +7 - +"),
            vec![
                TokenKind::Integer(-5),
                TokenKind::Integer(7),
                TokenKind::Identifier("-".to_string()),
                TokenKind::Identifier("+".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_booleans() {
        assert_eq!(
            kinds("#t #f #true #false"),
            vec![
                TokenKind::Boolean(true),
                TokenKind::Boolean(false),
                TokenKind::Boolean(true),
                TokenKind::Boolean(false),
                TokenKind::Eof,
            ]
        );
        assert!(SExprScanner::new("#x").scan_tokens().is_err());
    }

    #[test]
    fn test_string_keeps_quotes_in_lexeme() {
        let tokens = SExprScanner::new(r#""a\"b""#).scan_tokens().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::String("a\"b".to_string()));
        assert_eq!(tokens[0].lexeme, r#""a\"b""#);
    }

    #[test]
    fn test_unterminated_string() {
        let err = SExprScanner::new("\"abc").scan_tokens().unwrap_err();
        assert_eq!(err.kind_name(), "SyntaxError");
    }

    #[test]
    fn test_comment() {
        let tokens = kinds("; This is a comment\n(+ 1 2)");
        assert_eq!(tokens[0], TokenKind::LeftParen);
        assert_eq!(tokens[1], TokenKind::Identifier("+".to_string()));
    }

    #[test]
    fn test_positions() {
        let tokens = SExprScanner::new("(a\n  bc)").scan_tokens().unwrap();
        assert_eq!((tokens[1].line, tokens[1].column), (1, 2));
        assert_eq!((tokens[2].line, tokens[2].column), (2, 3));
    }

    #[test]
    fn test_scheme_identifiers() {
        assert_eq!(
            kinds("set! list->string <= null?"),
            vec![
                TokenKind::Identifier("set!".to_string()),
                TokenKind::Identifier("list->string".to_string()),
                TokenKind::Identifier("<=".to_string()),
                TokenKind::Identifier("null?".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_integer_overflow_is_syntax_error() {
        assert!(SExprScanner::new("99999999999999999999")
            .scan_tokens()
            .is_err());
    }
}
