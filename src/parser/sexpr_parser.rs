use std::collections::HashSet;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::lexer::{Token, TokenKind, TokenSource, TokenStream};
use crate::runtime::special_forms::{SpecialForm, ELSE_KEYWORD};
use crate::runtime::Value;

/// Recursive-descent parser building [`Value`]s straight from tokens
///
/// Code is parsed into [`Value::Application`] nodes whose identifiers are
/// [`Value::Variable`]s. Quoted data is parsed into pairs whose identifiers
/// are [`Value::Symbol`]s. Special-form keywords in operator position are
/// resolved here, and each special form's structure is checked here.
pub struct SExprParser<S: TokenSource = TokenStream> {
    tokens: S,
}

impl SExprParser<TokenStream> {
    /// Creates a new S-expression parser
    pub fn new(tokens: Vec<Token>) -> Self {
        SExprParser {
            tokens: TokenStream::new(tokens),
        }
    }
}

impl<S: TokenSource> SExprParser<S> {
    /// Creates a parser pulling from any token source
    pub fn from_source(tokens: S) -> Self {
        SExprParser { tokens }
    }

    /// Parses every remaining top-level form
    pub fn parse(&mut self) -> Result<Vec<Value>> {
        let mut forms = Vec::new();
        while let Some(form) = self.parse_one()? {
            forms.push(form);
        }
        Ok(forms)
    }

    /// Parses exactly one top-level form; `None` at end of input
    pub fn parse_one(&mut self) -> Result<Option<Value>> {
        if self.is_at_end() {
            return Ok(None);
        }
        self.parse_form().map(Some)
    }

    /// Parse a form in code position
    fn parse_form(&mut self) -> Result<Value> {
        match self.tokens.peek_kind().clone() {
            TokenKind::LeftParen => {
                self.tokens.next_token();
                self.parse_list()
            }
            TokenKind::Quote => {
                self.tokens.next_token();
                let datum = self.parse_datum()?;
                Ok(Self::keyword_application("quote", Value::list(vec![datum])))
            }
            TokenKind::Identifier(name) => {
                self.tokens.next_token();
                Ok(Value::variable(name))
            }
            TokenKind::RightParen | TokenKind::Eof => Err(self.unexpected()),
            _ => self.parse_atom(),
        }
    }

    /// Integer, boolean and string literals are the same in code and data
    fn parse_atom(&mut self) -> Result<Value> {
        let token = self.tokens.next_token();
        match token.kind {
            TokenKind::Integer(n) => Ok(Value::Number(n)),
            TokenKind::Boolean(b) => Ok(Value::Boolean(b)),
            TokenKind::String(text) => Ok(Value::string(text)),
            other => Err(Error::syntax(
                token.line,
                token.column,
                format!("Expected a literal, found {}", other.describe()),
            )),
        }
    }

    /// Parse the rest of a list form after its `(`
    fn parse_list(&mut self) -> Result<Value> {
        if self.check_right_paren() {
            self.tokens.next_token();
            return Ok(Value::Null);
        }

        if let TokenKind::Identifier(name) = self.tokens.peek_kind() {
            if let Some(form) = SpecialForm::lookup(name) {
                self.tokens.next_token();
                return self.parse_special_form(form);
            }
        }

        let operator = self.parse_form()?;
        let arguments = self.parse_forms_until_close("application")?;
        Ok(Value::application(operator, Value::list(arguments)))
    }

    fn parse_special_form(&mut self, form: SpecialForm) -> Result<Value> {
        let keyword = form.name();
        let arguments = match keyword {
            "quote" => self.parse_quote()?,
            "if" => self.parse_if()?,
            "define" => self.parse_define()?,
            "set!" => self.parse_set()?,
            "lambda" => self.parse_lambda()?,
            "let" | "let*" | "letrec" => self.parse_let(keyword)?,
            "cond" => self.parse_cond()?,
            "do" => self.parse_do()?,
            _ => Value::list(self.parse_forms_until_close(keyword)?),
        };
        Ok(Value::application(Value::SpecialForm(form), arguments))
    }

    /// (quote datum)
    fn parse_quote(&mut self) -> Result<Value> {
        if self.check_right_paren() {
            return Err(self.syntax_error("quote expects exactly one datum, got none"));
        }
        let datum = self.parse_datum()?;
        self.expect_right_paren("quote expects exactly one datum")?;
        Ok(Value::list(vec![datum]))
    }

    /// (if test consequent [alternative])
    fn parse_if(&mut self) -> Result<Value> {
        let operands = self.parse_forms_until_close("if")?;
        if !(2..=3).contains(&operands.len()) {
            return Err(self.syntax_error(format!(
                "if expects 2 or 3 operands, got {}",
                operands.len()
            )));
        }
        Ok(Value::list(operands))
    }

    /// (define name expr) or (define (name params...) body...)
    fn parse_define(&mut self) -> Result<Value> {
        if self.check_left_paren() {
            self.tokens.next_token();
            let name = self.expect_identifier("define")?;
            let params = self.parse_params_until_close("define")?;
            let body = self.parse_body("define")?;
            let lambda = Self::keyword_application("lambda", Value::cons(params, Value::list(body)));
            return Ok(Value::list(vec![Value::Variable(name), lambda]));
        }

        let name = self.expect_identifier("define")?;
        if self.check_right_paren() {
            return Err(self.syntax_error(format!("define of `{}` has no value", name)));
        }
        let value = self.parse_form()?;
        self.expect_right_paren("define expects a name and one value")?;
        Ok(Value::list(vec![Value::Variable(name), value]))
    }

    /// (set! name expr)
    fn parse_set(&mut self) -> Result<Value> {
        let name = self.expect_identifier("set!")?;
        if self.check_right_paren() {
            return Err(self.syntax_error(format!("set! of `{}` has no value", name)));
        }
        let value = self.parse_form()?;
        self.expect_right_paren("set! expects a name and one value")?;
        Ok(Value::list(vec![Value::Variable(name), value]))
    }

    /// (lambda (params...) body...)
    fn parse_lambda(&mut self) -> Result<Value> {
        self.expect_left_paren("lambda parameter list")?;
        let params = self.parse_params_until_close("lambda")?;
        let body = self.parse_body("lambda")?;
        Ok(Value::cons(params, Value::list(body)))
    }

    /// Identifiers up to `)`, duplicates rejected
    fn parse_params_until_close(&mut self, context: &str) -> Result<Value> {
        let mut seen = HashSet::new();
        let mut params = Vec::new();
        while !self.check_right_paren() {
            let (line, col) = self.tokens.position();
            let name = self.expect_identifier(context)?;
            if !seen.insert(name.clone()) {
                return Err(Error::syntax(
                    line,
                    col,
                    format!("{}: duplicate parameter `{}`", context, name),
                ));
            }
            params.push(Value::Variable(name));
        }
        self.expect_right_paren(context)?;
        Ok(Value::list(params))
    }

    /// One or more forms up to `)`
    fn parse_body(&mut self, context: &str) -> Result<Vec<Value>> {
        if self.check_right_paren() {
            return Err(self.syntax_error(format!("{} has an empty body", context)));
        }
        self.parse_forms_until_close(context)
    }

    /// (let ((name init) ...) body...), likewise let* and letrec
    fn parse_let(&mut self, keyword: &str) -> Result<Value> {
        self.expect_left_paren(&format!("{} binding list", keyword))?;

        let mut seen = HashSet::new();
        let mut bindings = Vec::new();
        while !self.check_right_paren() {
            if !self.check_left_paren() {
                return Err(self.expected_error(
                    &format!("`(name value)` binding in {}", keyword),
                ));
            }
            self.tokens.next_token();

            let (line, col) = self.tokens.position();
            let name = self.expect_identifier(keyword)?;
            // let* may rebind a name; the other two bind all names at once
            if keyword != "let*" && !seen.insert(name.clone()) {
                return Err(Error::syntax(
                    line,
                    col,
                    format!("{}: duplicate binding `{}`", keyword, name),
                ));
            }
            if self.check_right_paren() {
                return Err(self.syntax_error(format!(
                    "{}: binding `{}` has no value",
                    keyword, name
                )));
            }
            let init = self.parse_form()?;
            self.expect_right_paren(&format!("{} binding `{}`", keyword, name))?;
            bindings.push(Value::list(vec![Value::Variable(name), init]));
        }
        self.tokens.next_token();

        let body = self.parse_body(keyword)?;
        Ok(Value::cons(Value::list(bindings), Value::list(body)))
    }

    /// (cond (test body...) ... [(else body...)])
    fn parse_cond(&mut self) -> Result<Value> {
        let mut clauses = Vec::new();
        while !self.check_right_paren() {
            if !self.check_left_paren() {
                return Err(self.expected_error("`(test body...)` clause in cond"));
            }
            self.tokens.next_token();

            if self.check_right_paren() {
                return Err(self.syntax_error("cond: empty clause"));
            }

            let is_else =
                matches!(self.tokens.peek_kind(), TokenKind::Identifier(name) if name == ELSE_KEYWORD);
            if is_else {
                self.tokens.next_token();
                let body = self.parse_forms_until_close("cond else clause")?;
                if !self.check_right_paren() {
                    return Err(self.syntax_error("cond: else must be the last clause"));
                }
                clauses.push(Value::cons(Value::symbol(ELSE_KEYWORD), Value::list(body)));
                continue;
            }

            let test = self.parse_form()?;
            let body = self.parse_forms_until_close("cond clause")?;
            clauses.push(Value::cons(test, Value::list(body)));
        }
        self.tokens.next_token();
        Ok(Value::list(clauses))
    }

    /// (do ((var init [step]) ...) (test result...) body...)
    fn parse_do(&mut self) -> Result<Value> {
        self.expect_left_paren("do iterator list")?;

        let mut seen = HashSet::new();
        let mut iterators = Vec::new();
        while !self.check_right_paren() {
            if !self.check_left_paren() {
                return Err(self.expected_error("`(var init [step])` iterator in do"));
            }
            self.tokens.next_token();

            let (line, col) = self.tokens.position();
            let name = self.expect_identifier("do")?;
            if !seen.insert(name.clone()) {
                return Err(Error::syntax(
                    line,
                    col,
                    format!("do: duplicate iterator `{}`", name),
                ));
            }
            if self.check_right_paren() {
                return Err(self.syntax_error(format!("do: iterator `{}` has no initial value", name)));
            }

            let mut fields = vec![Value::Variable(name), self.parse_form()?];
            if !self.check_right_paren() {
                fields.push(self.parse_form()?);
            }
            if !self.check_right_paren() {
                return Err(self.syntax_error("do: bad update expr, iterator has more than 3 elements"));
            }
            self.tokens.next_token();
            iterators.push(Value::list(fields));
        }
        self.tokens.next_token();

        self.expect_left_paren("do test clause")?;
        if self.check_right_paren() {
            return Err(self.syntax_error("do: test clause requires a test"));
        }
        let test = self.parse_form()?;
        let results = self.parse_forms_until_close("do test clause")?;
        let test_clause = Value::cons(test, Value::list(results));

        let body = self.parse_forms_until_close("do")?;
        Ok(Value::list_with_tail(
            vec![Value::list(iterators), test_clause],
            Value::list(body),
        ))
    }

    /// Forms in code position up to and including the closing `)`
    fn parse_forms_until_close(&mut self, context: &str) -> Result<Vec<Value>> {
        let mut forms = Vec::new();
        while !self.check_right_paren() {
            if self.is_at_end() {
                return Err(self.syntax_error(format!("unterminated {}: missing `)`", context)));
            }
            forms.push(self.parse_form()?);
        }
        self.tokens.next_token();
        Ok(forms)
    }

    /// Parse a form in quoted position
    fn parse_datum(&mut self) -> Result<Value> {
        match self.tokens.peek_kind().clone() {
            TokenKind::LeftParen => {
                self.tokens.next_token();
                self.parse_datum_list()
            }
            TokenKind::Quote => {
                self.tokens.next_token();
                let datum = self.parse_datum()?;
                Ok(Value::list(vec![Value::symbol("quote"), datum]))
            }
            TokenKind::Identifier(name) => {
                self.tokens.next_token();
                Ok(Value::symbol(name))
            }
            TokenKind::RightParen | TokenKind::Eof => Err(self.unexpected()),
            _ => self.parse_atom(),
        }
    }

    /// Quoted list after its `(`, with `.` before a final tail
    fn parse_datum_list(&mut self) -> Result<Value> {
        let mut items = Vec::new();
        loop {
            match self.tokens.peek_kind() {
                TokenKind::RightParen => {
                    self.tokens.next_token();
                    return Ok(Value::list(items));
                }
                TokenKind::Eof => {
                    return Err(self.syntax_error("unterminated quoted list: missing `)`"));
                }
                TokenKind::Identifier(name) if name == "." => {
                    if items.is_empty() {
                        return Err(self.syntax_error("`.` needs an element before it"));
                    }
                    self.tokens.next_token();
                    let tail = self.parse_datum()?;
                    self.expect_right_paren("dotted list expects one datum after `.`")?;
                    return Ok(Value::list_with_tail(items, tail));
                }
                _ => items.push(self.parse_datum()?),
            }
        }
    }

    /// Builds a call of the special form bound to `keyword`
    fn keyword_application(keyword: &str, arguments: Value) -> Value {
        let operator = match SpecialForm::lookup(keyword) {
            Some(form) => Value::SpecialForm(form),
            None => Value::variable(keyword),
        };
        Value::application(operator, arguments)
    }

    fn is_at_end(&self) -> bool {
        matches!(self.tokens.peek_kind(), TokenKind::Eof)
    }

    fn check_left_paren(&self) -> bool {
        matches!(self.tokens.peek_kind(), TokenKind::LeftParen)
    }

    fn check_right_paren(&self) -> bool {
        matches!(self.tokens.peek_kind(), TokenKind::RightParen)
    }

    fn expect_left_paren(&mut self, context: &str) -> Result<()> {
        if self.check_left_paren() {
            self.tokens.next_token();
            Ok(())
        } else {
            Err(self.expected_error(&format!("`(` to start {}", context)))
        }
    }

    fn expect_right_paren(&mut self, context: &str) -> Result<()> {
        if self.check_right_paren() {
            self.tokens.next_token();
            Ok(())
        } else {
            Err(self.expected_error(&format!("`)`: {}", context)))
        }
    }

    fn expect_identifier(&mut self, context: &str) -> Result<Rc<str>> {
        match self.tokens.peek_kind() {
            TokenKind::Identifier(name) if name != "." => {
                let name: Rc<str> = Rc::from(name.as_str());
                self.tokens.next_token();
                Ok(name)
            }
            _ => Err(self.expected_error(&format!("identifier in {}", context))),
        }
    }

    fn unexpected(&self) -> Error {
        match self.tokens.peek_kind() {
            TokenKind::Eof => self.syntax_error("unexpected end of input"),
            other => self.syntax_error(format!("unexpected {}", other.describe())),
        }
    }

    /// Helper to create a syntax error at current position
    fn syntax_error(&self, message: impl Into<String>) -> Error {
        let (line, col) = self.tokens.position();
        Error::syntax(line, col, message)
    }

    /// Helper to create a syntax error with expected/found pattern
    fn expected_error(&self, expected: &str) -> Error {
        self.syntax_error(format!(
            "Expected {}, found {}",
            expected,
            self.tokens.peek_kind().describe()
        ))
    }
}
