use std::fmt;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::runtime::environment::FrameId;
use crate::runtime::special_forms::SpecialForm;
use crate::tools::Tool;

/// Runtime value representation
///
/// Parsed source and runtime data share this one type: a parsed call site is
/// an [`Value::Application`], quoted data is built from [`Value::Pair`]s and
/// [`Value::Symbol`]s, and evaluating either goes through the same evaluator.
#[derive(Clone)]
pub enum Value {
    /// The null pair, i.e. the empty list `()`
    Null,
    /// A cons cell
    Pair(Rc<Pair>),
    /// Machine integer
    Number(i64),
    /// `#t` / `#f`
    Boolean(bool),
    /// Immutable string
    String(Rc<str>),
    /// Inert identifier produced by quoting
    Symbol(Rc<str>),
    /// Reference to a binding, resolved in the active frame on evaluation
    Variable(Rc<str>),
    /// User-defined closure or builtin procedure
    Procedure(Rc<Procedure>),
    /// Keyword handler (`if`, `let`, `cond`, ...)
    SpecialForm(SpecialForm),
    /// Unevaluated call site
    Application(Rc<Application>),
    /// Result of operations with no meaningful value
    Undefined,
}

/// A cons cell with a head (`car`) and a tail (`cdr`)
pub struct Pair {
    /// First element
    pub head: Value,
    /// Rest of the list, or any value for a dotted pair
    pub tail: Value,
}

// Long lists would otherwise be dropped recursively, one stack frame per cell.
impl Drop for Pair {
    fn drop(&mut self) {
        let mut tail = std::mem::replace(&mut self.tail, Value::Null);
        while let Value::Pair(rc) = tail {
            match Rc::try_unwrap(rc) {
                Ok(mut pair) => tail = std::mem::replace(&mut pair.tail, Value::Null),
                Err(_) => break,
            }
        }
    }
}

/// A call site: operator plus a proper list of argument forms
pub struct Application {
    /// Operator form
    pub operator: Value,
    /// Argument forms as a list
    pub arguments: Value,
}

/// Procedure value
pub enum Procedure {
    /// Closure created by `lambda`
    Lambda(Lambda),
    /// Native procedure from the builtin library
    Builtin(Rc<dyn Tool>),
}

/// User-defined procedure: parameters, body and the frame it closes over
pub struct Lambda {
    /// Proper list of [`Value::Variable`] parameters
    pub params: Value,
    /// List of body forms, evaluated in sequence
    pub body: Value,
    /// Frame active when the `lambda` was evaluated
    pub env: FrameId,
}

impl Procedure {
    /// Name used in error messages
    pub fn name(&self) -> String {
        match self {
            Procedure::Lambda(_) => "#<closure>".to_string(),
            Procedure::Builtin(tool) => tool.name().to_string(),
        }
    }
}

/// Borrowing iterator over the heads of a pair chain
///
/// Stops at the first non-pair tail; [`ListIter::remainder`] tells whether
/// that was the null pair (proper list) or something else (dotted list).
pub struct ListIter<'a> {
    current: &'a Value,
}

impl<'a> ListIter<'a> {
    /// The tail that ended the iteration so far
    pub fn remainder(&self) -> &'a Value {
        self.current
    }
}

impl<'a> Iterator for ListIter<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<&'a Value> {
        match self.current {
            Value::Pair(pair) => {
                self.current = &pair.tail;
                Some(&pair.head)
            }
            _ => None,
        }
    }
}

impl Value {
    /// Creates a pair
    pub fn cons(head: Value, tail: Value) -> Self {
        Value::Pair(Rc::new(Pair { head, tail }))
    }

    /// Builds a proper list
    pub fn list<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: DoubleEndedIterator,
    {
        Self::list_with_tail(items, Value::Null)
    }

    /// Builds a list ending in `tail` instead of the null pair
    pub fn list_with_tail<I>(items: I, tail: Value) -> Self
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: DoubleEndedIterator,
    {
        items
            .into_iter()
            .rev()
            .fold(tail, |acc, item| Value::cons(item, acc))
    }

    /// Creates a string value
    pub fn string(text: impl Into<Rc<str>>) -> Self {
        Value::String(text.into())
    }

    /// Creates a symbol value
    pub fn symbol(name: impl Into<Rc<str>>) -> Self {
        Value::Symbol(name.into())
    }

    /// Creates a variable reference
    pub fn variable(name: impl Into<Rc<str>>) -> Self {
        Value::Variable(name.into())
    }

    /// Creates an application node
    pub fn application(operator: Value, arguments: Value) -> Self {
        Value::Application(Rc::new(Application {
            operator,
            arguments,
        }))
    }

    /// Creates a closure value
    pub fn lambda(params: Value, body: Value, env: FrameId) -> Self {
        Value::Procedure(Rc::new(Procedure::Lambda(Lambda { params, body, env })))
    }

    /// Creates a builtin procedure value
    pub fn builtin(tool: Rc<dyn Tool>) -> Self {
        Value::Procedure(Rc::new(Procedure::Builtin(tool)))
    }

    /// Returns the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Pair(_) => "pair",
            Value::Number(_) => "number",
            Value::Boolean(_) => "boolean",
            Value::String(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Variable(_) => "variable",
            Value::Procedure(_) => "procedure",
            Value::SpecialForm(_) => "syntax",
            Value::Application(_) => "application",
            Value::Undefined => "undefined",
        }
    }

    /// Only `#f` is false
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Boolean(false))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, Value::Boolean(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub fn is_symbol(&self) -> bool {
        matches!(self, Value::Symbol(_))
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Value::Variable(_))
    }

    pub fn is_procedure(&self) -> bool {
        matches!(self, Value::Procedure(_))
    }

    pub fn is_special_form(&self) -> bool {
        matches!(self, Value::SpecialForm(_))
    }

    pub fn is_application(&self) -> bool {
        matches!(self, Value::Application(_))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// True for the null pair `()`
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for a non-null pair
    pub fn is_pair(&self) -> bool {
        matches!(self, Value::Pair(_))
    }

    /// True for a chain of pairs ending in the null pair
    pub fn is_list(&self) -> bool {
        self.list_length().is_some()
    }

    /// Gets the integer payload
    pub fn as_number(&self) -> Result<i64> {
        match self {
            Value::Number(n) => Ok(*n),
            _ => Err(Error::type_error("number", self.type_name())),
        }
    }

    /// Gets the text of a string
    pub fn as_string(&self) -> Result<&str> {
        match self {
            Value::String(s) => Ok(s),
            _ => Err(Error::type_error("string", self.type_name())),
        }
    }

    /// Gets the name of a symbol
    pub fn as_symbol(&self) -> Result<&str> {
        match self {
            Value::Symbol(name) => Ok(name),
            _ => Err(Error::type_error("symbol", self.type_name())),
        }
    }

    /// Gets the cell of a non-null pair
    pub fn as_pair(&self) -> Result<&Pair> {
        match self {
            Value::Pair(pair) => Ok(pair),
            _ => Err(Error::type_error("pair", self.type_name())),
        }
    }

    /// Elements of a proper list, or a type error naming `list`
    pub fn as_list(&self) -> Result<Vec<Value>> {
        self.elements()
            .ok_or_else(|| Error::type_error("list", self.type_name()))
    }

    /// Iterates over list elements without copying
    pub fn iter(&self) -> ListIter<'_> {
        ListIter { current: self }
    }

    /// Elements of a proper list, `None` for anything else
    pub fn elements(&self) -> Option<Vec<Value>> {
        let mut iter = self.iter();
        let items: Vec<Value> = iter.by_ref().cloned().collect();
        if iter.remainder().is_null() {
            Some(items)
        } else {
            None
        }
    }

    /// Length of a proper list, `None` for anything else
    pub fn list_length(&self) -> Option<usize> {
        let mut iter = self.iter();
        let count = iter.by_ref().count();
        if iter.remainder().is_null() {
            Some(count)
        } else {
            None
        }
    }

    /// `eq?`: atoms by type and value, compound objects by identity
    pub fn is_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Undefined, Value::Undefined) => true,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Variable(a), Value::Variable(b)) => a == b,
            (Value::SpecialForm(a), Value::SpecialForm(b)) => a == b,
            (Value::String(a), Value::String(b)) => Rc::ptr_eq(a, b),
            (Value::Pair(a), Value::Pair(b)) => Rc::ptr_eq(a, b),
            (Value::Procedure(a), Value::Procedure(b)) => Rc::ptr_eq(a, b),
            (Value::Application(a), Value::Application(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// `equal?`: like `eq?`, but strings compare by content and pairs structurally
    pub fn is_equal(&self, other: &Value) -> bool {
        let mut left = self;
        let mut right = other;
        loop {
            match (left, right) {
                (Value::String(a), Value::String(b)) => return a == b,
                (Value::Pair(a), Value::Pair(b)) => {
                    if Rc::ptr_eq(a, b) {
                        return true;
                    }
                    if !a.head.is_equal(&b.head) {
                        return false;
                    }
                    left = &a.tail;
                    right = &b.tail;
                }
                (Value::Application(a), Value::Application(b)) => {
                    return a.operator.is_equal(&b.operator) && a.arguments.is_equal(&b.arguments)
                }
                _ => return left.is_eq(right),
            }
        }
    }
}

/// `==` is `equal?`
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal(other)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

fn write_string_literal(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    write!(f, "\"")?;
    for c in text.chars() {
        match c {
            '"' => write!(f, "\\\"")?,
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            '\t' => write!(f, "\\t")?,
            '\r' => write!(f, "\\r")?,
            c => write!(f, "{}", c)?,
        }
    }
    write!(f, "\"")
}

/// Writes `(a b c)` or `(a b . c)` for a chain starting at `first`
fn write_list(f: &mut fmt::Formatter<'_>, first: &Value, rest: &Value) -> fmt::Result {
    write!(f, "({}", first)?;
    let mut iter = rest.iter();
    for item in iter.by_ref() {
        write!(f, " {}", item)?;
    }
    match iter.remainder() {
        Value::Null => {}
        tail => write!(f, " . {}", tail)?,
    }
    write!(f, ")")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "()"),
            Value::Pair(pair) => write_list(f, &pair.head, &pair.tail),
            Value::Number(n) => write!(f, "{}", n),
            Value::Boolean(true) => write!(f, "#t"),
            Value::Boolean(false) => write!(f, "#f"),
            Value::String(s) => write_string_literal(f, s),
            Value::Symbol(name) | Value::Variable(name) => write!(f, "{}", name),
            Value::Procedure(procedure) => match procedure.as_ref() {
                Procedure::Lambda(_) => write!(f, "#<closure #f>"),
                Procedure::Builtin(tool) => write!(f, "#<subr {}>", tool.name()),
            },
            Value::SpecialForm(form) => write!(f, "#<syntax {}>", form.name()),
            Value::Application(app) => {
                let operator = match &app.operator {
                    Value::SpecialForm(form) => Value::Variable(form.name().into()),
                    other => other.clone(),
                };
                write_list(f, &operator, &app.arguments)
            }
            Value::Undefined => write!(f, "#<undef>"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.type_name(), self)
    }
}
