//! Special-form dispatch table
//!
//! Every keyword maps to a native handler that receives its argument list
//! unevaluated, together with the frame the form appears in. The parser has
//! already checked the structure of forms it recognized; handlers still check
//! shapes because a special form can also be reached through a variable bound
//! to it, in which case the arguments were parsed as an ordinary call: nested
//! groups such as `((x 1))` arrive as applications and identifiers as
//! variables. `as_group` and `datum` read them back as written.

use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::error::{Error, Result};
use crate::runtime::environment::FrameId;
use crate::runtime::lisp_evaluator::LispEvaluator;
use crate::runtime::value::Value;
use crate::tools::Arity;

/// Native handler: evaluator, unevaluated arguments, active frame
pub type SyntaxHandler = fn(&mut LispEvaluator, &Value, FrameId) -> Result<Value>;

/// Keyword plus the handler implementing it
#[derive(Clone, Copy)]
pub struct SpecialForm {
    name: &'static str,
    handler: SyntaxHandler,
}

const SPECIAL_FORMS: &[SpecialForm] = &[
    SpecialForm::new("quote", eval_quote),
    SpecialForm::new("if", eval_if),
    SpecialForm::new("define", eval_define),
    SpecialForm::new("set!", eval_set),
    SpecialForm::new("lambda", eval_lambda),
    SpecialForm::new("let", eval_let),
    SpecialForm::new("let*", eval_let_star),
    SpecialForm::new("letrec", eval_letrec),
    SpecialForm::new("cond", eval_cond),
    SpecialForm::new("do", eval_do),
    SpecialForm::new("and", eval_and),
    SpecialForm::new("or", eval_or),
    SpecialForm::new("begin", eval_begin),
];

/// Marker for the catch-all `cond` clause
pub const ELSE_KEYWORD: &str = "else";

impl SpecialForm {
    const fn new(name: &'static str, handler: SyntaxHandler) -> Self {
        SpecialForm { name, handler }
    }

    /// Finds the special form for a keyword
    pub fn lookup(keyword: &str) -> Option<SpecialForm> {
        SPECIAL_FORMS.iter().find(|form| form.name == keyword).copied()
    }

    /// All special forms, in table order
    pub fn all() -> &'static [SpecialForm] {
        SPECIAL_FORMS
    }

    /// Keyword this form is bound to
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Runs the handler on an unevaluated argument list
    pub fn invoke(&self, evaluator: &mut LispEvaluator, args: &Value, frame: FrameId) -> Result<Value> {
        trace!(form = self.name, "special form");
        (self.handler)(evaluator, args, frame)
    }
}

impl PartialEq for SpecialForm {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl fmt::Debug for SpecialForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpecialForm({})", self.name)
    }
}

/// Splits a proper argument list, checking its length
fn operands(form: &str, args: &Value, arity: Arity) -> Result<Vec<Value>> {
    let items = args
        .elements()
        .ok_or_else(|| Error::runtime(format!("{}: improper argument list", form)))?;
    arity.validate(form, items.len())?;
    Ok(items)
}

/// Splits `(first . rest)`
fn split_first(form: &str, args: &Value) -> Result<(Value, Value)> {
    match args {
        Value::Pair(pair) => Ok((pair.head.clone(), pair.tail.clone())),
        _ => Err(Error::arity(form, Arity::AtLeast(1), 0)),
    }
}

/// A group parsed as a call site, read back as the list it was written as
fn as_group(value: &Value) -> Value {
    match value {
        Value::Application(app) => Value::cons(app.operator.clone(), app.arguments.clone()),
        other => other.clone(),
    }
}

/// Splits a `(head rest...)` clause, naming the clause when it is malformed
fn clause(context: &str, value: &Value) -> Result<(Value, Value)> {
    match as_group(value) {
        Value::Pair(pair) => Ok((pair.head.clone(), pair.tail.clone())),
        other => Err(Error::malformed(format!(
            "{}: expected a non-empty clause, got {}",
            context, other
        ))),
    }
}

fn identifier(value: &Value) -> Result<Rc<str>> {
    match value {
        Value::Variable(name) | Value::Symbol(name) => Ok(name.clone()),
        other => Err(Error::type_error("identifier", other.type_name())),
    }
}

fn is_else(value: &Value) -> bool {
    matches!(value, Value::Symbol(name) | Value::Variable(name) if name.as_ref() == ELSE_KEYWORD)
}

/// Reads a binding list `((name init) ...)` into name/init pairs
fn bindings(form: &str, list: &Value) -> Result<Vec<(Rc<str>, Value)>> {
    let entries = as_group(list)
        .elements()
        .ok_or_else(|| Error::type_error("binding list", list.type_name()))?;
    entries
        .iter()
        .map(|entry| {
            let parts = operands(form, &as_group(entry), Arity::Exact(2))?;
            Ok((identifier(&parts[0])?, parts[1].clone()))
        })
        .collect()
}

fn contains_code(value: &Value) -> bool {
    match value {
        Value::Variable(_) | Value::SpecialForm(_) | Value::Application(_) => true,
        Value::Pair(_) => {
            let mut items = value.iter();
            items.by_ref().any(contains_code) || contains_code(items.remainder())
        }
        _ => false,
    }
}

/// Code rebuilt as inert data: variables become symbols, call sites lists
fn datum(value: &Value) -> Value {
    match value {
        Value::Variable(name) => Value::Symbol(name.clone()),
        Value::SpecialForm(form) => Value::symbol(form.name()),
        Value::Application(app) => Value::cons(datum(&app.operator), datum(&app.arguments)),
        Value::Pair(_) => {
            let mut items = value.iter();
            let heads: Vec<Value> = items.by_ref().map(datum).collect();
            Value::list_with_tail(heads, datum(items.remainder()))
        }
        other => other.clone(),
    }
}

fn eval_quote(_: &mut LispEvaluator, args: &Value, _: FrameId) -> Result<Value> {
    let mut parts = operands("quote", args, Arity::Exact(1))?;
    let quoted = parts.swap_remove(0);
    // Parsed data is already inert and keeps its identity
    if contains_code(&quoted) {
        Ok(datum(&quoted))
    } else {
        Ok(quoted)
    }
}

fn eval_if(evaluator: &mut LispEvaluator, args: &Value, frame: FrameId) -> Result<Value> {
    let parts = operands("if", args, Arity::Range(2, 3))?;
    if evaluator.evaluate(&parts[0], frame)?.is_truthy() {
        evaluator.evaluate(&parts[1], frame)
    } else if let Some(alternative) = parts.get(2) {
        evaluator.evaluate(alternative, frame)
    } else {
        Ok(Value::Undefined)
    }
}

fn eval_define(evaluator: &mut LispEvaluator, args: &Value, frame: FrameId) -> Result<Value> {
    let parts = operands("define", args, Arity::Exact(2))?;
    let name = identifier(&parts[0])?;
    let value = evaluator.evaluate(&parts[1], frame)?;
    evaluator.environment_mut().define(frame, name.clone(), value)?;
    Ok(Value::Symbol(name))
}

fn eval_set(evaluator: &mut LispEvaluator, args: &Value, frame: FrameId) -> Result<Value> {
    let parts = operands("set!", args, Arity::Exact(2))?;
    let name = identifier(&parts[0])?;
    let value = evaluator.evaluate(&parts[1], frame)?;
    evaluator
        .environment_mut()
        .assign(frame, &name, value.clone())?;
    Ok(value)
}

fn eval_lambda(_: &mut LispEvaluator, args: &Value, frame: FrameId) -> Result<Value> {
    let (params, body) = split_first("lambda", args)?;
    let params = as_group(&params);
    let names = params
        .elements()
        .ok_or_else(|| Error::type_error("parameter list", params.type_name()))?;
    for name in &names {
        identifier(name)?;
    }
    Ok(Value::lambda(params, body, frame))
}

fn eval_let(evaluator: &mut LispEvaluator, args: &Value, frame: FrameId) -> Result<Value> {
    let (binding_list, body) = split_first("let", args)?;
    let bindings = bindings("let", &binding_list)?;

    // Initializers see only the enclosing scope
    let mut values = Vec::with_capacity(bindings.len());
    for (_, init) in &bindings {
        values.push(evaluator.evaluate(init, frame)?);
    }

    let local = evaluator.environment_mut().new_frame(Some(frame));
    for ((name, _), value) in bindings.into_iter().zip(values) {
        evaluator.environment_mut().define(local, name, value)?;
    }
    evaluator.evaluate_sequence(&body, local)
}

fn eval_let_star(evaluator: &mut LispEvaluator, args: &Value, frame: FrameId) -> Result<Value> {
    let (binding_list, body) = split_first("let*", args)?;
    let bindings = bindings("let*", &binding_list)?;

    let local = evaluator.environment_mut().new_frame(Some(frame));
    for (name, init) in bindings {
        let value = evaluator.evaluate(&init, local)?;
        evaluator.environment_mut().define(local, name, value)?;
    }
    evaluator.evaluate_sequence(&body, local)
}

fn eval_letrec(evaluator: &mut LispEvaluator, args: &Value, frame: FrameId) -> Result<Value> {
    let (binding_list, body) = split_first("letrec", args)?;
    let bindings = bindings("letrec", &binding_list)?;

    let local = evaluator.environment_mut().new_frame(Some(frame));
    for (name, _) in &bindings {
        evaluator
            .environment_mut()
            .define(local, name.clone(), Value::Undefined)?;
    }
    for (name, init) in bindings {
        let value = evaluator.evaluate(&init, local)?;
        evaluator.environment_mut().define(local, name, value)?;
    }
    evaluator.evaluate_sequence(&body, local)
}

fn eval_cond(evaluator: &mut LispEvaluator, args: &Value, frame: FrameId) -> Result<Value> {
    let clauses = operands("cond", args, Arity::AtLeast(0))?;
    let last = clauses.len().saturating_sub(1);

    for (index, entry) in clauses.iter().enumerate() {
        let (test, body) = clause("cond clause", entry)?;

        if is_else(&test) {
            if index != last {
                return Err(Error::malformed("cond: else must be the last clause"));
            }
            return evaluator.evaluate_sequence(&body, frame);
        }

        let result = evaluator.evaluate(&test, frame)?;
        if result.is_truthy() {
            if body.is_null() {
                return Ok(result);
            }
            return evaluator.evaluate_sequence(&body, frame);
        }
    }

    Ok(Value::Undefined)
}

/// One `(variable init [step])` clause of a `do` loop
struct DoIterator {
    name: Rc<str>,
    init: Value,
    step: Option<Value>,
}

fn eval_do(evaluator: &mut LispEvaluator, args: &Value, frame: FrameId) -> Result<Value> {
    let parts = operands("do", args, Arity::AtLeast(2))?;
    let specs = as_group(&parts[0])
        .elements()
        .ok_or_else(|| Error::type_error("iterator list", parts[0].type_name()))?;
    let iterators = specs
        .iter()
        .map(|spec| {
            let fields = operands("do iterator", &as_group(spec), Arity::Range(2, 3))?;
            Ok(DoIterator {
                name: identifier(&fields[0])?,
                init: fields[1].clone(),
                step: fields.get(2).cloned(),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let (test, results) = clause("do test clause", &parts[1])?;
    let body = &parts[2..];

    let mut initial = Vec::with_capacity(iterators.len());
    for iterator in &iterators {
        initial.push(evaluator.evaluate(&iterator.init, frame)?);
    }
    let local = evaluator.environment_mut().new_frame(Some(frame));
    for (iterator, value) in iterators.iter().zip(initial) {
        evaluator
            .environment_mut()
            .define(local, iterator.name.clone(), value)?;
    }

    loop {
        let done = evaluator.evaluate(&test, local)?;
        if done.is_truthy() {
            if results.is_null() {
                return Ok(done);
            }
            return evaluator.evaluate_sequence(&results, local);
        }

        for form in body {
            evaluator.evaluate(form, local)?;
        }

        // All steps read the bindings of the finished iteration
        let mut updates = Vec::with_capacity(iterators.len());
        for iterator in &iterators {
            if let Some(step) = &iterator.step {
                updates.push((iterator.name.clone(), evaluator.evaluate(step, local)?));
            }
        }
        for (name, value) in updates {
            evaluator.environment_mut().define(local, name, value)?;
        }
    }
}

fn eval_and(evaluator: &mut LispEvaluator, args: &Value, frame: FrameId) -> Result<Value> {
    let mut result = Value::Boolean(true);
    for form in operands("and", args, Arity::AtLeast(0))? {
        result = evaluator.evaluate(&form, frame)?;
        if !result.is_truthy() {
            break;
        }
    }
    Ok(result)
}

fn eval_or(evaluator: &mut LispEvaluator, args: &Value, frame: FrameId) -> Result<Value> {
    let mut result = Value::Boolean(false);
    for form in operands("or", args, Arity::AtLeast(0))? {
        result = evaluator.evaluate(&form, frame)?;
        if result.is_truthy() {
            break;
        }
    }
    Ok(result)
}

fn eval_begin(evaluator: &mut LispEvaluator, args: &Value, frame: FrameId) -> Result<Value> {
    evaluator.evaluate_sequence(args, frame)
}
