use std::io::Write;
use std::rc::Rc;

use tracing::{debug, info, trace, warn};

use crate::config::{ErrorMode, InterpreterConfig};
use crate::error::{Error, Result};
use crate::lexer::SExprScanner;
use crate::parser::SExprParser;
use crate::runtime::environment::{Environment, FrameId};
use crate::runtime::special_forms::SpecialForm;
use crate::runtime::value::{Procedure, Value};
use crate::tools::ToolRegistry;

/// Scheme evaluator
///
/// Owns the frame arena and the one persistent global frame. The global frame
/// binds every special-form keyword and every builtin from the tool registry;
/// each top-level form is evaluated against it.
///
/// Dispatch for a call site:
/// - the operator is evaluated first
/// - a special form receives the unevaluated arguments
/// - a procedure receives the arguments evaluated left to right
/// - anything else is a type error
pub struct LispEvaluator {
    /// Frame arena
    env: Environment,
    /// Top-level frame
    global: FrameId,
    config: InterpreterConfig,
    /// Sink for `print`, `display` and echoed results
    output: Box<dyn Write>,
    /// Nesting of top-level evaluations (`load` nests)
    depth: usize,
    /// Result of the latest top-level form, kept alive across collections
    last_result: Value,
}

/// Outcome of [`LispEvaluator::run_source`]
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Value of the last form that succeeded
    pub last: Value,
    /// Errors in the order they happened
    pub errors: Vec<Error>,
}

impl RunReport {
    /// True when no form failed
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

impl LispEvaluator {
    /// Creates an evaluator with the standard library and default settings
    pub fn new() -> Self {
        Self::build(ToolRegistry::new(), InterpreterConfig::default())
    }

    /// Creates an evaluator with the standard library and custom settings
    pub fn with_config(config: InterpreterConfig) -> Self {
        Self::build(ToolRegistry::new(), config)
    }

    /// Creates an evaluator with a custom tool registry
    pub fn with_registry(registry: ToolRegistry) -> Self {
        Self::build(registry, InterpreterConfig::default())
    }

    fn build(registry: ToolRegistry, config: InterpreterConfig) -> Self {
        let mut env = Environment::new();
        let global = env.new_frame(None);
        let mut evaluator = LispEvaluator {
            env,
            global,
            config,
            output: Box::new(std::io::stdout()),
            depth: 0,
            last_result: Value::Undefined,
        };
        evaluator.install_globals(&registry);
        evaluator
    }

    fn install_globals(&mut self, registry: &ToolRegistry) {
        let global = self.global;
        for form in SpecialForm::all() {
            // The global frame is live for the evaluator's whole lifetime
            let _ = self
                .env
                .define(global, form.name(), Value::SpecialForm(*form));
        }
        registry.install(&mut self.env, global);
    }

    /// Handle of the top-level frame
    pub fn global_frame(&self) -> FrameId {
        self.global
    }

    /// Frame arena
    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Frame arena, mutable
    pub fn environment_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// Current settings
    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    /// Replaces the current settings
    pub fn set_config(&mut self, config: InterpreterConfig) {
        self.config = config;
    }

    /// Redirects printed output
    pub fn set_output(&mut self, output: impl Write + 'static) {
        self.output = Box::new(output);
    }

    /// Writes text to the output sink
    pub fn write_output(&mut self, text: &str) -> Result<()> {
        self.output
            .write_all(text.as_bytes())
            .and_then(|_| self.output.flush())
            .map_err(|e| Error::Io {
                path: "<output>".to_string(),
                message: e.to_string(),
            })
    }

    /// Evaluates a value in a frame
    pub fn evaluate(&mut self, value: &Value, frame: FrameId) -> Result<Value> {
        match value {
            Value::Variable(name) => self.env.lookup(frame, name),
            Value::Application(app) => {
                self.evaluate_application(&app.operator, &app.arguments, frame)
            }
            Value::Pair(pair) => {
                if !pair.tail.is_list() {
                    return Err(Error::runtime(format!(
                        "cannot evaluate improper list {}",
                        value
                    )));
                }
                self.evaluate_application(&pair.head, &pair.tail, frame)
            }
            other => Ok(other.clone()),
        }
    }

    fn evaluate_application(
        &mut self,
        operator: &Value,
        arguments: &Value,
        frame: FrameId,
    ) -> Result<Value> {
        match self.evaluate(operator, frame)? {
            Value::SpecialForm(form) => form.invoke(self, arguments, frame),
            Value::Procedure(procedure) => {
                let args = self.evaluate_arguments(arguments, frame)?;
                self.apply(&procedure, args)
            }
            other => Err(Error::type_error("procedure", other.type_name())),
        }
    }

    fn evaluate_arguments(&mut self, arguments: &Value, frame: FrameId) -> Result<Vec<Value>> {
        let mut iter = arguments.iter();
        let mut values = Vec::new();
        for argument in iter.by_ref() {
            values.push(self.evaluate(argument, frame)?);
        }
        if !iter.remainder().is_null() {
            return Err(Error::runtime("improper argument list in application"));
        }
        Ok(values)
    }

    /// Evaluates each form of a list in order, returning the last value
    ///
    /// An empty list yields [`Value::Undefined`].
    pub fn evaluate_sequence(&mut self, forms: &Value, frame: FrameId) -> Result<Value> {
        let mut iter = forms.iter();
        let mut result = Value::Undefined;
        for form in iter.by_ref() {
            result = self.evaluate(form, frame)?;
        }
        if !iter.remainder().is_null() {
            return Err(Error::runtime("improper body sequence"));
        }
        Ok(result)
    }

    /// Calls a procedure with already evaluated arguments
    pub fn apply(&mut self, procedure: &Procedure, args: Vec<Value>) -> Result<Value> {
        trace!(procedure = %procedure.name(), argc = args.len(), "apply");

        match procedure {
            Procedure::Builtin(tool) => {
                tool.arity().validate(tool.name(), args.len())?;
                tool.execute(self, &args)
            }
            Procedure::Lambda(lambda) => {
                let params = lambda
                    .params
                    .elements()
                    .ok_or_else(|| Error::runtime("closure has an improper parameter list"))?;
                if params.len() != args.len() {
                    return Err(Error::arity(procedure.name(), params.len(), args.len()));
                }

                let frame = self.env.new_frame(Some(lambda.env));
                for (param, arg) in params.iter().zip(args) {
                    let name = match param {
                        Value::Variable(name) | Value::Symbol(name) => Rc::clone(name),
                        other => return Err(Error::type_error("identifier", other.type_name())),
                    };
                    self.env.define(frame, name, arg)?;
                }
                self.evaluate_sequence(&lambda.body, frame)
            }
        }
    }

    /// Evaluates one top-level form in the global frame
    ///
    /// Once the outermost form finishes, unreachable frames are reclaimed if
    /// enough have been allocated since the previous collection.
    pub fn evaluate_top_level(&mut self, form: &Value) -> Result<Value> {
        debug!(form = %form, depth = self.depth, "evaluating top-level form");

        self.depth += 1;
        let result = self.evaluate(form, self.global);
        self.depth -= 1;
        let value = result?;

        if self.depth == 0 {
            self.last_result = value.clone();
            let threshold = self.config.gc_threshold;
            if threshold > 0 && self.env.allocated_since_collect() >= threshold {
                self.collect_garbage();
            }
        }
        Ok(value)
    }

    /// Reclaims frames unreachable from the global frame and the last result
    ///
    /// Does nothing while a top-level form is being evaluated. Returns the
    /// number of frames freed.
    pub fn collect_garbage(&mut self) -> usize {
        if self.depth > 0 {
            return 0;
        }
        let before = self.env.live_frames();
        let freed = self.env.collect([self.global], [&self.last_result]);
        debug!(before, freed, "collected environment frames");
        freed
    }

    /// Evaluates parsed forms in order, stopping at the first error
    pub fn execute(&mut self, forms: &[Value]) -> Result<Value> {
        let mut last = Value::Undefined;
        for form in forms {
            last = self.evaluate_top_level(form)?;
        }
        Ok(last)
    }

    /// Scans, parses and evaluates source text, stopping at the first error
    ///
    /// Forms are parsed one at a time, so forms before a syntax error run.
    pub fn execute_source(&mut self, source: &str) -> Result<Value> {
        let tokens = SExprScanner::new(source).scan_tokens()?;
        let mut parser = SExprParser::new(tokens);
        let mut last = Value::Undefined;
        while let Some(form) = parser.parse_one()? {
            last = self.evaluate_top_level(&form)?;
        }
        Ok(last)
    }

    /// Like [`execute_source`](Self::execute_source), honouring the configured [`ErrorMode`]
    ///
    /// Evaluation errors either stop the run or are recorded before moving on.
    /// Scan and parse errors always stop it.
    pub fn run_source(&mut self, source: &str) -> RunReport {
        let mut report = RunReport {
            last: Value::Undefined,
            errors: Vec::new(),
        };

        let tokens = match SExprScanner::new(source).scan_tokens() {
            Ok(tokens) => tokens,
            Err(e) => {
                report.errors.push(e);
                return report;
            }
        };
        let mut parser = SExprParser::new(tokens);

        loop {
            let form = match parser.parse_one() {
                Ok(Some(form)) => form,
                Ok(None) => break,
                Err(e) => {
                    report.errors.push(e);
                    break;
                }
            };

            match self.evaluate_top_level(&form) {
                Ok(value) => {
                    if self.config.echo_results && !value.is_undefined() {
                        if let Err(e) = self.write_output(&format!("{}\n", value)) {
                            report.errors.push(e);
                            break;
                        }
                    }
                    report.last = value;
                }
                Err(e) => match self.config.error_mode {
                    ErrorMode::Halt => {
                        report.errors.push(e);
                        break;
                    }
                    ErrorMode::Continue => {
                        warn!(kind = e.kind_name(), error = %e, "continuing after error");
                        report.errors.push(e);
                    }
                },
            }
        }

        report
    }

    /// Reads and evaluates every form of a file in the global frame
    pub fn load_file(&mut self, path: &str) -> Result<Value> {
        let source = std::fs::read_to_string(path).map_err(|e| Error::Io {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        info!(path, "loading file");
        self.execute_source(&source)
    }
}

impl Default for LispEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_str(source: &str) -> Result<Value> {
        LispEvaluator::new().execute_source(source)
    }

    #[test]
    fn test_self_evaluating() {
        assert_eq!(eval_str("42").unwrap(), Value::Number(42));
        assert_eq!(eval_str("#f").unwrap(), Value::Boolean(false));
        assert_eq!(eval_str("\"hi\"").unwrap(), Value::string("hi"));
        assert_eq!(eval_str("()").unwrap(), Value::Null);
    }

    #[test]
    fn test_define_and_lookup() {
        let mut evaluator = LispEvaluator::new();
        assert_eq!(
            evaluator.execute_source("(define x 10)").unwrap(),
            Value::symbol("x")
        );
        assert_eq!(evaluator.execute_source("x").unwrap(), Value::Number(10));
    }

    #[test]
    fn test_invalid_application() {
        let err = eval_str("(1 2 3)").unwrap_err();
        assert_eq!(err, Error::type_error("procedure", "number"));
    }

    #[test]
    fn test_improper_pair_evaluation_is_runtime_error() {
        let mut evaluator = LispEvaluator::new();
        let frame = evaluator.global_frame();
        let dotted = Value::cons(Value::variable("+"), Value::Number(1));
        let err = evaluator.evaluate(&dotted, frame).unwrap_err();
        assert_eq!(err.kind_name(), "RuntimeError");
    }

    #[test]
    fn test_pair_evaluates_as_application() {
        let mut evaluator = LispEvaluator::new();
        let frame = evaluator.global_frame();
        let call = Value::list(vec![
            Value::variable("+"),
            Value::Number(1),
            Value::Number(2),
        ]);
        assert_eq!(evaluator.evaluate(&call, frame).unwrap(), Value::Number(3));
    }

    #[test]
    fn test_lambda_arity() {
        let err = eval_str("((lambda (x) x) 1 2)").unwrap_err();
        assert_eq!(err.kind_name(), "ArityError");
    }

    #[test]
    fn test_special_form_through_variable() {
        let mut evaluator = LispEvaluator::new();
        evaluator.execute_source("(define my-if if)").unwrap();
        assert_eq!(
            evaluator.execute_source("(my-if #f 1 2)").unwrap(),
            Value::Number(2)
        );
    }

    #[test]
    fn test_collect_keeps_closures_reachable_from_globals() {
        let mut evaluator = LispEvaluator::with_config(InterpreterConfig {
            gc_threshold: 0,
            ..InterpreterConfig::default()
        });
        evaluator
            .execute_source("(define make (lambda (n) (lambda () n))) (define k (make 7))")
            .unwrap();
        evaluator.execute_source("(make 1) (make 2) (make 3)").unwrap();

        let before = evaluator.environment().live_frames();
        let freed = evaluator.collect_garbage();
        assert!(freed >= 2);
        assert_eq!(evaluator.environment().live_frames(), before - freed);
        assert_eq!(evaluator.execute_source("(k)").unwrap(), Value::Number(7));
    }

    #[test]
    fn test_run_source_continue_mode() {
        let mut evaluator = LispEvaluator::with_config(InterpreterConfig {
            error_mode: ErrorMode::Continue,
            ..InterpreterConfig::default()
        });
        let report = evaluator.run_source("(car 5) (define y 2) undefined-name y");
        assert_eq!(report.errors.len(), 2);
        assert_eq!(report.last, Value::Number(2));
    }

    #[test]
    fn test_run_source_halt_mode() {
        let mut evaluator = LispEvaluator::new();
        let report = evaluator.run_source("(define a 1) (car 5) (define b 2)");
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.last, Value::symbol("a"));
        assert!(evaluator.execute_source("b").is_err());
    }
}
