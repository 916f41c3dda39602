//! Runtime: value model, frame arena, evaluator and special forms

mod environment;
mod lisp_evaluator;
pub mod special_forms;
mod value;

pub use environment::{Environment, FrameId};
pub use lisp_evaluator::{LispEvaluator, RunReport};
pub use special_forms::SpecialForm;
pub use value::{Application, Lambda, ListIter, Pair, Procedure, Value};
