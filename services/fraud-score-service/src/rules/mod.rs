//! Rule evaluation engine: the evaluator and its boolean expression parser

pub mod evaluator;
pub mod expr;

pub use evaluator::{evaluate, RuleEvalError};
