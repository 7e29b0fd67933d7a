//! Formula evaluation.
//!
//! This module walks a parsed [`Expr`](crate::formula::Expr) against an
//! [`EvaluationContext`] and produces a decimal amount. Arithmetic is checked
//! decimal arithmetic; operands are type-checked at evaluation time.

mod context;
mod evaluator;
mod functions;
mod value;

pub use context::EvaluationContext;
pub use evaluator::{evaluate_component, evaluate_value};
pub use value::Value;
