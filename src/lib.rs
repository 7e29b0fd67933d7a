//! Payroll Component Formula Engine
//!
//! This crate parses payroll component formulas such as
//! `IF(EMPLOYEE.NATIONALITY == "UAE", (EMPLOYEE.BASIC_SALARY + HOUSING_ALLOWANCE) * 0.05, 0)`,
//! orders components so that every formula runs after the components it
//! reads, and evaluates them with decimal arithmetic.
//!
//! The three entry points are [`parse_formula`], [`resolve_components`] and
//! [`evaluate_component`]. [`calculation::PayrollEngine`] ties them together
//! into payroll runs for UAE, Saudi and Oman rosters.

#![warn(missing_docs)]

pub mod calculation;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod formula;
pub mod models;
pub mod resolution;

pub use error::{EngineError, EngineResult, EvalError, ParseError, ResolutionError, ResolutionErrors};
pub use evaluation::{evaluate_component, EvaluationContext, Value};
pub use formula::{parse_formula, Expr};
pub use resolution::{resolve_components, OrderedComponent};
