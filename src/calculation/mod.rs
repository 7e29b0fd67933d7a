//! Payroll calculation built on the formula engine.
//!
//! This module contains the payroll run orchestrator, which evaluates a
//! resolved roster for one or many employees, and the formula test lab.

mod formula_lab;
mod payroll_run;

pub use formula_lab::{run_formula_tests, run_test_suite};
pub use payroll_run::{run_payroll, PayrollEngine, PayrollInput, NEGATIVE_AMOUNT_WARNING};
