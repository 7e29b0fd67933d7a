//! Core data models for the payroll formula engine.
//!
//! This module contains the domain models shared by configuration,
//! resolution and payroll runs.

mod component;
mod employee;
mod formula_test;
mod pay_period;
mod run_result;

pub use component::{
    ComponentCategory, ComponentDefinition, ComponentKind, ComponentStatus, GLOBAL_SCOPE,
};
pub use employee::{Employee, EMPLOYEE_NAMESPACE};
pub use formula_test::{FormulaTestCase, FormulaTestOutcome, FormulaTestSuite};
pub use pay_period::{PayPeriod, PAYROLL_NAMESPACE};
pub use run_result::{AuditStep, AuditTrace, AuditWarning, ComponentLine, RunResult, RunTotals};
