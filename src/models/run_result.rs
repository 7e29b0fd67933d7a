//! Payroll run result models.
//!
//! This module contains the [`RunResult`] type and its associated structures
//! that capture all outputs from a payroll run: one line per component,
//! the earnings/deductions/benefits totals, and the audit trace.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ComponentKind, PayPeriod};

/// The amount produced by one component in a run.
///
/// # Example
///
/// ```
/// use payroll_formula_engine::models::{ComponentKind, ComponentLine};
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let line = ComponentLine {
///     component_id: "2".to_string(),
///     name: "Housing Allowance".to_string(),
///     kind: ComponentKind::Earning,
///     amount: Decimal::from_str("3750.00").unwrap(),
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentLine {
    /// The ID of the component that produced this line.
    pub component_id: String,
    /// The component's display name.
    pub name: String,
    /// Earning, deduction or benefit.
    pub kind: ComponentKind,
    /// The evaluated amount.
    pub amount: Decimal,
}

/// Aggregated totals for a payroll run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTotals {
    /// Sum of all earning lines.
    pub earnings: Decimal,
    /// Sum of all deduction lines.
    pub deductions: Decimal,
    /// Sum of all benefit lines. Benefits do not affect net pay.
    pub benefits: Decimal,
    /// Earnings minus deductions.
    pub net_pay: Decimal,
}

impl RunTotals {
    /// Builds totals from component lines.
    ///
    /// # Example
    ///
    /// ```
    /// use payroll_formula_engine::models::{ComponentKind, ComponentLine, RunTotals};
    /// use rust_decimal::Decimal;
    ///
    /// let lines = vec![
    ///     ComponentLine {
    ///         component_id: "1".to_string(),
    ///         name: "Basic Salary".to_string(),
    ///         kind: ComponentKind::Earning,
    ///         amount: Decimal::new(15000, 0),
    ///     },
    ///     ComponentLine {
    ///         component_id: "3".to_string(),
    ///         name: "UAE GPSSA".to_string(),
    ///         kind: ComponentKind::Deduction,
    ///         amount: Decimal::new(750, 0),
    ///     },
    /// ];
    /// let totals = RunTotals::from_lines(&lines);
    /// assert_eq!(totals.net_pay, Decimal::new(14250, 0));
    /// ```
    pub fn from_lines(lines: &[ComponentLine]) -> Self {
        let mut totals = RunTotals::default();
        for line in lines {
            match line.kind {
                ComponentKind::Earning => totals.earnings += line.amount,
                ComponentKind::Deduction => totals.deductions += line.amount,
                ComponentKind::Benefit => totals.benefits += line.amount,
            }
        }
        totals.net_pay = totals.earnings - totals.deductions;
        totals
    }
}

/// A single step in the audit trace, one per evaluated component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number, starting at 1.
    pub step_number: u32,
    /// The component evaluated in this step.
    pub component_id: String,
    /// The component's display name.
    pub component_name: String,
    /// The formula as written.
    pub formula: String,
    /// The context values the formula read.
    pub input: serde_json::Value,
    /// The evaluated amount.
    pub output: Decimal,
    /// Human-readable explanation of the step.
    pub reasoning: String,
}

/// A warning generated during a run.
///
/// Warnings flag results that are valid but likely unintended, such as a
/// negative earning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditWarning {
    /// A code identifying the type of warning.
    pub code: String,
    /// A human-readable description of the warning.
    pub message: String,
    /// The component the warning concerns.
    pub component_id: String,
}

/// The complete audit trace for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrace {
    /// One step per component, in evaluation order.
    pub steps: Vec<AuditStep>,
    /// Any warnings generated during the run.
    pub warnings: Vec<AuditWarning>,
    /// The total run duration in microseconds.
    pub duration_us: u64,
}

/// The complete result of a payroll run for one employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    /// Unique identifier for this run.
    pub run_id: Uuid,
    /// When the run was performed.
    pub timestamp: DateTime<Utc>,
    /// The version of the engine that performed the run.
    pub engine_version: String,
    /// The ID of the employee the run is for.
    pub employee_id: String,
    /// The pay period for this run.
    pub pay_period: PayPeriod,
    /// One line per component, in evaluation order.
    pub lines: Vec<ComponentLine>,
    /// Aggregated totals.
    pub totals: RunTotals,
    /// Audit trace of the run.
    pub audit_trace: AuditTrace,
}

impl RunResult {
    /// Returns the line produced by the given component, if any.
    pub fn line(&self, component_id: &str) -> Option<&ComponentLine> {
        self.lines.iter().find(|line| line.component_id == component_id)
    }

    /// Returns the amount produced by the given component, if any.
    pub fn amount(&self, component_id: &str) -> Option<Decimal> {
        self.line(component_id).map(|line| line.amount)
    }
}
