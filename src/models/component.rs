//! Payroll component definitions.
//!
//! This module defines [`ComponentDefinition`], the unit of payroll
//! calculation (an earning, deduction or benefit backed by a formula).

use serde::{Deserialize, Serialize};

use crate::formula::component_identifier;

/// Country scope that any component may reference regardless of its own scope.
pub const GLOBAL_SCOPE: &str = "GLOBAL";

/// Whether a component adds to or subtracts from pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComponentKind {
    /// Paid to the employee (salary, allowances, overtime).
    Earning,
    /// Withheld from pay (statutory contributions, insurance).
    Deduction,
    /// Employer-provided benefit reported alongside pay.
    Benefit,
}

/// Reporting category of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComponentCategory {
    /// Base salary.
    Salary,
    /// Fixed allowances such as housing or transport.
    Allowance,
    /// Contributions required by law.
    Statutory,
    /// Amounts that vary per period, such as overtime.
    Variable,
}

/// Lifecycle status of a component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComponentStatus {
    /// Included in payroll runs.
    #[default]
    Active,
    /// Retired; excluded from payroll runs.
    Inactive,
    /// Being authored; excluded from payroll runs.
    Draft,
}

/// One payroll component and its formula.
///
/// Definitions are authored elsewhere and are treated as immutable for the
/// duration of a resolution and evaluation pass.
///
/// # Example
///
/// ```
/// use payroll_formula_engine::models::{ComponentDefinition, ComponentKind};
///
/// let housing = ComponentDefinition::new(
///     "housing",
///     "Housing Allowance",
///     ComponentKind::Earning,
///     "EMPLOYEE.BASIC_SALARY * 0.25",
///     "UAE",
/// );
/// assert_eq!(housing.canonical_name().as_deref(), Some("HOUSING_ALLOWANCE"));
/// assert!(housing.is_active());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDefinition {
    /// Unique, stable identifier.
    pub id: String,
    /// Human-readable label; formulas refer to the component by its canonical form.
    pub name: String,
    /// Earning, deduction or benefit.
    #[serde(alias = "type")]
    pub kind: ComponentKind,
    /// Optional reporting category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ComponentCategory>,
    /// Lifecycle status.
    #[serde(default)]
    pub status: ComponentStatus,
    /// Raw formula source.
    #[serde(rename = "formula")]
    pub formula_source: String,
    /// Market the component applies to (e.g. "UAE"), or [`GLOBAL_SCOPE`].
    #[serde(alias = "country")]
    pub country_scope: String,
    /// Version label owned by the authoring tool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Free-text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ComponentDefinition {
    /// Creates an active component without category, version or description.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: ComponentKind,
        formula_source: impl Into<String>,
        country_scope: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            category: None,
            status: ComponentStatus::Active,
            formula_source: formula_source.into(),
            country_scope: country_scope.into(),
            version: None,
            description: None,
        }
    }

    /// Returns true if the component takes part in payroll runs.
    pub fn is_active(&self) -> bool {
        self.status == ComponentStatus::Active
    }

    /// Returns the identifier formulas use to reference this component.
    pub fn canonical_name(&self) -> Option<String> {
        component_identifier(&self.name)
    }

    /// Returns true if the component is visible to every country scope.
    pub fn is_global(&self) -> bool {
        self.country_scope.eq_ignore_ascii_case(GLOBAL_SCOPE)
    }

    /// Returns true if this component's formula may reference `other`.
    pub fn can_reference(&self, other: &ComponentDefinition) -> bool {
        other.is_global() || self.country_scope.eq_ignore_ascii_case(&other.country_scope)
    }

    /// Returns true if the component is paid to employees working in `country`.
    pub fn applies_to(&self, country: &str) -> bool {
        self.is_global() || self.country_scope.eq_ignore_ascii_case(country)
    }
}
