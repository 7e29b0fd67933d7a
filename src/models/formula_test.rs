//! Formula test cases.
//!
//! A test case pairs a set of context values with the amount a formula is
//! expected to produce for them. Suites are keyed by component id so they
//! can live next to the component roster in configuration.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::evaluation::Value;

/// One named input/expected-output pair for a formula.
///
/// # Example
///
/// ```
/// use payroll_formula_engine::models::FormulaTestCase;
/// use payroll_formula_engine::Value;
/// use rust_decimal::Decimal;
///
/// let case = FormulaTestCase::new("UAE National", Decimal::new(9375, 1))
///     .with("EMPLOYEE.NATIONALITY", "UAE")
///     .with("EMPLOYEE.BASIC_SALARY", Decimal::new(15000, 0))
///     .with("HOUSING_ALLOWANCE", Decimal::new(3750, 0));
///
/// assert_eq!(case.variables.len(), 3);
/// assert_eq!(case.variables["EMPLOYEE.NATIONALITY"], Value::from("UAE"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaTestCase {
    /// Label shown in outcomes.
    pub name: String,
    /// Context values, keyed by identifier path.
    #[serde(default)]
    pub variables: BTreeMap<String, Value>,
    /// The amount the formula should produce.
    pub expected: Decimal,
}

impl FormulaTestCase {
    /// Creates a case with no variables.
    pub fn new(name: impl Into<String>, expected: Decimal) -> Self {
        Self {
            name: name.into(),
            variables: BTreeMap::new(),
            expected,
        }
    }

    /// Adds a context value, returning the updated case.
    pub fn with(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(path.into(), value.into());
        self
    }
}

/// Test cases attached to one component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaTestSuite {
    /// The component whose formula the cases exercise.
    pub component_id: String,
    /// The cases, run in order.
    pub cases: Vec<FormulaTestCase>,
}

/// The result of running one [`FormulaTestCase`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulaTestOutcome {
    /// The case's label.
    pub name: String,
    /// The expected amount.
    pub expected: Decimal,
    /// The amount produced, if evaluation succeeded.
    pub actual: Option<Decimal>,
    /// The evaluation error message, if evaluation failed.
    pub error: Option<String>,
    /// True when evaluation succeeded and `actual == expected`.
    pub passed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_suite_from_yaml() {
        let yaml = r#"
component_id: "3"
cases:
  - name: UAE National
    variables:
      EMPLOYEE.NATIONALITY: UAE
      EMPLOYEE.BASIC_SALARY: 15000
      HOUSING_ALLOWANCE: 3750
    expected: 937.5
  - name: Non-UAE National
    variables:
      EMPLOYEE.NATIONALITY: India
    expected: 0
"#;
        let suite: FormulaTestSuite = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(suite.component_id, "3");
        assert_eq!(suite.cases.len(), 2);

        let first = &suite.cases[0];
        assert_eq!(first.expected, Decimal::new(9375, 1));
        assert_eq!(first.variables["EMPLOYEE.NATIONALITY"], Value::from("UAE"));
        assert_eq!(
            first.variables["EMPLOYEE.BASIC_SALARY"],
            Value::Number(Decimal::new(15000, 0))
        );
        assert_eq!(suite.cases[1].expected, Decimal::ZERO);
    }

    #[test]
    fn test_variables_default_to_empty() {
        let case: FormulaTestCase =
            serde_json::from_str(r#"{"name": "constant", "expected": "42"}"#).unwrap();
        assert!(case.variables.is_empty());
        assert_eq!(case.expected, Decimal::new(42, 0));
    }
}
