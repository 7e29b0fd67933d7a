//! Employee model.
//!
//! This module defines the [`Employee`] struct and the context paths it
//! contributes to formula evaluation.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::evaluation::Value;
use crate::formula::canonical_path;

/// Namespace under which employee attributes are exposed to formulas.
pub const EMPLOYEE_NAMESPACE: &str = "EMPLOYEE";

/// Fields exposed from the typed struct; `attributes` may not reuse them.
const TYPED_FIELDS: [&str; 6] = ["ID", "NAME", "NATIONALITY", "BASIC_SALARY", "HIRE_DATE", "COUNTRY"];

/// Represents an employee whose payroll components are being computed.
///
/// Only the fields formulas commonly read are typed; anything else the
/// orchestrator wants to expose goes in `attributes` and appears as
/// `EMPLOYEE.<KEY>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier for the employee.
    pub id: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Nationality as written in formulas (e.g. "UAE", "India").
    pub nationality: String,
    /// Monthly basic salary.
    pub basic_salary: Decimal,
    /// The date the employee was hired.
    pub hire_date: NaiveDate,
    /// Country of employment (e.g. "UAE", "KSA", "OMAN").
    pub country: String,
    /// Additional attributes exposed as `EMPLOYEE.<KEY>`.
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

impl Employee {
    /// Checks the record for values formulas cannot work with.
    pub fn validate(&self) -> EngineResult<()> {
        if self.id.trim().is_empty() {
            return Err(EngineError::InvalidEmployee {
                field: "id".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if self.basic_salary.is_sign_negative() && !self.basic_salary.is_zero() {
            return Err(EngineError::InvalidEmployee {
                field: "basic_salary".to_string(),
                message: format!("must not be negative, found {}", self.basic_salary),
            });
        }
        for key in self.attributes.keys() {
            let path = canonical_path(key);
            if TYPED_FIELDS.contains(&path.as_str()) {
                return Err(EngineError::InvalidEmployee {
                    field: format!("attributes.{}", key),
                    message: format!("collides with the typed field {}.{}", EMPLOYEE_NAMESPACE, path),
                });
            }
        }
        Ok(())
    }

    /// Returns true if the employee is a national of their country of employment.
    ///
    /// # Examples
    ///
    /// ```
    /// use payroll_formula_engine::models::Employee;
    /// use chrono::NaiveDate;
    /// use rust_decimal::Decimal;
    ///
    /// let employee = Employee {
    ///     id: "emp_001".to_string(),
    ///     name: None,
    ///     nationality: "UAE".to_string(),
    ///     basic_salary: Decimal::new(15000, 0),
    ///     hire_date: NaiveDate::from_ymd_opt(2020, 3, 1).unwrap(),
    ///     country: "UAE".to_string(),
    ///     attributes: Default::default(),
    /// };
    /// assert!(employee.is_national());
    /// ```
    pub fn is_national(&self) -> bool {
        self.nationality.eq_ignore_ascii_case(&self.country)
    }

    /// Returns the `EMPLOYEE.*` context entries for this employee.
    ///
    /// The hire date is exposed as ISO-8601 text (`YYYY-MM-DD`). Typed
    /// fields come after `attributes`, so they win when both are inserted
    /// into one context.
    pub fn context_entries(&self) -> Vec<(String, Value)> {
        let field = |name: &str| format!("{}.{}", EMPLOYEE_NAMESPACE, name);
        let mut entries: Vec<(String, Value)> = self
            .attributes
            .iter()
            .map(|(key, value)| (field(&canonical_path(key)), value.clone()))
            .collect();
        entries.extend([
            (field("ID"), Value::from(self.id.as_str())),
            (field("NATIONALITY"), Value::from(self.nationality.as_str())),
            (field("BASIC_SALARY"), Value::Number(self.basic_salary)),
            (field("HIRE_DATE"), Value::Text(self.hire_date.to_string())),
            (field("COUNTRY"), Value::from(self.country.as_str())),
        ]);
        if let Some(name) = &self.name {
            entries.push((field("NAME"), Value::from(name.as_str())));
        }
        entries
    }
}
