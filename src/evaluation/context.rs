//! The variable environment a formula is evaluated against.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::formula::canonical_path;

use super::Value;

/// Values available to a formula, keyed by canonical path.
///
/// A context belongs to a single payroll computation. It is seeded with
/// context paths such as `EMPLOYEE.BASIC_SALARY`, and the amounts of
/// already-evaluated components are added under the names formulas read them
/// by; entries are never removed.
///
/// # Example
///
/// ```
/// use payroll_formula_engine::evaluation::{EvaluationContext, Value};
/// use rust_decimal::Decimal;
///
/// let mut context = EvaluationContext::new()
///     .with("employee.nationality", "UAE")
///     .with("EMPLOYEE.BASIC_SALARY", Decimal::new(15000, 0));
/// context.insert_component_result("HOUSING_ALLOWANCE", Decimal::new(3750, 0));
///
/// assert_eq!(context.get("EMPLOYEE.NATIONALITY"), Some(&Value::from("UAE")));
/// assert_eq!(context.len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationContext {
    values: BTreeMap<String, Value>,
}

impl EvaluationContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, path: &str, value: impl Into<Value>) -> Self {
        self.insert(path, value);
        self
    }

    /// Inserts a value under the canonical form of `path`, returning any
    /// previous value.
    pub fn insert(&mut self, path: &str, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(canonical_path(path), value.into())
    }

    /// Records a computed component amount under the identifier formulas use for it.
    pub fn insert_component_result(&mut self, identifier: &str, amount: Decimal) {
        self.insert(identifier, Value::Number(amount));
    }

    /// Looks up a value; the path is matched case-insensitively.
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.values
            .get(path)
            .or_else(|| self.values.get(&canonical_path(path)))
    }

    /// Returns true if the path has a value.
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the context has no entries.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over entries in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: AsRef<str>> FromIterator<(K, Value)> for EvaluationContext {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut context = Self::new();
        context.extend(iter);
        context
    }
}

impl<K: AsRef<str>> Extend<(K, Value)> for EvaluationContext {
    fn extend<I: IntoIterator<Item = (K, Value)>>(&mut self, iter: I) {
        for (path, value) in iter {
            self.insert(path.as_ref(), value);
        }
    }
}
