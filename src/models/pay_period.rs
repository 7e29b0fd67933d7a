//! Pay period model.
//!
//! This module contains the [`PayPeriod`] type, which supplies the
//! `PAYROLL.*` context paths used for proration.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::evaluation::Value;

/// Namespace under which pay period values are exposed to formulas.
pub const PAYROLL_NAMESPACE: &str = "PAYROLL";

/// Represents a pay period and how much of it the employee worked.
///
/// # Example
///
/// ```
/// use payroll_formula_engine::models::PayPeriod;
/// use chrono::NaiveDate;
///
/// let period = PayPeriod {
///     start_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
///     end_date: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
///     worked_days: Some(15),
/// };
///
/// assert_eq!(period.total_days(), 30);
/// assert_eq!(period.effective_worked_days(), 15);
/// assert!(period.contains_date(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayPeriod {
    /// The start date of the pay period (inclusive).
    pub start_date: NaiveDate,
    /// The end date of the pay period (inclusive).
    pub end_date: NaiveDate,
    /// Days actually worked; `None` means the whole period.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worked_days: Option<u32>,
}

impl PayPeriod {
    /// Checks that the period is well-formed.
    pub fn validate(&self) -> EngineResult<()> {
        if self.end_date < self.start_date {
            return Err(EngineError::InvalidPayPeriod {
                message: format!(
                    "end date {} is before start date {}",
                    self.end_date, self.start_date
                ),
            });
        }
        if let Some(worked) = self.worked_days {
            if i64::from(worked) > self.total_days() {
                return Err(EngineError::InvalidPayPeriod {
                    message: format!(
                        "worked days {} exceed the {} days in the period",
                        worked,
                        self.total_days()
                    ),
                });
            }
        }
        Ok(())
    }

    /// Number of calendar days in the period, counting both ends.
    pub fn total_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    /// Days worked, defaulting to the whole period.
    pub fn effective_worked_days(&self) -> i64 {
        self.worked_days
            .map(i64::from)
            .unwrap_or_else(|| self.total_days())
    }

    /// Checks if a given date falls within this pay period (inclusive).
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Returns the `PAYROLL.*` context entries for this period.
    pub fn context_entries(&self) -> Vec<(String, Value)> {
        let field = |name: &str| format!("{}.{}", PAYROLL_NAMESPACE, name);
        vec![
            (field("START_DATE"), Value::Text(self.start_date.to_string())),
            (field("END_DATE"), Value::Text(self.end_date.to_string())),
            (field("TOTAL_DAYS"), Value::Number(Decimal::from(self.total_days()))),
            (
                field("WORKED_DAYS"),
                Value::Number(Decimal::from(self.effective_worked_days())),
            ),
        ]
    }
}
