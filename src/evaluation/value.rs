//! Runtime values seen by the evaluator.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::de::{self, Deserialize, Deserializer, Visitor};
use serde::{Serialize, Serializer};

/// A value held in an evaluation context or produced by a sub-expression.
///
/// Numbers are decimals so currency amounts never pick up binary
/// floating-point drift. When deserialized, JSON/YAML numbers become
/// [`Value::Number`], strings become [`Value::Text`] and booleans become
/// [`Value::Bool`].
///
/// # Example
///
/// ```
/// use payroll_formula_engine::evaluation::Value;
/// use rust_decimal::Decimal;
///
/// let salary: Value = serde_json::from_str("15000.50").unwrap();
/// assert_eq!(salary, Value::Number(Decimal::new(1500050, 2)));
///
/// let nationality: Value = serde_json::from_str("\"UAE\"").unwrap();
/// assert_eq!(nationality, Value::from("UAE"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A decimal number.
    Number(Decimal),
    /// A case-sensitive string.
    Text(String),
    /// A boolean.
    Bool(bool),
}

impl Value {
    /// Returns the type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Text(_) => "text",
            Self::Bool(_) => "boolean",
        }
    }

    /// Returns the number, if this is one.
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the string, if this is one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the boolean, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
            Self::Bool(true) => f.write_str("TRUE"),
            Self::Bool(false) => f.write_str("FALSE"),
        }
    }
}

impl From<Decimal> for Value {
    fn from(n: Decimal) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Number(n) => Serialize::serialize(n, serializer),
            Self::Text(s) => serializer.serialize_str(s),
            Self::Bool(b) => serializer.serialize_bool(*b),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number, string or boolean")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Number(Decimal::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        Ok(Value::Number(Decimal::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        // Shortest round-trip formatting keeps 0.05 as exactly 0.05.
        Decimal::from_str(&v.to_string())
            .map(Value::Number)
            .map_err(|_| E::custom(format!("number out of decimal range: {}", v)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::Text(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_deserialize_json_numbers_exactly() {
        let value: Value = serde_json::from_str("0.05").unwrap();
        assert_eq!(value, Value::Number(dec("0.05")));

        let value: Value = serde_json::from_str("3750").unwrap();
        assert_eq!(value, Value::Number(dec("3750")));
    }

    #[test]
    fn test_deserialize_strings_stay_text() {
        let value: Value = serde_json::from_str("\"15000\"").unwrap();
        assert_eq!(value, Value::Text("15000".to_string()));
    }

    #[test]
    fn test_deserialize_yaml_mapping() {
        let yaml = "EMPLOYEE.NATIONALITY: UAE\nEMPLOYEE.BASIC_SALARY: 15000\nFLAG: true\n";
        let map: std::collections::BTreeMap<String, Value> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(map["EMPLOYEE.NATIONALITY"], Value::from("UAE"));
        assert_eq!(map["EMPLOYEE.BASIC_SALARY"], Value::Number(dec("15000")));
        assert_eq!(map["FLAG"], Value::Bool(true));
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Value::Number(Decimal::ONE).type_name(), "number");
        assert_eq!(Value::from("x").type_name(), "text");
        assert_eq!(Value::from(false).type_name(), "boolean");
    }

    #[test]
    fn test_serialize_number_as_string() {
        let json = serde_json::to_string(&Value::Number(dec("937.5"))).unwrap();
        assert_eq!(json, "\"937.5\"");
        let json = serde_json::to_string(&Value::Bool(true)).unwrap();
        assert_eq!(json, "true");
    }
}
