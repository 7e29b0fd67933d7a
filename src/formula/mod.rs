//! Formula language: tokenizer, expression tree and parser.
//!
//! Formulas are small expressions over decimal numbers, strings and booleans,
//! such as `IF(EMPLOYEE.NATIONALITY == "UAE", (EMPLOYEE.BASIC_SALARY + HOUSING_ALLOWANCE) * 0.05, 0)`.
//! Identifiers are case-insensitive and stored upper-cased; string literals
//! are case-sensitive.
//!
//! # Example
//!
//! ```
//! use payroll_formula_engine::formula::parse_formula;
//!
//! let expr = parse_formula("employee.basic_salary * 0.25").unwrap();
//! assert_eq!(expr.to_string(), "(EMPLOYEE.BASIC_SALARY * 0.25)");
//! ```

mod ast;
mod lexer;
mod parser;

pub use ast::{
    BinaryOp, Expr, Function, Identifier, Literal, UnaryOp, canonical_path,
    component_identifier, is_keyword,
};
pub use parser::{MAX_GROUPING_DEPTH, MAX_NESTING_DEPTH, parse_formula};
