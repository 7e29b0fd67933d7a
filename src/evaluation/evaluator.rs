//! Tree-walking evaluator.
//!
//! Evaluation is a pure function of the expression and the context: nothing
//! is mutated, and the first fault aborts the whole formula. Only the taken
//! branch of an `IF` and the needed operand of `AND`/`OR` are evaluated.

use std::cmp::Ordering;

use rust_decimal::Decimal;

use crate::error::{EvalError, EvalResult};
use crate::formula::{BinaryOp, Expr, Literal, UnaryOp};

use super::functions;
use super::{EvaluationContext, Value};

/// Evaluates a component formula to a currency amount.
///
/// # Errors
///
/// Any [`EvalError`] raised by a sub-expression, or
/// [`EvalError::TypeMismatch`] if the formula yields a string or boolean.
///
/// # Example
///
/// ```
/// use payroll_formula_engine::evaluation::{evaluate_component, EvaluationContext};
/// use payroll_formula_engine::formula::parse_formula;
/// use rust_decimal::Decimal;
///
/// let expr = parse_formula("PRORATE(3000, 15, 30)").unwrap();
/// let amount = evaluate_component(&expr, &EvaluationContext::new()).unwrap();
/// assert_eq!(amount, Decimal::new(1500, 0));
/// ```
pub fn evaluate_component(expr: &Expr, context: &EvaluationContext) -> EvalResult<Decimal> {
    let value = evaluate_value(expr, context)?;
    expect_number(value, "formula result")
}

/// Evaluates an expression to a value of any type.
pub fn evaluate_value(expr: &Expr, context: &EvaluationContext) -> EvalResult<Value> {
    match expr {
        Expr::Literal(literal) => Ok(match literal {
            Literal::Number(n) => Value::Number(*n),
            Literal::Text(s) => Value::Text(s.clone()),
            Literal::Bool(b) => Value::Bool(*b),
        }),
        Expr::Identifier(id) => {
            context
                .get(id.path())
                .cloned()
                .ok_or_else(|| EvalError::UnboundVariable {
                    identifier: id.path().to_string(),
                })
        }
        Expr::Unary { op, operand } => {
            let value = evaluate_value(operand, context)?;
            eval_unary(*op, value)
        }
        Expr::Binary { op, left, right } => match op {
            BinaryOp::And | BinaryOp::Or => eval_logical(*op, left, right, context),
            _ => {
                let l = evaluate_value(left, context)?;
                let r = evaluate_value(right, context)?;
                eval_binary(*op, l, r)
            }
        },
        Expr::Call { function, args } => functions::call(*function, args, context),
        Expr::Conditional {
            condition,
            then_branch,
            else_branch,
        } => {
            let condition = evaluate_value(condition, context)?;
            if expect_bool(condition, "IF condition")? {
                evaluate_value(then_branch, context)
            } else {
                evaluate_value(else_branch, context)
            }
        }
    }
}

pub(crate) fn expect_number(value: Value, operation: &str) -> EvalResult<Decimal> {
    match value {
        Value::Number(n) => Ok(n),
        other => Err(type_mismatch(operation, "number", other.type_name())),
    }
}

fn expect_bool(value: Value, operation: &str) -> EvalResult<bool> {
    match value {
        Value::Bool(b) => Ok(b),
        other => Err(type_mismatch(operation, "boolean", other.type_name())),
    }
}

fn type_mismatch(operation: &str, expected: &str, found: &str) -> EvalError {
    EvalError::TypeMismatch {
        operation: operation.to_string(),
        expected: expected.to_string(),
        found: found.to_string(),
    }
}

fn eval_unary(op: UnaryOp, value: Value) -> EvalResult<Value> {
    match op {
        UnaryOp::Neg => expect_number(value, "unary -").map(|n| Value::Number(-n)),
        UnaryOp::Not => expect_bool(value, "NOT").map(|b| Value::Bool(!b)),
    }
}

fn eval_logical(
    op: BinaryOp,
    left: &Expr,
    right: &Expr,
    context: &EvaluationContext,
) -> EvalResult<Value> {
    let l = expect_bool(evaluate_value(left, context)?, op.symbol())?;
    let short_circuit = match op {
        BinaryOp::And => !l,
        _ => l,
    };
    if short_circuit {
        return Ok(Value::Bool(l));
    }
    let r = expect_bool(evaluate_value(right, context)?, op.symbol())?;
    Ok(Value::Bool(r))
}

fn eval_binary(op: BinaryOp, left: Value, right: Value) -> EvalResult<Value> {
    match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
            let (l, r) = match (left, right) {
                (Value::Number(l), Value::Number(r)) => (l, r),
                (l, r) => {
                    return Err(type_mismatch(
                        op.symbol(),
                        "number and number",
                        &format!("{} and {}", l.type_name(), r.type_name()),
                    ));
                }
            };
            eval_arithmetic(op, l, r).map(Value::Number)
        }
        BinaryOp::Eq | BinaryOp::NotEq => {
            let equal = match (&left, &right) {
                (Value::Number(l), Value::Number(r)) => l == r,
                (Value::Text(l), Value::Text(r)) => l == r,
                (Value::Bool(l), Value::Bool(r)) => l == r,
                (l, r) => {
                    return Err(type_mismatch(
                        op.symbol(),
                        "operands of the same type",
                        &format!("{} and {}", l.type_name(), r.type_name()),
                    ));
                }
            };
            Ok(Value::Bool(if op == BinaryOp::Eq { equal } else { !equal }))
        }
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = match (&left, &right) {
                (Value::Number(l), Value::Number(r)) => l.cmp(r),
                (Value::Text(l), Value::Text(r)) => l.cmp(r),
                (l, r) => {
                    return Err(type_mismatch(
                        op.symbol(),
                        "two numbers or two strings",
                        &format!("{} and {}", l.type_name(), r.type_name()),
                    ));
                }
            };
            let result = match op {
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::Le => ordering != Ordering::Greater,
                BinaryOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            };
            Ok(Value::Bool(result))
        }
        BinaryOp::And | BinaryOp::Or => {
            let l = expect_bool(left, op.symbol())?;
            let r = expect_bool(right, op.symbol())?;
            Ok(Value::Bool(if op == BinaryOp::And { l && r } else { l || r }))
        }
    }
}

fn eval_arithmetic(op: BinaryOp, l: Decimal, r: Decimal) -> EvalResult<Decimal> {
    let result = match op {
        BinaryOp::Add => l.checked_add(r),
        BinaryOp::Sub => l.checked_sub(r),
        BinaryOp::Mul => l.checked_mul(r),
        _ => {
            if r.is_zero() {
                return Err(EvalError::DivisionByZero);
            }
            l.checked_div(r)
        }
    };
    result.ok_or_else(|| EvalError::Overflow {
        operation: op.symbol().to_string(),
    })
}
