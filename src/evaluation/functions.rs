//! Built-in functions callable from formulas.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{EvalError, EvalResult};
use crate::formula::{Expr, Function};

use super::evaluator::{evaluate_value, expect_number};
use super::{EvaluationContext, Value};

/// Largest number of decimal places a `Decimal` can hold.
const MAX_ROUND_DECIMALS: u32 = 28;

pub(crate) fn call(
    function: Function,
    args: &[Expr],
    context: &EvaluationContext,
) -> EvalResult<Value> {
    let mut numbers = Vec::with_capacity(args.len());
    for arg in args {
        let value = evaluate_value(arg, context)?;
        numbers.push(expect_number(value, function.name())?);
    }

    match (function, numbers.as_slice()) {
        (Function::Round, [number, decimals]) => round(*number, *decimals).map(Value::Number),
        (Function::Prorate, [amount, days, total_days]) => {
            prorate(*amount, *days, *total_days).map(Value::Number)
        }
        _ => Err(EvalError::InvalidArgument {
            function: function.name().to_string(),
            message: format!(
                "expected {} arguments, found {}",
                function.arity(),
                numbers.len()
            ),
        }),
    }
}

/// `ROUND(number, decimals)` with midpoints rounded away from zero.
pub(crate) fn round(number: Decimal, decimals: Decimal) -> EvalResult<Decimal> {
    let invalid = |message: String| EvalError::InvalidArgument {
        function: "ROUND".to_string(),
        message,
    };

    if decimals.is_sign_negative() && !decimals.is_zero() {
        return Err(invalid(format!("decimals must not be negative, found {}", decimals)));
    }
    if !decimals.fract().is_zero() {
        return Err(invalid(format!("decimals must be a whole number, found {}", decimals)));
    }
    let places = decimals
        .to_u32()
        .filter(|p| *p <= MAX_ROUND_DECIMALS)
        .ok_or_else(|| {
            invalid(format!(
                "decimals must be at most {}, found {}",
                MAX_ROUND_DECIMALS, decimals
            ))
        })?;

    Ok(number.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero))
}

/// `PRORATE(amount, days, totalDays)` = `amount * days / totalDays`.
pub(crate) fn prorate(amount: Decimal, days: Decimal, total_days: Decimal) -> EvalResult<Decimal> {
    if total_days.is_zero() {
        return Err(EvalError::DivisionByZero);
    }
    amount
        .checked_mul(days)
        .and_then(|scaled| scaled.checked_div(total_days))
        .ok_or_else(|| EvalError::Overflow {
            operation: "PRORATE".to_string(),
        })
}
