//! Formula test lab.
//!
//! Runs a formula against hand-written cases so authors can check it before
//! activating the component. Each case is evaluated with its own context.

use tracing::debug;

use crate::error::{EngineError, EngineResult, ParseError};
use crate::evaluation::{evaluate_component, EvaluationContext};
use crate::formula::{parse_formula, Expr};
use crate::models::{ComponentDefinition, FormulaTestCase, FormulaTestOutcome, FormulaTestSuite};

/// Parses `formula` once and evaluates it for every case.
///
/// Evaluation failures are reported per case in
/// [`FormulaTestOutcome::error`]; only a parse failure fails the whole call.
///
/// # Example
///
/// ```
/// use payroll_formula_engine::calculation::run_formula_tests;
/// use payroll_formula_engine::models::FormulaTestCase;
/// use rust_decimal::Decimal;
///
/// let cases = vec![
///     FormulaTestCase::new("half", Decimal::new(1500, 0)).with("DAYS", Decimal::new(15, 0)),
///     FormulaTestCase::new("missing days", Decimal::ZERO),
/// ];
/// let outcomes = run_formula_tests("PRORATE(3000, DAYS, 30)", &cases).unwrap();
///
/// assert!(outcomes[0].passed);
/// assert!(!outcomes[1].passed);
/// assert_eq!(outcomes[1].error.as_deref(), Some("Unbound variable: DAYS"));
/// ```
pub fn run_formula_tests(
    formula: &str,
    cases: &[FormulaTestCase],
) -> Result<Vec<FormulaTestOutcome>, ParseError> {
    let expr = parse_formula(formula)?;
    let outcomes: Vec<FormulaTestOutcome> = cases.iter().map(|case| run_case(&expr, case)).collect();

    debug!(
        formula,
        cases = outcomes.len(),
        passed = outcomes.iter().filter(|o| o.passed).count(),
        "Ran formula tests"
    );
    Ok(outcomes)
}

/// Runs a configured suite against the formula of the component it names.
pub fn run_test_suite(
    suite: &FormulaTestSuite,
    components: &[ComponentDefinition],
) -> EngineResult<Vec<FormulaTestOutcome>> {
    let component = components
        .iter()
        .find(|c| c.id == suite.component_id)
        .ok_or_else(|| EngineError::ComponentNotFound {
            component_id: suite.component_id.clone(),
        })?;
    Ok(run_formula_tests(&component.formula_source, &suite.cases)?)
}

fn run_case(expr: &Expr, case: &FormulaTestCase) -> FormulaTestOutcome {
    let context: EvaluationContext = case
        .variables
        .iter()
        .map(|(path, value)| (path, value.clone()))
        .collect();

    let (actual, error) = match evaluate_component(expr, &context) {
        Ok(amount) => (Some(amount), None),
        Err(err) => (None, Some(err.to_string())),
    };

    FormulaTestOutcome {
        name: case.name.clone(),
        expected: case.expected,
        passed: actual == Some(case.expected),
        actual,
        error,
    }
}
