//! Payroll run orchestration.
//!
//! A run seeds a fresh [`EvaluationContext`] from the employee, the pay
//! period and any bare variables, then evaluates the components that apply
//! to the employee's country in resolved order. Each formula sees the seed
//! plus the amounts of exactly the components it was bound to at
//! resolution time.

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::Utc;
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{ConfigLoader, ContextSchema};
use crate::error::{EngineError, EngineResult};
use crate::evaluation::{evaluate_component, EvaluationContext, Value};
use crate::models::{
    AuditStep, AuditTrace, AuditWarning, ComponentDefinition, ComponentLine, Employee, PayPeriod,
    RunResult, RunTotals,
};
use crate::resolution::{resolve_components, OrderedComponent};

/// Warning code attached to components that produce a negative amount.
pub const NEGATIVE_AMOUNT_WARNING: &str = "NEGATIVE_AMOUNT";

/// Everything a payroll run needs besides the component roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollInput {
    /// The employee being paid.
    pub employee: Employee,
    /// The period being paid.
    pub pay_period: PayPeriod,
    /// Bare inputs such as `OVERTIME_HOURS`.
    #[serde(default)]
    pub variables: BTreeMap<String, Value>,
}

impl PayrollInput {
    /// Creates an input with no bare variables.
    pub fn new(employee: Employee, pay_period: PayPeriod) -> Self {
        Self {
            employee,
            pay_period,
            variables: BTreeMap::new(),
        }
    }

    /// Adds a bare variable, returning the updated input.
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Builds the initial context for a run.
    ///
    /// Employee and pay period entries are inserted after the bare variables
    /// so a variable cannot override a typed field.
    pub fn seed_context(&self) -> EvaluationContext {
        let mut context: EvaluationContext = self
            .variables
            .iter()
            .map(|(name, value)| (name, value.clone()))
            .collect();
        context.extend(self.employee.context_entries());
        context.extend(self.pay_period.context_entries());
        context
    }
}

/// Runs an already-resolved roster for one employee.
///
/// The roster must be in the order returned by
/// [`resolve_components`]; components are evaluated strictly in sequence.
/// Components scoped to another country are skipped; `GLOBAL` ones always run.
///
/// # Errors
///
/// - [`EngineError::InvalidEmployee`] or [`EngineError::InvalidPayPeriod`]
///   if the input fails validation.
/// - [`EngineError::Evaluation`] for the first component that fails; no
///   partial result is returned.
pub fn run_payroll(input: &PayrollInput, roster: &[OrderedComponent]) -> EngineResult<RunResult> {
    let start_time = Instant::now();

    input.employee.validate()?;
    input.pay_period.validate()?;

    let seed = input.seed_context();
    let mut amounts: BTreeMap<&str, Decimal> = BTreeMap::new();
    let mut lines = Vec::with_capacity(roster.len());
    let mut steps = Vec::with_capacity(roster.len());
    let mut warnings = Vec::new();

    let applicable = roster
        .iter()
        .filter(|component| component.definition.applies_to(&input.employee.country));

    for (step_number, component) in (1u32..).zip(applicable) {
        let definition = &component.definition;
        let context = bound_context(&seed, component, &amounts);
        let amount = evaluate_component(&component.expr, &context).map_err(|source| {
            warn!(
                employee_id = %input.employee.id,
                component_id = %definition.id,
                error = %source,
                "Component evaluation failed"
            );
            EngineError::Evaluation {
                component_id: definition.id.clone(),
                source,
            }
        })?;

        debug!(
            component_id = %definition.id,
            name = %component.canonical_name,
            amount = %amount,
            "Evaluated component"
        );

        if amount < Decimal::ZERO {
            warnings.push(AuditWarning {
                code: NEGATIVE_AMOUNT_WARNING.to_string(),
                message: format!("{} evaluated to a negative amount ({})", definition.name, amount),
                component_id: definition.id.clone(),
            });
        }

        steps.push(AuditStep {
            step_number,
            component_id: definition.id.clone(),
            component_name: definition.name.clone(),
            formula: definition.formula_source.clone(),
            input: inputs_read(component, &context),
            output: amount,
            reasoning: format!(
                "{} = {} = {}",
                component.canonical_name, component.expr, amount
            ),
        });
        lines.push(ComponentLine {
            component_id: definition.id.clone(),
            name: definition.name.clone(),
            kind: definition.kind,
            amount,
        });

        amounts.insert(definition.id.as_str(), amount);
    }

    let totals = RunTotals::from_lines(&lines);
    let duration_us = start_time.elapsed().as_micros() as u64;

    info!(
        employee_id = %input.employee.id,
        components = lines.len(),
        net_pay = %totals.net_pay,
        warnings = warnings.len(),
        duration_us,
        "Payroll run completed"
    );

    Ok(RunResult {
        run_id: Uuid::new_v4(),
        timestamp: Utc::now(),
        engine_version: env!("CARGO_PKG_VERSION").to_string(),
        employee_id: input.employee.id.clone(),
        pay_period: input.pay_period.clone(),
        lines,
        totals,
        audit_trace: AuditTrace {
            steps,
            warnings,
            duration_us,
        },
    })
}

/// The seed context plus the amounts of the components `component` reads,
/// each under the identifier the formula uses for it.
///
/// A binding whose component has not run yet is left out, so the evaluator
/// reports it as unbound instead of reading another component's amount.
fn bound_context(
    seed: &EvaluationContext,
    component: &OrderedComponent,
    amounts: &BTreeMap<&str, Decimal>,
) -> EvaluationContext {
    let mut context = seed.clone();
    for (identifier, component_id) in &component.bindings {
        if let Some(amount) = amounts.get(component_id.as_str()) {
            context.insert_component_result(identifier, *amount);
        }
    }
    context
}

/// The values a component's formula read, keyed by identifier path.
///
/// Identifiers in an untaken `IF` branch may be absent and are recorded as null.
fn inputs_read(component: &OrderedComponent, context: &EvaluationContext) -> serde_json::Value {
    let map: serde_json::Map<String, serde_json::Value> = component
        .expr
        .identifiers()
        .into_iter()
        .map(|identifier| {
            let value = match context.get(identifier.path()) {
                Some(Value::Number(n)) => serde_json::Value::String(n.to_string()),
                Some(Value::Text(s)) => serde_json::Value::String(s.clone()),
                Some(Value::Bool(b)) => serde_json::Value::Bool(*b),
                None => serde_json::Value::Null,
            };
            (identifier.path().to_string(), value)
        })
        .collect();
    serde_json::Value::Object(map)
}

/// Resolves a roster once and runs it for any number of employees.
///
/// # Example
///
/// ```
/// use payroll_formula_engine::calculation::{PayrollEngine, PayrollInput};
/// use payroll_formula_engine::config::ContextSchema;
/// use payroll_formula_engine::models::{ComponentDefinition, ComponentKind, Employee, PayPeriod};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let roster = vec![
///     ComponentDefinition::new("1", "Basic Salary", ComponentKind::Earning, "EMPLOYEE.BASIC_SALARY", "UAE"),
///     ComponentDefinition::new("2", "Housing Allowance", ComponentKind::Earning, "BASIC_SALARY * 0.25", "UAE"),
/// ];
/// let engine = PayrollEngine::new(ContextSchema::default(), &roster).unwrap();
///
/// let input = PayrollInput::new(
///     Employee {
///         id: "emp_001".to_string(),
///         name: None,
///         nationality: "UAE".to_string(),
///         basic_salary: Decimal::new(15000, 0),
///         hire_date: NaiveDate::from_ymd_opt(2020, 3, 1).unwrap(),
///         country: "UAE".to_string(),
///         attributes: Default::default(),
///     },
///     PayPeriod {
///         start_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
///         end_date: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
///         worked_days: None,
///     },
/// );
///
/// let result = engine.run(&input).unwrap();
/// assert_eq!(result.totals.earnings, Decimal::new(18750, 0));
/// ```
#[derive(Debug, Clone)]
pub struct PayrollEngine {
    order: Vec<OrderedComponent>,
}

impl PayrollEngine {
    /// Resolves the ACTIVE components of `components`.
    ///
    /// Inactive and draft components are skipped before resolution, so an
    /// active formula that reads one fails with an unknown identifier.
    pub fn new(schema: ContextSchema, components: &[ComponentDefinition]) -> EngineResult<Self> {
        let schema = schema.canonicalize();
        let active: Vec<ComponentDefinition> = components
            .iter()
            .filter(|c| c.is_active())
            .cloned()
            .collect();
        let order = resolve_components(&active, &schema)?;

        debug!(
            schema_version = %schema.version,
            active = active.len(),
            skipped = components.len() - active.len(),
            "Payroll engine ready"
        );

        Ok(Self { order })
    }

    /// Builds an engine from a loaded configuration directory.
    pub fn from_config(loader: &ConfigLoader) -> EngineResult<Self> {
        Self::new(loader.schema().clone(), loader.components())
    }

    /// The resolved evaluation order.
    pub fn order(&self) -> &[OrderedComponent] {
        &self.order
    }

    /// Runs payroll for one employee.
    pub fn run(&self, input: &PayrollInput) -> EngineResult<RunResult> {
        run_payroll(input, &self.order)
    }

    /// Runs payroll for many employees in parallel.
    ///
    /// Each run gets its own context; results are returned in input order.
    pub fn run_batch(&self, inputs: &[PayrollInput]) -> Vec<EngineResult<RunResult>> {
        let results: Vec<EngineResult<RunResult>> =
            inputs.par_iter().map(|input| self.run(input)).collect();

        let failed = results.iter().filter(|r| r.is_err()).count();
        info!(runs = inputs.len(), failed, "Payroll batch completed");
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EvalError, ResolutionErrorKind};
    use crate::models::{ComponentKind, ComponentStatus};
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn create_test_employee(id: &str, nationality: &str, salary: &str) -> Employee {
        Employee {
            id: id.to_string(),
            name: None,
            nationality: nationality.to_string(),
            basic_salary: dec(salary),
            hire_date: NaiveDate::from_ymd_opt(2021, 1, 10).unwrap(),
            country: "UAE".to_string(),
            attributes: BTreeMap::new(),
        }
    }

    fn june() -> PayPeriod {
        PayPeriod {
            start_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
            worked_days: None,
        }
    }

    fn component(id: &str, name: &str, kind: ComponentKind, formula: &str) -> ComponentDefinition {
        ComponentDefinition::new(id, name, kind, formula, "UAE")
    }

    fn uae_roster() -> Vec<ComponentDefinition> {
        vec![
            component("1", "Basic Salary", ComponentKind::Earning, "EMPLOYEE.BASIC_SALARY"),
            component("2", "Housing Allowance", ComponentKind::Earning, "BASIC_SALARY * 0.25"),
            component(
                "3",
                "UAE GPSSA",
                ComponentKind::Deduction,
                "IF(EMPLOYEE.NATIONALITY == \"UAE\", (EMPLOYEE.BASIC_SALARY + HOUSING_ALLOWANCE) * 0.05, 0)",
            ),
        ]
    }

    fn engine(roster: &[ComponentDefinition]) -> PayrollEngine {
        PayrollEngine::new(ContextSchema::default(), roster).unwrap()
    }

    #[test]
    fn test_run_for_uae_national() {
        let input = PayrollInput::new(create_test_employee("emp_001", "UAE", "15000"), june());
        let result = engine(&uae_roster()).run(&input).unwrap();

        assert_eq!(result.amount("1"), Some(dec("15000")));
        assert_eq!(result.amount("2"), Some(dec("3750")));
        assert_eq!(result.amount("3"), Some(dec("937.5")));
        assert_eq!(result.totals.earnings, dec("18750"));
        assert_eq!(result.totals.deductions, dec("937.5"));
        assert_eq!(result.totals.net_pay, dec("17812.5"));
        assert_eq!(result.employee_id, "emp_001");
    }

    #[test]
    fn test_run_for_non_national_is_exempt() {
        let input = PayrollInput::new(create_test_employee("emp_002", "India", "12000"), june());
        let result = engine(&uae_roster()).run(&input).unwrap();

        assert_eq!(result.amount("3"), Some(Decimal::ZERO));
        assert_eq!(result.totals.net_pay, dec("15000"));
    }

    #[test]
    fn test_audit_trace_records_every_step() {
        let input = PayrollInput::new(create_test_employee("emp_001", "UAE", "15000"), june());
        let result = engine(&uae_roster()).run(&input).unwrap();
        let steps = &result.audit_trace.steps;

        assert_eq!(steps.len(), 3);
        let numbers: Vec<u32> = steps.iter().map(|s| s.step_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);

        let gpssa = &steps[2];
        assert_eq!(gpssa.component_id, "3");
        assert_eq!(gpssa.output, dec("937.5"));
        assert_eq!(gpssa.input["EMPLOYEE.NATIONALITY"], "UAE");
        assert_eq!(gpssa.input["HOUSING_ALLOWANCE"], "3750.00");
        assert!(gpssa.reasoning.starts_with("UAE_GPSSA = IF("));
        assert!(result.audit_trace.warnings.is_empty());
    }

    #[test]
    fn test_untaken_branch_inputs_recorded_as_null() {
        let roster = vec![component(
            "1",
            "Bonus",
            ComponentKind::Earning,
            "IF(EMPLOYEE.NATIONALITY == \"UAE\", EMPLOYEE.BONUS, 0)",
        )];
        let input = PayrollInput::new(create_test_employee("emp_002", "India", "12000"), june());
        let result = engine(&roster).run(&input).unwrap();

        assert_eq!(result.amount("1"), Some(Decimal::ZERO));
        assert!(result.audit_trace.steps[0].input["EMPLOYEE.BONUS"].is_null());
    }

    #[test]
    fn test_negative_amount_produces_warning() {
        let roster = vec![component("1", "Adjustment", ComponentKind::Earning, "0 - 250")];
        let input = PayrollInput::new(create_test_employee("emp_001", "UAE", "15000"), june());
        let result = engine(&roster).run(&input).unwrap();

        let warnings = &result.audit_trace.warnings;
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, NEGATIVE_AMOUNT_WARNING);
        assert_eq!(warnings[0].component_id, "1");
    }

    #[test]
    fn test_bare_variables_and_pay_period_are_available() {
        let schema = ContextSchema::new("1", ["EMPLOYEE", "PAYROLL"], ["OVERTIME_HOURS"]);
        let roster = vec![
            component(
                "5",
                "Overtime Pay",
                ComponentKind::Earning,
                "OVERTIME_HOURS * (EMPLOYEE.BASIC_SALARY / 30 / 8) * 1.25",
            ),
            component(
                "6",
                "Transport Allowance",
                ComponentKind::Earning,
                "ROUND(PRORATE(500, PAYROLL.WORKED_DAYS, PAYROLL.TOTAL_DAYS), 2)",
            ),
        ];
        let engine = PayrollEngine::new(schema, &roster).unwrap();

        let mut period = june();
        period.worked_days = Some(20);
        let input = PayrollInput::new(create_test_employee("emp_001", "UAE", "12000"), period)
            .with_variable("overtime_hours", dec("10"));
        let result = engine.run(&input).unwrap();

        assert_eq!(result.amount("5"), Some(dec("625")));
        assert_eq!(result.amount("6"), Some(dec("333.33")));
    }

    #[test]
    fn test_first_failure_aborts_run() {
        let roster = vec![
            component("1", "Basic Salary", ComponentKind::Earning, "EMPLOYEE.BASIC_SALARY"),
            component("2", "Broken", ComponentKind::Earning, "BASIC_SALARY / 0"),
            component("3", "After", ComponentKind::Earning, "EMPLOYEE.BASIC_SALARY"),
        ];
        let input = PayrollInput::new(create_test_employee("emp_001", "UAE", "15000"), june());

        match engine(&roster).run(&input) {
            Err(EngineError::Evaluation {
                component_id,
                source,
            }) => {
                assert_eq!(component_id, "2");
                assert_eq!(source, EvalError::DivisionByZero);
            }
            other => panic!("Expected Evaluation error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_context_value_is_unbound() {
        let roster = vec![component(
            "1",
            "Children Allowance",
            ComponentKind::Earning,
            "EMPLOYEE.CHILDREN * 100",
        )];
        let input = PayrollInput::new(create_test_employee("emp_001", "UAE", "15000"), june());

        match engine(&roster).run(&input) {
            Err(EngineError::Evaluation { source, .. }) => assert_eq!(
                source,
                EvalError::UnboundVariable {
                    identifier: "EMPLOYEE.CHILDREN".to_string()
                }
            ),
            other => panic!("Expected Evaluation error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_input_rejected_before_evaluation() {
        let input = PayrollInput::new(create_test_employee("", "UAE", "15000"), june());
        assert!(matches!(
            engine(&uae_roster()).run(&input),
            Err(EngineError::InvalidEmployee { .. })
        ));

        let mut period = june();
        period.worked_days = Some(45);
        let input = PayrollInput::new(create_test_employee("emp_001", "UAE", "15000"), period);
        assert!(matches!(
            engine(&uae_roster()).run(&input),
            Err(EngineError::InvalidPayPeriod { .. })
        ));
    }

    #[test]
    fn test_inactive_components_are_skipped() {
        let mut roster = uae_roster();
        roster.push(component("4", "Bonus", ComponentKind::Earning, "1000"));
        roster[3].status = ComponentStatus::Inactive;

        let engine = engine(&roster);
        let ids: Vec<&str> = engine.order().iter().map(|c| c.definition.id.as_str()).collect();
        assert_eq!(ids, ["1", "2", "3"]);
    }

    #[test]
    fn test_reference_to_draft_component_fails_resolution() {
        let mut roster = uae_roster();
        roster[1].status = ComponentStatus::Draft;

        match PayrollEngine::new(ContextSchema::default(), &roster) {
            Err(EngineError::Resolution(errors)) => {
                assert!(errors.contains_kind(ResolutionErrorKind::UnknownIdentifier));
            }
            other => panic!("Expected Resolution error, got {:?}", other),
        }
    }

    fn scoped(id: &str, name: &str, formula: &str, scope: &str) -> ComponentDefinition {
        ComponentDefinition::new(id, name, ComponentKind::Earning, formula, scope)
    }

    #[test]
    fn test_reference_reads_the_component_it_was_bound_to() {
        let roster = vec![
            scoped("u", "Housing Allowance", "100", "UAE"),
            scoped("g", "Housing Allowance", "200", "GLOBAL"),
            scoped("b", "Bonus", "HOUSING_ALLOWANCE", "UAE"),
        ];
        let input = PayrollInput::new(create_test_employee("emp_001", "UAE", "15000"), june());
        let result = engine(&roster).run(&input).unwrap();

        assert_eq!(result.amount("u"), Some(dec("100")));
        assert_eq!(result.amount("g"), Some(dec("200")));
        assert_eq!(result.amount("b"), Some(dec("100")));
        let bonus = result.audit_trace.steps.iter().find(|s| s.component_id == "b").unwrap();
        assert_eq!(bonus.input["HOUSING_ALLOWANCE"], "100");
    }

    #[test]
    fn test_run_skips_components_for_other_countries() {
        let roster = vec![
            scoped("uae", "UAE Housing", "EMPLOYEE.BASIC_SALARY * 0.25", "UAE"),
            scoped("oman", "Oman Housing", "EMPLOYEE.BASIC_SALARY * 0.2", "OMAN"),
            scoped("all", "Transport", "500", "GLOBAL"),
        ];
        let engine = engine(&roster);

        let input = PayrollInput::new(create_test_employee("emp_001", "UAE", "10000"), june());
        let result = engine.run(&input).unwrap();
        let ids: Vec<&str> = result.lines.iter().map(|l| l.component_id.as_str()).collect();
        assert_eq!(ids, ["uae", "all"]);
        assert_eq!(result.totals.earnings, dec("3000"));
        assert_eq!(result.audit_trace.steps[1].step_number, 2);

        let mut employee = create_test_employee("emp_002", "Oman", "10000");
        employee.country = "oman".to_string();
        let result = engine.run(&PayrollInput::new(employee, june())).unwrap();
        assert_eq!(result.amount("oman"), Some(dec("2000")));
        assert_eq!(result.amount("uae"), None);
    }

    #[test]
    fn test_other_scope_component_does_not_replace_variable() {
        let schema = ContextSchema::new("1", ["EMPLOYEE", "PAYROLL"], ["OVERTIME_HOURS"]);
        let roster = vec![
            scoped("oman_ot", "Overtime Hours", "40", "OMAN"),
            scoped("ot", "Overtime Pay", "OVERTIME_HOURS * 50", "UAE"),
        ];
        let engine = PayrollEngine::new(schema, &roster).unwrap();
        let input = PayrollInput::new(create_test_employee("emp_001", "UAE", "15000"), june())
            .with_variable("OVERTIME_HOURS", dec("10"));

        let result = engine.run(&input).unwrap();
        assert_eq!(result.amount("ot"), Some(dec("500")));
    }

    #[test]
    fn test_payroll_input_serializes_variables_as_decimal_strings() {
        let input = PayrollInput::new(create_test_employee("emp_001", "UAE", "15000"), june())
            .with_variable("OVERTIME_HOURS", dec("10.5"));
        let json = serde_json::to_string(&input).unwrap();

        assert!(json.contains(r#""variables":{"OVERTIME_HOURS":"10.5"}"#));
        assert!(json.contains(r#""basic_salary":"15000""#));
    }

    #[test]
    fn test_run_batch_keeps_input_order() {
        let engine = engine(&uae_roster());
        let inputs = vec![
            PayrollInput::new(create_test_employee("emp_001", "UAE", "15000"), june()),
            PayrollInput::new(create_test_employee("", "UAE", "15000"), june()),
            PayrollInput::new(create_test_employee("emp_003", "India", "12000"), june()),
        ];

        let results = engine.run_batch(&inputs);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().employee_id, "emp_001");
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap().amount("3"), Some(Decimal::ZERO));
    }

    #[test]
    fn test_runs_are_independent() {
        let engine = engine(&uae_roster());
        let input = PayrollInput::new(create_test_employee("emp_001", "UAE", "15000"), june());

        let first = engine.run(&input).unwrap();
        let second = engine.run(&input).unwrap();
        assert_eq!(first.lines, second.lines);
        assert_eq!(first.totals, second.totals);
        assert_ne!(first.run_id, second.run_id);
    }
}
