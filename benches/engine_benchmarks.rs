//! Performance benchmarks for the payroll formula engine.
//!
//! Covers each layer on its own (parse, resolve, evaluate) plus full payroll
//! runs for single employees and parallel batches.
//!
//! Run with: `cargo bench`
//! HTML reports are generated in `target/criterion/`

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rust_decimal::Decimal;

use payroll_formula_engine::calculation::{PayrollEngine, PayrollInput};
use payroll_formula_engine::config::{ConfigLoader, ContextSchema};
use payroll_formula_engine::models::{ComponentDefinition, ComponentKind, Employee, PayPeriod};
use payroll_formula_engine::{evaluate_component, parse_formula, resolve_components, EvaluationContext};

const GPSSA: &str =
    r#"IF(EMPLOYEE.NATIONALITY == "UAE", (EMPLOYEE.BASIC_SALARY + HOUSING_ALLOWANCE) * 0.05, 0)"#;

fn load_engine() -> PayrollEngine {
    let config = ConfigLoader::load("./config/uae").expect("Failed to load config");
    PayrollEngine::from_config(&config).expect("Failed to resolve roster")
}

fn create_input(index: usize) -> PayrollInput {
    let nationality = if index % 3 == 0 { "UAE" } else { "India" };
    let employee = Employee {
        id: format!("emp_bench_{:04}", index),
        name: None,
        nationality: nationality.to_string(),
        basic_salary: Decimal::from(10000 + (index as i64 % 50) * 100),
        hire_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        country: "UAE".to_string(),
        attributes: BTreeMap::new(),
    };
    let pay_period = PayPeriod {
        start_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        worked_days: None,
    };
    PayrollInput::new(employee, pay_period)
        .with_variable("OVERTIME_HOURS", Decimal::from(index as i64 % 12))
}

/// A roster where each component reads the one before it.
fn create_chain_roster(length: usize) -> Vec<ComponentDefinition> {
    (0..length)
        .rev()
        .map(|i| {
            let formula = if i == 0 {
                "EMPLOYEE.BASIC_SALARY".to_string()
            } else {
                format!("C{} * 1.01 + 1", i - 1)
            };
            ComponentDefinition::new(
                format!("c{}", i),
                format!("C{}", i),
                ComponentKind::Earning,
                formula,
                "UAE",
            )
        })
        .collect()
}

fn bench_parse(c: &mut Criterion) {
    c.bench_function("parse_gpssa_formula", |b| {
        b.iter(|| parse_formula(black_box(GPSSA)).unwrap())
    });
}

fn bench_evaluate(c: &mut Criterion) {
    let expr = parse_formula(GPSSA).unwrap();
    let context = EvaluationContext::new()
        .with("EMPLOYEE.NATIONALITY", "UAE")
        .with("EMPLOYEE.BASIC_SALARY", Decimal::from_str("15000").unwrap())
        .with("HOUSING_ALLOWANCE", Decimal::from_str("3750").unwrap());

    c.bench_function("evaluate_gpssa_formula", |b| {
        b.iter(|| evaluate_component(black_box(&expr), black_box(&context)).unwrap())
    });
}

fn bench_resolve(c: &mut Criterion) {
    let schema = ContextSchema::default();
    let mut group = c.benchmark_group("resolve_chain");

    for length in [10usize, 100, 500].iter() {
        let roster = create_chain_roster(*length);
        group.throughput(Throughput::Elements(*length as u64));
        group.bench_with_input(BenchmarkId::from_parameter(length), &roster, |b, roster| {
            b.iter(|| resolve_components(black_box(roster), &schema).unwrap())
        });
    }

    group.finish();
}

fn bench_single_run(c: &mut Criterion) {
    let engine = load_engine();
    let input = create_input(0);

    c.bench_function("single_payroll_run", |b| {
        b.iter(|| engine.run(black_box(&input)).unwrap())
    });
}

fn bench_batch(c: &mut Criterion) {
    let engine = load_engine();
    let mut group = c.benchmark_group("batch_processing");

    for size in [100usize, 1000].iter() {
        let inputs: Vec<PayrollInput> = (0..*size).map(create_input).collect();
        group.throughput(Throughput::Elements(*size as u64));
        if *size >= 1000 {
            group.sample_size(10);
        }
        group.bench_with_input(BenchmarkId::from_parameter(size), &inputs, |b, inputs| {
            b.iter(|| {
                let results = engine.run_batch(black_box(inputs));
                assert!(results.iter().all(|r| r.is_ok()));
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_parse,
    bench_evaluate,
    bench_resolve,
    bench_single_run,
    bench_batch
);
criterion_main!(benches);
