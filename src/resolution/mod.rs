//! Dependency resolution.
//!
//! Turns a roster of [`ComponentDefinition`]s into an evaluation order in
//! which every component comes after the components its formula reads.
//!
//! Resolution runs in phases:
//!
//! 1. Roster checks: duplicate ids, names that cannot be referenced, and
//!    two components in one scope sharing a canonical name.
//! 2. Every formula is parsed (in parallel). Any failure from phases 1 or 2
//!    stops resolution with all of them reported.
//! 3. Identifiers are classified as context paths or component references.
//! 4. The dependency graph is ordered with a stable Kahn's algorithm. Unknown
//!    identifiers and every cycle are reported together.

mod classify;
mod graph;

use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::config::ContextSchema;
use crate::error::{ResolutionError, ResolutionErrors};
use crate::formula::{parse_formula, Expr};
use crate::models::ComponentDefinition;

use classify::{classify, NameIndex, Reference};
use graph::DependencyGraph;

/// A component ready for evaluation, in resolved order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedComponent {
    /// The component as authored.
    pub definition: ComponentDefinition,
    /// The parsed formula.
    pub expr: Expr,
    /// The name other formulas use to read this component's result.
    pub canonical_name: String,
    /// Ids of the components this formula reads, in roster order.
    pub dependencies: Vec<String>,
    /// Each component identifier in the formula, mapped to the id of the
    /// component it resolved to.
    pub bindings: BTreeMap<String, String>,
    /// Context paths this formula reads, in first-occurrence order.
    pub context_paths: Vec<String>,
}

/// Resolves a roster into evaluation order.
///
/// The input is not modified. On success, for every component A that reads
/// component B, B appears before A. Components with no ordering constraint
/// between them keep their roster order, so identical input always yields
/// the identical order.
///
/// # Example
///
/// ```
/// use payroll_formula_engine::config::ContextSchema;
/// use payroll_formula_engine::models::{ComponentDefinition, ComponentKind};
/// use payroll_formula_engine::resolve_components;
///
/// let roster = vec![
///     ComponentDefinition::new(
///         "gpssa",
///         "GPSSA",
///         ComponentKind::Deduction,
///         "(BASIC_SALARY + HOUSING_ALLOWANCE) * 0.05",
///         "UAE",
///     ),
///     ComponentDefinition::new(
///         "housing",
///         "Housing Allowance",
///         ComponentKind::Earning,
///         "BASIC_SALARY * 0.25",
///         "UAE",
///     ),
///     ComponentDefinition::new(
///         "basic",
///         "Basic Salary",
///         ComponentKind::Earning,
///         "EMPLOYEE.BASIC_SALARY",
///         "UAE",
///     ),
/// ];
///
/// let order = resolve_components(&roster, &ContextSchema::default()).unwrap();
/// let ids: Vec<&str> = order.iter().map(|c| c.definition.id.as_str()).collect();
/// assert_eq!(ids, ["basic", "housing", "gpssa"]);
/// ```
pub fn resolve_components(
    defs: &[ComponentDefinition],
    schema: &ContextSchema,
) -> Result<Vec<OrderedComponent>, ResolutionErrors> {
    let (names, mut errors) = check_roster(defs);

    let parsed: Vec<_> = defs
        .par_iter()
        .map(|def| parse_formula(&def.formula_source))
        .collect();

    let mut exprs = Vec::with_capacity(defs.len());
    for (def, result) in defs.iter().zip(parsed) {
        match result {
            Ok(expr) => exprs.push(expr),
            Err(cause) => errors.push(ResolutionError::ParseFailure {
                component_id: def.id.clone(),
                cause,
            }),
        }
    }
    debug!(
        components = defs.len(),
        parsed = exprs.len(),
        "Parsed component formulas"
    );

    if !errors.is_empty() {
        return Err(fail(errors));
    }

    let index = NameIndex::new(&names);
    let Some(names) = names.into_iter().collect::<Option<Vec<String>>>() else {
        unreachable!("check_roster reports every component without a canonical name");
    };
    let mut graph = DependencyGraph::with_nodes(defs.len());
    let mut context_paths = Vec::with_capacity(defs.len());
    let mut bindings = Vec::with_capacity(defs.len());

    for (position, (def, expr)) in defs.iter().zip(&exprs).enumerate() {
        let mut paths = Vec::new();
        let mut bound = BTreeMap::new();
        for identifier in expr.identifiers() {
            match classify(identifier, def, defs, &index, schema) {
                Reference::Context(path) => paths.push(path),
                Reference::Component(dependency) => {
                    graph.add_dependency(position, dependency);
                    bound.insert(identifier.path().to_string(), defs[dependency].id.clone());
                }
                Reference::Unknown(identifier) => {
                    errors.push(ResolutionError::UnknownIdentifier {
                        component_id: def.id.clone(),
                        identifier,
                    })
                }
            }
        }
        context_paths.push(paths);
        bindings.push(bound);
    }

    let order = match graph.stable_order() {
        Ok(order) => order,
        Err(unordered) => {
            debug!(unordered = unordered.len(), "Dependency graph has cycles");
            for members in graph.cycles() {
                errors.push(ResolutionError::CircularDependency {
                    cycle_members: members.into_iter().map(|i| defs[i].id.clone()).collect(),
                });
            }
            Vec::new()
        }
    };

    if !errors.is_empty() {
        return Err(fail(errors));
    }

    debug!(
        edges = graph.edge_count(),
        order = ?order.iter().map(|&i| defs[i].id.as_str()).collect::<Vec<_>>(),
        "Resolved evaluation order"
    );

    debug_assert_eq!(order.len(), defs.len());
    let mut rank = vec![0; defs.len()];
    for (step, &position) in order.iter().enumerate() {
        rank[position] = step;
    }

    let mut ordered: Vec<(usize, OrderedComponent)> = defs
        .iter()
        .zip(exprs)
        .zip(names)
        .zip(context_paths.into_iter().zip(bindings))
        .enumerate()
        .map(|(position, (((def, expr), canonical_name), (context_paths, bindings)))| {
            let component = OrderedComponent {
                definition: def.clone(),
                expr,
                canonical_name,
                dependencies: graph
                    .dependencies(position)
                    .into_iter()
                    .map(|dep| defs[dep].id.clone())
                    .collect(),
                bindings,
                context_paths,
            };
            (rank[position], component)
        })
        .collect();
    ordered.sort_by_key(|(step, _)| *step);

    Ok(ordered.into_iter().map(|(_, component)| component).collect())
}

/// Checks ids and names, returning each component's canonical name.
fn check_roster(defs: &[ComponentDefinition]) -> (Vec<Option<String>>, Vec<ResolutionError>) {
    let mut errors = Vec::new();

    let mut ids: BTreeMap<&str, usize> = BTreeMap::new();
    for def in defs {
        let seen = ids.entry(def.id.as_str()).or_insert(0);
        *seen += 1;
        if *seen == 2 {
            errors.push(ResolutionError::DuplicateComponentId {
                component_id: def.id.clone(),
            });
        }
    }

    let names: Vec<Option<String>> = defs.iter().map(|def| def.canonical_name()).collect();

    let mut by_scope: BTreeMap<(String, String), Vec<String>> = BTreeMap::new();
    let mut scope_order = Vec::new();
    for (def, name) in defs.iter().zip(&names) {
        match name {
            Some(name) => {
                let key = (name.clone(), def.country_scope.to_ascii_uppercase());
                let ids = by_scope.entry(key.clone()).or_default();
                if ids.is_empty() {
                    scope_order.push(key);
                }
                ids.push(def.id.clone());
            }
            None => errors.push(ResolutionError::InvalidComponentName {
                component_id: def.id.clone(),
                name: def.name.clone(),
            }),
        }
    }

    for key in scope_order {
        if let Some(component_ids) = by_scope.remove(&key) {
            if component_ids.len() > 1 {
                errors.push(ResolutionError::DuplicateComponentName {
                    name: key.0,
                    component_ids,
                });
            }
        }
    }

    (names, errors)
}

fn fail(errors: Vec<ResolutionError>) -> ResolutionErrors {
    let errors = ResolutionErrors::new(errors);
    warn!(count = errors.len(), %errors, "Component resolution failed");
    errors
}
