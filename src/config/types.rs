//! Configuration types for payroll formula evaluation.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files.

use serde::{Deserialize, Serialize};

use crate::formula::{canonical_path, Identifier};
use crate::models::{
    ComponentDefinition, FormulaTestSuite, EMPLOYEE_NAMESPACE, PAYROLL_NAMESPACE,
};

/// The contract between the orchestrator and the engine about which
/// external values a formula may read.
///
/// A dotted identifier is a context path when its first segment is one of
/// `namespaces`; a bare identifier is a context path when it is listed in
/// `variables`.
///
/// # Example
///
/// ```
/// use payroll_formula_engine::config::ContextSchema;
///
/// let schema = ContextSchema::new("2024.1", ["employee", "payroll"], ["overtime_hours"]);
/// assert!(schema.has_namespace("EMPLOYEE"));
/// assert!(schema.has_variable("OVERTIME_HOURS"));
/// assert!(!schema.has_variable("HOUSING_ALLOWANCE"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSchema {
    /// Version label of the schema.
    pub version: String,
    /// First segments accepted for dotted context paths.
    #[serde(default)]
    pub namespaces: Vec<String>,
    /// Bare identifiers supplied by the orchestrator.
    #[serde(default)]
    pub variables: Vec<String>,
}

impl Default for ContextSchema {
    fn default() -> Self {
        Self {
            version: "default".to_string(),
            namespaces: vec![EMPLOYEE_NAMESPACE.to_string(), PAYROLL_NAMESPACE.to_string()],
            variables: Vec::new(),
        }
    }
}

impl ContextSchema {
    /// Creates a canonicalised schema.
    pub fn new<N, V>(
        version: impl Into<String>,
        namespaces: impl IntoIterator<Item = N>,
        variables: impl IntoIterator<Item = V>,
    ) -> Self
    where
        N: AsRef<str>,
        V: AsRef<str>,
    {
        Self {
            version: version.into(),
            namespaces: namespaces.into_iter().map(|n| n.as_ref().to_string()).collect(),
            variables: variables.into_iter().map(|v| v.as_ref().to_string()).collect(),
        }
        .canonicalize()
    }

    /// Upper-cases every entry and drops duplicates, keeping first occurrences.
    pub fn canonicalize(mut self) -> Self {
        self.namespaces = dedup_canonical(&self.namespaces);
        self.variables = dedup_canonical(&self.variables);
        self
    }

    /// Returns true if `namespace` is an accepted first path segment.
    pub fn has_namespace(&self, namespace: &str) -> bool {
        let namespace = canonical_path(namespace);
        self.namespaces.iter().any(|n| *n == namespace)
    }

    /// Returns true if `name` is a declared bare variable.
    pub fn has_variable(&self, name: &str) -> bool {
        let name = canonical_path(name);
        self.variables.iter().any(|v| *v == name)
    }

    /// Returns true if the identifier refers to external context data.
    pub fn is_context_path(&self, identifier: &Identifier) -> bool {
        match identifier.namespace() {
            Some(namespace) => self.has_namespace(namespace),
            None => self.has_variable(identifier.path()),
        }
    }
}

fn dedup_canonical(entries: &[String]) -> Vec<String> {
    let mut seen = Vec::with_capacity(entries.len());
    for entry in entries {
        let entry = canonical_path(entry);
        if !entry.is_empty() && !seen.contains(&entry) {
            seen.push(entry);
        }
    }
    seen
}

/// Components configuration file structure.
#[derive(Debug, Clone, Deserialize)]
pub struct ComponentsConfig {
    /// The component roster, in authoring order.
    pub components: Vec<ComponentDefinition>,
}

/// Formula tests configuration file structure.
#[derive(Debug, Clone, Deserialize)]
pub struct FormulaTestsConfig {
    /// Test suites keyed by component id.
    #[serde(default)]
    pub formula_tests: Vec<FormulaTestSuite>,
}

/// The complete engine configuration loaded from YAML files.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    schema: ContextSchema,
    components: Vec<ComponentDefinition>,
    formula_tests: Vec<FormulaTestSuite>,
}

impl EngineConfig {
    /// Creates a new EngineConfig from its component parts.
    pub fn new(
        schema: ContextSchema,
        components: Vec<ComponentDefinition>,
        formula_tests: Vec<FormulaTestSuite>,
    ) -> Self {
        Self {
            schema: schema.canonicalize(),
            components,
            formula_tests,
        }
    }

    /// Returns the context schema.
    pub fn schema(&self) -> &ContextSchema {
        &self.schema
    }

    /// Returns the full roster, in authoring order.
    pub fn components(&self) -> &[ComponentDefinition] {
        &self.components
    }

    /// Returns all formula test suites.
    pub fn formula_tests(&self) -> &[FormulaTestSuite] {
        &self.formula_tests
    }
}
