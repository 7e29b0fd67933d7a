//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading a market's
//! context schema, component roster and formula tests from YAML files.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::models::{ComponentDefinition, FormulaTestSuite};

use super::types::{ComponentsConfig, ContextSchema, EngineConfig, FormulaTestsConfig};

/// Loads and provides access to engine configuration.
///
/// # Directory Structure
///
/// The configuration directory should have the following structure:
/// ```text
/// config/uae/
/// ├── schema.yaml          # Context schema: namespaces and bare variables
/// ├── components.yaml      # Component roster
/// └── formula_tests.yaml   # Optional formula test cases
/// ```
///
/// # Example
///
/// ```no_run
/// use payroll_formula_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/uae").unwrap();
///
/// let gpssa = loader.get_component("3").unwrap();
/// println!("{}: {}", gpssa.name, gpssa.formula_source);
/// println!("{} active components", loader.active_components().len());
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: EngineConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration directory (e.g., "./config/uae")
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - `schema.yaml` or `components.yaml` is missing
    /// - Any file contains invalid YAML
    /// - Any required field is missing from the configuration
    ///
    /// Formulas are not parsed here; that happens during resolution.
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let schema = Self::load_yaml::<ContextSchema>(&path.join("schema.yaml"))?;
        let components = Self::load_yaml::<ComponentsConfig>(&path.join("components.yaml"))?;

        let tests_path = path.join("formula_tests.yaml");
        let formula_tests = if tests_path.exists() {
            Self::load_yaml::<FormulaTestsConfig>(&tests_path)?.formula_tests
        } else {
            Vec::new()
        };

        debug!(
            path = %path.display(),
            schema_version = %schema.version,
            components = components.components.len(),
            formula_test_suites = formula_tests.len(),
            "Loaded engine configuration"
        );

        Ok(Self {
            config: EngineConfig::new(schema, components.components, formula_tests),
        })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the underlying engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the context schema.
    pub fn schema(&self) -> &ContextSchema {
        self.config.schema()
    }

    /// Returns the full roster, in authoring order.
    pub fn components(&self) -> &[ComponentDefinition] {
        self.config.components()
    }

    /// Returns the components that take part in payroll runs, in authoring order.
    pub fn active_components(&self) -> Vec<ComponentDefinition> {
        self.components()
            .iter()
            .filter(|c| c.is_active())
            .cloned()
            .collect()
    }

    /// Gets a component by its id.
    ///
    /// # Returns
    ///
    /// Returns the component if found, or `ComponentNotFound` error.
    pub fn get_component(&self, id: &str) -> EngineResult<&ComponentDefinition> {
        self.components()
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| EngineError::ComponentNotFound {
                component_id: id.to_string(),
            })
    }

    /// Returns all formula test suites.
    pub fn formula_tests(&self) -> &[FormulaTestSuite] {
        self.config.formula_tests()
    }

    /// Returns the test suite for a component, if one is configured.
    pub fn formula_tests_for(&self, component_id: &str) -> Option<&FormulaTestSuite> {
        self.formula_tests()
            .iter()
            .find(|suite| suite.component_id == component_id)
    }
}
