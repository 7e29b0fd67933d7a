//! Configuration loading and management for the payroll formula engine.
//!
//! This module provides functionality to load a market configuration from
//! YAML files: the context schema, the component roster and formula tests.
//!
//! # Example
//!
//! ```no_run
//! use payroll_formula_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/uae").unwrap();
//! println!("Schema version: {}", config.schema().version);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{ComponentsConfig, ContextSchema, EngineConfig, FormulaTestsConfig};
