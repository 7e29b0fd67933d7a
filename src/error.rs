//! Error types for the Payroll Formula Engine.
//!
//! Each layer of the engine has its own strongly-typed error built with the
//! `thiserror` crate: [`ParseError`] from the parser, [`ResolutionError`]
//! (collected into [`ResolutionErrors`]) from the dependency resolver, and
//! [`EvalError`] from the evaluator. [`EngineError`] wraps all of them for
//! configuration loading and payroll runs.

use std::fmt;

use thiserror::Error;

/// A formula could not be parsed.
///
/// `position` is the 0-based byte offset into the formula source where the
/// problem was detected.
///
/// # Example
///
/// ```
/// use payroll_formula_engine::error::ParseError;
///
/// let error = ParseError::new(4, "unexpected token ')'");
/// assert_eq!(error.to_string(), "Parse error at position 4: unexpected token ')'");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Parse error at position {position}: {message}")]
pub struct ParseError {
    /// Byte offset into the source where parsing failed.
    pub position: usize,
    /// A description of the problem.
    pub message: String,
}

impl ParseError {
    /// Creates a new parse error at the given position.
    pub fn new(position: usize, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

/// Stable classification of a [`ResolutionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionErrorKind {
    /// A component formula failed to parse.
    ParseFailure,
    /// A formula referenced an identifier that is neither a context path nor a component.
    UnknownIdentifier,
    /// The dependency graph contains a cycle.
    CircularDependency,
    /// Two components share an id.
    DuplicateId,
    /// Two components in the same country scope share a canonical name.
    DuplicateName,
    /// A component name cannot be turned into a formula identifier.
    InvalidName,
}

impl ResolutionErrorKind {
    /// Returns the error code used when reporting this kind to callers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ParseFailure => "PARSE_FAILURE",
            Self::UnknownIdentifier => "UNKNOWN_IDENTIFIER",
            Self::CircularDependency => "CIRCULAR_DEPENDENCY",
            Self::DuplicateId => "DUPLICATE_ID",
            Self::DuplicateName => "DUPLICATE_NAME",
            Self::InvalidName => "INVALID_NAME",
        }
    }
}

/// A problem found while resolving a component roster.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// The component's formula did not parse.
    #[error("Component '{component_id}' has an invalid formula: {cause}")]
    ParseFailure {
        /// The component whose formula failed.
        component_id: String,
        /// The underlying parse error.
        #[source]
        cause: ParseError,
    },

    /// The component's formula references an identifier nobody provides.
    #[error("Component '{component_id}' references unknown identifier '{identifier}'")]
    UnknownIdentifier {
        /// The component containing the reference.
        component_id: String,
        /// The canonical identifier that could not be classified.
        identifier: String,
    },

    /// Components reference each other in a cycle.
    #[error("Circular dependency between components: {}", .cycle_members.join(", "))]
    CircularDependency {
        /// Ids of every component on the cycle, in roster order.
        cycle_members: Vec<String>,
    },

    /// The same id appears more than once in the roster.
    #[error("Duplicate component id: {component_id}")]
    DuplicateComponentId {
        /// The repeated id.
        component_id: String,
    },

    /// Two components in one country scope normalise to the same name.
    #[error("Components {} share the name '{name}'", .component_ids.join(", "))]
    DuplicateComponentName {
        /// The shared canonical name.
        name: String,
        /// Ids of the clashing components, in roster order.
        component_ids: Vec<String>,
    },

    /// The component name has no valid identifier form.
    #[error("Component '{component_id}' has a name that is not a valid identifier: '{name}'")]
    InvalidComponentName {
        /// The offending component.
        component_id: String,
        /// The name as authored.
        name: String,
    },
}

impl ResolutionError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> ResolutionErrorKind {
        match self {
            Self::ParseFailure { .. } => ResolutionErrorKind::ParseFailure,
            Self::UnknownIdentifier { .. } => ResolutionErrorKind::UnknownIdentifier,
            Self::CircularDependency { .. } => ResolutionErrorKind::CircularDependency,
            Self::DuplicateComponentId { .. } => ResolutionErrorKind::DuplicateId,
            Self::DuplicateComponentName { .. } => ResolutionErrorKind::DuplicateName,
            Self::InvalidComponentName { .. } => ResolutionErrorKind::InvalidName,
        }
    }
}

/// Every problem found while resolving a roster.
///
/// The resolver keeps going after the first fault where it can, so a caller
/// can surface all authoring mistakes at once. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionErrors {
    errors: Vec<ResolutionError>,
}

impl ResolutionErrors {
    pub(crate) fn new(errors: Vec<ResolutionError>) -> Self {
        debug_assert!(!errors.is_empty());
        Self { errors }
    }

    /// Returns the collected errors in the order they were found.
    pub fn errors(&self) -> &[ResolutionError] {
        &self.errors
    }

    /// Returns the number of collected errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Always false; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Iterates over the collected errors.
    pub fn iter(&self) -> std::slice::Iter<'_, ResolutionError> {
        self.errors.iter()
    }

    /// Returns true if any collected error has the given kind.
    pub fn contains_kind(&self, kind: ResolutionErrorKind) -> bool {
        self.errors.iter().any(|e| e.kind() == kind)
    }

    /// Consumes the collection, returning the underlying errors.
    pub fn into_vec(self) -> Vec<ResolutionError> {
        self.errors
    }
}

impl fmt::Display for ResolutionErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} resolution error(s)", self.errors.len())?;
        for error in &self.errors {
            write!(f, "; {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ResolutionErrors {}

impl IntoIterator for ResolutionErrors {
    type Item = ResolutionError;
    type IntoIter = std::vec::IntoIter<ResolutionError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

/// Stable classification of an [`EvalError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvalErrorKind {
    /// An identifier was missing from the evaluation context.
    UnboundVariable,
    /// An operator or function received an operand of the wrong type.
    TypeMismatch,
    /// Division (or proration) by zero.
    DivisionByZero,
    /// A function argument was out of its accepted range.
    InvalidArgument,
    /// Decimal arithmetic overflowed.
    Overflow,
}

impl EvalErrorKind {
    /// Returns the error code used when reporting this kind to callers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnboundVariable => "UNBOUND_VARIABLE",
            Self::TypeMismatch => "TYPE_MISMATCH",
            Self::DivisionByZero => "DIVISION_BY_ZERO",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::Overflow => "OVERFLOW",
        }
    }
}

/// A formula failed while being evaluated.
///
/// # Example
///
/// ```
/// use payroll_formula_engine::error::{EvalError, EvalErrorKind};
///
/// let error = EvalError::UnboundVariable {
///     identifier: "EMPLOYEE.BONUS".to_string(),
/// };
/// assert_eq!(error.kind(), EvalErrorKind::UnboundVariable);
/// assert_eq!(error.to_string(), "Unbound variable: EMPLOYEE.BONUS");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// The identifier has no value in the context.
    #[error("Unbound variable: {identifier}")]
    UnboundVariable {
        /// The canonical identifier that was looked up.
        identifier: String,
    },

    /// An operand had the wrong type for the operation.
    #[error("Type mismatch in {operation}: expected {expected}, found {found}")]
    TypeMismatch {
        /// The operator or function being applied.
        operation: String,
        /// The type(s) the operation accepts.
        expected: String,
        /// The type(s) that were supplied.
        found: String,
    },

    /// A divisor evaluated to zero.
    #[error("Division by zero")]
    DivisionByZero,

    /// A function argument was outside its accepted range.
    #[error("Invalid argument to {function}: {message}")]
    InvalidArgument {
        /// The function name.
        function: String,
        /// What was wrong with the argument.
        message: String,
    },

    /// The result does not fit in a decimal.
    #[error("Arithmetic overflow in {operation}")]
    Overflow {
        /// The operator or function that overflowed.
        operation: String,
    },
}

impl EvalError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> EvalErrorKind {
        match self {
            Self::UnboundVariable { .. } => EvalErrorKind::UnboundVariable,
            Self::TypeMismatch { .. } => EvalErrorKind::TypeMismatch,
            Self::DivisionByZero => EvalErrorKind::DivisionByZero,
            Self::InvalidArgument { .. } => EvalErrorKind::InvalidArgument,
            Self::Overflow { .. } => EvalErrorKind::Overflow,
        }
    }
}

/// A type alias for evaluator results.
pub type EvalResult<T> = Result<T, EvalError>;

/// The main error type for the Payroll Formula Engine.
///
/// Configuration loading and payroll runs return this error type; the
/// lower-level parser, resolver and evaluator errors convert into it.
///
/// # Example
///
/// ```
/// use payroll_formula_engine::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/schema.yaml".to_string(),
/// };
/// assert_eq!(error.to_string(), "Configuration file not found: /missing/schema.yaml");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A standalone formula failed to parse.
    #[error("Invalid formula: {0}")]
    Parse(#[from] ParseError),

    /// A component roster failed to resolve.
    #[error("Component roster failed to resolve: {0}")]
    Resolution(#[from] ResolutionErrors),

    /// A component failed during a payroll run.
    #[error("Component '{component_id}' failed to evaluate: {source}")]
    Evaluation {
        /// The component being evaluated.
        component_id: String,
        /// The underlying evaluation error.
        source: EvalError,
    },

    /// An employee record was invalid or contained inconsistent data.
    #[error("Invalid employee field '{field}': {message}")]
    InvalidEmployee {
        /// The field that was invalid.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// A pay period was inconsistent.
    #[error("Invalid pay period: {message}")]
    InvalidPayPeriod {
        /// A description of what made the period invalid.
        message: String,
    },

    /// No component with the given id exists.
    #[error("Component not found: {component_id}")]
    ComponentNotFound {
        /// The id that was looked up.
        component_id: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
