//! Expression tree produced by the formula parser.
//!
//! Every node owns its children; a tree is never shared between components.
//! The [`fmt::Display`] implementation prints canonical source that parses
//! back to a structurally identical tree.

use std::fmt;

use rust_decimal::Decimal;

/// A literal value written directly in a formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    /// A decimal number such as `0.05`.
    Number(Decimal),
    /// A double-quoted string such as `"UAE"`.
    Text(String),
    /// `TRUE` or `FALSE`.
    Bool(bool),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "\"{}\"", s),
            Self::Bool(true) => f.write_str("TRUE"),
            Self::Bool(false) => f.write_str("FALSE"),
        }
    }
}

/// A reference to a value supplied at evaluation time.
///
/// The path is stored upper-cased. A dotted path such as
/// `EMPLOYEE.BASIC_SALARY` names external context data; a bare name such as
/// `HOUSING_ALLOWANCE` is either a component reference or a schema variable,
/// which only the resolver can decide.
///
/// # Example
///
/// ```
/// use payroll_formula_engine::formula::Identifier;
///
/// let id = Identifier::new("employee.basic_salary");
/// assert_eq!(id.path(), "EMPLOYEE.BASIC_SALARY");
/// assert_eq!(id.namespace(), Some("EMPLOYEE"));
/// assert!(Identifier::new("HOUSING_ALLOWANCE").namespace().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier {
    path: String,
}

impl Identifier {
    /// Creates an identifier, normalising the path to upper case.
    pub fn new(path: &str) -> Self {
        Self {
            path: canonical_path(path),
        }
    }

    /// Returns the canonical path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns true if the path contains a `.` separator.
    pub fn is_dotted(&self) -> bool {
        self.path.contains('.')
    }

    /// Returns the first segment of a dotted path.
    pub fn namespace(&self) -> Option<&str> {
        self.path.split_once('.').map(|(head, _)| head)
    }

    /// Iterates over the path segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('.')
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// Upper-cases a context path or identifier.
pub fn canonical_path(path: &str) -> String {
    path.trim().to_ascii_uppercase()
}

/// Derives the identifier a formula uses to refer to a component.
///
/// The name is upper-cased and every run of characters outside `[A-Z0-9_]`
/// collapses to a single `_`. Returns `None` if the result is not a valid
/// bare identifier or collides with a keyword.
///
/// # Example
///
/// ```
/// use payroll_formula_engine::formula::component_identifier;
///
/// assert_eq!(component_identifier("Housing Allowance").as_deref(), Some("HOUSING_ALLOWANCE"));
/// assert_eq!(component_identifier("UAE GPSSA").as_deref(), Some("UAE_GPSSA"));
/// assert_eq!(component_identifier("13th Month"), None);
/// ```
pub fn component_identifier(name: &str) -> Option<String> {
    let mut out = String::with_capacity(name.len());
    let mut pending_separator = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_separator && !out.is_empty() {
                out.push('_');
            }
            pending_separator = false;
            out.push(c.to_ascii_uppercase());
        } else {
            pending_separator = true;
        }
    }

    let starts_well = out
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !starts_well || is_keyword(&out) {
        return None;
    }
    Some(out)
}

/// Returns true for words the grammar reserves.
pub fn is_keyword(word: &str) -> bool {
    matches!(word, "IF" | "AND" | "OR" | "NOT" | "TRUE" | "FALSE")
}

/// Binary operators, in no particular order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `==`
    Eq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `AND` / `&&`
    And,
    /// `OR` / `||`
    Or,
}

impl BinaryOp {
    /// Returns the operator as written in canonical source.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Arithmetic negation.
    Neg,
    /// Logical negation.
    Not,
}

impl UnaryOp {
    /// Returns the operator as written in canonical source.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Not => "NOT ",
        }
    }
}

/// Built-in functions other than `IF`, which parses to [`Expr::Conditional`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    /// `PRORATE(amount, days, totalDays)`
    Prorate,
    /// `ROUND(number, decimals)`
    Round,
}

impl Function {
    /// Looks up a function by canonical name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "PRORATE" => Some(Self::Prorate),
            "ROUND" => Some(Self::Round),
            _ => None,
        }
    }

    /// Returns the canonical function name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Prorate => "PRORATE",
            Self::Round => "ROUND",
        }
    }

    /// Returns the fixed number of arguments.
    pub fn arity(&self) -> usize {
        match self {
            Self::Prorate => 3,
            Self::Round => 2,
        }
    }
}

/// A parsed formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// A literal value.
    Literal(Literal),
    /// A context path or component reference.
    Identifier(Identifier),
    /// A binary operation.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
    /// A unary operation.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: Box<Expr>,
    },
    /// A built-in function call; arity is checked by the parser.
    Call {
        /// The function being called.
        function: Function,
        /// Arguments in call order.
        args: Vec<Expr>,
    },
    /// `IF(condition, then, else)`.
    Conditional {
        /// Must evaluate to a boolean.
        condition: Box<Expr>,
        /// Evaluated only when the condition is true.
        then_branch: Box<Expr>,
        /// Evaluated only when the condition is false.
        else_branch: Box<Expr>,
    },
}

impl Expr {
    /// Returns every identifier in the tree, once each, in first-occurrence order.
    ///
    /// # Example
    ///
    /// ```
    /// use payroll_formula_engine::formula::parse_formula;
    ///
    /// let expr = parse_formula("(BASIC + HOUSING) * 0.05 + BASIC").unwrap();
    /// let names: Vec<&str> = expr.identifiers().iter().map(|id| id.path()).collect();
    /// assert_eq!(names, vec!["BASIC", "HOUSING"]);
    /// ```
    pub fn identifiers(&self) -> Vec<&Identifier> {
        let mut found: Vec<&Identifier> = Vec::new();
        self.collect_identifiers(&mut found);
        found
    }

    fn collect_identifiers<'a>(&'a self, found: &mut Vec<&'a Identifier>) {
        match self {
            Expr::Literal(_) => {}
            Expr::Identifier(id) => {
                if !found.contains(&id) {
                    found.push(id);
                }
            }
            Expr::Binary { left, right, .. } => {
                left.collect_identifiers(found);
                right.collect_identifiers(found);
            }
            Expr::Unary { operand, .. } => operand.collect_identifiers(found),
            Expr::Call { args, .. } => {
                for arg in args {
                    arg.collect_identifiers(found);
                }
            }
            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                condition.collect_identifiers(found);
                then_branch.collect_identifiers(found);
                else_branch.collect_identifiers(found);
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(literal) => write!(f, "{}", literal),
            Expr::Identifier(id) => write!(f, "{}", id),
            Expr::Binary { op, left, right } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
            Expr::Unary { op, operand } => write!(f, "({}{})", op.symbol(), operand),
            Expr::Call { function, args } => {
                write!(f, "{}(", function.name())?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => write!(f, "IF({}, {}, {})", condition, then_branch, else_branch),
        }
    }
}
