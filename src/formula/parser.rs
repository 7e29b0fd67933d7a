//! Recursive-descent parser for payroll formulas.
//!
//! Precedence, lowest to highest:
//!
//! ```text
//! expression     := or
//! or             := and ( (OR | "||") and )*
//! and            := equality ( (AND | "&&") equality )*
//! equality       := relational ( ("==" | "!=") relational )*
//! relational     := additive ( ("<" | "<=" | ">" | ">=") additive )*
//! additive       := multiplicative ( ("+" | "-") multiplicative )*
//! multiplicative := unary ( ("*" | "/") unary )*
//! unary          := ("-" | NOT | "!") unary | primary
//! primary        := NUMBER | STRING | TRUE | FALSE
//!                 | IF "(" expression "," expression "," expression ")"
//!                 | IDENT "(" arguments ")" | IDENT | "(" expression ")"
//! ```

use crate::error::ParseError;

use super::ast::{BinaryOp, Expr, Function, Identifier, Literal, UnaryOp};
use super::lexer::{Token, TokenKind, tokenize};

/// Deepest expression tree a formula may produce.
///
/// Operators, function calls and `IF` each add a level. Parentheses that
/// only group add none, so printing an accepted tree and parsing the result
/// stays within the limit.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Deepest run of parentheses, calls and unary operators the parser will
/// descend through. A printed tree needs at most two per level (`(-x)`).
pub const MAX_GROUPING_DEPTH: usize = 2 * MAX_NESTING_DEPTH;

/// Parses a formula into an expression tree.
///
/// Parsing is purely syntactic: undefined identifiers are accepted here and
/// reported later by the resolver or evaluator.
///
/// # Errors
///
/// Returns a [`ParseError`] for empty input, unexpected tokens, unbalanced
/// parentheses, unterminated strings, unknown functions, wrong argument
/// counts, a tree deeper than [`MAX_NESTING_DEPTH`], or grouping deeper than
/// [`MAX_GROUPING_DEPTH`].
///
/// # Example
///
/// ```
/// use payroll_formula_engine::formula::{parse_formula, Expr};
///
/// let expr = parse_formula(
///     r#"IF(EMPLOYEE.NATIONALITY == "UAE", (EMPLOYEE.BASIC_SALARY + HOUSING_ALLOWANCE) * 0.05, 0)"#,
/// ).unwrap();
/// assert!(matches!(expr, Expr::Conditional { .. }));
///
/// let err = parse_formula("ROUND(1.5)").unwrap_err();
/// assert_eq!(err.position, 0);
/// ```
pub fn parse_formula(source: &str) -> Result<Expr, ParseError> {
    let tokens = tokenize(source)?;
    if tokens.len() == 1 {
        return Err(ParseError::new(0, "empty formula"));
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        grouping: 0,
    };
    let (expr, _) = parser.parse_expression()?;
    let trailing = parser.peek();
    if trailing.kind != TokenKind::Eof {
        return Err(ParseError::new(
            trailing.position,
            format!("unexpected {}", trailing.kind),
        ));
    }
    Ok(expr)
}

/// An expression and the depth of its tree; leaves have depth zero.
type Parsed = (Expr, usize);

/// Returns `depth` if a node at `position` may sit that deep.
fn nested(position: usize, depth: usize) -> Result<usize, ParseError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(ParseError::new(
            position,
            format!("formula nests deeper than {} levels", MAX_NESTING_DEPTH),
        ));
    }
    Ok(depth)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    grouping: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        // The token list always ends with Eof, and `advance` never moves past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn expect(&mut self, kind: TokenKind, context: &str) -> Result<Token, ParseError> {
        if self.check(&kind) {
            return Ok(self.advance());
        }
        let found = self.peek();
        Err(ParseError::new(
            found.position,
            format!("expected {} {}, found {}", kind, context, found.kind),
        ))
    }

    fn enter(&mut self, position: usize) -> Result<(), ParseError> {
        if self.grouping >= MAX_GROUPING_DEPTH {
            return Err(ParseError::new(
                position,
                format!("formula groups deeper than {} levels", MAX_GROUPING_DEPTH),
            ));
        }
        self.grouping += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.grouping -= 1;
    }

    fn parse_expression(&mut self) -> Result<Parsed, ParseError> {
        self.parse_or()
    }

    /// Parses a left-associative chain of binary operators. Chains are
    /// parsed iteratively; each link deepens the tree by one level.
    fn parse_binary_chain(
        &mut self,
        operand: fn(&mut Self) -> Result<Parsed, ParseError>,
        operator: fn(&TokenKind) -> Option<BinaryOp>,
    ) -> Result<Parsed, ParseError> {
        let (mut left, mut depth) = operand(self)?;
        while let Some(op) = operator(&self.peek().kind) {
            let token = self.advance();
            let (right, right_depth) = operand(self)?;
            depth = nested(token.position, depth.max(right_depth) + 1)?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok((left, depth))
    }

    fn parse_or(&mut self) -> Result<Parsed, ParseError> {
        self.parse_binary_chain(Self::parse_and, |kind| match kind {
            TokenKind::Or => Some(BinaryOp::Or),
            _ => None,
        })
    }

    fn parse_and(&mut self) -> Result<Parsed, ParseError> {
        self.parse_binary_chain(Self::parse_equality, |kind| match kind {
            TokenKind::And => Some(BinaryOp::And),
            _ => None,
        })
    }

    fn parse_equality(&mut self) -> Result<Parsed, ParseError> {
        self.parse_binary_chain(Self::parse_relational, |kind| match kind {
            TokenKind::EqEq => Some(BinaryOp::Eq),
            TokenKind::NotEq => Some(BinaryOp::NotEq),
            _ => None,
        })
    }

    fn parse_relational(&mut self) -> Result<Parsed, ParseError> {
        self.parse_binary_chain(Self::parse_additive, |kind| match kind {
            TokenKind::Lt => Some(BinaryOp::Lt),
            TokenKind::Le => Some(BinaryOp::Le),
            TokenKind::Gt => Some(BinaryOp::Gt),
            TokenKind::Ge => Some(BinaryOp::Ge),
            _ => None,
        })
    }

    fn parse_additive(&mut self) -> Result<Parsed, ParseError> {
        self.parse_binary_chain(Self::parse_multiplicative, |kind| match kind {
            TokenKind::Plus => Some(BinaryOp::Add),
            TokenKind::Minus => Some(BinaryOp::Sub),
            _ => None,
        })
    }

    fn parse_multiplicative(&mut self) -> Result<Parsed, ParseError> {
        self.parse_binary_chain(Self::parse_unary, |kind| match kind {
            TokenKind::Star => Some(BinaryOp::Mul),
            TokenKind::Slash => Some(BinaryOp::Div),
            _ => None,
        })
    }

    fn parse_unary(&mut self) -> Result<Parsed, ParseError> {
        let op = match self.peek().kind {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Not => UnaryOp::Not,
            _ => return self.parse_primary(),
        };
        let token = self.advance();
        self.enter(token.position)?;
        let operand = self.parse_unary();
        self.leave();
        let (operand, depth) = operand?;
        Ok((
            Expr::Unary {
                op,
                operand: Box::new(operand),
            },
            nested(token.position, depth + 1)?,
        ))
    }

    fn parse_primary(&mut self) -> Result<Parsed, ParseError> {
        let token = self.advance();
        match token.kind {
            TokenKind::Number(n) => Ok((Expr::Literal(Literal::Number(n)), 0)),
            TokenKind::Text(s) => Ok((Expr::Literal(Literal::Text(s)), 0)),
            TokenKind::True => Ok((Expr::Literal(Literal::Bool(true)), 0)),
            TokenKind::False => Ok((Expr::Literal(Literal::Bool(false)), 0)),
            TokenKind::LParen => {
                self.enter(token.position)?;
                let inner = self.parse_expression();
                self.leave();
                let inner = inner?;
                let context = format!("to close '(' at position {}", token.position);
                self.expect(TokenKind::RParen, &context)?;
                Ok(inner)
            }
            TokenKind::If => {
                let (mut args, depth) = self.parse_arguments("IF", token.position)?;
                if args.len() != 3 {
                    return Err(ParseError::new(
                        token.position,
                        format!("IF expects 3 arguments, found {}", args.len()),
                    ));
                }
                let depth = nested(token.position, depth + 1)?;
                let else_branch = args.pop();
                let then_branch = args.pop();
                let condition = args.pop();
                match (condition, then_branch, else_branch) {
                    (Some(condition), Some(then_branch), Some(else_branch)) => Ok((
                        Expr::Conditional {
                            condition: Box::new(condition),
                            then_branch: Box::new(then_branch),
                            else_branch: Box::new(else_branch),
                        },
                        depth,
                    )),
                    _ => Err(ParseError::new(token.position, "IF expects 3 arguments")),
                }
            }
            TokenKind::Ident(name) => {
                if !self.check(&TokenKind::LParen) {
                    return Ok((Expr::Identifier(Identifier::new(&name)), 0));
                }
                let function = Function::from_name(&name).ok_or_else(|| {
                    ParseError::new(token.position, format!("unknown function '{}'", name))
                })?;
                let (args, depth) = self.parse_arguments(function.name(), token.position)?;
                if args.len() != function.arity() {
                    return Err(ParseError::new(
                        token.position,
                        format!(
                            "{} expects {} arguments, found {}",
                            function.name(),
                            function.arity(),
                            args.len()
                        ),
                    ));
                }
                let depth = nested(token.position, depth + 1)?;
                Ok((Expr::Call { function, args }, depth))
            }
            TokenKind::Eof => Err(ParseError::new(
                token.position,
                "unexpected end of formula",
            )),
            other => Err(ParseError::new(
                token.position,
                format!("unexpected {}", other),
            )),
        }
    }

    /// Parses `"(" [expression ("," expression)*] ")"` after a function name,
    /// returning the arguments and the depth of the deepest one.
    fn parse_arguments(
        &mut self,
        name: &str,
        position: usize,
    ) -> Result<(Vec<Expr>, usize), ParseError> {
        self.expect(TokenKind::LParen, &format!("after {}", name))?;
        self.enter(position)?;
        let args = self.parse_argument_list(name, position);
        self.leave();
        args
    }

    fn parse_argument_list(
        &mut self,
        name: &str,
        position: usize,
    ) -> Result<(Vec<Expr>, usize), ParseError> {
        let mut args = Vec::new();
        let mut depth = 0;
        if self.check(&TokenKind::RParen) {
            self.advance();
            return Ok((args, depth));
        }
        loop {
            let (arg, arg_depth) = self.parse_expression()?;
            args.push(arg);
            depth = depth.max(arg_depth);
            if self.check(&TokenKind::Comma) {
                self.advance();
                continue;
            }
            let context = format!("to close {}( at position {}", name, position);
            self.expect(TokenKind::RParen, &context)?;
            return Ok((args, depth));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn num(s: &str) -> Expr {
        Expr::Literal(Literal::Number(Decimal::from_str(s).unwrap()))
    }

    fn ident(path: &str) -> Expr {
        Expr::Identifier(Identifier::new(path))
    }

    fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    #[test]
    fn test_parse_single_identifier() {
        assert_eq!(
            parse_formula("EMPLOYEE.BASIC_SALARY").unwrap(),
            ident("EMPLOYEE.BASIC_SALARY")
        );
    }

    #[test]
    fn test_multiplication_binds_tighter_than_addition() {
        assert_eq!(
            parse_formula("A + B * 2").unwrap(),
            binary(
                BinaryOp::Add,
                ident("A"),
                binary(BinaryOp::Mul, ident("B"), num("2"))
            )
        );
    }

    #[test]
    fn test_operators_are_left_associative() {
        assert_eq!(
            parse_formula("SALARY / 30 / 8").unwrap(),
            binary(
                BinaryOp::Div,
                binary(BinaryOp::Div, ident("SALARY"), num("30")),
                num("8")
            )
        );
    }

    #[test]
    fn test_parentheses_override_precedence() {
        assert_eq!(
            parse_formula("(A + B) * 0.05").unwrap(),
            binary(
                BinaryOp::Mul,
                binary(BinaryOp::Add, ident("A"), ident("B")),
                num("0.05")
            )
        );
    }

    #[test]
    fn test_comparison_binds_tighter_than_logic() {
        assert_eq!(
            parse_formula("A > 1 AND B == \"x\" OR C").unwrap(),
            binary(
                BinaryOp::Or,
                binary(
                    BinaryOp::And,
                    binary(BinaryOp::Gt, ident("A"), num("1")),
                    binary(
                        BinaryOp::Eq,
                        ident("B"),
                        Expr::Literal(Literal::Text("x".to_string()))
                    )
                ),
                ident("C")
            )
        );
    }

    #[test]
    fn test_unary_minus_is_not_part_of_literal() {
        assert_eq!(
            parse_formula("-5 * A").unwrap(),
            binary(
                BinaryOp::Mul,
                Expr::Unary {
                    op: UnaryOp::Neg,
                    operand: Box::new(num("5")),
                },
                ident("A")
            )
        );
    }

    #[test]
    fn test_if_becomes_conditional() {
        let expr = parse_formula("if(true, 1, 0)").unwrap();
        assert_eq!(
            expr,
            Expr::Conditional {
                condition: Box::new(Expr::Literal(Literal::Bool(true))),
                then_branch: Box::new(num("1")),
                else_branch: Box::new(num("0")),
            }
        );
    }

    #[test]
    fn test_prorate_and_round_calls() {
        assert_eq!(
            parse_formula("ROUND(PRORATE(3000, 15, 30), 2)").unwrap(),
            Expr::Call {
                function: Function::Round,
                args: vec![
                    Expr::Call {
                        function: Function::Prorate,
                        args: vec![num("3000"), num("15"), num("30")],
                    },
                    num("2"),
                ],
            }
        );
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let err = parse_formula("   ").unwrap_err();
        assert_eq!(err.position, 0);
        assert_eq!(err.message, "empty formula");
    }

    #[test]
    fn test_unbalanced_open_parenthesis() {
        let err = parse_formula("(A + B").unwrap_err();
        assert_eq!(err.position, 6);
        assert!(err.message.contains("to close '(' at position 0"));
    }

    #[test]
    fn test_unbalanced_close_parenthesis() {
        let err = parse_formula("A + B)").unwrap_err();
        assert_eq!(err.position, 5);
        assert!(err.message.contains("')'"));
    }

    #[test]
    fn test_unknown_function_is_rejected() {
        let err = parse_formula("1 + SUM(A, B)").unwrap_err();
        assert_eq!(err.position, 4);
        assert_eq!(err.message, "unknown function 'SUM'");
    }

    #[test]
    fn test_wrong_arity_is_rejected() {
        let err = parse_formula("PRORATE(1, 2)").unwrap_err();
        assert_eq!(err.message, "PRORATE expects 3 arguments, found 2");

        let err = parse_formula("IF(A, B)").unwrap_err();
        assert_eq!(err.message, "IF expects 3 arguments, found 2");

        let err = parse_formula("ROUND()").unwrap_err();
        assert_eq!(err.message, "ROUND expects 2 arguments, found 0");
    }

    #[test]
    fn test_dotted_path_call_is_unknown_function() {
        let err = parse_formula("EMPLOYEE.ROUND(1, 2)").unwrap_err();
        assert!(err.message.contains("unknown function"));
    }

    #[test]
    fn test_dangling_operator() {
        let err = parse_formula("A *").unwrap_err();
        assert_eq!(err.position, 3);
        assert_eq!(err.message, "unexpected end of formula");
    }

    #[test]
    fn test_adjacent_operands_are_rejected() {
        let err = parse_formula("A B").unwrap_err();
        assert_eq!(err.position, 2);
    }

    #[test]
    fn test_undefined_identifiers_parse() {
        assert!(parse_formula("NOT_A_REAL_THING * 2").is_ok());
    }

    #[test]
    fn test_grouping_limit() {
        let deep = format!(
            "{}1{}",
            "(".repeat(MAX_GROUPING_DEPTH + 1),
            ")".repeat(MAX_GROUPING_DEPTH + 1)
        );
        let err = parse_formula(&deep).unwrap_err();
        assert!(err.message.contains("groups deeper"));

        // Grouping alone adds no tree depth.
        let ok = format!("{}1{}", "(".repeat(MAX_GROUPING_DEPTH), ")".repeat(MAX_GROUPING_DEPTH));
        assert_eq!(parse_formula(&ok).unwrap(), num("1"));
    }

    #[test]
    fn test_tree_depth_limit() {
        let calls = |n: usize| format!("{}1{}", "ROUND(".repeat(n), ", 2)".repeat(n));
        assert!(parse_formula(&calls(MAX_NESTING_DEPTH)).is_ok());

        let err = parse_formula(&calls(MAX_NESTING_DEPTH + 1)).unwrap_err();
        assert_eq!(err.position, 0);
        assert!(err.message.contains("nests deeper than 128"));
    }

    #[test]
    fn test_long_operator_chain_is_bounded() {
        let chain = vec!["1"; MAX_NESTING_DEPTH + 2].join(" + ");
        let err = parse_formula(&chain).unwrap_err();
        assert!(err.message.contains("nests deeper"));

        let chain = vec!["1"; 50].join(" + ");
        assert!(parse_formula(&chain).is_ok());
    }

    #[test]
    fn test_deepest_accepted_formulas_reparse_after_printing() {
        let chain = vec!["1"; MAX_NESTING_DEPTH + 1].join(" + ");
        let negations = format!("{}1", "-".repeat(70));
        let unary_limit = format!("{}1", "-".repeat(MAX_NESTING_DEPTH));

        for source in [chain, negations, unary_limit] {
            let expr = parse_formula(&source).unwrap();
            let printed = expr.to_string();
            assert_eq!(parse_formula(&printed), Ok(expr), "printed as {}", printed);
        }
    }

    #[test]
    fn test_display_round_trips() {
        let source =
            r#"IF(EMPLOYEE.NATIONALITY == "UAE", (EMPLOYEE.BASIC_SALARY + HOUSING_ALLOWANCE) * 0.05, 0)"#;
        let expr = parse_formula(source).unwrap();
        let reparsed = parse_formula(&expr.to_string()).unwrap();
        assert_eq!(expr, reparsed);
    }
}
