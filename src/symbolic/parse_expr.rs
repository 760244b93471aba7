/// Parser from text into a canonical [`Expr`].
///
/// Works in two passes: a `nom` grammar produces a purely syntactic tree, which is then built into
/// an expression through the canonical constructors. Failures of the first pass are syntax errors;
/// failures of the second pass (unknown function, wrong number of arguments, unsupported constant)
/// are reported separately because the text itself is well-formed.
///
/// Grammar (all binary operators left-associative except the power):
/// ```text
/// sum     := product (('+' | '-') product)*
/// product := unary (('*' | '/') unary)*
/// unary   := ('-' | '+') unary | power
/// power   := primary (('**' | '^') ('-' | '+')* primary)*
/// primary := number | ident '(' sum (',' sum)* ')' | ident | '(' sum ')'
/// ```
/// There is no implicit multiplication: `2x` and `invalid expr` are syntax errors. Power chains
/// are read iteratively and folded to the right, so `2**-3**2` is `2**(-(3**2))`.
use crate::symbolic::number::Number;
use crate::symbolic::symbolic_engine::{Expr, Func};
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, digit0, digit1, multispace0, one_of},
    combinator::{all_consuming, map, not, opt, recognize, value},
    multi::{fold_many0, many0, separated_list1},
    sequence::{delimited, pair, preceded, terminated},
};
use std::fmt;
use std::str::FromStr;

/// longest accepted input
pub const MAX_INPUT_LEN: usize = 10_000;
/// deepest accepted nesting of parentheses or chained signs
pub const MAX_NESTING: usize = 100;
/// deepest accepted nesting of powers, counted along any path of the syntax tree
pub const MAX_POWER_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub enum ParseExprError {
    /// the text is not a well-formed expression
    Syntax(String),
    /// well-formed text using a construct the engine does not support
    Unsupported(String),
}

impl fmt::Display for ParseExprError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseExprError::Syntax(msg) => write!(f, "invalid syntax: {}", msg),
            ParseExprError::Unsupported(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ParseExprError {}

#[derive(Clone, Copy, Debug, PartialEq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

/// syntax tree produced by the grammar
#[derive(Clone, Debug, PartialEq)]
enum Node {
    Number(String),
    Ident(String),
    Call(String, Vec<Node>),
    Neg(Box<Node>),
    Binary(BinOp, Box<Node>, Box<Node>),
}

fn ws<'a, O, F>(inner: F) -> impl Parser<&'a str, Output = O, Error = nom::error::Error<&'a str>>
where
    F: Parser<&'a str, Output = O, Error = nom::error::Error<&'a str>>,
{
    delimited(multispace0, inner, multispace0)
}

fn sum(input: &str) -> IResult<&str, Node> {
    let (input, first) = product(input)?;
    fold_many0(
        pair(
            ws(alt((value(BinOp::Add, char('+')), value(BinOp::Sub, char('-'))))),
            product,
        ),
        move || first.clone(),
        |acc, (op, rhs)| Node::Binary(op, Box::new(acc), Box::new(rhs)),
    )
    .parse(input)
}

fn mul_op(input: &str) -> IResult<&str, BinOp> {
    ws(alt((
        value(BinOp::Mul, terminated(char('*'), not(char('*')))),
        value(BinOp::Div, char('/')),
    )))
    .parse(input)
}

fn product(input: &str) -> IResult<&str, Node> {
    let (input, first) = unary(input)?;
    fold_many0(
        pair(mul_op, unary),
        move || first.clone(),
        |acc, (op, rhs)| Node::Binary(op, Box::new(acc), Box::new(rhs)),
    )
    .parse(input)
}

fn unary(input: &str) -> IResult<&str, Node> {
    alt((
        map(preceded(ws(char('-')), unary), |n| Node::Neg(Box::new(n))),
        preceded(ws(char('+')), unary),
        power,
    ))
    .parse(input)
}

fn pow_op(input: &str) -> IResult<&str, &str> {
    ws(alt((tag("**"), tag("^")))).parse(input)
}

/// number of minus signs in a run of signs
fn minus_count(input: &str) -> IResult<&str, usize> {
    fold_many0(ws(one_of("+-")), || 0usize, |n, c| n + usize::from(c == '-')).parse(input)
}

fn negate_if_odd(node: Node, minus: usize) -> Node {
    if minus % 2 == 1 {
        Node::Neg(Box::new(node))
    } else {
        node
    }
}

fn power(input: &str) -> IResult<&str, Node> {
    let (input, base) = primary(input)?;
    let (input, chain) = many0(preceded(pow_op, pair(minus_count, primary))).parse(input)?;
    // right-associative: fold from the last exponent
    let mut chain = chain.into_iter().rev();
    let Some((mut minus, mut exponent)) = chain.next() else {
        return Ok((input, base));
    };
    for (next_minus, operand) in chain {
        let signed = negate_if_odd(exponent, minus);
        exponent = Node::Binary(BinOp::Pow, Box::new(operand), Box::new(signed));
        minus = next_minus;
    }
    let signed = negate_if_odd(exponent, minus);
    let node = Node::Binary(BinOp::Pow, Box::new(base), Box::new(signed));
    Ok((input, node))
}

fn primary(input: &str) -> IResult<&str, Node> {
    ws(alt((number, call_or_ident, parens))).parse(input)
}

fn exponent_part(input: &str) -> IResult<&str, &str> {
    recognize((one_of("eE"), opt(one_of("+-")), digit1)).parse(input)
}

fn number(input: &str) -> IResult<&str, Node> {
    map(
        alt((
            recognize((digit1, opt((char('.'), digit0)), opt(exponent_part))),
            recognize((char('.'), digit1, opt(exponent_part))),
        )),
        |s: &str| Node::Number(s.to_string()),
    )
    .parse(input)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))
    .parse(input)
}

fn call_or_ident(input: &str) -> IResult<&str, Node> {
    let (input, name) = identifier(input)?;
    let (input, args) = opt(delimited(
        ws(char('(')),
        separated_list1(ws(char(',')), sum),
        ws(char(')')),
    ))
    .parse(input)?;
    let node = match args {
        Some(args) => Node::Call(name.to_string(), args),
        None => Node::Ident(name.to_string()),
    };
    Ok((input, node))
}

fn parens(input: &str) -> IResult<&str, Node> {
    delimited(ws(char('(')), sum, ws(char(')'))).parse(input)
}

/// Rejects input that would recurse too deeply in the grammar.
fn check_nesting(input: &str) -> Result<(), ParseExprError> {
    let mut depth = 0usize;
    let mut max_depth = 0usize;
    let mut sign_run = 0usize;
    let mut max_sign_run = 0usize;
    for c in input.chars() {
        match c {
            '(' => {
                depth += 1;
                max_depth = max_depth.max(depth);
            }
            ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
        match c {
            '+' | '-' => {
                sign_run += 1;
                max_sign_run = max_sign_run.max(sign_run);
            }
            c if c.is_whitespace() => {}
            _ => sign_run = 0,
        }
    }
    if max_depth > MAX_NESTING || max_sign_run > MAX_NESTING {
        return Err(ParseExprError::Syntax(
            "expression is nested too deeply".to_string(),
        ));
    }
    Ok(())
}

/// largest number of powers on a path from the root to a leaf
fn power_depth(node: &Node) -> usize {
    match node {
        Node::Number(_) | Node::Ident(_) => 0,
        Node::Call(_, args) => args.iter().map(power_depth).max().unwrap_or(0),
        Node::Neg(inner) => power_depth(inner),
        Node::Binary(BinOp::Pow, base, exp) => 1 + power_depth(base).max(power_depth(exp)),
        Node::Binary(_, lhs, rhs) => power_depth(lhs).max(power_depth(rhs)),
    }
}

fn describe_failure(input: &str, rest: &str) -> String {
    if rest.trim().is_empty() {
        return "unexpected end of input".to_string();
    }
    let position = input.len() - rest.len();
    let token: String = rest.trim_start().chars().take(12).collect();
    format!("unexpected '{}' at position {}", token, position)
}

/// Parses `input` into a canonical expression.
pub fn parse_expression_func(input: &str) -> Result<Expr, ParseExprError> {
    if input.trim().is_empty() {
        return Err(ParseExprError::Syntax("empty expression".to_string()));
    }
    if input.len() > MAX_INPUT_LEN {
        return Err(ParseExprError::Syntax(format!(
            "expression longer than {} characters",
            MAX_INPUT_LEN
        )));
    }
    check_nesting(input)?;
    let node = match all_consuming(ws(sum)).parse(input) {
        Ok((_, node)) => node,
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            return Err(ParseExprError::Syntax(describe_failure(input, e.input)));
        }
        Err(nom::Err::Incomplete(_)) => {
            return Err(ParseExprError::Syntax("unexpected end of input".to_string()));
        }
    };
    if power_depth(&node) > MAX_POWER_DEPTH {
        return Err(ParseExprError::Syntax(
            "powers are nested too deeply".to_string(),
        ));
    }
    build(&node)
}

impl Expr {
    /// Parses text into an expression; see [`parse_expression_func`].
    pub fn parse_expression(input: &str) -> Result<Expr, ParseExprError> {
        parse_expression_func(input)
    }
}

fn build(node: &Node) -> Result<Expr, ParseExprError> {
    match node {
        Node::Number(text) => Number::from_literal(text).map(Expr::Const).ok_or_else(|| {
            ParseExprError::Unsupported(format!("numeric literal out of range: {}", text))
        }),
        Node::Ident(name) => build_identifier(name),
        Node::Call(name, args) => build_call(name, args),
        Node::Neg(inner) => Ok(-build(inner)?),
        Node::Binary(BinOp::Add | BinOp::Sub, _, _) => {
            // left-deep chains are walked iteratively
            let mut terms = Vec::new();
            let mut current = node;
            loop {
                match current {
                    Node::Binary(BinOp::Add, lhs, rhs) => {
                        terms.push(build(rhs)?);
                        current = lhs;
                    }
                    Node::Binary(BinOp::Sub, lhs, rhs) => {
                        terms.push(-build(rhs)?);
                        current = lhs;
                    }
                    other => {
                        terms.push(build(other)?);
                        break;
                    }
                }
            }
            terms.reverse();
            Ok(Expr::sum(terms))
        }
        Node::Binary(BinOp::Mul | BinOp::Div, _, _) => {
            let mut factors = Vec::new();
            let mut current = node;
            loop {
                match current {
                    Node::Binary(BinOp::Mul, lhs, rhs) => {
                        factors.push(build(rhs)?);
                        current = lhs;
                    }
                    Node::Binary(BinOp::Div, lhs, rhs) => {
                        factors.push(build(rhs)?.recip());
                        current = lhs;
                    }
                    other => {
                        factors.push(build(other)?);
                        break;
                    }
                }
            }
            factors.reverse();
            Ok(Expr::product(factors))
        }
        Node::Binary(BinOp::Pow, base, exp) => Ok(Expr::power(build(base)?, build(exp)?)),
    }
}

fn build_identifier(name: &str) -> Result<Expr, ParseExprError> {
    match name {
        "pi" => Ok(Expr::Pi),
        "E" => Ok(Expr::E),
        "oo" | "zoo" | "nan" | "I" => Err(ParseExprError::Unsupported(format!(
            "unsupported constant '{}'",
            name
        ))),
        _ if name == "sqrt" || Func::from_str(name).is_ok() => Err(ParseExprError::Unsupported(
            format!("function '{}' used without arguments", name),
        )),
        _ => Ok(Expr::var(name)),
    }
}

fn build_call(name: &str, args: &[Node]) -> Result<Expr, ParseExprError> {
    let arity_error = |expected: &str| {
        ParseExprError::Unsupported(format!(
            "{}() takes {} ({} given)",
            name,
            expected,
            args.len()
        ))
    };
    if name == "sqrt" {
        return match args {
            [arg] => Ok(build(arg)?.sqrt()),
            _ => Err(arity_error("exactly 1 argument")),
        };
    }
    let func = Func::from_str(name)
        .map_err(|_| ParseExprError::Unsupported(format!("unknown function '{}'", name)))?;
    match (func, args) {
        (_, [arg]) => Ok(Expr::func(func, build(arg)?)),
        (Func::Log, [arg, base]) => Ok(build(arg)?.ln() / build(base)?.ln()),
        (Func::Log, _) => Err(arity_error("1 or 2 arguments")),
        _ => Err(arity_error("exactly 1 argument")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Expr {
        parse_expression_func(input).unwrap()
    }

    fn x() -> Expr {
        Expr::var("x")
    }

    #[test]
    fn test_precedence() {
        assert_eq!(parse("1 + 2*3"), Expr::int(7));
        assert_eq!(parse("2**3**2"), Expr::int(512));
        assert_eq!(parse("-x**2"), -(x().powi(2)));
        assert_eq!(parse("x^2"), x().powi(2));
        assert_eq!(parse("(x + 1)*2"), Expr::int(2) * x() + Expr::int(2));
        assert_eq!(parse("2**-1"), Expr::rational(1, 2));
        assert_eq!(parse("8/4/2"), Expr::one());
    }

    #[test]
    fn test_numbers() {
        assert_eq!(parse("2.5"), Expr::float(2.5));
        assert_eq!(parse(".5"), Expr::float(0.5));
        assert_eq!(parse("1e2"), Expr::float(100.0));
        assert_eq!(parse("1/3"), Expr::rational(1, 3));
    }

    #[test]
    fn test_functions_and_aliases() {
        assert_eq!(parse("sin(x)"), x().sin());
        assert_eq!(parse("tg(x)"), Expr::func(Func::Tan, x()));
        assert_eq!(parse("ln(x)"), x().ln());
        assert_eq!(parse("sqrt(16)"), Expr::int(4));
        assert_eq!(parse("sqrt(x)"), x().sqrt());
        assert_eq!(parse("log(x, 2)"), x().ln() / Expr::int(2).ln());
        assert_eq!(parse("exp(0)"), Expr::one());
        assert_eq!(parse(" sin ( x ) "), x().sin());
    }

    #[test]
    fn test_constants() {
        assert_eq!(parse("pi"), Expr::Pi);
        assert_eq!(parse("E**x"), x().exp());
    }

    #[test]
    fn test_syntax_errors() {
        for bad in ["invalid expr", "2x", "", "   ", "x +", "(x", "x)", "x ** * 2", "sin()"] {
            assert!(
                matches!(parse_expression_func(bad), Err(ParseExprError::Syntax(_))),
                "expected syntax error for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_unsupported_constructs() {
        for bad in ["foo(x)", "sin", "sin(x, y)", "log(x, 2, 3)", "oo", "1e999"] {
            assert!(
                matches!(parse_expression_func(bad), Err(ParseExprError::Unsupported(_))),
                "expected unsupported construct for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_nesting_limit() {
        let deep = format!("{}x{}", "(".repeat(MAX_NESTING + 1), ")".repeat(MAX_NESTING + 1));
        assert!(matches!(
            parse_expression_func(&deep),
            Err(ParseExprError::Syntax(_))
        ));
        let fine = format!("{}x{}", "(".repeat(20), ")".repeat(20));
        assert_eq!(parse(&fine), x());
        let long_sum = vec!["x"; 2000].join(" + ");
        assert_eq!(parse(&long_sum), Expr::int(2000) * x());
    }

    #[test]
    fn test_power_depth_limit() {
        let tower = vec!["x"; MAX_POWER_DEPTH + 1].join("**");
        assert!(parse_expression_func(&tower).is_ok());
        let too_tall = vec!["x"; MAX_POWER_DEPTH + 2].join("**");
        assert!(matches!(
            parse_expression_func(&too_tall),
            Err(ParseExprError::Syntax(_))
        ));
        let long_chain = vec!["x"; 3000].join("^");
        assert!(matches!(
            parse_expression_func(&long_chain),
            Err(ParseExprError::Syntax(_))
        ));
        // many squares side by side are not nested
        let squares = vec!["x**2"; 600].join(" + ");
        assert_eq!(parse(&squares), Expr::int(600) * x().powi(2));
    }

    #[test]
    fn test_signed_exponents() {
        assert_eq!(parse("2**-3**2"), Expr::rational(1, 512));
        assert_eq!(parse("2**--1"), Expr::int(2));
        assert_eq!(parse("2^+-1"), Expr::rational(1, 2));
        assert_eq!(parse("x**-y"), x().pow(-Expr::var("y")));
    }

    #[test]
    fn test_printed_text_parses_back() {
        for text in [
            "x**2 + 2*x + 1",
            "-(x - 1)**2/8",
            "x**5/120 + x**4/24 + x**3/6 + x**2/2 + x + 1",
            "1/(x + 1)",
            "sqrt(x)/2",
            "x**(1/3)",
            "exp(x)*sin(x)",
            "2.5*y - 1",
        ] {
            let e = parse(text);
            assert_eq!(e.to_string(), text);
            assert_eq!(parse(&e.to_string()), e);
        }
    }
}
