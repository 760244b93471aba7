#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
/// exact rationals and floats, the numeric leaves of expressions
pub mod number;
/// a module turns a String expression into a symbolic expression
///
///# Example
/// ```
/// use RustedSymCalc::symbolic::symbolic_engine::Expr;
/// let parsed_expression = Expr::parse_expression("x^2 + 2*x*1 + 1").unwrap();
/// assert_eq!(parsed_expression.to_string(), "x**2 + 2*x + 1");
/// assert!(Expr::parse_expression("2x").is_err());
/// ```
/// ________________________________________________________________________________________________________________________________
pub mod parse_expr;
///____________________________________________________________________________________________________________________________
/// # Symbolic engine
/// a module
/// 1) keeps expressions in a canonical form
/// 2) substitutes and evaluates them numerically
/// 3) prints them back as text that parses to the same expression
///# Example#
/// ```
/// use RustedSymCalc::symbolic::symbolic_engine::Expr;
/// use std::collections::HashMap;
/// let f = Expr::parse_expression("x*y + sin(x)").unwrap();
/// // differentiate with respect to x and y
/// let df_dx = f.diff("x");
/// let df_dy = f.diff("y");
/// assert_eq!(df_dx.to_string(), "y + cos(x)");
/// assert_eq!(df_dy.to_string(), "x");
/// let values = HashMap::from([("x".to_string(), 0.0), ("y".to_string(), 2.0)]);
/// assert_eq!(f.set_variable_from_map(&values).evalf().unwrap(), 0.0);
/// ```
/// ________________________________________________________________________________________________________________________________________________
pub mod symbolic_engine;
pub mod symbolic_arithmetic;
pub mod symbolic_display;
pub mod symbolic_engine_derivatives;
///________________________________________________________________________________________________________________________________________________
///
/// indefinite and definite integrals
/// Example#
/// ```
/// use RustedSymCalc::symbolic::symbolic_engine::Expr;
/// let f = Expr::parse_expression("x**2").unwrap();
/// assert_eq!(f.integrate("x").unwrap().to_string(), "x**3/3");
/// let area = f.integrate_definite("x", &Expr::zero(), &Expr::one()).unwrap();
/// assert_eq!(area.to_string(), "1/3");
/// ```
pub mod symbolic_integration;
/// univariate polynomials with rational coefficients
pub mod symbolic_polynomial;
/// expansion, cancellation and trigonometric simplification
pub mod symbolic_simplify;
///______________________________________________________________________________________________________________________________________________
/// the collection of utility functions: grids and finite differences
/// _____________________________________________________________________________________________________________________________________________
pub mod utils;
mod symbolic_engine_tests;
