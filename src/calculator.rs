/// the three kinds of failure and the pipeline stages they come from
pub mod error;
///________________________________________________________________________________________________________________________________
/// # Expression evaluation service
/// derivative, numeric evaluation, integration, simplification and series expansion of expressions given as text.
/// Every call is stateless: text in, canonical text (or an error) out.
///# Example
/// ```
/// use RustedSymCalc::calculator::service::{calculate, simplify};
/// use RustedSymCalc::calculator::error::ErrorKind;
/// use std::collections::HashMap;
/// let values = HashMap::from([("x".to_string(), 3.0)]);
/// let evaluation = calculate("x + 1", Some(&values)).unwrap();
/// assert_eq!(evaluation.value, 4.0);
/// assert_eq!(simplify("sin(x)**2 + cos(x)**2").unwrap(), "1");
/// assert_eq!(simplify("invalid expr").unwrap_err().kind, ErrorKind::ParseError);
/// ```
/// ________________________________________________________________________________________________________________________________
pub mod service;
/// typed operations built from the raw fields of a form
pub mod operation;
/// TOML settings: series defaults and logging
pub mod config;
/// nom grammar for substitution lists like "x=2, y=3"
pub mod field_parser;
