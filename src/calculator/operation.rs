//! Text-form boundary of the calculator.
//!
//! A front end shows one form per [`OperationKind`] with the fields of
//! [`OperationKind::field_labels`]. [`Operation::from_fields`] turns the raw field text into a
//! typed [`Operation`], and [`Operation::run`] dispatches it to the matching service function.
//!
//! ```
//! use RustedSymCalc::calculator::config::CalculatorConfig;
//! use RustedSymCalc::calculator::operation::{Operation, OperationKind, render};
//! let config = CalculatorConfig::default();
//! let op = Operation::from_fields(OperationKind::Evaluate, &["x + 1", "x=3"], &config).unwrap();
//! assert_eq!(render(&op.run()), "Expression: 4.0\nValue: 4");
//! ```

use crate::calculator::config::CalculatorConfig;
use crate::calculator::error::CalcError;
use crate::calculator::field_parser::parse_substitutions;
use crate::calculator::service::{self, Evaluation, SubstitutionMap};
use std::fmt;
use strum_macros::{Display, EnumIter, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum OperationKind {
    #[strum(to_string = "derivative")]
    Derivative,
    #[strum(to_string = "integral", serialize = "integrate")]
    Integral,
    #[strum(to_string = "evaluate", serialize = "calculate")]
    Evaluate,
    #[strum(to_string = "simplify")]
    Simplify,
    #[strum(to_string = "series")]
    Series,
}

impl OperationKind {
    /// ordered labels of the form fields
    pub fn field_labels(&self) -> &'static [&'static str] {
        match self {
            OperationKind::Derivative => &["Expression", "Variable"],
            OperationKind::Integral => &[
                "Expression",
                "Variable",
                "Lower limit (optional)",
                "Upper limit (optional)",
            ],
            OperationKind::Evaluate => &["Expression", "Substitutions (example: x=2,y=3)"],
            OperationKind::Simplify => &["Expression"],
            OperationKind::Series => &[
                "Expression",
                "Variable",
                "Order",
                "Expansion point (optional)",
            ],
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            OperationKind::Derivative => {
                "Computes the derivative of the expression with respect to the variable.\nExample: Expression: x**2 + 3*x, Variable: x"
            }
            OperationKind::Integral => {
                "Computes the indefinite or definite integral.\nIntegration limits are optional: give both or neither."
            }
            OperationKind::Evaluate => {
                "Computes the numeric value of the expression. Separate variable substitutions with commas, for example: x=2,y=3"
            }
            OperationKind::Simplify => "Simplifies the expression.",
            OperationKind::Series => {
                "Expands the expression in a Taylor series around a point up to the given order.\nExample: order 5, expansion point 0."
            }
        }
    }

    /// number of leading fields that must not be empty
    pub fn required_fields(&self) -> usize {
        match self {
            OperationKind::Derivative | OperationKind::Integral | OperationKind::Series => 2,
            OperationKind::Evaluate | OperationKind::Simplify => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DerivativeParams {
    pub expression: String,
    pub variable: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntegralParams {
    pub expression: String,
    pub variable: String,
    pub lower: Option<String>,
    pub upper: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluateParams {
    pub expression: String,
    pub substitutions: Option<SubstitutionMap>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimplifyParams {
    pub expression: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesParams {
    pub expression: String,
    pub variable: String,
    pub order: usize,
    pub point: String,
}

/// One fully parameterised request to the service.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Derivative(DerivativeParams),
    Integral(IntegralParams),
    Evaluate(EvaluateParams),
    Simplify(SimplifyParams),
    Series(SeriesParams),
}

/// Success payload of an operation.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationOutput {
    Text(String),
    Numeric(Evaluation),
}

impl fmt::Display for OperationOutput {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OperationOutput::Text(text) => write!(f, "{}", text),
            OperationOutput::Numeric(evaluation) => write!(
                f,
                "Expression: {}\nValue: {}",
                evaluation.expression, evaluation.value
            ),
        }
    }
}

pub type OperationResult = Result<OperationOutput, CalcError>;

/// the single string shown in the result box
pub fn render(result: &OperationResult) -> String {
    match result {
        Ok(output) => output.to_string(),
        Err(e) => format!("Error: {}", e),
    }
}

/// `(text, value)` shape of the numeric evaluation in older front ends: the value is present
/// only for a successful numeric evaluation, and an error yields its text with no value.
pub trait IntoLegacyPair {
    fn into_legacy_pair(self) -> (String, Option<f64>);
}

impl IntoLegacyPair for OperationResult {
    fn into_legacy_pair(self) -> (String, Option<f64>) {
        match self {
            Ok(OperationOutput::Numeric(evaluation)) => {
                (evaluation.expression, Some(evaluation.value))
            }
            Ok(OperationOutput::Text(text)) => (text, None),
            Err(e) => (e.to_string(), None),
        }
    }
}

fn field(fields: &[String], i: usize) -> Option<String> {
    fields.get(i).filter(|s| !s.is_empty()).cloned()
}

fn required(fields: &[String], i: usize) -> String {
    fields.get(i).cloned().unwrap_or_default()
}

fn parse_order(text: Option<String>, config: &CalculatorConfig) -> Result<usize, CalcError> {
    let Some(text) = text else {
        return Ok(config.series.default_order);
    };
    let order = text.parse::<usize>().map_err(|_| {
        CalcError::validation(format!(
            "series order must be a positive integer, got '{}'",
            text
        ))
    })?;
    if order > config.series.max_order {
        return Err(CalcError::validation(format!(
            "series order must not exceed {}, got {}",
            config.series.max_order, order
        )));
    }
    Ok(order)
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Derivative(_) => OperationKind::Derivative,
            Operation::Integral(_) => OperationKind::Integral,
            Operation::Evaluate(_) => OperationKind::Evaluate,
            Operation::Simplify(_) => OperationKind::Simplify,
            Operation::Series(_) => OperationKind::Series,
        }
    }

    /// Builds an operation from the raw text of its form fields, in the order of
    /// [`OperationKind::field_labels`]. Missing trailing fields count as empty.
    pub fn from_fields(
        kind: OperationKind,
        fields: &[&str],
        config: &CalculatorConfig,
    ) -> Result<Operation, CalcError> {
        let labels = kind.field_labels();
        if fields.len() > labels.len() {
            return Err(CalcError::validation(format!(
                "{} takes at most {} fields ({}), got {}",
                kind,
                labels.len(),
                labels.join(", "),
                fields.len()
            )));
        }
        let fields: Vec<String> = fields.iter().map(|f| f.trim().to_string()).collect();
        let missing = (0..kind.required_fields()).any(|i| field(&fields, i).is_none());
        if missing {
            let message = if kind.required_fields() == 1 {
                "enter expression"
            } else {
                "enter expression and variable"
            };
            return Err(CalcError::validation(message));
        }

        let operation = match kind {
            OperationKind::Derivative => Operation::Derivative(DerivativeParams {
                expression: required(&fields, 0),
                variable: required(&fields, 1),
            }),
            OperationKind::Integral => Operation::Integral(IntegralParams {
                expression: required(&fields, 0),
                variable: required(&fields, 1),
                lower: field(&fields, 2),
                upper: field(&fields, 3),
            }),
            OperationKind::Evaluate => {
                let substitutions = match field(&fields, 1) {
                    Some(text) => {
                        Some(parse_substitutions(&text).map_err(CalcError::validation)?)
                    }
                    None => None,
                };
                Operation::Evaluate(EvaluateParams {
                    expression: required(&fields, 0),
                    substitutions,
                })
            }
            OperationKind::Simplify => Operation::Simplify(SimplifyParams {
                expression: required(&fields, 0),
            }),
            OperationKind::Series => Operation::Series(SeriesParams {
                expression: required(&fields, 0),
                variable: required(&fields, 1),
                order: parse_order(field(&fields, 2), config)?,
                point: field(&fields, 3).unwrap_or_else(|| config.series.default_point.clone()),
            }),
        };
        Ok(operation)
    }

    pub fn run(&self) -> OperationResult {
        match self {
            Operation::Derivative(p) => {
                service::derivative(&p.expression, &p.variable).map(OperationOutput::Text)
            }
            Operation::Integral(p) => service::integrate(
                &p.expression,
                &p.variable,
                p.lower.as_deref(),
                p.upper.as_deref(),
            )
            .map(OperationOutput::Text),
            Operation::Evaluate(p) => service::calculate(&p.expression, p.substitutions.as_ref())
                .map(OperationOutput::Numeric),
            Operation::Simplify(p) => service::simplify(&p.expression).map(OperationOutput::Text),
            Operation::Series(p) => {
                service::series_expansion(&p.expression, &p.variable, p.order, &p.point)
                    .map(OperationOutput::Text)
            }
        }
    }
}

/// parses the fields and runs the operation in one step
pub fn run_fields(kind: OperationKind, fields: &[&str], config: &CalculatorConfig) -> OperationResult {
    Operation::from_fields(kind, fields, config)?.run()
}
