//! The five operations of the expression evaluation service.
//!
//! Every function parses its arguments afresh, runs one engine transform and returns either the
//! canonical text of the result or a [`CalcError`]. Nothing is cached and no state survives a
//! call. Engine calls run under `catch_unwind`, so a fault inside the engine reaches the caller
//! as an `EvaluationError` rather than a panic. While a guarded call runs, the panic hook stays
//! quiet on that thread; the fault is reported through the error and the `warn!` log only.

use crate::calculator::error::{CalcError, Stage};
use crate::symbolic::parse_expr::{ParseExprError, parse_expression_func};
use crate::symbolic::symbolic_engine::Expr;
use log::{debug, info, warn};
use std::any::Any;
use std::cell::Cell;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe, catch_unwind};
use std::sync::Once;

/// variable name -> float value
pub type SubstitutionMap = HashMap<String, f64>;

/// largest accepted series order
pub const SERIES_ORDER_LIMIT: usize = 50;

/// Result of a numeric evaluation: the substituted expression and its value.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub expression: String,
    pub value: f64,
}

thread_local! {
    /// guarded engine calls in progress on this thread
    static GUARDED_CALLS: Cell<usize> = const { Cell::new(0) };
}

static QUIET_HOOK: Once = Once::new();

/// `catch_unwind` with the panic hook silenced for this thread. Panics elsewhere still reach the
/// hook that was installed before.
fn guarded<T>(step: impl FnOnce() -> T) -> Result<T, Box<dyn Any + Send>> {
    QUIET_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if GUARDED_CALLS.try_with(Cell::get).unwrap_or(0) == 0 {
                previous(info);
            }
        }));
    });
    GUARDED_CALLS.with(|calls| calls.set(calls.get() + 1));
    let result = catch_unwind(AssertUnwindSafe(step));
    GUARDED_CALLS.with(|calls| calls.set(calls.get() - 1));
    result
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        text.to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown engine fault".to_string()
    }
}

/// Runs an engine step, turning both its error and any panic into an `EvaluationError` whose
/// message starts with `context`.
fn run_engine<T>(
    stage: Stage,
    context: &str,
    step: impl FnOnce() -> Result<T, String>,
) -> Result<T, CalcError> {
    match guarded(step) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(detail)) => Err(CalcError::evaluation(
            stage,
            format!("{} ({})", context, detail),
        )),
        Err(payload) => Err(CalcError::evaluation(
            stage,
            format!("{} (internal error: {})", context, panic_message(payload)),
        )),
    }
}

fn logged<T>(operation: &str, result: Result<T, CalcError>) -> Result<T, CalcError> {
    if let Err(e) = &result {
        warn!("{} failed: {}", operation, e);
    }
    result
}

fn symbol_name(var: &Expr) -> Result<&str, String> {
    match var {
        Expr::Var(name) => Ok(name),
        other => Err(format!("{} is not a symbol", other)),
    }
}

/// Parses text into an expression.
///
/// Malformed text is a `ParseError`; well-formed text using an unsupported construct (unknown
/// function, wrong arity, `oo`) is an `EvaluationError` at the parse stage.
pub fn parse(text: &str) -> Result<Expr, CalcError> {
    match guarded(|| parse_expression_func(text)) {
        Ok(Ok(expr)) => Ok(expr),
        Ok(Err(e @ ParseExprError::Syntax(_))) => Err(CalcError::parse(e.to_string())),
        Ok(Err(ParseExprError::Unsupported(detail))) => Err(CalcError::evaluation(
            Stage::Parse,
            format!("unsupported expression ({})", detail),
        )),
        Err(payload) => Err(CalcError::parse(format!(
            "invalid syntax: {}",
            panic_message(payload)
        ))),
    }
}

/// Derivative of `expression` with respect to `variable`.
///
/// ```
/// use RustedSymCalc::calculator::service::derivative;
/// assert_eq!(derivative("x**2 + 2*x + 1", "x").unwrap(), "2*x + 2");
/// assert_eq!(derivative("x**2", "y").unwrap(), "0");
/// ```
pub fn derivative(expression: &str, variable: &str) -> Result<String, CalcError> {
    info!("derivative of {} with respect to {}", expression, variable);
    logged("derivative", derivative_of(expression, variable))
}

fn derivative_of(expression: &str, variable: &str) -> Result<String, CalcError> {
    let var = parse(variable)?;
    let expr = parse(expression)?;
    let derivative = run_engine(Stage::Differentiation, "cannot compute derivative", || {
        Ok(expr.diff(symbol_name(&var)?).simplify())
    })?;
    debug!("d/d{} ({}) = {}", var, expr, derivative);
    Ok(derivative.to_string())
}

/// Numeric value of `expression` after substituting float values.
///
/// Keys must be plain symbols; keys that do not occur in the expression are ignored.
pub fn calculate(
    expression: &str,
    substitutions: Option<&SubstitutionMap>,
) -> Result<Evaluation, CalcError> {
    info!("calculate {} with {:?}", expression, substitutions);
    logged("calculate", evaluate(expression, substitutions))
}

fn evaluate(
    expression: &str,
    substitutions: Option<&SubstitutionMap>,
) -> Result<Evaluation, CalcError> {
    let expr = parse(expression)?;
    let substituted = match substitutions {
        Some(map) => substitute(&expr, map)?,
        None => expr,
    };
    let value = run_engine(Stage::Evaluation, "cannot evaluate expression", || {
        substituted.evalf()
    })?;
    Ok(Evaluation {
        expression: substituted.to_string(),
        value,
    })
}

fn substitute(expr: &Expr, map: &SubstitutionMap) -> Result<Expr, CalcError> {
    run_engine(Stage::Substitution, "substitution failed", || {
        let mut values = SubstitutionMap::with_capacity(map.len());
        for (key, value) in map {
            let name = match Expr::parse_expression(key) {
                Ok(Expr::Var(name)) => name,
                _ => return Err(format!("'{}' is not a symbol", key)),
            };
            if !value.is_finite() {
                return Err(format!("value of {} is not a finite number", name));
            }
            values.insert(name, *value);
        }
        Ok(expr.set_variable_from_map(&values))
    })
}

/// Indefinite integral when both bounds are `None`, definite integral when both are given.
///
/// ```
/// use RustedSymCalc::calculator::service::integrate;
/// assert_eq!(integrate("x**2", "x", None, None).unwrap(), "x**3/3");
/// assert_eq!(integrate("x**2", "x", Some("0"), Some("1")).unwrap(), "1/3");
/// assert!(integrate("x**2", "x", Some("0"), None).is_err());
/// ```
pub fn integrate(
    expression: &str,
    variable: &str,
    lower: Option<&str>,
    upper: Option<&str>,
) -> Result<String, CalcError> {
    info!(
        "integrate {} with respect to {} over {:?}..{:?}",
        expression, variable, lower, upper
    );
    logged("integrate", integral_of(expression, variable, lower, upper))
}

fn integral_of(
    expression: &str,
    variable: &str,
    lower: Option<&str>,
    upper: Option<&str>,
) -> Result<String, CalcError> {
    let var = parse(variable)?;
    let expr = parse(expression)?;
    let integral = match (lower, upper) {
        (None, None) => run_engine(
            Stage::Integration,
            "cannot compute indefinite integral",
            || expr.integrate(symbol_name(&var)?),
        )?,
        (Some(lower), Some(upper)) => {
            let (a, b) = parse_bounds(lower, upper)?;
            run_engine(
                Stage::Integration,
                "cannot compute definite integral",
                || expr.integrate_definite(symbol_name(&var)?, &a, &b),
            )?
        }
        _ => {
            return Err(CalcError::validation(
                "both integration limits must be given or neither",
            ));
        }
    };
    debug!("integral of {} d{} = {}", expr, var, integral);
    Ok(integral.to_string())
}

fn parse_bounds(lower: &str, upper: &str) -> Result<(Expr, Expr), CalcError> {
    match (parse(lower), parse(upper)) {
        (Ok(a), Ok(b)) => Ok((a, b)),
        (a, b) => {
            let mut failures = Vec::new();
            if let Err(e) = a {
                failures.push(format!("lower limit: {}", e.message));
            }
            if let Err(e) = b {
                failures.push(format!("upper limit: {}", e.message));
            }
            Err(CalcError::parse(format!(
                "invalid integration bounds ({})",
                failures.join("; ")
            )))
        }
    }
}

/// Best-effort simplification; the result is a fixpoint of the simplifier.
pub fn simplify(expression: &str) -> Result<String, CalcError> {
    info!("simplify {}", expression);
    let result = parse(expression).and_then(|expr| {
        run_engine(Stage::Simplification, "cannot simplify expression", || {
            Ok(expr.simplify().to_string())
        })
    });
    logged("simplify", result)
}

/// Taylor polynomial of `expression` around `point` with the terms of degree below `order`,
/// without a remainder term.
///
/// ```
/// use RustedSymCalc::calculator::service::series_expansion;
/// let s = series_expansion("exp(x)", "x", 6, "0").unwrap();
/// assert_eq!(s, "x**5/120 + x**4/24 + x**3/6 + x**2/2 + x + 1");
/// ```
pub fn series_expansion(
    expression: &str,
    variable: &str,
    order: usize,
    point: &str,
) -> Result<String, CalcError> {
    info!(
        "series of {} in {} around {} to order {}",
        expression, variable, point, order
    );
    logged("series_expansion", series_of(expression, variable, order, point))
}

fn series_of(
    expression: &str,
    variable: &str,
    order: usize,
    point: &str,
) -> Result<String, CalcError> {
    let var = parse(variable)?;
    let expr = parse(expression)?;
    if order == 0 || order > SERIES_ORDER_LIMIT {
        return Err(CalcError::validation(format!(
            "series order must be between 1 and {}, got {}",
            SERIES_ORDER_LIMIT, order
        )));
    }
    let x0 = parse(point)?;
    if let Expr::Var(name) = &var {
        if x0.contains_variable(name) {
            return Err(CalcError::validation(format!(
                "expansion point {} must not depend on {}",
                x0, name
            )));
        }
    }
    let series = run_engine(Stage::Series, "cannot compute series expansion", || {
        expr.taylor_series(symbol_name(&var)?, &x0, order)
    })?;
    debug!("series of {} = {}", expr, series);
    Ok(series.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::error::ErrorKind;

    #[test]
    fn test_engine_panic_becomes_evaluation_error() {
        let result = run_engine(
            Stage::Simplification,
            "cannot simplify expression",
            || -> Result<(), String> { panic!("index out of range") },
        );
        let e = result.unwrap_err();
        assert_eq!(e.kind, ErrorKind::EvaluationError);
        assert_eq!(e.stage, Stage::Simplification);
        assert_eq!(
            e.message,
            "cannot simplify expression (internal error: index out of range)"
        );
        assert_eq!(GUARDED_CALLS.with(Cell::get), 0);
    }

    #[test]
    fn test_guarded_calls_nest() {
        let inner = guarded(|| {
            assert_eq!(GUARDED_CALLS.with(Cell::get), 1);
            guarded(|| GUARDED_CALLS.with(Cell::get))
        });
        assert!(matches!(inner, Ok(Ok(2))));
        assert_eq!(GUARDED_CALLS.with(Cell::get), 0);
    }
}
