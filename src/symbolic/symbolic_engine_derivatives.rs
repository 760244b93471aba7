//! # Symbolic Engine Derivatives Module
//!
//! Differentiation, numeric evaluation and Taylor expansion on top of the canonical `Expr`.
//!
//! ## Purpose
//!
//! This module enables:
//! - **Analytical Differentiation**: symbolic derivatives using the calculus rules
//! - **Numerical Evaluation**: turning a symbol-free expression (or one with bound variables)
//!   into an `f64`, refusing results that are not finite real numbers
//! - **Taylor Series Expansion**: truncated polynomial approximations with exact coefficients
//!
//! ## Key Methods
//!
//! ### Differentiation
//! - `diff(var: &str)` - analytical partial derivative
//!
//! ### Function evaluation
//! - `evalf()` - numeric value of an expression without free symbols
//! - `eval_with(&HashMap)` - numeric value with variables bound to floats
//!
//! ### Series
//! - `taylor_series(var, x0, order)` - `sum_{k < order} f^(k)(x0)/k! * (x - x0)^k`
//!
//! ## Interesting Code Features
//!
//! 1. **Rule table for the chain rule**: `outer_derivative` maps each elementary function to its
//!    derivative evaluated at the inner argument; `diff` multiplies by the inner derivative.
//! 2. **Canonical results for free**: derivatives are assembled through the canonical
//!    constructors, so `d/dx(x**2 + 2*x + 1)` comes out directly as `2*x + 2`.
//! 3. **Exact Taylor coefficients**: factorials are exact rationals, so `exp(x)` expands to
//!    `x**5/120 + ...` rather than a float approximation.

use crate::symbolic::number::Number;
use crate::symbolic::symbolic_engine::{Expr, Func};
use std::collections::HashMap;
use std::f64::consts::{E, PI};

/// highest power of `(x - x0)` a denominator may vanish to in a removable singularity
const MAX_CANCELLED_ORDER: usize = 7;

impl Expr {
    /// DIFFERENTIATION

    /// Computes the analytical derivative of the expression with respect to a variable.
    ///
    /// Implements the standard rules:
    /// - Power rule: d/dx(u^n) = n*u^(n-1)*u'
    /// - Exponential rule: d/dx(c^u) = c^u*ln(c)*u'
    /// - Product rule over all factors of a product
    /// - Chain rule: d/dx(f(u)) = f'(u)*u'
    ///
    /// A variable that does not occur gives zero.
    ///
    /// # Examples
    /// ```rust, ignore
    /// let f = Expr::parse_expression("x**2").unwrap();
    /// assert_eq!(f.diff("x").to_string(), "2*x");
    /// ```
    pub fn diff(&self, var: &str) -> Expr {
        match self {
            Expr::Var(name) => {
                if name == var {
                    Expr::one()
                } else {
                    Expr::zero()
                }
            }
            Expr::Const(_) | Expr::Pi | Expr::E => Expr::zero(),
            Expr::Add(terms) => Expr::sum(terms.iter().map(|t| t.diff(var)).collect()),
            Expr::Mul(factors) => {
                let mut terms = Vec::with_capacity(factors.len());
                for (i, factor) in factors.iter().enumerate() {
                    if !factor.contains_variable(var) {
                        continue;
                    }
                    let mut parts: Vec<Expr> = factors
                        .iter()
                        .enumerate()
                        .filter(|(j, _)| *j != i)
                        .map(|(_, g)| g.clone())
                        .collect();
                    parts.push(factor.diff(var));
                    terms.push(Expr::product(parts));
                }
                Expr::sum(terms)
            }
            Expr::Pow(base, exp) => {
                let base = base.as_ref();
                let exp = exp.as_ref();
                match (base.contains_variable(var), exp.contains_variable(var)) {
                    (false, false) => Expr::zero(),
                    (true, false) => Expr::product(vec![
                        exp.clone(),
                        Expr::power(base.clone(), exp.clone() - Expr::one()),
                        base.diff(var),
                    ]),
                    (false, true) => Expr::product(vec![
                        self.clone(),
                        base.clone().ln(),
                        exp.diff(var),
                    ]),
                    (true, true) => {
                        // d(u^v) = u^v * (v' ln u + v u'/u)
                        let inner = exp.diff(var) * base.clone().ln()
                            + exp.clone() * base.diff(var) / base.clone();
                        self.clone() * inner
                    }
                }
            }
            Expr::Fun(f, arg) => {
                if !arg.contains_variable(var) {
                    return Expr::zero();
                }
                outer_derivative(*f, arg) * arg.diff(var)
            }
        }
    }

    /// EVALUATION

    /// Numeric value of an expression without free symbols.
    ///
    /// Fails when symbols remain or when the value is not a finite real number (division by zero,
    /// logarithm of a non-positive number, even root of a negative number, ...).
    pub fn evalf(&self) -> Result<f64, String> {
        let free = self.extract_variables();
        if !free.is_empty() {
            return Err(format!(
                "expression contains free symbols: {}",
                free.join(", ")
            ));
        }
        self.eval_with(&HashMap::new())
    }

    /// Numeric value with the variables of `values` bound.
    pub fn eval_with(&self, values: &HashMap<String, f64>) -> Result<f64, String> {
        let value = self.eval_raw(values)?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(format!("{} is not a finite real number", self))
        }
    }

    fn eval_raw(&self, values: &HashMap<String, f64>) -> Result<f64, String> {
        let value = match self {
            Expr::Const(n) => n.to_f64(),
            Expr::Var(name) => match values.get(name) {
                Some(v) => *v,
                None => return Err(format!("no value for symbol {}", name)),
            },
            Expr::Pi => PI,
            Expr::E => E,
            Expr::Add(terms) => {
                let mut acc = 0.0;
                for t in terms {
                    acc += t.eval_raw(values)?;
                }
                acc
            }
            Expr::Mul(factors) => {
                let mut acc = 1.0;
                for f in factors {
                    acc *= f.eval_raw(values)?;
                }
                acc
            }
            Expr::Pow(base, exp) => {
                let b = base.eval_raw(values)?;
                match exp.as_integer() {
                    Some(n) if n.unsigned_abs() <= i32::MAX as u64 => b.powi(n as i32),
                    _ => b.powf(exp.eval_raw(values)?),
                }
            }
            Expr::Fun(f, arg) => f.apply_f64(arg.eval_raw(values)?),
        };
        Ok(value)
    }

    /// SERIES

    /// Truncated Taylor expansion around `x0` keeping the terms of degree `0..order`.
    ///
    /// Coefficients are computed exactly by repeated differentiation and substitution. When that
    /// hits `0/0` at the expansion point, the numerator and denominator are expanded separately
    /// and their series divided, so removable singularities like `sin(x)/x` expand normally.
    /// The expansion fails when the function is not analytic at the expansion point (a pole,
    /// a logarithm, a fractional power). No remainder term is attached.
    ///
    /// # Examples
    /// ```rust, ignore
    /// let f = Expr::parse_expression("exp(x)").unwrap();
    /// let t = f.taylor_series("x", &Expr::zero(), 3).unwrap();
    /// assert_eq!(t.to_string(), "x**2/2 + x + 1");
    /// ```
    pub fn taylor_series(&self, var: &str, x0: &Expr, order: usize) -> Result<Expr, String> {
        if x0.contains_variable(var) {
            return Err(format!("expansion point {} depends on {}", x0, var));
        }
        let coefficients = match taylor_coefficients(self, var, x0, order) {
            Ok(coefficients) => coefficients,
            Err(e) => quotient_coefficients(self, var, x0, order).ok_or(e)?,
        };
        let shift = Expr::var(var) - x0.clone();
        let terms = coefficients
            .into_iter()
            .enumerate()
            .filter(|(_, c)| !c.is_zero())
            .map(|(k, c)| c * shift.clone().powi(k as i64))
            .collect();
        Ok(Expr::sum(terms))
    }
}

/// `f^(k)(x0)/k!` for `k` in `0..count`
fn taylor_coefficients(expr: &Expr, var: &str, x0: &Expr, count: usize) -> Result<Vec<Expr>, String> {
    let not_analytic = || format!("{} is not analytic at {} = {}", expr, var, x0);
    let numeric_point = x0.evalf().ok();
    let mut derivative = expr.clone();
    let mut factorial = Number::int(1);
    let mut coefficients = Vec::with_capacity(count);
    for k in 0..count {
        if k > 0 {
            derivative = derivative.diff(var).simplify();
            factorial = factorial.mul(&Number::int(k as i64));
        }
        if let Some(point) = numeric_point {
            check_finite_at(&derivative, var, point).map_err(|_| not_analytic())?;
        }
        let value = derivative.substitute_variable(var, x0).simplify();
        if value.is_free_of_symbols() && value.evalf().is_err() {
            return Err(not_analytic());
        }
        let Some(inverse) = factorial.recip() else {
            return Err("factorial overflow".to_string());
        };
        coefficients.push(value * Expr::Const(inverse));
    }
    Ok(coefficients)
}

/// Series of `n/d` where `d` vanishes at `x0` to order `v`: `n` must vanish at least as fast,
/// then `q = n/d` follows from `n_{k+v} = sum_j d_{j+v} q_{k-j}`.
/// `None` for a pole or when either part is not analytic itself.
fn quotient_coefficients(expr: &Expr, var: &str, x0: &Expr, order: usize) -> Option<Vec<Expr>> {
    let (numerator, denominator) = expr.numer_denom();
    if !denominator.contains_variable(var) {
        return None;
    }
    let mut d = taylor_coefficients(&denominator, var, x0, MAX_CANCELLED_ORDER + 1).ok()?;
    let v = d.iter().position(|c| !c.is_zero())?;
    if v == 0 {
        return None;
    }
    if d.len() < order + v {
        d = taylor_coefficients(&denominator, var, x0, order + v).ok()?;
    }
    let n = taylor_coefficients(&numerator, var, x0, order + v).ok()?;
    if n[..v].iter().any(|c| !c.is_zero()) {
        return None;
    }
    let mut q: Vec<Expr> = Vec::with_capacity(order);
    for k in 0..order {
        let mut acc = n[k + v].clone();
        for j in 1..=k {
            acc = acc - d[j + v].clone() * q[k - j].clone();
        }
        q.push((acc / d[v].clone()).simplify());
    }
    Some(q)
}

/// Checks a derivative numerically at the expansion point when it only depends on `var`.
fn check_finite_at(expr: &Expr, var: &str, point: f64) -> Result<(), String> {
    let free = expr.extract_variables();
    if free.iter().any(|name| name != var) {
        return Ok(());
    }
    let values = HashMap::from([(var.to_string(), point)]);
    expr.eval_with(&values).map(|_| ())
}

/// f'(u) for the chain rule
fn outer_derivative(f: Func, u: &Expr) -> Expr {
    let u = u.clone();
    match f {
        Func::Exp => u.exp(),
        Func::Log => u.recip(),
        Func::Sin => u.cos(),
        Func::Cos => -u.sin(),
        Func::Tan => Expr::func(Func::Tan, u).powi(2) + Expr::one(),
        Func::Cot => -(Expr::func(Func::Cot, u).powi(2)) - Expr::one(),
        Func::Asin => (Expr::one() - u.powi(2)).pow(Expr::rational(-1, 2)),
        Func::Acos => -(Expr::one() - u.powi(2)).pow(Expr::rational(-1, 2)),
        Func::Atan => (u.powi(2) + Expr::one()).recip(),
        Func::Acot => -(u.powi(2) + Expr::one()).recip(),
        Func::Sinh => Expr::func(Func::Cosh, u),
        Func::Cosh => Expr::func(Func::Sinh, u),
        Func::Tanh => Expr::one() - Expr::func(Func::Tanh, u).powi(2),
    }
}
