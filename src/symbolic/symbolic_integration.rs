//! # Symbolic Integration Module
//!
//! Indefinite and definite integration of canonical expressions, plus Gauss-Legendre quadrature
//! for numerical cross-checks.
//!
//! ## Strategy
//!
//! `integrate` splits sums term by term and pulls factors free of the variable out of products.
//! What remains is tried against, in this order:
//! 1. **Table** of elementary antiderivatives for a linear inner argument `a*x + b`
//! 2. **Rational functions** with a denominator of degree one or two
//! 3. **Expansion** of products and integer powers of sums
//! 4. **Substitution** in the derivative-divides form `f(g(x))*g'(x)`
//! 5. **Integration by parts** for a polynomial times exp/sin/cos/sinh/cosh/c**u or log/atan
//!
//! Results carry no constant of integration. Failure means no rule applied, not that no
//! elementary antiderivative exists.

use crate::symbolic::number::Number;
use crate::symbolic::symbolic_engine::{Expr, Func};
use crate::symbolic::symbolic_polynomial::Polynomial;
use crate::symbolic::utils::interior_points;
use gauss_quad::GaussLegendre;
use log::{debug, warn};
use num::BigRational;
use num_traits::{Signed, Zero};
use std::collections::HashMap;

/// nested integrations (by parts, expansion) before giving up
const MAX_INTEGRATION_DEPTH: usize = 12;
/// sample points used to look for singularities inside a numeric interval
const SINGULARITY_SAMPLES: usize = 257;
/// Gauss-Legendre nodes for the numeric cross-check of definite integrals
const CROSS_CHECK_DEGREE: usize = 40;
const CROSS_CHECK_TOLERANCE: f64 = 1e-6;

impl Expr {
    /// SYMBOLIC INTEGRATION

    /// Indefinite integral with respect to `var`, without constant of integration.
    ///
    /// # Examples
    /// ```rust, ignore
    /// let f = Expr::parse_expression("x**2").unwrap();
    /// assert_eq!(f.integrate("x").unwrap().to_string(), "x**3/3");
    /// ```
    pub fn integrate(&self, var: &str) -> Result<Expr, String> {
        integrate_in(self, var, 0)
    }

    /// Definite integral over `[lower, upper]` by the fundamental theorem of calculus.
    ///
    /// Bounds may be symbolic but must not depend on `var`. With numeric bounds the integrand is
    /// sampled inside the interval first, so `1/x` over `[-1, 1]` is refused instead of giving a
    /// meaningless `F(1) - F(-1)`. A sampled integrand keeps one sign of every `log(u)` argument
    /// across the interval, so `log(c)` with a negative constant `c` is read as `log(-c)`: the
    /// antiderivative of `1/x` on `[-2, -1]` is `log(|x|)`. The difference is simplified; a
    /// symbol-free result must be a finite real number and is compared against Gauss-Legendre
    /// quadrature.
    pub fn integrate_definite(&self, var: &str, lower: &Expr, upper: &Expr) -> Result<Expr, String> {
        if lower.contains_variable(var) || upper.contains_variable(var) {
            return Err(format!("integration bounds must not depend on {}", var));
        }
        let interval = match (lower.evalf(), upper.evalf()) {
            (Ok(a), Ok(b)) if check_integrand_finite(self, var, a, b)? => Some((a, b)),
            _ => None,
        };
        let antiderivative = self.integrate(var)?;
        let mut at_upper = antiderivative.substitute_variable(var, upper);
        let mut at_lower = antiderivative.substitute_variable(var, lower);
        if interval.is_some() {
            at_upper = fold_negative_logs(&at_upper);
            at_lower = fold_negative_logs(&at_lower);
        }
        let result = (at_upper - at_lower).simplify();
        if result.is_free_of_symbols() {
            let value = result
                .evalf()
                .map_err(|_| format!("{} has no finite value on [{}, {}]", self, lower, upper))?;
            if let Some((a, b)) = interval {
                cross_check(self, var, a, b, value);
            }
        }
        Ok(result)
    }

    /// Numerical integral of a univariate expression with Gauss-Legendre quadrature of the
    /// given degree.
    pub fn quad_legendre(&self, var: &str, lower: f64, upper: f64, degree: usize) -> Result<f64, String> {
        let quad = GaussLegendre::new(degree)
            .map_err(|e| format!("Failed to create Gauss-Legendre quadrature: {:?}", e))?;
        let f = |x: f64| {
            let values = HashMap::from([(var.to_string(), x)]);
            self.eval_with(&values).unwrap_or(f64::NAN)
        };
        let result = quad.integrate(lower, upper, f);
        if result.is_finite() {
            Ok(result)
        } else {
            Err(format!("{} is not integrable on [{}, {}]", self, lower, upper))
        }
    }
}

fn no_antiderivative(e: &Expr) -> String {
    format!("no elementary antiderivative found for {}", e)
}

fn integrate_in(e: &Expr, var: &str, depth: usize) -> Result<Expr, String> {
    if depth > MAX_INTEGRATION_DEPTH {
        return Err(no_antiderivative(e));
    }
    // ∫ c dx = c*x
    if !e.contains_variable(var) {
        return Ok(e.clone() * Expr::var(var));
    }
    match e {
        // ∫ (f + g) dx = ∫ f dx + ∫ g dx
        Expr::Add(terms) => {
            let mut parts = Vec::with_capacity(terms.len());
            for term in terms {
                parts.push(integrate_in(term, var, depth)?);
            }
            Ok(Expr::sum(parts))
        }
        // ∫ c*f dx = c*∫ f dx
        Expr::Mul(factors) => {
            let (dependent, constant): (Vec<Expr>, Vec<Expr>) =
                factors.iter().cloned().partition(|f| f.contains_variable(var));
            let integral = integrate_dependent(&Expr::product(dependent), var, depth)?;
            Ok(Expr::product(constant) * integral)
        }
        _ => integrate_dependent(e, var, depth),
    }
}

/// integrand whose every factor depends on `var`
fn integrate_dependent(e: &Expr, var: &str, depth: usize) -> Result<Expr, String> {
    if let Some(result) = table_integral(e, var) {
        return Ok(result);
    }
    if let Some(result) = rational_integral(e, var) {
        return Ok(result);
    }
    let expanded = e.expand();
    if expanded != *e && matches!(expanded, Expr::Add(_)) {
        return integrate_in(&expanded, var, depth + 1);
    }
    if let Some(result) = substitution_integral(e, var) {
        return Ok(result);
    }
    if let Some(result) = parts_integral(e, var, depth) {
        return Ok(result);
    }
    Err(no_antiderivative(e))
}

/// `a` if `u == a*x + b` with `a != 0` and `a`, `b` free of `x`
fn linear_slope(u: &Expr, var: &str) -> Option<Expr> {
    let slope = u.diff(var).simplify();
    if slope.is_zero() || slope.contains_variable(var) {
        return None;
    }
    let offset = (u.clone() - slope.clone() * Expr::var(var)).simplify();
    if offset.contains_variable(var) {
        return None;
    }
    Some(slope)
}

fn rat(r: BigRational) -> Expr {
    Expr::Const(Number::Rational(r))
}

/// Antiderivatives of single factors with a linear inner argument.
fn table_integral(e: &Expr, var: &str) -> Option<Expr> {
    match e {
        Expr::Var(_) => Some(e.clone().powi(2) / Expr::int(2)),
        // ∫ sin(u)^2 dx, ∫ cos(u)^2 dx
        Expr::Pow(base, exp) if exp.as_integer() == Some(2) => match base.as_ref() {
            Expr::Fun(f @ (Func::Sin | Func::Cos), u) => {
                let a = linear_slope(u, var)?;
                let u = (**u).clone();
                let half_angle = Expr::func(Func::Sin, Expr::int(2) * u.clone()) / Expr::int(4);
                let main = u / Expr::int(2);
                let integral = if *f == Func::Sin {
                    main - half_angle
                } else {
                    main + half_angle
                };
                Some(integral / a)
            }
            _ => power_rule(base, exp, var),
        },
        Expr::Pow(base, exp) if !exp.contains_variable(var) => power_rule(base, exp, var),
        // ∫ c^u dx = c^u / (a*ln(c))
        Expr::Pow(base, exp) if !base.contains_variable(var) => {
            let a = linear_slope(exp, var)?;
            Some(e.clone() / (a * (**base).clone().ln()))
        }
        Expr::Fun(f, u) => {
            let a = linear_slope(u, var)?;
            Some(function_antiderivative(*f, u) / a)
        }
        _ => None,
    }
}

/// ∫ u^n dx for linear `u`, plus the quadratic forms `1/q` and `1/sqrt(q)`
fn power_rule(base: &Expr, exp: &Expr, var: &str) -> Option<Expr> {
    if exp.contains_variable(var) {
        return None;
    }
    if let Some(result) = quadratic_power(base, exp, var) {
        return Some(result);
    }
    let a = linear_slope(base, var)?;
    if exp.as_integer() == Some(-1) {
        return Some(base.clone().ln() / a);
    }
    let raised = exp.clone() + Expr::one();
    Some(Expr::power(base.clone(), raised.clone()) / (raised * a))
}

fn quadratic_power(base: &Expr, exp: &Expr, var: &str) -> Option<Expr> {
    if base.has_float() {
        return None;
    }
    let q = Polynomial::from_expr(base, var)?;
    if q.degree() != Some(2) {
        return None;
    }
    if exp.as_integer() == Some(-1) {
        return Some(reciprocal_quadratic(&q, var));
    }
    // ∫ 1/sqrt(c - k*x^2) dx = asin(x*sqrt(k/c)) / sqrt(k)
    if *exp == Expr::rational(-1, 2) && q.coeff(1).is_zero() {
        let (a, c) = (q.coeff(2), q.coeff(0));
        if a.is_negative() && c.is_positive() {
            let k = rat(-a.clone());
            let scale = rat(-a / c).sqrt();
            return Some(Expr::func(Func::Asin, scale * Expr::var(var)) / k.sqrt());
        }
    }
    None
}

/// ∫ dx / (a*x^2 + b*x + c) by the sign of the discriminant
fn reciprocal_quadratic(q: &Polynomial, var: &str) -> Expr {
    let (c, b, a) = (q.coeff(0), q.coeff(1), q.coeff(2));
    let four = BigRational::from_integer(4.into());
    let two = BigRational::from_integer(2.into());
    let disc = &b * &b - four * &a * &c;
    let linear = rat(two * a) * Expr::var(var) + rat(b);
    if disc.is_negative() {
        let root = rat(-disc).sqrt();
        Expr::int(2) / root.clone() * Expr::func(Func::Atan, linear / root)
    } else if disc.is_zero() {
        Expr::int(-2) / linear
    } else {
        let root = rat(disc).sqrt();
        (Expr::func(Func::Log, linear.clone() - root.clone())
            - Expr::func(Func::Log, linear + root.clone()))
            / root
    }
}

/// F(u) with F' = f, before dividing by the slope of `u`
fn function_antiderivative(f: Func, u: &Expr) -> Expr {
    let u = u.clone();
    let arg = || u.clone();
    match f {
        Func::Exp => arg().exp(),
        Func::Sin => -arg().cos(),
        Func::Cos => arg().sin(),
        Func::Tan => -(arg().cos().ln()),
        Func::Cot => arg().sin().ln(),
        Func::Sinh => Expr::func(Func::Cosh, arg()),
        Func::Cosh => Expr::func(Func::Sinh, arg()),
        Func::Tanh => Expr::func(Func::Cosh, arg()).ln(),
        Func::Log => arg() * arg().ln() - arg(),
        Func::Asin => {
            arg() * Expr::func(Func::Asin, arg()) + (Expr::one() - arg().powi(2)).sqrt()
        }
        Func::Acos => {
            arg() * Expr::func(Func::Acos, arg()) - (Expr::one() - arg().powi(2)).sqrt()
        }
        Func::Atan => {
            arg() * Expr::func(Func::Atan, arg())
                - (arg().powi(2) + Expr::one()).ln() / Expr::int(2)
        }
        Func::Acot => {
            arg() * Expr::func(Func::Acot, arg())
                + (arg().powi(2) + Expr::one()).ln() / Expr::int(2)
        }
    }
}

/// p/q with rational coefficients and `deg q` one or two: polynomial part plus log/atan terms
fn rational_integral(e: &Expr, var: &str) -> Option<Expr> {
    if e.has_float() {
        return None;
    }
    let (numer, denom) = e.numer_denom();
    let p = Polynomial::from_expr(&numer, var)?;
    let q = Polynomial::from_expr(&denom, var)?;
    let degree = q.degree()?;
    if degree == 0 || degree > 2 {
        return None;
    }
    let (quotient, remainder) = p.div_rem(&q)?;
    let mut parts = vec![quotient.integral().to_expr(var)];
    if !remainder.is_zero() {
        let q_expr = q.to_expr(var);
        if degree == 1 {
            // r / (q1*x + q0)
            let factor = remainder.coeff(0) / q.coeff(1);
            parts.push(rat(factor) * q_expr.ln());
        } else {
            // (r1*x + r0) = r1/(2a) * q' + (r0 - r1*b/(2a))
            let (r1, r0) = (remainder.coeff(1), remainder.coeff(0));
            let two_a = BigRational::from_integer(2.into()) * q.coeff(2);
            let log_factor = &r1 / &two_a;
            let rest = r0 - r1 * q.coeff(1) / two_a;
            if !log_factor.is_zero() {
                parts.push(rat(log_factor) * q_expr.ln());
            }
            if !rest.is_zero() {
                parts.push(rat(rest) * reciprocal_quadratic(&q, var));
            }
        }
    }
    Some(Expr::sum(parts))
}

fn dummy_name(e: &Expr) -> String {
    let used = e.extract_variables();
    let mut name = "_u".to_string();
    while used.contains(&name) {
        name.push('_');
    }
    name
}

/// ∫ f(g(x))*g'(x)*c dx = c*F(g(x)) when the cofactor `c` is free of `x`
fn substitution_integral(e: &Expr, var: &str) -> Option<Expr> {
    let dummy = dummy_name(e);
    let u = Expr::var(&dummy);
    for factor in e.factors() {
        // (inner g, outer f as a function of u)
        let mut candidates: Vec<(Expr, Expr)> = Vec::new();
        match &factor {
            Expr::Fun(f, inner) => candidates.push(((**inner).clone(), Expr::func(*f, u.clone()))),
            Expr::Pow(base, exp) if !exp.contains_variable(var) => {
                candidates.push(((**base).clone(), Expr::power(u.clone(), (**exp).clone())))
            }
            Expr::Pow(base, exp) if !base.contains_variable(var) => {
                candidates.push(((**exp).clone(), Expr::power((**base).clone(), u.clone())))
            }
            _ => {}
        }
        candidates.push((factor.clone(), u.clone()));
        for (inner, outer) in candidates {
            let inner_derivative = inner.diff(var);
            if inner_derivative.is_zero() {
                continue;
            }
            let mut cofactor = e.clone() / (factor.clone() * inner_derivative);
            if cofactor.contains_variable(var) {
                cofactor = cofactor.simplify();
                if cofactor.contains_variable(var) {
                    continue;
                }
            }
            let Some(antiderivative) = table_integral(&outer, &dummy) else {
                continue;
            };
            return Some(cofactor * antiderivative.substitute_variable(&dummy, &inner));
        }
    }
    None
}

/// `x` or a positive integer power of `x`
fn is_monomial(factor: &Expr, var: &str) -> bool {
    match factor {
        Expr::Var(name) => name == var,
        Expr::Pow(base, exp) => {
            matches!(base.as_ref(), Expr::Var(name) if name == var)
                && exp.as_integer().is_some_and(|n| n > 0)
        }
        _ => false,
    }
}

/// ∫ P*h dx = P*H - ∫ P'*H dx, or R*h - ∫ R*h' dx with R = ∫ P dx for log and atan
fn parts_integral(e: &Expr, var: &str, depth: usize) -> Option<Expr> {
    let (poly, other): (Vec<Expr>, Vec<Expr>) =
        e.factors().into_iter().partition(|f| is_monomial(f, var));
    if poly.is_empty() || other.len() != 1 {
        return None;
    }
    let p = Expr::product(poly);
    let h = &other[0];
    match h {
        Expr::Fun(Func::Exp | Func::Sin | Func::Cos | Func::Sinh | Func::Cosh, _) | Expr::Pow(..) => {
            let antiderivative = table_integral(h, var)?;
            let rest = integrate_in(&(p.diff(var) * antiderivative.clone()), var, depth + 1).ok()?;
            Some(p * antiderivative - rest)
        }
        Expr::Fun(Func::Log | Func::Atan, u) => {
            linear_slope(u, var)?;
            let r = integrate_in(&p, var, depth + 1).ok()?;
            let rest = integrate_in(&(r.clone() * h.diff(var)), var, depth + 1).ok()?;
            Some(r * h.clone() - rest)
        }
        _ => None,
    }
}

/// The integrand must be finite at every sample point strictly inside the interval.
/// Returns `false` when other symbols leave nothing to sample.
fn check_integrand_finite(e: &Expr, var: &str, lower: f64, upper: f64) -> Result<bool, String> {
    if e.extract_variables().iter().any(|name| name != var) {
        return Ok(false);
    }
    for point in interior_points(lower, upper, SINGULARITY_SAMPLES) {
        let values = HashMap::from([(var.to_string(), point)]);
        if e.eval_with(&values).is_err() {
            return Err(format!(
                "{} is not finite at {} = {} inside the integration interval",
                e, var, point
            ));
        }
    }
    Ok(true)
}

/// `log(c)` -> `log(-c)` for every symbol-free argument with a negative value
fn fold_negative_logs(e: &Expr) -> Expr {
    e.map_bottom_up(&|node| {
        if let Expr::Fun(Func::Log, arg) = &node {
            if arg.is_free_of_symbols() && arg.evalf().is_ok_and(|v| v < 0.0) {
                return Expr::func(Func::Log, -(**arg).clone());
            }
        }
        node
    })
}

/// Gauss-Legendre estimate of the same integral; a mismatch is only logged since quadrature
/// converges slowly near integrable endpoint singularities.
fn cross_check(e: &Expr, var: &str, lower: f64, upper: f64, exact: f64) {
    match e.quad_legendre(var, lower, upper, CROSS_CHECK_DEGREE) {
        Ok(numeric) if (numeric - exact).abs() <= CROSS_CHECK_TOLERANCE * (1.0 + exact.abs()) => {
            debug!("quadrature agrees with {} on [{}, {}]", exact, lower, upper)
        }
        Ok(numeric) => warn!(
            "integral of {} on [{}, {}]: antiderivative gives {}, quadrature gives {}",
            e, lower, upper, exact, numeric
        ),
        Err(err) => debug!("no quadrature estimate: {}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn parse(text: &str) -> Expr {
        Expr::parse_expression(text).unwrap()
    }

    fn integral(text: &str) -> String {
        parse(text).integrate("x").unwrap().to_string()
    }

    /// d/dx of the antiderivative matches the integrand at a few points
    fn assert_antiderivative(text: &str, points: &[f64]) {
        let f = parse(text);
        let antiderivative = f.integrate("x").unwrap();
        let derivative = antiderivative.diff("x");
        for &x in points {
            let values = HashMap::from([("x".to_string(), x)]);
            let expected = f.eval_with(&values).unwrap();
            let actual = derivative.eval_with(&values).unwrap();
            assert_relative_eq!(actual, expected, epsilon = 1e-9, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_polynomials() {
        assert_eq!(integral("x**2"), "x**3/3");
        assert_eq!(integral("3*x**2 + 2*x + 1"), "x**3 + x**2 + x");
        assert_eq!(integral("5"), "5*x");
        assert_eq!(integral("y"), "x*y");
        assert_eq!(integral("(x + 1)**2"), "(x + 1)**3/3");
    }

    #[test]
    fn test_table() {
        assert_eq!(integral("cos(x)"), "sin(x)");
        assert_eq!(integral("sin(x)"), "-cos(x)");
        assert_eq!(integral("exp(2*x)"), "exp(2*x)/2");
        assert_eq!(integral("1/x"), "log(x)");
        assert_eq!(integral("1/(x**2 + 1)"), "atan(x)");
        assert_eq!(integral("1/sqrt(1 - x**2)"), "asin(x)");
        for text in ["tan(x)", "log(x)", "atan(x)", "cosh(3*x)", "2**x", "sin(x)**2", "cos(2*x)**2"] {
            assert_antiderivative(text, &[0.3, 0.7, 1.1]);
        }
    }

    #[test]
    fn test_rational_functions() {
        assert_eq!(integral("2*x/(x**2 + 1)"), "log(x**2 + 1)");
        for text in ["(x + 1)/(x - 3)", "x**3/(x**2 + 4)", "1/(x**2 - 1)", "1/(x**2 + 2*x + 1)"] {
            assert_antiderivative(text, &[3.5, 4.0, 5.25]);
        }
    }

    #[test]
    fn test_substitution_and_parts() {
        assert_eq!(integral("x*exp(x**2)"), "exp(x**2)/2");
        assert_eq!(integral("x*exp(x)"), "x*exp(x) - exp(x)");
        for text in [
            "sin(x)*cos(x)",
            "x**2*exp(x)",
            "x*sin(x)",
            "x*log(x)",
            "x*atan(x)",
            "cos(x)*exp(sin(x))",
        ] {
            assert_antiderivative(text, &[0.4, 0.9, 1.3]);
        }
    }

    #[test]
    fn test_no_closed_form() {
        assert!(parse("exp(x**2)").integrate("x").is_err());
        assert!(parse("x**x").integrate("x").is_err());
        assert!(parse("sin(x)/x").integrate("x").is_err());
    }

    #[test]
    fn test_definite() {
        let zero = Expr::zero();
        let one = Expr::one();
        let r = parse("x**2").integrate_definite("x", &zero, &one).unwrap();
        assert_eq!(r.to_string(), "1/3");
        let r = parse("exp(x)").integrate_definite("x", &zero, &one).unwrap();
        assert_eq!(r, parse("E - 1"));
        let r = parse("x*y").integrate_definite("x", &zero, &Expr::int(2)).unwrap();
        assert_eq!(r.to_string(), "2*y");
        let r = parse("cos(x)").integrate_definite("x", &zero, &Expr::Pi).unwrap();
        assert_eq!(r, Expr::zero());
    }

    #[test]
    fn test_definite_rejects_singularities() {
        let r = parse("1/x").integrate_definite("x", &Expr::int(-1), &Expr::one());
        assert!(r.is_err());
        let r = parse("1/x").integrate_definite("x", &Expr::zero(), &Expr::one());
        assert!(r.is_err());
        let r = parse("x").integrate_definite("x", &Expr::zero(), &Expr::var("x"));
        assert!(r.is_err());
    }

    #[test]
    fn test_definite_logs_on_negative_arguments() {
        let r = parse("1/x").integrate_definite("x", &Expr::int(-2), &Expr::int(-1)).unwrap();
        assert_eq!(r.to_string(), "-log(2)");
        for (text, a, b, expected) in [
            ("1/(x - 3)", 0.0, 1.0, (2.0f64 / 3.0).ln()),
            ("1/(x**2 - 1)", 0.0, 0.5, -(0.5f64.atanh())),
            ("tan(x)", 2.0, 3.0, (2.0f64.cos() / 3.0f64.cos()).ln()),
        ] {
            let value = parse(text)
                .integrate_definite("x", &Expr::float(a), &Expr::float(b))
                .unwrap()
                .evalf()
                .unwrap();
            assert_relative_eq!(value, expected, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_quadrature_agrees_with_antiderivative() {
        for (text, a, b) in [("x**2", 0.0, 1.0), ("x*exp(x)", -1.0, 2.0), ("1/(x**2 + 1)", 0.0, 3.0)] {
            let f = parse(text);
            let exact = f
                .integrate_definite("x", &Expr::float(a), &Expr::float(b))
                .unwrap()
                .evalf()
                .unwrap();
            let numeric = f.quad_legendre("x", a, b, 20).unwrap();
            assert_relative_eq!(exact, numeric, epsilon = 1e-8);
        }
    }
}
