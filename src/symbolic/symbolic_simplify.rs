//! # Symbolic Expression Simplification Module
//!
//! Best-effort simplification on top of the canonical form that the constructors already
//! maintain (constant folding, like-term collection, power merging).
//!
//! ## Simplification Strategy
//!
//! Every round builds a handful of equivalent candidates and keeps the least complex one
//! (`Expr::complexity`); the input itself wins ties:
//!
//! 1. **Expansion**: products and integer powers of sums are multiplied out
//! 2. **Cancellation**: univariate rational functions are brought over a common denominator
//!    and the polynomial gcd of numerator and denominator is divided out
//! 3. **Trigonometric identities**: `k*sin(u)**2 + k*cos(u)**2 -> k`,
//!    `k - k*sin(u)**2 -> k*cos(u)**2`, `sin(u)**n/cos(u)**n -> tan(u)**n`
//!
//! Function arguments are simplified first. Rounds repeat until nothing changes, so the result
//! is a fixpoint and simplifying it again returns it unchanged.

use crate::symbolic::number::Number;
use crate::symbolic::symbolic_engine::{Expr, Func};
use crate::symbolic::symbolic_polynomial::Polynomial;

const MAX_SIMPLIFY_ROUNDS: usize = 16;
const MAX_EXPAND_POWER: i64 = 24;
const MAX_EXPAND_TERMS: usize = 4096;

impl Expr {
    //___________________________________SIMPLIFICATION____________________________________

    /// Simplifies the expression; never fails and always returns an equivalent expression.
    ///
    /// # Examples
    /// ```rust, ignore
    /// let e = Expr::parse_expression("sin(x)**2 + cos(x)**2").unwrap();
    /// assert_eq!(e.simplify(), Expr::one());
    /// ```
    pub fn simplify(&self) -> Expr {
        let mut current = self.clone();
        for _ in 0..MAX_SIMPLIFY_ROUNDS {
            let next = current.simplify_step();
            if next == current {
                return current;
            }
            current = next;
        }
        current
    }

    fn simplify_step(&self) -> Expr {
        let base = self.simplify_arguments();
        let expanded = base.expand();
        let candidates = [
            expanded.trigsimp(),
            base.trigsimp(),
            base.cancel(),
            expanded.cancel(),
            expanded,
        ];
        let mut best = base;
        let mut best_cost = best.complexity();
        for candidate in candidates {
            let cost = candidate.complexity();
            if cost < best_cost {
                best = candidate;
                best_cost = cost;
            }
        }
        best
    }

    fn simplify_arguments(&self) -> Expr {
        match self {
            Expr::Fun(f, arg) => Expr::func(*f, arg.simplify()),
            Expr::Add(terms) => Expr::sum(terms.iter().map(|t| t.simplify_arguments()).collect()),
            Expr::Mul(factors) => {
                Expr::product(factors.iter().map(|f| f.simplify_arguments()).collect())
            }
            Expr::Pow(base, exp) => {
                Expr::power(base.simplify_arguments(), exp.simplify_arguments())
            }
            Expr::Const(_) | Expr::Var(_) | Expr::Pi | Expr::E => self.clone(),
        }
    }

    //___________________________________EXPANSION____________________________________

    /// Multiplies out products of sums and integer powers of sums, recursively.
    ///
    /// Powers above a fixed exponent and expansions producing too many terms are left as they
    /// are.
    pub fn expand(&self) -> Expr {
        match self {
            Expr::Const(_) | Expr::Var(_) | Expr::Pi | Expr::E => self.clone(),
            Expr::Add(terms) => Expr::sum(terms.iter().map(|t| t.expand()).collect()),
            Expr::Mul(factors) => {
                let expanded: Vec<Expr> = factors.iter().map(|f| f.expand()).collect();
                match distribute(&expanded) {
                    Some(result) => result,
                    None => Expr::product(expanded),
                }
            }
            Expr::Pow(base, exp) => {
                let base = base.expand();
                let exp = exp.expand();
                match (exp.as_integer(), &base) {
                    (Some(n), Expr::Add(_)) if (2..=MAX_EXPAND_POWER).contains(&n) => {
                        match distribute(&vec![base.clone(); n as usize]) {
                            Some(result) => result,
                            None => Expr::power(base, exp),
                        }
                    }
                    (Some(n), Expr::Add(_)) if (-MAX_EXPAND_POWER..=-2).contains(&n) => {
                        match distribute(&vec![base.clone(); n.unsigned_abs() as usize]) {
                            Some(result) => result.recip(),
                            None => Expr::power(base, exp),
                        }
                    }
                    _ => Expr::power(base, exp),
                }
            }
            Expr::Fun(f, arg) => Expr::func(*f, arg.expand()),
        }
    }

    //___________________________________CANCELLATION____________________________________

    /// Numerator and denominator over a common denominator.
    pub fn numer_denom(&self) -> (Expr, Expr) {
        match self {
            Expr::Add(terms) => {
                let parts: Vec<(Expr, Expr)> = terms.iter().map(|t| t.numer_denom()).collect();
                let denominator =
                    Expr::product(parts.iter().map(|(_, d)| d.clone()).collect());
                let numerator = Expr::sum(
                    parts
                        .iter()
                        .enumerate()
                        .map(|(i, (n, _))| {
                            let mut factors = vec![n.clone()];
                            factors.extend(
                                parts
                                    .iter()
                                    .enumerate()
                                    .filter(|(j, _)| *j != i)
                                    .map(|(_, (_, d))| d.clone()),
                            );
                            Expr::product(factors)
                        })
                        .collect(),
                );
                (numerator, denominator)
            }
            _ => {
                let mut numer = Vec::new();
                let mut denom = Vec::new();
                for factor in self.factors() {
                    match &factor {
                        Expr::Const(Number::Rational(r)) => {
                            numer.push(Expr::Const(Number::Rational(r.numer().clone().into())));
                            denom.push(Expr::Const(Number::Rational(r.denom().clone().into())));
                        }
                        Expr::Pow(base, exp) if exp.is_negative_term() => {
                            denom.push(Expr::power((**base).clone(), -(**exp).clone()));
                        }
                        _ => numer.push(factor.clone()),
                    }
                }
                (Expr::product(numer), Expr::product(denom))
            }
        }
    }

    /// Cancels common polynomial factors of a rational function in a single variable.
    ///
    /// Expressions with several symbols, floats or non-polynomial parts are returned unchanged.
    pub fn cancel(&self) -> Expr {
        let vars = self.extract_variables();
        if vars.len() != 1 || self.has_float() {
            return self.clone();
        }
        let var = vars[0].as_str();
        let (numer, denom) = self.numer_denom();
        let (Some(p), Some(q)) = (
            Polynomial::from_expr(&numer, var),
            Polynomial::from_expr(&denom, var),
        ) else {
            return self.clone();
        };
        if q.is_zero() {
            return self.clone();
        }
        let g = p.gcd(&q);
        let (Some((p, _)), Some((q, _))) = (p.div_rem(&g), q.div_rem(&g)) else {
            return self.clone();
        };
        let lead = q.leading();
        let p = p.scale(&lead.recip());
        let q = q.monic();
        p.to_expr(var) / q.to_expr(var)
    }

    //___________________________________TRIGONOMETRY____________________________________

    /// Applies the Pythagorean identities and `sin/cos -> tan` throughout the tree.
    pub fn trigsimp(&self) -> Expr {
        self.map_bottom_up(&trig_rewrite)
    }
}

/// Multiplies out a list of factors, collecting after every step; `None` if the number of terms
/// grows past the limit.
fn distribute(factors: &[Expr]) -> Option<Expr> {
    if !factors.iter().any(|f| matches!(f, Expr::Add(_))) {
        return None;
    }
    let mut acc: Vec<Expr> = vec![Expr::one()];
    for factor in factors {
        let terms = factor.terms();
        if acc.len() * terms.len() > MAX_EXPAND_TERMS {
            return None;
        }
        let mut next = Vec::with_capacity(acc.len() * terms.len());
        for a in &acc {
            for t in &terms {
                next.push(Expr::product(vec![a.clone(), t.clone()]));
            }
        }
        acc = Expr::sum(next).terms();
    }
    Some(Expr::sum(acc))
}

fn trig_rewrite(expr: Expr) -> Expr {
    match expr {
        Expr::Add(terms) => pythagorean(terms),
        Expr::Mul(_) => sin_over_cos(expr),
        other => other,
    }
}

/// argument `u` of a factor `f(u)**2` of `term`
fn squared_argument(term: &Expr, f: Func) -> Option<Expr> {
    term.factors().into_iter().find_map(|factor| match factor {
        Expr::Pow(base, exp) if exp.as_integer() == Some(2) => match *base {
            Expr::Fun(g, u) if g == f => Some(*u),
            _ => None,
        },
        _ => None,
    })
}

fn pythagorean(mut terms: Vec<Expr>) -> Expr {
    let mut changed = true;
    while changed {
        changed = false;
        'scan: for i in 0..terms.len() {
            for (f, partner_fn) in [(Func::Sin, Func::Cos), (Func::Cos, Func::Sin)] {
                let Some(u) = squared_argument(&terms[i], f) else {
                    continue;
                };
                let rest = terms[i].clone() / Expr::func(f, u.clone()).powi(2);
                let partner_square = Expr::func(partner_fn, u).powi(2);
                let partner = rest.clone() * partner_square.clone();
                let negated = -rest.clone();
                let replacement = if let Some(j) = terms.iter().position(|t| *t == partner) {
                    Some((j, rest))
                } else {
                    terms
                        .iter()
                        .position(|t| *t == negated)
                        .map(|j| (j, negated * partner_square))
                };
                if let Some((j, new_term)) = replacement {
                    if j == i {
                        continue;
                    }
                    terms.remove(i.max(j));
                    terms.remove(i.min(j));
                    terms.push(new_term);
                    changed = true;
                    break 'scan;
                }
            }
        }
    }
    Expr::sum(terms)
}

fn sin_over_cos(expr: Expr) -> Expr {
    let factors = expr.factors();
    for factor in &factors {
        let (base, exp) = factor.as_base_exp();
        if let Expr::Fun(Func::Sin, u) = &base {
            let cos_factor = Expr::power(Expr::func(Func::Cos, (**u).clone()), -exp.clone());
            if factors.contains(&cos_factor) {
                let tan = Expr::power(Expr::func(Func::Tan, (**u).clone()), exp);
                return expr / (factor.clone() * cos_factor) * tan;
            }
        }
    }
    expr
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Expr {
        Expr::parse_expression(text).unwrap()
    }

    #[test]
    fn test_expand() {
        assert_eq!(parse("(x + 1)**2").expand().to_string(), "x**2 + 2*x + 1");
        assert_eq!(parse("x*(x - 1)").expand().to_string(), "x**2 - x");
        assert_eq!(parse("(x + y)*(x - y)").expand().to_string(), "x**2 - y**2");
        assert_eq!(parse("sin(x)").expand(), parse("sin(x)"));
    }

    #[test]
    fn test_cancel() {
        assert_eq!(parse("(x**2 - 1)/(x - 1)").cancel().to_string(), "x + 1");
        assert_eq!(parse("1/x + 1/x**2").cancel(), parse("(x + 1)/x**2"));
        assert_eq!(parse("x*y/x"), parse("y"));
    }

    #[test]
    fn test_trig_identities() {
        assert_eq!(parse("sin(x)**2 + cos(x)**2").simplify(), Expr::one());
        assert_eq!(parse("3*sin(x)**2 + 3*cos(x)**2").simplify(), Expr::int(3));
        assert_eq!(parse("1 - sin(x)**2").simplify(), parse("cos(x)**2"));
        assert_eq!(parse("sin(x)/cos(x)").simplify(), parse("tan(x)"));
    }

    #[test]
    fn test_simplify_prefers_smaller_form() {
        assert_eq!(parse("(x**2 - 1)/(x - 1)").simplify(), parse("x + 1"));
        assert_eq!(parse("(x + 1)**2 - x**2").simplify(), parse("2*x + 1"));
        // already minimal input stays as it is
        assert_eq!(parse("(x + 1)**10").simplify(), parse("(x + 1)**10"));
        assert_eq!(parse("exp(sin(x)**2 + cos(x)**2)").simplify(), parse("E"));
    }

    #[test]
    fn test_simplify_is_idempotent() {
        for text in [
            "x**2 + 2*x + 1",
            "(x**3 - x)/(x**2 - x)",
            "sin(x)**2 + cos(x)**2 + x",
            "log(x)*exp(2*x)/(x + 1)**2",
            "2.5*x + y/3",
        ] {
            let once = parse(text).simplify();
            let twice = parse(&once.to_string()).simplify();
            assert_eq!(once.to_string(), twice.to_string(), "input {}", text);
        }
    }
}
