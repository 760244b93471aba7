//! Canonicalising constructors of [`Expr`].
//!
//! All arithmetic in the engine funnels through the four constructors here. They apply the cheap,
//! always-valid rewrites (the ones a computer algebra system performs automatically on
//! construction) and leave everything costly, like expansion or cancellation, to `simplify`.

use crate::symbolic::number::Number;
use crate::symbolic::symbolic_engine::{Expr, Func};

impl Expr {
    /// Canonical sum of `terms`.
    ///
    /// Nested sums are flattened, numbers are folded into one trailing constant and like terms
    /// are collected by adding their numeric coefficients (`2*x + 3*x -> 5*x`).
    pub fn sum(terms: Vec<Expr>) -> Expr {
        let mut constant = Number::int(0);
        let mut collected: Vec<(Expr, Number)> = Vec::new();
        let mut flat = Vec::with_capacity(terms.len());
        for term in terms {
            match term {
                Expr::Add(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        for term in flat {
            match term {
                Expr::Const(n) => constant = constant.add(&n),
                other => {
                    let (coeff, rest) = other.split_coefficient();
                    match collected.iter_mut().find(|(e, _)| *e == rest) {
                        Some(entry) => entry.1 = entry.1.add(&coeff),
                        None => collected.push((rest, coeff)),
                    }
                }
            }
        }
        let mut result: Vec<Expr> = collected
            .into_iter()
            .filter(|(_, c)| !c.is_zero())
            .map(|(rest, c)| Expr::with_coefficient(c, rest))
            .collect();
        result.sort_by(|a, b| a.term_cmp(b));
        if result.is_empty() {
            return Expr::Const(constant);
        }
        if !constant.is_zero() {
            result.push(Expr::Const(constant));
        }
        if result.len() == 1 {
            result.remove(0)
        } else {
            Expr::Add(result)
        }
    }

    /// Canonical product of `factors`.
    ///
    /// Nested products are flattened, numbers folded into a leading coefficient, equal bases
    /// merged by adding exponents (`x*x**2 -> x**3`) and exponentials merged into one
    /// (`exp(a)*exp(b) -> exp(a + b)`). A lone sum multiplied by a number is distributed,
    /// `2*(x + 1) -> 2*x + 2`.
    pub fn product(factors: Vec<Expr>) -> Expr {
        let mut coeff = Number::int(1);
        let mut powers: Vec<(Expr, Expr)> = Vec::new();
        let mut exp_args: Vec<Expr> = Vec::new();
        let mut flat = Vec::with_capacity(factors.len());
        for factor in factors {
            match factor {
                Expr::Mul(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        for factor in flat {
            match factor {
                Expr::Const(n) => coeff = coeff.mul(&n),
                Expr::Fun(Func::Exp, arg) => exp_args.push(*arg),
                Expr::E => exp_args.push(Expr::one()),
                other => {
                    let (base, exponent) = match other {
                        Expr::Pow(base, exponent) => (*base, *exponent),
                        atom => (atom, Expr::one()),
                    };
                    match powers.iter_mut().find(|(b, _)| *b == base) {
                        Some(entry) => {
                            let previous = std::mem::replace(&mut entry.1, Expr::zero());
                            entry.1 = Expr::sum(vec![previous, exponent]);
                        }
                        None => powers.push((base, exponent)),
                    }
                }
            }
        }
        if coeff.is_zero() {
            return Expr::Const(coeff);
        }
        let mut out = Vec::new();
        for (base, exponent) in powers {
            absorb_factor(Expr::power(base, exponent), &mut coeff, &mut out);
        }
        if !exp_args.is_empty() {
            absorb_factor(Expr::func(Func::Exp, Expr::sum(exp_args)), &mut coeff, &mut out);
        }
        if coeff.is_zero() {
            return Expr::Const(coeff);
        }
        out.sort_by(|a, b| a.factor_cmp(b));
        match out.len() {
            0 => Expr::Const(coeff),
            1 if coeff.is_one() => out.remove(0),
            1 if matches!(out[0], Expr::Add(_)) => {
                let terms = out.remove(0).terms();
                Expr::sum(
                    terms
                        .into_iter()
                        .map(|t| Expr::product(vec![Expr::Const(coeff.clone()), t]))
                        .collect(),
                )
            }
            _ => {
                if !coeff.is_one() {
                    out.insert(0, Expr::Const(coeff));
                }
                Expr::Mul(out)
            }
        }
    }

    /// Term with an explicit numeric coefficient, assuming `rest` is already canonical and not a
    /// sum.
    pub fn with_coefficient(coeff: Number, rest: Expr) -> Expr {
        if coeff.is_one() {
            return rest;
        }
        if coeff.is_zero() {
            return Expr::Const(coeff);
        }
        match rest {
            Expr::Const(n) => Expr::Const(coeff.mul(&n)),
            Expr::Mul(mut factors) => {
                if let Some(Expr::Const(c)) = factors.first() {
                    let merged = coeff.mul(c);
                    factors.remove(0);
                    return Expr::with_coefficient(merged, Expr::from_factors(factors));
                }
                factors.insert(0, Expr::Const(coeff));
                Expr::Mul(factors)
            }
            other => Expr::Mul(vec![Expr::Const(coeff), other]),
        }
    }

    fn from_factors(mut factors: Vec<Expr>) -> Expr {
        match factors.len() {
            0 => Expr::one(),
            1 => factors.remove(0),
            _ => Expr::Mul(factors),
        }
    }

    /// Canonical power `base ** exponent`.
    pub fn power(base: Expr, exponent: Expr) -> Expr {
        if exponent.is_zero() {
            return Expr::one();
        }
        if exponent.is_one() || matches!(&exponent, Expr::Const(Number::Float(v)) if *v == 1.0) {
            return base;
        }
        if base.is_one() {
            return Expr::one();
        }
        if let (Expr::Const(b), Expr::Const(e)) = (&base, &exponent) {
            if let Some(value) = b.pow(e) {
                return Expr::Const(value);
            }
            if b.is_zero() && !e.is_negative() {
                return Expr::Const(b.clone());
            }
            return Expr::Pow(base.boxed(), exponent.boxed());
        }
        if base.is_zero() && exponent.as_number().is_some_and(|e| !e.is_negative()) {
            return base;
        }
        let integer_exponent = exponent.as_number().is_some_and(|e| e.is_integer());
        match base {
            Expr::E => Expr::func(Func::Exp, exponent),
            Expr::Fun(Func::Exp, arg) if exponent.is_number() => {
                Expr::func(Func::Exp, Expr::product(vec![*arg, exponent]))
            }
            Expr::Pow(inner_base, inner_exp) if integer_exponent => {
                Expr::power(*inner_base, Expr::product(vec![*inner_exp, exponent]))
            }
            Expr::Mul(factors) if integer_exponent => Expr::product(
                factors
                    .into_iter()
                    .map(|f| Expr::power(f, exponent.clone()))
                    .collect(),
            ),
            other => Expr::Pow(other.boxed(), exponent.boxed()),
        }
    }

    /// Canonical function application, evaluating at special points and pulling signs out of
    /// odd and even functions.
    pub fn func(f: Func, arg: Expr) -> Expr {
        if let Expr::Const(Number::Float(v)) = &arg {
            let value = f.apply_f64(*v);
            if value.is_finite() {
                return Expr::float(value);
            }
        }
        if arg.could_extract_minus_sign() {
            if f.is_odd() {
                return -Expr::func(f, -arg);
            }
            if f.is_even() {
                return Expr::func(f, -arg);
            }
        }
        let special = match (f, &arg) {
            (Func::Exp, a) if a.is_zero() => Some(Expr::one()),
            (Func::Exp, a) if a.is_one() => Some(Expr::E),
            (Func::Exp, Expr::Fun(Func::Log, inner)) => Some((**inner).clone()),
            (Func::Log, a) if a.is_one() => Some(Expr::zero()),
            (Func::Log, Expr::E) => Some(Expr::one()),
            (Func::Sin | Func::Tan | Func::Asin | Func::Atan, a) if a.is_zero() => {
                Some(Expr::zero())
            }
            (Func::Sinh | Func::Tanh, a) if a.is_zero() => Some(Expr::zero()),
            (Func::Cos | Func::Cosh, a) if a.is_zero() => Some(Expr::one()),
            (Func::Acos, a) if a.is_one() => Some(Expr::zero()),
            (Func::Acos | Func::Acot, a) if a.is_zero() => {
                Some(Expr::product(vec![Expr::rational(1, 2), Expr::Pi]))
            }
            (Func::Sin | Func::Tan, Expr::Pi) => Some(Expr::zero()),
            (Func::Cos, Expr::Pi) => Some(Expr::int(-1)),
            _ => None,
        };
        special.unwrap_or_else(|| Expr::Fun(f, arg.boxed()))
    }

    /// Negative number or product with a negative coefficient.
    pub fn could_extract_minus_sign(&self) -> bool {
        match self {
            Expr::Const(n) => n.is_negative(),
            Expr::Mul(_) => self.is_negative_term(),
            _ => false,
        }
    }
}

fn absorb_factor(factor: Expr, coeff: &mut Number, out: &mut Vec<Expr>) {
    match factor {
        Expr::Const(n) => *coeff = coeff.mul(&n),
        Expr::Mul(inner) => {
            for f in inner {
                absorb_factor(f, coeff, out);
            }
        }
        other => out.push(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> Expr {
        Expr::var("x")
    }

    fn y() -> Expr {
        Expr::var("y")
    }

    #[test]
    fn test_sum_collects_like_terms() {
        let e = Expr::sum(vec![x(), x(), Expr::int(1), Expr::int(2)]);
        assert_eq!(e, Expr::Add(vec![Expr::Mul(vec![Expr::int(2), x()]), Expr::int(3)]));
        let cancelled = x() - x();
        assert_eq!(cancelled, Expr::zero());
    }

    #[test]
    fn test_product_merges_powers() {
        let e = x() * x() * x();
        assert_eq!(e, Expr::Pow(x().boxed(), Expr::int(3).boxed()));
        assert_eq!(x() / x(), Expr::one());
        assert_eq!(Expr::int(0) * y(), Expr::zero());
    }

    #[test]
    fn test_product_distributes_number_over_sum() {
        let e = Expr::int(2) * (x() + Expr::one());
        assert_eq!(
            e,
            Expr::Add(vec![Expr::Mul(vec![Expr::int(2), x()]), Expr::int(2)])
        );
    }

    #[test]
    fn test_power_rules() {
        assert_eq!(x().powi(0), Expr::one());
        assert_eq!(x().powi(1), x());
        assert_eq!(x().powi(2).powi(3), x().powi(6));
        assert_eq!(Expr::int(4).sqrt(), Expr::int(2));
        assert_eq!(Expr::E.pow(x()), x().exp());
        assert_eq!((Expr::int(2) * x()).powi(2), Expr::int(4) * x().powi(2));
    }

    #[test]
    fn test_function_special_values() {
        assert_eq!(Expr::zero().sin(), Expr::zero());
        assert_eq!(Expr::zero().cos(), Expr::one());
        assert_eq!(x().ln().exp(), x());
        assert_eq!((-x()).sin(), -(x().sin()));
        assert_eq!((-x()).cos(), x().cos());
        assert_eq!(x().exp() * (-x()).exp(), Expr::one());
    }
}
