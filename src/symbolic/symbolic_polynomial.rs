//! Dense univariate polynomials with exact rational coefficients.
//!
//! Used by the simplifier to cancel common factors of rational functions and by the integrator
//! to split rational integrands into a polynomial part and a proper fraction.

use crate::symbolic::number::Number;
use crate::symbolic::symbolic_engine::Expr;
use num::BigRational;
use num_traits::{ToPrimitive, Zero};

/// degrees above this are not converted
const MAX_DEGREE: usize = 256;

#[derive(Clone, Debug, PartialEq)]
pub struct Polynomial {
    /// coefficients in ascending degree, without trailing zeros
    coeffs: Vec<BigRational>,
}

impl Polynomial {
    pub fn new(mut coeffs: Vec<BigRational>) -> Polynomial {
        while coeffs.last().is_some_and(|c| c.is_zero()) {
            coeffs.pop();
        }
        Polynomial { coeffs }
    }

    pub fn zero() -> Polynomial {
        Polynomial { coeffs: Vec::new() }
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// `None` for the zero polynomial
    pub fn degree(&self) -> Option<usize> {
        self.coeffs.len().checked_sub(1)
    }

    pub fn coeff(&self, k: usize) -> BigRational {
        self.coeffs.get(k).cloned().unwrap_or_else(BigRational::zero)
    }

    pub fn leading(&self) -> BigRational {
        self.coeffs.last().cloned().unwrap_or_else(BigRational::zero)
    }

    /// Reads `expr` as a polynomial in `var` with rational coefficients; `None` when other
    /// symbols, floats or non-polynomial terms occur.
    pub fn from_expr(expr: &Expr, var: &str) -> Option<Polynomial> {
        let expanded = expr.expand();
        let mut coeffs: Vec<BigRational> = Vec::new();
        for term in expanded.terms() {
            let (coeff, rest) = term.split_coefficient();
            let coeff = match coeff {
                Number::Rational(r) => r,
                Number::Float(_) => return None,
            };
            let degree = match &rest {
                r if r.is_one() => 0,
                Expr::Var(name) if name == var => 1,
                Expr::Pow(base, exp) => match (base.as_ref(), exp.as_integer()) {
                    (Expr::Var(name), Some(n)) if name == var && n > 0 => n.to_usize()?,
                    _ => return None,
                },
                _ => return None,
            };
            if degree > MAX_DEGREE {
                return None;
            }
            if coeffs.len() <= degree {
                coeffs.resize(degree + 1, BigRational::zero());
            }
            coeffs[degree] = &coeffs[degree] + coeff;
        }
        Some(Polynomial::new(coeffs))
    }

    pub fn to_expr(&self, var: &str) -> Expr {
        let terms = self
            .coeffs
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_zero())
            .map(|(k, c)| {
                Expr::Const(Number::Rational(c.clone())) * Expr::var(var).powi(k as i64)
            })
            .collect();
        Expr::sum(terms)
    }

    fn sub(&self, other: &Polynomial) -> Polynomial {
        let n = self.coeffs.len().max(other.coeffs.len());
        Polynomial::new((0..n).map(|k| self.coeff(k) - other.coeff(k)).collect())
    }

    pub fn mul(&self, other: &Polynomial) -> Polynomial {
        if self.is_zero() || other.is_zero() {
            return Polynomial::zero();
        }
        let mut coeffs = vec![BigRational::zero(); self.coeffs.len() + other.coeffs.len() - 1];
        for (i, a) in self.coeffs.iter().enumerate() {
            for (j, b) in other.coeffs.iter().enumerate() {
                coeffs[i + j] = &coeffs[i + j] + a * b;
            }
        }
        Polynomial::new(coeffs)
    }

    pub fn scale(&self, factor: &BigRational) -> Polynomial {
        Polynomial::new(self.coeffs.iter().map(|c| c * factor).collect())
    }

    /// quotient and remainder; `None` when dividing by zero
    pub fn div_rem(&self, divisor: &Polynomial) -> Option<(Polynomial, Polynomial)> {
        let divisor_degree = divisor.degree()?;
        let lead = divisor.leading();
        let mut remainder = self.clone();
        let mut quotient = vec![BigRational::zero(); self.coeffs.len().saturating_sub(divisor_degree).max(1)];
        while let Some(d) = remainder.degree() {
            if d < divisor_degree {
                break;
            }
            let shift = d - divisor_degree;
            let factor = remainder.leading() / &lead;
            quotient[shift] = &quotient[shift] + &factor;
            let mut term = vec![BigRational::zero(); shift + 1];
            term[shift] = factor;
            remainder = remainder.sub(&divisor.mul(&Polynomial::new(term)));
        }
        Some((Polynomial::new(quotient), remainder))
    }

    /// monic greatest common divisor
    pub fn gcd(&self, other: &Polynomial) -> Polynomial {
        let mut a = self.clone();
        let mut b = other.clone();
        while !b.is_zero() {
            let r = match a.div_rem(&b) {
                Some((_, r)) => r,
                None => break,
            };
            a = b;
            b = r;
        }
        a.monic()
    }

    pub fn monic(&self) -> Polynomial {
        if self.is_zero() {
            return self.clone();
        }
        let lead = self.leading();
        self.scale(&lead.recip())
    }

    /// antiderivative with zero constant term
    pub fn integral(&self) -> Polynomial {
        let mut coeffs = vec![BigRational::zero()];
        coeffs.extend(
            self.coeffs
                .iter()
                .enumerate()
                .map(|(k, c)| c / BigRational::from_integer((k as i64 + 1).into())),
        );
        Polynomial::new(coeffs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poly(coeffs: &[i64]) -> Polynomial {
        Polynomial::new(
            coeffs
                .iter()
                .map(|c| BigRational::from_integer((*c).into()))
                .collect(),
        )
    }

    #[test]
    fn test_from_expr() {
        let e = Expr::parse_expression("(x + 1)**2").unwrap();
        assert_eq!(Polynomial::from_expr(&e, "x"), Some(poly(&[1, 2, 1])));
        let not_poly = Expr::parse_expression("x + sin(x)").unwrap();
        assert_eq!(Polynomial::from_expr(&not_poly, "x"), None);
        let other_symbol = Expr::parse_expression("x + y").unwrap();
        assert_eq!(Polynomial::from_expr(&other_symbol, "x"), None);
    }

    #[test]
    fn test_division_and_gcd() {
        let p = poly(&[-1, 0, 1]);
        let q = poly(&[-1, 1]);
        let (quot, rem) = p.div_rem(&q).unwrap();
        assert_eq!(quot, poly(&[1, 1]));
        assert!(rem.is_zero());
        assert_eq!(p.gcd(&q), q);
        assert_eq!(poly(&[1, 1]).gcd(&poly(&[2, 1])), poly(&[1]));
    }

    #[test]
    fn test_to_expr() {
        assert_eq!(poly(&[1, 2, 1]).to_expr("x").to_string(), "x**2 + 2*x + 1");
        assert_eq!(poly(&[1, 0, 9]).integral(), poly(&[0, 1, 0, 3]));
    }
}
