//! Numeric atoms of the symbolic engine.
//!
//! Integer literals and everything derived from them exactly (sums, products, integer powers,
//! perfect roots) stay exact rationals with arbitrary precision. A literal written with a decimal
//! point or an exponent is a binary float, and float contaminates: any operation involving a float
//! produces a float.

use num::{BigInt, BigRational};
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::cmp::Ordering;
use std::fmt;

/// exact powers above this exponent are left unevaluated
const MAX_EXACT_EXPONENT: u64 = 4096;
/// roots above this degree are never extracted exactly
const MAX_EXACT_ROOT: u32 = 64;

#[derive(Clone, Debug, PartialEq)]
pub enum Number {
    Rational(BigRational),
    Float(f64),
}

impl Number {
    pub fn int(value: i64) -> Number {
        Number::Rational(BigRational::from_integer(BigInt::from(value)))
    }
    /// exact fraction `numer/denom`; a zero denominator yields NaN
    pub fn rational(numer: i64, denom: i64) -> Number {
        if denom == 0 {
            return Number::Float(f64::NAN);
        }
        Number::Rational(BigRational::new(BigInt::from(numer), BigInt::from(denom)))
    }

    pub fn float(value: f64) -> Number {
        Number::Float(value)
    }
    /// Reads a numeric literal as the parser delivers it: digits with an optional fraction and
    /// exponent. Literals with `.`, `e` or `E` become floats, all others exact integers.
    pub fn from_literal(text: &str) -> Option<Number> {
        if text.contains(['.', 'e', 'E']) {
            text.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Number::Float)
        } else {
            BigInt::parse_bytes(text.as_bytes(), 10)
                .map(|n| Number::Rational(BigRational::from_integer(n)))
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Number::Rational(r) => r.is_zero(),
            Number::Float(v) => *v == 0.0,
        }
    }
    /// exact one only: a float `1.0` coefficient is kept visible
    pub fn is_one(&self) -> bool {
        matches!(self, Number::Rational(r) if r.is_one())
    }

    pub fn is_negative(&self) -> bool {
        match self {
            Number::Rational(r) => r.is_negative(),
            Number::Float(v) => *v < 0.0,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Number::Float(_))
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Number::Rational(r) if r.is_integer())
    }

    pub fn to_integer(&self) -> Option<BigInt> {
        match self {
            Number::Rational(r) if r.is_integer() => Some(r.to_integer()),
            _ => None,
        }
    }

    pub fn to_i64(&self) -> Option<i64> {
        self.to_integer().and_then(|n| n.to_i64())
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            Number::Rational(r) => r.to_f64().unwrap_or(f64::NAN),
            Number::Float(v) => *v,
        }
    }
    /// numerator and denominator of an exact value
    pub fn numer_denom(&self) -> Option<(BigInt, BigInt)> {
        match self {
            Number::Rational(r) => Some((r.numer().clone(), r.denom().clone())),
            Number::Float(_) => None,
        }
    }

    pub fn add(&self, other: &Number) -> Number {
        match (self, other) {
            (Number::Rational(a), Number::Rational(b)) => Number::Rational(a + b),
            _ => Number::Float(self.to_f64() + other.to_f64()),
        }
    }

    pub fn mul(&self, other: &Number) -> Number {
        match (self, other) {
            (Number::Rational(a), Number::Rational(b)) => Number::Rational(a * b),
            _ => Number::Float(self.to_f64() * other.to_f64()),
        }
    }

    pub fn neg(&self) -> Number {
        match self {
            Number::Rational(r) => Number::Rational(-r),
            Number::Float(v) => Number::Float(-v),
        }
    }

    pub fn abs(&self) -> Number {
        match self {
            Number::Rational(r) => Number::Rational(r.abs()),
            Number::Float(v) => Number::Float(v.abs()),
        }
    }
    /// `None` for zero
    pub fn recip(&self) -> Option<Number> {
        if self.is_zero() {
            return None;
        }
        match self {
            Number::Rational(r) => Some(Number::Rational(r.recip())),
            Number::Float(v) => Some(Number::Float(1.0 / v)),
        }
    }

    /// Raises to a numeric power when the result is representable.
    ///
    /// Exact bases with integer exponents stay exact. Exact bases with fractional exponents are
    /// evaluated only when the root is itself rational (`8**(1/3) == 2`), otherwise `None` is
    /// returned so the caller keeps the power symbolic (`2**(1/2)` stays `sqrt(2)`). Division by
    /// zero and results that are not finite real numbers also give `None`.
    pub fn pow(&self, exponent: &Number) -> Option<Number> {
        match (self, exponent) {
            (Number::Rational(base), Number::Rational(exp)) => {
                if exp.is_integer() {
                    let n = exp.to_integer().to_i64()?;
                    if n.unsigned_abs() > MAX_EXACT_EXPONENT {
                        return None;
                    }
                    return rational_powi(base, n).map(Number::Rational);
                }
                if base.is_negative() {
                    return None;
                }
                let q = exp.denom().to_u32()?;
                let p = exp.numer().to_i64()?;
                if q > MAX_EXACT_ROOT || p.unsigned_abs() > MAX_EXACT_EXPONENT {
                    return None;
                }
                let root_numer = exact_root(base.numer(), q)?;
                let root_denom = exact_root(base.denom(), q)?;
                rational_powi(&BigRational::new(root_numer, root_denom), p).map(Number::Rational)
            }
            _ => {
                let value = self.to_f64().powf(exponent.to_f64());
                if value.is_finite() {
                    Some(Number::Float(value))
                } else {
                    None
                }
            }
        }
    }

    /// total order by value, exact before float on ties
    pub fn cmp_value(&self, other: &Number) -> Ordering {
        match (self, other) {
            (Number::Rational(a), Number::Rational(b)) => a.cmp(b),
            (Number::Rational(_), Number::Float(_)) => self
                .to_f64()
                .total_cmp(&other.to_f64())
                .then(Ordering::Less),
            (Number::Float(_), Number::Rational(_)) => self
                .to_f64()
                .total_cmp(&other.to_f64())
                .then(Ordering::Greater),
            (Number::Float(a), Number::Float(b)) => a.total_cmp(b),
        }
    }
}

fn rational_powi(base: &BigRational, n: i64) -> Option<BigRational> {
    if n < 0 && base.is_zero() {
        return None;
    }
    let mut result = BigRational::one();
    let mut acc = base.clone();
    let mut e = n.unsigned_abs();
    while e > 0 {
        if e & 1 == 1 {
            result = &result * &acc;
        }
        e >>= 1;
        if e > 0 {
            acc = &acc * &acc;
        }
    }
    Some(if n < 0 { result.recip() } else { result })
}

fn exact_root(value: &BigInt, degree: u32) -> Option<BigInt> {
    if value.is_negative() {
        return None;
    }
    let root = value.nth_root(degree);
    if &root.pow(degree) == value {
        Some(root)
    } else {
        None
    }
}

/// Float text that reads back as a float: always carries a `.` or an exponent.
pub(crate) fn format_float(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-6..1e16).contains(&magnitude) {
        format!("{:e}", value)
    } else if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Number::Rational(r) if r.is_integer() => write!(f, "{}", r.numer()),
            Number::Rational(r) => write!(f, "{}/{}", r.numer(), r.denom()),
            Number::Float(v) => write!(f, "{}", format_float(*v)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literals() {
        assert_eq!(Number::from_literal("42"), Some(Number::int(42)));
        assert_eq!(Number::from_literal("2.5"), Some(Number::Float(2.5)));
        assert_eq!(Number::from_literal("1e3"), Some(Number::Float(1000.0)));
        assert!(Number::from_literal("123456789012345678901234567890").is_some());
    }

    #[test]
    fn test_exact_arithmetic() {
        let third = Number::rational(1, 3);
        assert_eq!(third.add(&third).add(&third), Number::int(1));
        assert_eq!(Number::int(2).mul(&Number::rational(1, 2)), Number::int(1));
        assert_eq!(Number::int(2).add(&Number::Float(0.5)), Number::Float(2.5));
        assert_eq!(Number::int(0).recip(), None);
    }

    #[test]
    fn test_pow() {
        assert_eq!(Number::int(2).pow(&Number::int(10)), Some(Number::int(1024)));
        assert_eq!(Number::int(2).pow(&Number::int(-1)), Some(Number::rational(1, 2)));
        assert_eq!(Number::int(8).pow(&Number::rational(1, 3)), Some(Number::int(2)));
        assert_eq!(Number::rational(4, 9).pow(&Number::rational(1, 2)), Some(Number::rational(2, 3)));
        assert_eq!(Number::int(2).pow(&Number::rational(1, 2)), None);
        assert_eq!(Number::int(-4).pow(&Number::rational(1, 2)), None);
        assert_eq!(Number::int(0).pow(&Number::int(-1)), None);
        assert_eq!(Number::Float(4.0).pow(&Number::rational(1, 2)), Some(Number::Float(2.0)));
    }

    #[test]
    fn test_display() {
        assert_eq!(Number::rational(-1, 3).to_string(), "-1/3");
        assert_eq!(Number::int(7).to_string(), "7");
        assert_eq!(Number::Float(4.0).to_string(), "4.0");
        assert_eq!(Number::Float(0.25).to_string(), "0.25");
        assert_eq!(Number::Float(1e20).to_string(), "1e20");
    }
}
