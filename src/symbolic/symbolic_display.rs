//! Text rendering of expressions.
//!
//! The output uses `**` for powers, `sqrt(..)` for square roots and writes negative powers as
//! division: `x**5/120 + x**4/24`, `-(x - 1)**2/8`, `1/(x + 1)`. Every string produced here is
//! accepted by the parser and parses back to the same canonical tree, so re-running an operation
//! on its own output is stable.

use crate::symbolic::number::Number;
use crate::symbolic::symbolic_engine::Expr;
use std::fmt;

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&render(self))
    }
}

fn render(expr: &Expr) -> String {
    match expr {
        Expr::Const(n) => n.to_string(),
        Expr::Var(name) => name.clone(),
        Expr::Pi => "pi".to_string(),
        Expr::E => "E".to_string(),
        Expr::Add(terms) => render_sum(terms),
        Expr::Mul(_) => render_product(expr),
        Expr::Pow(base, exp) => render_power(base, exp),
        Expr::Fun(func, arg) => format!("{}({})", func, render(arg)),
    }
}

fn render_sum(terms: &[Expr]) -> String {
    let mut out = String::new();
    for (i, term) in terms.iter().enumerate() {
        let negative = term.is_negative_term();
        let body = if negative {
            render(&negate_term(term))
        } else {
            render(term)
        };
        match (i, negative) {
            (0, true) => out.push('-'),
            (0, false) => {}
            (_, true) => out.push_str(" - "),
            (_, false) => out.push_str(" + "),
        }
        out.push_str(&body);
    }
    out
}

fn negate_term(term: &Expr) -> Expr {
    let (coeff, rest) = term.split_coefficient();
    Expr::with_coefficient(coeff.neg(), rest)
}

fn render_product(expr: &Expr) -> String {
    let (coeff, rest) = expr.split_coefficient();
    if coeff.is_negative() {
        return format!("-{}", render_product_parts(&coeff.neg(), &rest.factors()));
    }
    render_product_parts(&coeff, &rest.factors())
}

fn render_product_parts(coeff: &Number, factors: &[Expr]) -> String {
    let mut numer: Vec<String> = Vec::new();
    let mut denom: Vec<String> = Vec::new();
    match coeff.numer_denom() {
        Some((p, q)) => {
            if p != num::BigInt::from(1) {
                numer.push(p.to_string());
            }
            if q != num::BigInt::from(1) {
                denom.push(q.to_string());
            }
        }
        None => numer.push(coeff.to_string()),
    }
    for factor in factors {
        match factor {
            Expr::Pow(base, exp) if matches!(exp.as_ref(), Expr::Const(Number::Rational(_)) if exp.is_negative_term()) => {
                let positive = match exp.as_number() {
                    Some(n) => n.neg(),
                    None => continue,
                };
                if positive.is_one() {
                    denom.push(render_factor(base));
                } else {
                    denom.push(render_power(base, &Expr::Const(positive)));
                }
            }
            other => numer.push(render_factor(other)),
        }
    }
    let numerator = if numer.is_empty() {
        "1".to_string()
    } else {
        numer.join("*")
    };
    match denom.len() {
        0 => numerator,
        1 => format!("{}/{}", numerator, denom[0]),
        _ => format!("{}/({})", numerator, denom.join("*")),
    }
}

fn render_factor(factor: &Expr) -> String {
    match factor {
        Expr::Add(_) | Expr::Mul(_) => format!("({})", render(factor)),
        Expr::Const(n) if n.is_negative() => format!("({})", render(factor)),
        _ => render(factor),
    }
}

fn render_power(base: &Expr, exp: &Expr) -> String {
    if let Expr::Const(n @ Number::Rational(_)) = exp {
        if *n == Number::rational(1, 2) {
            return format!("sqrt({})", render(base));
        }
        if n.is_negative() {
            return render_product_parts(
                &Number::int(1),
                &[Expr::Pow(Box::new(base.clone()), Box::new(exp.clone()))],
            );
        }
    }
    let base_text = match base {
        Expr::Add(_) | Expr::Mul(_) | Expr::Pow(..) => format!("({})", render(base)),
        Expr::Const(n) if n.is_negative() || (!n.is_integer() && !n.is_float()) => {
            format!("({})", render(base))
        }
        _ => render(base),
    };
    let exp_text = match exp {
        Expr::Const(n) if n.is_negative() || (!n.is_integer() && !n.is_float()) => {
            format!("({})", render(exp))
        }
        Expr::Add(_) | Expr::Mul(_) | Expr::Pow(..) => format!("({})", render(exp)),
        _ => render(exp),
    };
    format!("{}**{}", base_text, exp_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> Expr {
        Expr::var("x")
    }

    #[test]
    fn test_polynomial_text() {
        let e = x().powi(2) + Expr::int(2) * x() + Expr::one();
        assert_eq!(e.to_string(), "x**2 + 2*x + 1");
        let d = Expr::int(2) * x() + Expr::int(2);
        assert_eq!(d.to_string(), "2*x + 2");
    }

    #[test]
    fn test_fractions_and_signs() {
        assert_eq!((x().powi(3) / Expr::int(3)).to_string(), "x**3/3");
        assert_eq!((-x()).to_string(), "-x");
        assert_eq!((x() - Expr::int(1)).to_string(), "x - 1");
        assert_eq!(Expr::rational(1, 3).to_string(), "1/3");
        assert_eq!((Expr::rational(3, 2) * x()).to_string(), "3*x/2");
        let shifted = Expr::rational(-1, 8) * (x() - Expr::one()).powi(2);
        assert_eq!(shifted.to_string(), "-(x - 1)**2/8");
    }

    #[test]
    fn test_powers_and_roots() {
        assert_eq!(x().sqrt().to_string(), "sqrt(x)");
        assert_eq!(x().recip().to_string(), "1/x");
        assert_eq!((x() + Expr::one()).recip().to_string(), "1/(x + 1)");
        assert_eq!(x().powi(-2).to_string(), "1/x**2");
        assert_eq!(x().pow(Expr::rational(1, 3)).to_string(), "x**(1/3)");
        assert_eq!(x().pow(Expr::float(2.5)).to_string(), "x**2.5");
        assert_eq!((x().sin().powi(2)).to_string(), "sin(x)**2");
    }

    #[test]
    fn test_functions_and_constants() {
        assert_eq!((x() * x().sin()).to_string(), "x*sin(x)");
        assert_eq!((Expr::Pi * x()).to_string(), "pi*x");
        assert_eq!((x() + x().sin()).to_string(), "x + sin(x)");
        assert_eq!(Expr::float(4.0).to_string(), "4.0");
    }
}
