//! # Symbolic Engine Module
//!
//! Core expression type of the calculator. Every expression handed out by this module is kept in
//! a canonical form, so structurally equal trees mean equal expressions and printing the same
//! mathematical object always yields the same text.
//!
//! ## Purpose
//!
//! The symbolic engine allows users to:
//! - Parse text into symbolic expressions (`parse_expr`)
//! - Differentiate, integrate, simplify and expand into Taylor series
//! - Substitute variables and evaluate numerically
//!
//! ## Main Structures and Methods
//!
//! ### `Expr` Enum
//! - **Atoms**: `Const(Number)` exact or float number, `Var(String)` symbol, `Pi`, `E`
//! - **n-ary operations**: `Add(Vec<Expr>)`, `Mul(Vec<Expr>)`
//! - **Power**: `Pow(base, exponent)`; subtraction and division are expressed through
//!   `-1*b` and `b**-1`
//! - **Functions**: `Fun(Func, arg)` for exp, log and the trigonometric/hyperbolic family
//!
//! ### Canonical form
//! Construction goes through `Expr::sum`, `Expr::product`, `Expr::power` and `Expr::func`
//! (see `symbolic_arithmetic`) which:
//! 1. flatten nested sums and products,
//! 2. fold numbers exactly,
//! 3. collect like terms (`x + x -> 2*x`) and like factors (`x*x -> x**2`),
//! 4. sort operands deterministically,
//! 5. evaluate functions at special points (`sin(0) -> 0`, `exp(log(u)) -> u`).
//!
//! The `std::ops` operators are implemented on top of them, so `x.clone() * x` is `x**2`.
//!
//! ### Key Methods
//! - `substitute_variable(var, expr)` / `set_variable_from_map(map)` - substitution
//! - `contains_variable(var)` / `extract_variables()` - free symbol queries
//! - `complexity()` - node count used by the simplifier to rank candidates

use crate::symbolic::number::Number;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::f64::consts::PI;
use strum_macros::{Display, EnumIter, EnumString};

/// Elementary functions of one argument.
///
/// `Display` gives the canonical name. Parsing also accepts the classic aliases
/// (`ln`, `tg`, `ctg`, `arcsin`, `arctg`, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, EnumIter)]
pub enum Func {
    #[strum(to_string = "exp")]
    Exp,
    #[strum(to_string = "log", serialize = "ln")]
    Log,
    #[strum(to_string = "sin")]
    Sin,
    #[strum(to_string = "cos")]
    Cos,
    #[strum(to_string = "tan", serialize = "tg")]
    Tan,
    #[strum(to_string = "cot", serialize = "ctg")]
    Cot,
    #[strum(to_string = "asin", serialize = "arcsin")]
    Asin,
    #[strum(to_string = "acos", serialize = "arccos")]
    Acos,
    #[strum(to_string = "atan", serialize = "arctan", serialize = "arctg")]
    Atan,
    #[strum(to_string = "acot", serialize = "arccot", serialize = "arcctg")]
    Acot,
    #[strum(to_string = "sinh")]
    Sinh,
    #[strum(to_string = "cosh")]
    Cosh,
    #[strum(to_string = "tanh")]
    Tanh,
}

impl Func {
    /// numeric value of the function; NaN or infinity outside its real domain
    pub fn apply_f64(&self, x: f64) -> f64 {
        match self {
            Func::Exp => x.exp(),
            Func::Log => x.ln(),
            Func::Sin => x.sin(),
            Func::Cos => x.cos(),
            Func::Tan => x.tan(),
            Func::Cot => 1.0 / x.tan(),
            Func::Asin => x.asin(),
            Func::Acos => x.acos(),
            Func::Atan => x.atan(),
            Func::Acot => {
                if x == 0.0 {
                    PI / 2.0
                } else {
                    (1.0 / x).atan()
                }
            }
            Func::Sinh => x.sinh(),
            Func::Cosh => x.cosh(),
            Func::Tanh => x.tanh(),
        }
    }
    /// f(-u) == -f(u)
    pub fn is_odd(&self) -> bool {
        matches!(
            self,
            Func::Sin
                | Func::Tan
                | Func::Cot
                | Func::Asin
                | Func::Atan
                | Func::Acot
                | Func::Sinh
                | Func::Tanh
        )
    }
    /// f(-u) == f(u)
    pub fn is_even(&self) -> bool {
        matches!(self, Func::Cos | Func::Cosh)
    }
}

/// Symbolic expression tree in canonical form.
///
/// Build values with the constructors (`Expr::sum`, `Expr::product`, `Expr::power`,
/// `Expr::func`, the operators) rather than the raw variants; the rest of the engine relies on
/// the canonical invariants they maintain:
/// - `Add` has at least two terms, none of them an `Add`, numbers folded into one trailing term
/// - `Mul` has at least two factors, none of them a `Mul`, an optional leading numeric
///   coefficient different from one
/// - `Pow` never has exponent zero or one
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// exact or floating point number
    Const(Number),
    /// symbolic variable
    Var(String),
    /// the constant pi
    Pi,
    /// Euler's number
    E,
    /// sum of terms
    Add(Vec<Expr>),
    /// product of factors
    Mul(Vec<Expr>),
    /// base ** exponent
    Pow(Box<Expr>, Box<Expr>),
    /// elementary function applied to one argument
    Fun(Func, Box<Expr>),
}

impl std::ops::Add for Expr {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Expr::sum(vec![self, rhs])
    }
}

impl std::ops::Sub for Expr {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Expr::sum(vec![self, -rhs])
    }
}

impl std::ops::Mul for Expr {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Expr::product(vec![self, rhs])
    }
}

impl std::ops::Div for Expr {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        Expr::product(vec![self, rhs.recip()])
    }
}

impl std::ops::Neg for Expr {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Expr::product(vec![Expr::int(-1), self])
    }
}

impl Expr {
    /// BASIC FEATURES

    pub fn int(value: i64) -> Expr {
        Expr::Const(Number::int(value))
    }

    pub fn rational(numer: i64, denom: i64) -> Expr {
        Expr::Const(Number::rational(numer, denom))
    }

    pub fn float(value: f64) -> Expr {
        Expr::Const(Number::Float(value))
    }

    pub fn zero() -> Expr {
        Expr::int(0)
    }

    pub fn one() -> Expr {
        Expr::int(1)
    }

    pub fn var(name: &str) -> Expr {
        Expr::Var(name.to_string())
    }

    /// Convenience method to wrap expression in Box for recursive structures.
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    pub fn powi(self, exponent: i64) -> Expr {
        Expr::power(self, Expr::int(exponent))
    }

    pub fn pow(self, exponent: Expr) -> Expr {
        Expr::power(self, exponent)
    }

    pub fn recip(self) -> Expr {
        Expr::power(self, Expr::int(-1))
    }

    pub fn sqrt(self) -> Expr {
        Expr::power(self, Expr::rational(1, 2))
    }

    pub fn exp(self) -> Expr {
        Expr::func(Func::Exp, self)
    }

    pub fn ln(self) -> Expr {
        Expr::func(Func::Log, self)
    }

    pub fn sin(self) -> Expr {
        Expr::func(Func::Sin, self)
    }

    pub fn cos(self) -> Expr {
        Expr::func(Func::Cos, self)
    }

    /// NUMBER QUERIES

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Expr::Const(n) => Some(n),
            _ => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Expr::Const(_))
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Const(n) if n.is_zero())
    }

    pub fn is_one(&self) -> bool {
        matches!(self, Expr::Const(n) if n.is_one())
    }

    /// exact integer constant
    pub fn as_integer(&self) -> Option<i64> {
        self.as_number().and_then(|n| n.to_i64())
    }

    /// Numeric coefficient of a term and the remaining factors: `3*x*y -> (3, x*y)`.
    pub fn split_coefficient(&self) -> (Number, Expr) {
        match self {
            Expr::Const(n) => (n.clone(), Expr::one()),
            Expr::Mul(factors) => match factors.first() {
                Some(Expr::Const(c)) => {
                    let rest = &factors[1..];
                    let rest = if rest.len() == 1 {
                        rest[0].clone()
                    } else {
                        Expr::Mul(rest.to_vec())
                    };
                    (c.clone(), rest)
                }
                _ => (Number::int(1), self.clone()),
            },
            _ => (Number::int(1), self.clone()),
        }
    }

    /// a term printed with a leading minus sign
    pub fn is_negative_term(&self) -> bool {
        match self {
            Expr::Const(n) => n.is_negative(),
            Expr::Mul(factors) => matches!(factors.first(), Some(Expr::Const(c)) if c.is_negative()),
            _ => false,
        }
    }

    /// Base and exponent of a factor: `x**2 -> (x, 2)`, `sin(x) -> (sin(x), 1)`.
    pub fn as_base_exp(&self) -> (Expr, Expr) {
        match self {
            Expr::Pow(base, exp) => ((**base).clone(), (**exp).clone()),
            _ => (self.clone(), Expr::one()),
        }
    }

    /// Terms of a sum, or the expression itself as the single term.
    pub fn terms(&self) -> Vec<Expr> {
        match self {
            Expr::Add(terms) => terms.clone(),
            _ => vec![self.clone()],
        }
    }

    /// Factors of a product, or the expression itself as the single factor.
    pub fn factors(&self) -> Vec<Expr> {
        match self {
            Expr::Mul(factors) => factors.clone(),
            _ => vec![self.clone()],
        }
    }

    /// SUBSTITUTION

    /// substitute a variable with an expression, re-canonicalising on the way up
    pub fn substitute_variable(&self, var: &str, expr: &Expr) -> Expr {
        match self {
            Expr::Var(name) if name == var => expr.clone(),
            Expr::Const(_) | Expr::Var(_) | Expr::Pi | Expr::E => self.clone(),
            Expr::Add(terms) => {
                Expr::sum(terms.iter().map(|t| t.substitute_variable(var, expr)).collect())
            }
            Expr::Mul(factors) => Expr::product(
                factors
                    .iter()
                    .map(|f| f.substitute_variable(var, expr))
                    .collect(),
            ),
            Expr::Pow(base, exp) => Expr::power(
                base.substitute_variable(var, expr),
                exp.substitute_variable(var, expr),
            ),
            Expr::Fun(f, arg) => Expr::func(*f, arg.substitute_variable(var, expr)),
        }
    }

    /// Substitutes multiple variables with constant values using a HashMap.
    ///
    /// Only variables present in the map are substituted; values enter the tree as floats, so
    /// `x + 1` with `x = 3` becomes the float `4.0`.
    pub fn set_variable_from_map(&self, var_map: &HashMap<String, f64>) -> Expr {
        match self {
            Expr::Var(name) => match var_map.get(name) {
                Some(value) => Expr::float(*value),
                None => self.clone(),
            },
            Expr::Const(_) | Expr::Pi | Expr::E => self.clone(),
            Expr::Add(terms) => Expr::sum(
                terms
                    .iter()
                    .map(|t| t.set_variable_from_map(var_map))
                    .collect(),
            ),
            Expr::Mul(factors) => Expr::product(
                factors
                    .iter()
                    .map(|f| f.set_variable_from_map(var_map))
                    .collect(),
            ),
            Expr::Pow(base, exp) => Expr::power(
                base.set_variable_from_map(var_map),
                exp.set_variable_from_map(var_map),
            ),
            Expr::Fun(f, arg) => Expr::func(*f, arg.set_variable_from_map(var_map)),
        }
    }

    /// Rebuilds the tree bottom-up with `map` applied to every node after its children.
    pub fn map_bottom_up(&self, map: &dyn Fn(Expr) -> Expr) -> Expr {
        let rebuilt = match self {
            Expr::Const(_) | Expr::Var(_) | Expr::Pi | Expr::E => self.clone(),
            Expr::Add(terms) => Expr::sum(terms.iter().map(|t| t.map_bottom_up(map)).collect()),
            Expr::Mul(factors) => {
                Expr::product(factors.iter().map(|f| f.map_bottom_up(map)).collect())
            }
            Expr::Pow(base, exp) => Expr::power(base.map_bottom_up(map), exp.map_bottom_up(map)),
            Expr::Fun(f, arg) => Expr::func(*f, arg.map_bottom_up(map)),
        };
        map(rebuilt)
    }

    /// VARIABLE QUERIES

    /// check if the expression contains a variable
    pub fn contains_variable(&self, var_name: &str) -> bool {
        match self {
            Expr::Var(name) => name == var_name,
            Expr::Const(_) | Expr::Pi | Expr::E => false,
            Expr::Add(items) | Expr::Mul(items) => {
                items.iter().any(|e| e.contains_variable(var_name))
            }
            Expr::Pow(base, exp) => {
                base.contains_variable(var_name) || exp.contains_variable(var_name)
            }
            Expr::Fun(_, arg) => arg.contains_variable(var_name),
        }
    }

    /// sorted names of all free symbols
    pub fn extract_variables(&self) -> Vec<String> {
        let mut names = BTreeSet::new();
        self.collect_variables(&mut names);
        names.into_iter().collect()
    }

    fn collect_variables(&self, names: &mut BTreeSet<String>) {
        match self {
            Expr::Var(name) => {
                names.insert(name.clone());
            }
            Expr::Const(_) | Expr::Pi | Expr::E => {}
            Expr::Add(items) | Expr::Mul(items) => {
                items.iter().for_each(|e| e.collect_variables(names))
            }
            Expr::Pow(base, exp) => {
                base.collect_variables(names);
                exp.collect_variables(names);
            }
            Expr::Fun(_, arg) => arg.collect_variables(names),
        }
    }

    pub fn is_free_of_symbols(&self) -> bool {
        match self {
            Expr::Var(_) => false,
            Expr::Const(_) | Expr::Pi | Expr::E => true,
            Expr::Add(items) | Expr::Mul(items) => items.iter().all(|e| e.is_free_of_symbols()),
            Expr::Pow(base, exp) => base.is_free_of_symbols() && exp.is_free_of_symbols(),
            Expr::Fun(_, arg) => arg.is_free_of_symbols(),
        }
    }

    /// true if any float constant occurs in the tree
    pub fn has_float(&self) -> bool {
        match self {
            Expr::Const(n) => n.is_float(),
            Expr::Var(_) | Expr::Pi | Expr::E => false,
            Expr::Add(items) | Expr::Mul(items) => items.iter().any(|e| e.has_float()),
            Expr::Pow(base, exp) => base.has_float() || exp.has_float(),
            Expr::Fun(_, arg) => arg.has_float(),
        }
    }

    /// Node count with a small surcharge for divisions and functions; the simplifier keeps the
    /// candidate with the smallest value.
    pub fn complexity(&self) -> usize {
        match self {
            Expr::Const(n) => {
                if n.is_negative() || !n.is_integer() {
                    2
                } else {
                    1
                }
            }
            Expr::Var(_) | Expr::Pi | Expr::E => 1,
            Expr::Add(items) | Expr::Mul(items) => {
                items.len() - 1 + items.iter().map(|e| e.complexity()).sum::<usize>()
            }
            Expr::Pow(base, exp) => {
                let surcharge = if exp.is_negative_term() { 2 } else { 1 };
                surcharge + base.complexity() + exp.complexity()
            }
            Expr::Fun(_, arg) => 2 + arg.complexity(),
        }
    }

    /// Polynomial degree used to order the terms of a sum: symbols count one, numeric powers
    /// multiply, everything else counts zero.
    pub fn degree(&self) -> f64 {
        match self {
            Expr::Var(_) => 1.0,
            Expr::Const(_) | Expr::Pi | Expr::E | Expr::Fun(..) => 0.0,
            Expr::Add(terms) => terms
                .iter()
                .map(|t| t.degree())
                .fold(0.0, f64::max),
            Expr::Mul(factors) => factors.iter().map(|f| f.degree()).sum(),
            Expr::Pow(base, exp) => match exp.as_ref() {
                Expr::Const(n) => base.degree() * n.to_f64(),
                _ => 0.0,
            },
        }
    }

    /// ORDERING

    fn rank(&self) -> u8 {
        match self {
            Expr::Const(_) => 0,
            Expr::Pi => 1,
            Expr::E => 2,
            Expr::Var(_) => 3,
            Expr::Pow(..) => 4,
            Expr::Mul(_) => 5,
            Expr::Add(_) => 6,
            Expr::Fun(..) => 7,
        }
    }

    /// Deterministic total order on expressions used for canonical sorting.
    pub fn structural_cmp(&self, other: &Expr) -> Ordering {
        match (self, other) {
            (Expr::Const(a), Expr::Const(b)) => a.cmp_value(b),
            (Expr::Var(a), Expr::Var(b)) => a.cmp(b),
            (Expr::Pow(b1, e1), Expr::Pow(b2, e2)) => {
                b1.structural_cmp(b2).then_with(|| e1.structural_cmp(e2))
            }
            (Expr::Add(a), Expr::Add(b)) | (Expr::Mul(a), Expr::Mul(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    let ord = x.structural_cmp(y);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            (Expr::Fun(f1, a1), Expr::Fun(f2, a2)) => f1.cmp(f2).then_with(|| a1.structural_cmp(a2)),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    /// Order of factors inside a product: by base, then by exponent.
    pub fn factor_cmp(&self, other: &Expr) -> Ordering {
        let (b1, e1) = self.base_exp_ref();
        let (b2, e2) = other.base_exp_ref();
        b1.structural_cmp(b2).then_with(|| match (e1, e2) {
            (Some(a), Some(b)) => a.structural_cmp(b),
            (Some(a), None) => a.structural_cmp(&Expr::one()),
            (None, Some(b)) => Expr::one().structural_cmp(b),
            (None, None) => Ordering::Equal,
        })
    }

    fn base_exp_ref(&self) -> (&Expr, Option<&Expr>) {
        match self {
            Expr::Pow(base, exp) => (base.as_ref(), Some(exp.as_ref())),
            _ => (self, None),
        }
    }

    /// Order of terms inside a sum: symbolic terms by descending degree, then symbol-free
    /// terms, then the numeric constant.
    pub fn term_cmp(&self, other: &Expr) -> Ordering {
        let group = |e: &Expr| {
            if e.is_number() {
                2
            } else if e.is_free_of_symbols() {
                1
            } else {
                0
            }
        };
        let (c1, r1) = self.split_coefficient();
        let (c2, r2) = other.split_coefficient();
        group(self)
            .cmp(&group(other))
            .then_with(|| other.degree().total_cmp(&self.degree()))
            .then_with(|| r1.structural_cmp(&r2))
            .then_with(|| c1.cmp_value(&c2))
    }
}
