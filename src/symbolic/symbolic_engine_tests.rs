//___________________________________TESTS____________________________________

#[cfg(test)]
mod tests {
    use crate::symbolic::symbolic_engine::Expr;
    use approx::assert_relative_eq;
    use std::collections::HashMap;
    use rand::Rng;

    fn parse(text: &str) -> Expr {
        Expr::parse_expression(text).unwrap()
    }

    fn at(x: f64) -> HashMap<String, f64> {
        HashMap::from([("x".to_string(), x)])
    }

    #[test]
    fn test_diff() {
        assert_eq!(parse("x**2 + 2*x + 1").diff("x").to_string(), "2*x + 2");
        assert_eq!(parse("sin(x)").diff("x").to_string(), "cos(x)");
        assert_eq!(parse("x**2").diff("y"), Expr::zero());
        assert_eq!(parse("exp(2*x)").diff("x").to_string(), "2*exp(2*x)");
        assert_eq!(parse("log(x)").diff("x").to_string(), "1/x");
        assert_eq!(parse("sqrt(x)").diff("x").to_string(), "1/(2*sqrt(x))");
        assert_eq!(parse("x*y").diff("y").to_string(), "x");
    }

    #[test]
    fn test_diff_chain_and_general_power() {
        let f = parse("sin(x**2)");
        assert_eq!(f.diff("x"), parse("2*x*cos(x**2)"));
        let g = parse("x**x");
        let dg = g.diff("x");
        // d/dx x^x = x^x (log(x) + 1)
        assert_relative_eq!(dg.eval_with(&at(2.0)).unwrap(), 4.0 * (2f64.ln() + 1.0), epsilon = 1e-12);
        let h = parse("2**x");
        assert_relative_eq!(h.diff("x").eval_with(&at(3.0)).unwrap(), 8.0 * 2f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_evalf() {
        assert_eq!(parse("2 + 3*4").evalf().unwrap(), 14.0);
        assert_eq!(parse("sqrt(16)").evalf().unwrap(), 4.0);
        assert_relative_eq!(parse("sin(pi/6)").evalf().unwrap(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(parse("log(8, 2)").evalf().unwrap(), 3.0, epsilon = 1e-12);
        assert!(parse("log(-1)").evalf().is_err());
        assert!(parse("1/0").evalf().is_err());
        assert!(parse("x + 1").evalf().is_err());
    }

    #[test]
    fn test_substitution() {
        let values = HashMap::from([("x".to_string(), 3.0)]);
        let substituted = parse("x + 1").set_variable_from_map(&values);
        assert_eq!(substituted.to_string(), "4.0");
        assert_eq!(substituted.evalf().unwrap(), 4.0);
        let partial = parse("x*y").set_variable_from_map(&values);
        assert_eq!(partial.to_string(), "3.0*y");
        let exact = parse("x**2 + 1").substitute_variable("x", &Expr::int(2));
        assert_eq!(exact, Expr::int(5));
    }

    #[test]
    fn test_taylor_series() {
        let series = parse("exp(x)").taylor_series("x", &Expr::zero(), 6).unwrap();
        assert_eq!(
            series.to_string(),
            "x**5/120 + x**4/24 + x**3/6 + x**2/2 + x + 1"
        );
        let series = parse("sin(x)").taylor_series("x", &Expr::zero(), 6).unwrap();
        assert_eq!(series.to_string(), "x**5/120 - x**3/6 + x");
        let series = parse("cos(x)").taylor_series("x", &Expr::zero(), 1).unwrap();
        assert_eq!(series, Expr::one());
    }

    #[test]
    fn test_taylor_series_away_from_zero() {
        let f = parse("log(x)");
        let series = f.taylor_series("x", &Expr::one(), 4).unwrap();
        // x - 1 - (x - 1)^2/2 + (x - 1)^3/3
        let x = 1.2;
        let t = x - 1.0;
        let expected = t - t * t / 2.0 + t * t * t / 3.0;
        assert_relative_eq!(series.eval_with(&at(x)).unwrap(), expected, epsilon = 1e-12);
        assert!(!series.to_string().contains('O'));
    }

    #[test]
    fn test_taylor_series_rejects_singular_points() {
        assert!(parse("1/x").taylor_series("x", &Expr::zero(), 3).is_err());
        assert!(parse("log(x)").taylor_series("x", &Expr::zero(), 3).is_err());
        assert!(parse("x").taylor_series("x", &Expr::var("x"), 3).is_err());
        assert!(parse("sin(x)/x**2").taylor_series("x", &Expr::zero(), 3).is_err());
        assert!(parse("sqrt(x)/x").taylor_series("x", &Expr::zero(), 3).is_err());
    }

    #[test]
    fn test_taylor_series_removable_singularities() {
        let series = parse("sin(x)/x").taylor_series("x", &Expr::zero(), 6).unwrap();
        assert_eq!(series.to_string(), "x**4/120 - x**2/6 + 1");
        let series = parse("(exp(x) - 1)/x").taylor_series("x", &Expr::zero(), 4).unwrap();
        assert_eq!(series.to_string(), "x**3/24 + x**2/6 + x/2 + 1");
        let series = parse("x/sin(x)").taylor_series("x", &Expr::zero(), 5).unwrap();
        assert_eq!(series.to_string(), "7*x**4/360 + x**2/6 + 1");
        let series = parse("(1 - cos(x))/x**2").taylor_series("x", &Expr::zero(), 2).unwrap();
        assert_eq!(series.to_string(), "1/2");
    }

    #[test]
    fn test_derivative_of_integral_is_integrand() {
        let integrands = [
            "x**3 - 2*x + 7",
            "exp(3*x) + cos(x)",
            "x*exp(x**2)",
            "1/(x**2 + 4)",
            "x**2*sin(x)",
            "log(x)",
            "sin(x)**2",
            "tan(x)",
            "x*log(x)",
        ];
        let mut rng = rand::rng();
        for text in integrands {
            let f = parse(text);
            let antiderivative = f.integrate("x").unwrap();
            let derivative = antiderivative.diff("x");
            for _ in 0..5 {
                let x: f64 = rng.random_range(0.1..1.4);
                let expected = f.eval_with(&at(x)).unwrap();
                let actual = derivative.eval_with(&at(x)).unwrap();
                assert_relative_eq!(actual, expected, epsilon = 1e-8, max_relative = 1e-8);
            }
        }
    }

    #[test]
    fn test_analytic_derivative_matches_finite_differences() {
        use crate::symbolic::utils::linspace;
        let f = parse("exp(sin(x))*x**2/(x + 2)");
        let df = f.diff("x");
        let h = 1e-6;
        for x in linspace(0.1, 2.0, 20) {
            let f_plus = f.eval_with(&at(x + h)).unwrap();
            let f_minus = f.eval_with(&at(x - h)).unwrap();
            let expected = (f_plus - f_minus) / (2.0 * h);
            assert_relative_eq!(df.eval_with(&at(x)).unwrap(), expected, epsilon = 1e-6);
        }
    }
}
