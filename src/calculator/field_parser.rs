/// parse substitution lists like "x=2, y=3.5" typed into a single form field into a map from
/// variable name to value.
///
/// Keys are taken verbatim (trimmed): whether a key really is a symbol is decided later by the
/// service, so a key like `2x` is reported at the substitution stage rather than here.
use crate::calculator::service::SubstitutionMap;
use nom::{
    IResult, Parser,
    bytes::complete::{tag, take_while1},
    combinator::{all_consuming, map, map_res},
    multi::separated_list1,
    sequence::separated_pair,
};

/// format shown to the user when the list cannot be read
pub const SUBSTITUTION_EXAMPLE: &str = "x=2, y=3";

/// Parses a key: everything up to '=' or ','
fn parse_key(input: &str) -> IResult<&str, String> {
    let parser = take_while1(|c: char| !matches!(c, '=' | ','));
    let mut parser = map(parser, |s: &str| s.trim().to_string());
    parser.parse(input)
}

/// Parses a float value: everything up to the next ','
fn parse_value(input: &str) -> IResult<&str, f64> {
    let value_parser = take_while1(|c: char| c != ',');
    let mut value_parser = map_res(value_parser, |s: &str| s.trim().parse::<f64>());
    value_parser.parse(input)
}

/// Parses a key=value pair
fn parse_pair(input: &str) -> IResult<&str, (String, f64)> {
    let mut parser = separated_pair(parse_key, tag("="), parse_value);
    parser.parse(input)
}

/// Parses the whole comma separated list; duplicate or empty keys are rejected.
pub fn parse_substitutions(input: &str) -> Result<SubstitutionMap, String> {
    let invalid = || {
        format!(
            "invalid substitution format '{}' (example: {})",
            input.trim(),
            SUBSTITUTION_EXAMPLE
        )
    };
    let mut parser = all_consuming(separated_list1(tag(","), parse_pair));
    let (_, pairs) = parser.parse(input.trim()).map_err(|_| invalid())?;

    let mut map = SubstitutionMap::with_capacity(pairs.len());
    for (key, value) in pairs {
        if key.is_empty() {
            return Err(invalid());
        }
        if map.insert(key.clone(), value).is_some() {
            return Err(format!("duplicate substitution for {}", key));
        }
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_substitutions() {
        let map = parse_substitutions("x=2, y = 3.5").unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["x"], 2.0);
        assert_eq!(map["y"], 3.5);
        let map = parse_substitutions(" t=-1e-3 ").unwrap();
        assert_eq!(map["t"], -1e-3);
    }

    #[test]
    fn test_odd_keys_pass_through() {
        let map = parse_substitutions("2x=1").unwrap();
        assert_eq!(map["2x"], 1.0);
    }

    #[test]
    fn test_malformed_lists() {
        for text in ["x", "x=", "=2", "x=abc", "x=2,", "x=2;y=3", "x=2 y=3", ""] {
            assert!(parse_substitutions(text).is_err(), "accepted {:?}", text);
        }
        let err = parse_substitutions("x=1, x=2").unwrap_err();
        assert!(err.contains("duplicate"));
    }
}
