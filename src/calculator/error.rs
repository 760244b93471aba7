//! Error taxonomy of the calculator.
//!
//! Every failure handed to a caller is a [`CalcError`] of one of three kinds. The [`Stage`]
//! says where in the pipeline it happened, so callers can branch without matching message text.

use std::fmt;
use strum_macros::{Display, EnumIter};

/// The three kinds of failure a caller can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum ErrorKind {
    /// the text of an argument is not a well-formed expression
    ParseError,
    /// the arguments are well-formed but do not fit together (missing bound, order out of range)
    ValidationError,
    /// the engine could not carry out the operation or produce a finite value
    EvaluationError,
}

/// Pipeline step at which a failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Stage {
    Parse,
    Validation,
    Differentiation,
    Substitution,
    Evaluation,
    Integration,
    Simplification,
    Series,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalcError {
    pub kind: ErrorKind,
    pub stage: Stage,
    pub message: String,
}

impl CalcError {
    pub fn new(kind: ErrorKind, stage: Stage, message: impl Into<String>) -> CalcError {
        CalcError {
            kind,
            stage,
            message: message.into(),
        }
    }

    /// malformed text
    pub fn parse(message: impl Into<String>) -> CalcError {
        CalcError::new(ErrorKind::ParseError, Stage::Parse, message)
    }

    /// inconsistent or out-of-range parameters
    pub fn validation(message: impl Into<String>) -> CalcError {
        CalcError::new(ErrorKind::ValidationError, Stage::Validation, message)
    }

    /// engine failure at `stage`
    pub fn evaluation(stage: Stage, message: impl Into<String>) -> CalcError {
        CalcError::new(ErrorKind::EvaluationError, stage, message)
    }
}

impl fmt::Display for CalcError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for CalcError {}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_display() {
        let e = CalcError::parse("invalid syntax: unexpected 'expr' at position 8");
        assert_eq!(
            e.to_string(),
            "ParseError: invalid syntax: unexpected 'expr' at position 8"
        );
        let e = CalcError::evaluation(Stage::Integration, "cannot compute indefinite integral");
        assert_eq!(e.kind, ErrorKind::EvaluationError);
        assert_eq!(e.stage.to_string(), "Integration");
    }

    #[test]
    fn test_three_kinds() {
        let kinds: Vec<String> = ErrorKind::iter().map(|k| k.to_string()).collect();
        assert_eq!(kinds, ["ParseError", "ValidationError", "EvaluationError"]);
        assert_eq!(Stage::iter().count(), 8);
    }
}
