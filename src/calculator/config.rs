//! Calculator settings read from a TOML document.
//!
//! ```toml
//! [series]
//! default_order = 5
//! default_point = "0"
//! max_order = 20
//!
//! [logging]
//! level = "info"
//! console = true
//! file = "symcalc_{timestamp}.log"
//! ```
//! Every key is optional and unknown keys are ignored.

use crate::Utils::logger::LoggingConfig;
use crate::calculator::service::SERIES_ORDER_LIMIT;
use crate::symbolic::symbolic_engine::Expr;
use log::LevelFilter;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use toml::{Table, Value};

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Syntax(String),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "cannot read config: {}", e),
            ConfigError::Syntax(msg) => write!(f, "config is not valid TOML: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "invalid config value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesConfig {
    /// order used when the order field is left empty
    pub default_order: usize,
    /// expansion point used when the point field is left empty
    pub default_point: String,
    /// largest order accepted from a form
    pub max_order: usize,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        SeriesConfig {
            default_order: 5,
            default_point: "0".to_string(),
            max_order: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CalculatorConfig {
    pub series: SeriesConfig,
    pub logging: LoggingConfig,
}

fn section<'a>(table: &'a Table, name: &str) -> Result<Option<&'a Table>, ConfigError> {
    match table.get(name) {
        None => Ok(None),
        Some(Value::Table(t)) => Ok(Some(t)),
        Some(other) => Err(ConfigError::Invalid(format!(
            "[{}] must be a table, got {}",
            name,
            other.type_str()
        ))),
    }
}

fn order_value(table: &Table, key: &str) -> Result<Option<usize>, ConfigError> {
    match table.get(key) {
        None => Ok(None),
        Some(Value::Integer(n)) => usize::try_from(*n).map(Some).map_err(|_| {
            ConfigError::Invalid(format!("series.{} must not be negative, got {}", key, n))
        }),
        Some(other) => Err(ConfigError::Invalid(format!(
            "series.{} must be an integer, got {}",
            key,
            other.type_str()
        ))),
    }
}

fn string_value<'a>(table: &'a Table, section: &str, key: &str) -> Result<Option<&'a str>, ConfigError> {
    match table.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(ConfigError::Invalid(format!(
            "{}.{} must be a string, got {}",
            section,
            key,
            other.type_str()
        ))),
    }
}

impl CalculatorConfig {
    /// Reads a config from TOML text, starting from the defaults.
    pub fn from_toml_str(text: &str) -> Result<CalculatorConfig, ConfigError> {
        let table = text
            .parse::<Table>()
            .map_err(|e| ConfigError::Syntax(e.to_string()))?;
        let mut config = CalculatorConfig::default();

        if let Some(series) = section(&table, "series")? {
            if let Some(order) = order_value(series, "default_order")? {
                config.series.default_order = order;
            }
            if let Some(max_order) = order_value(series, "max_order")? {
                config.series.max_order = max_order;
            }
            if let Some(point) = string_value(series, "series", "default_point")? {
                config.series.default_point = point.trim().to_string();
            }
        }

        if let Some(logging) = section(&table, "logging")? {
            if let Some(level) = string_value(logging, "logging", "level")? {
                config.logging.level = LevelFilter::from_str(level).map_err(|_| {
                    ConfigError::Invalid(format!(
                        "logging.level must be one of off, error, warn, info, debug, trace; got {}",
                        level
                    ))
                })?;
            }
            match logging.get("console") {
                None => {}
                Some(Value::Boolean(b)) => config.logging.console = *b,
                Some(other) => {
                    return Err(ConfigError::Invalid(format!(
                        "logging.console must be a boolean, got {}",
                        other.type_str()
                    )));
                }
            }
            if let Some(file) = string_value(logging, "logging", "file")? {
                config.logging.file = Some(file.to_string());
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<CalculatorConfig, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        CalculatorConfig::from_toml_str(&text)
    }

    /// checks the series settings against each other and against the service limit
    pub fn validate(&self) -> Result<(), ConfigError> {
        let series = &self.series;
        if series.max_order == 0 || series.max_order > SERIES_ORDER_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "series.max_order must be between 1 and {}, got {}",
                SERIES_ORDER_LIMIT, series.max_order
            )));
        }
        if series.default_order == 0 || series.default_order > series.max_order {
            return Err(ConfigError::Invalid(format!(
                "series.default_order must be between 1 and {}, got {}",
                series.max_order, series.default_order
            )));
        }
        if Expr::parse_expression(&series.default_point).is_err() {
            return Err(ConfigError::Invalid(format!(
                "series.default_point '{}' is not an expression",
                series.default_point
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = CalculatorConfig::default();
        assert_eq!(config.series.default_order, 5);
        assert_eq!(config.series.default_point, "0");
        assert_eq!(config.series.max_order, 20);
        assert_eq!(config.logging.level, LevelFilter::Info);
        assert!(config.logging.console);
        assert!(config.validate().is_ok());
        assert_eq!(CalculatorConfig::from_toml_str("").unwrap(), config);
    }

    #[test]
    fn test_from_toml_str() {
        let text = r#"
            [series]
            default_order = 8
            default_point = "pi"
            max_order = 30
            colour = "blue"

            [logging]
            level = "debug"
            console = false
            file = "calc_{timestamp}.log"
        "#;
        let config = CalculatorConfig::from_toml_str(text).unwrap();
        assert_eq!(config.series.default_order, 8);
        assert_eq!(config.series.default_point, "pi");
        assert_eq!(config.series.max_order, 30);
        assert_eq!(config.logging.level, LevelFilter::Debug);
        assert!(!config.logging.console);
        assert_eq!(config.logging.file.as_deref(), Some("calc_{timestamp}.log"));
    }

    #[test]
    fn test_invalid_configs() {
        let syntax = CalculatorConfig::from_toml_str("[series\n");
        assert!(matches!(syntax, Err(ConfigError::Syntax(_))));
        for text in [
            "series = 3",
            "[series]\ndefault_order = \"five\"",
            "[series]\ndefault_order = -1",
            "[series]\ndefault_order = 0",
            "[series]\ndefault_order = 25",
            "[series]\nmax_order = 51",
            "[series]\ndefault_point = \"1 +\"",
            "[logging]\nlevel = \"loud\"",
            "[logging]\nconsole = 1",
        ] {
            let result = CalculatorConfig::from_toml_str(text);
            assert!(
                matches!(result, Err(ConfigError::Invalid(_))),
                "accepted {:?}",
                text
            );
        }
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[series]\ndefault_order = 3").unwrap();
        let config = CalculatorConfig::from_file(file.path()).unwrap();
        assert_eq!(config.series.default_order, 3);

        let dir = tempfile::tempdir().unwrap();
        let missing = CalculatorConfig::from_file(dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}
