use chrono::Local;
use simplelog::*;
use std::fs::File;
use std::io;

/// Where and how verbosely the calculator logs.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub level: LevelFilter,
    pub console: bool,
    /// log file name; `{timestamp}` is replaced by the current local time
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: LevelFilter::Info,
            console: true,
            file: None,
        }
    }
}

/// expands the `{timestamp}` placeholder of a log file name
pub fn log_file_name(template: &str) -> String {
    let date_and_time = Local::now().format("%Y-%m-%d_%H-%M-%S");
    template.replace("{timestamp}", &date_and_time.to_string())
}

/// Installs the global logger described by `config`.
///
/// Returns `Ok(true)` when a logger was installed and `Ok(false)` when there was nothing to
/// install or a global logger is already set. Only failing to create the log file is an error.
pub fn init_logging(config: &LoggingConfig) -> io::Result<bool> {
    let level = config.level;
    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();

    if config.console {
        loggers.push(TermLogger::new(
            level,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ));
    }

    if let Some(template) = &config.file {
        let file = File::create(log_file_name(template))?;
        loggers.push(WriteLogger::new(level, Config::default(), file));
    }

    if loggers.is_empty() {
        return Ok(false);
    }
    let logger_instance = CombinedLogger::init(loggers);
    Ok(logger_instance.is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_name() {
        let name = log_file_name("calc_{timestamp}.log");
        assert!(name.starts_with("calc_"));
        assert!(name.ends_with(".log"));
        assert!(!name.contains('{'));
        // %Y-%m-%d_%H-%M-%S
        assert_eq!(name.len(), "calc_.log".len() + 19);
        assert_eq!(log_file_name("plain.log"), "plain.log");
    }

    #[test]
    fn test_init_logging_writes_file_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("symcalc.log");
        let config = LoggingConfig {
            level: LevelFilter::Debug,
            console: false,
            file: Some(path.to_string_lossy().to_string()),
        };
        // another test may already own the global logger
        let _first = init_logging(&config).unwrap();
        assert!(path.exists());
        assert!(!init_logging(&config).unwrap());
        let silent = LoggingConfig {
            console: false,
            ..LoggingConfig::default()
        };
        assert!(!init_logging(&silent).unwrap());
    }
}
