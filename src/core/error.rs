use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TickerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Record source error: {message}")]
    SourceError { message: String },

    #[error("Invalid record file {path}: {source}")]
    RecordFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(#[from] std::num::ParseIntError),

    #[error("Parse bool error: {0}")]
    ParseBoolError(#[from] std::str::ParseBoolError),

    #[error("Task join error: {0}")]
    TaskJoinError(#[from] tokio::task::JoinError),
}

impl TickerError {
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    pub fn source_error(message: impl Into<String>) -> Self {
        Self::SourceError {
            message: message.into(),
        }
    }

    pub fn record_format(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::RecordFormat {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = TickerError::config_error("tick interval must be greater than 0");
        assert_eq!(
            err.to_string(),
            "Configuration error: tick interval must be greater than 0"
        );

        let err = TickerError::source_error("empty file");
        assert_eq!(err.to_string(), "Record source error: empty file");
    }

    #[test]
    fn test_parse_error_conversion() {
        let parse_err = "abc".parse::<u64>().unwrap_err();
        let err: TickerError = parse_err.into();
        assert!(matches!(err, TickerError::ParseError(_)));
    }
}
