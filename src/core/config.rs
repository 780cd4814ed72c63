use std::path::PathBuf;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::core::error::TickerError;
use crate::{DEFAULT_LOG_LEVEL, DEFAULT_TICK_INTERVAL_MS};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub records_file: PathBuf,
    pub tick_interval_ms: u64,
    pub reload_on_change: bool,
    pub log_level: String,
    pub max_ticks: Option<u64>,  // 运行指定次数后停止
}

impl Default for Config {
    fn default() -> Self {
        Self {
            records_file: PathBuf::new(),
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            reload_on_change: true,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            max_ticks: None,
        }
    }
}

impl Config {
    /// 从 key=value 选项解析配置
    pub fn from_options(options: &[&str], records_file: PathBuf) -> Result<Self, TickerError> {
        let mut config = Config::default();
        config.records_file = records_file;

        for option in options {
            let option = option.trim();
            if option.is_empty() {
                continue;
            }

            if let Some((key, value)) = option.split_once('=') {
                match key.trim() {
                    "interval_ms" => {
                        config.tick_interval_ms = value.trim().parse()?;
                    }
                    "reload" => {
                        config.reload_on_change = value.trim().parse()?;
                    }
                    "log_level" => {
                        config.log_level = value.trim().to_lowercase();
                    }
                    "ticks" => {
                        config.max_ticks = Some(value.trim().parse()?);
                    }
                    other => {
                        tracing::debug!("Ignoring unknown option: {}", other);
                    }
                }
            } else {
                tracing::debug!("Ignoring malformed option: {}", option);
            }
        }

        config.validate()?;

        tracing::debug!("Configuration loaded successfully: {:?}", config);
        Ok(config)
    }

    /// 验证配置合理性
    pub fn validate(&self) -> Result<(), TickerError> {
        if self.records_file.as_os_str().is_empty() {
            return Err(TickerError::config_error("Missing required records file"));
        }

        if self.tick_interval_ms == 0 {
            return Err(TickerError::config_error("Tick interval must be greater than 0"));
        }

        if self.max_ticks == Some(0) {
            return Err(TickerError::config_error("Tick count must be greater than 0"));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(TickerError::config_error(format!("Unknown log level: {}", other))),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
        assert!(config.reload_on_change);
        assert_eq!(config.max_ticks, None);
        // 没有记录文件，验证应失败
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_options() {
        let config = Config::from_options(
            &["interval_ms=250", "reload=false", "ticks=5", "log_level=DEBUG", "allow_other"],
            PathBuf::from("bookings.json"),
        )
        .unwrap();

        assert_eq!(config.tick_interval_ms, 250);
        assert!(!config.reload_on_change);
        assert_eq!(config.max_ticks, Some(5));
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.records_file, PathBuf::from("bookings.json"));
    }

    #[test]
    fn test_invalid_options() {
        let path = PathBuf::from("bookings.json");
        assert!(Config::from_options(&["interval_ms=0"], path.clone()).is_err());
        assert!(Config::from_options(&["interval_ms=fast"], path.clone()).is_err());
        assert!(Config::from_options(&["reload=maybe"], path.clone()).is_err());
        assert!(Config::from_options(&["log_level=loud"], path.clone()).is_err());
        assert!(Config::from_options(&["ticks=0"], path).is_err());
    }

    #[test]
    fn test_unknown_options_ignored() {
        let config = Config::from_options(&["color=always", ""], PathBuf::from("b.json")).unwrap();
        assert_eq!(config.tick_interval_ms, DEFAULT_TICK_INTERVAL_MS);
    }
}
