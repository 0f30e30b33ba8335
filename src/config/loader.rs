use std::{env, time::Duration};

use super::env::{
    AppConfig, ClassifierMode, ConfigError, DirectoryConfig, GeminiConfig, LoggingConfig,
    ServerConfig,
};

pub fn load_config() -> Result<AppConfig, ConfigError> {
    AppConfig::from_env()
}

impl AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server = ServerConfig {
            host: lookup("SERVER_HOST")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| "127.0.0.1".to_string()),
            port: match lookup("SERVER_PORT").filter(|v| !v.is_empty()) {
                Some(value) => value.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                    key: "SERVER_PORT",
                    value,
                })?,
                None => 5000,
            },
        };

        let gemini = GeminiConfig {
            api_key: lookup("GEMINI_API_KEY").filter(|v| !v.is_empty()),
            model: lookup("GEMINI_MODEL")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| "gemini-1.5-flash".to_string()),
            request_timeout: match lookup("GEMINI_TIMEOUT_MS") {
                Some(value) => parse_positive_millis("GEMINI_TIMEOUT_MS", value)?,
                None => Duration::from_secs(20),
            },
        };

        let classifier_mode = match lookup("CLASSIFIER_MODE") {
            Some(value) => parse_mode(&value).ok_or(ConfigError::Invalid {
                key: "CLASSIFIER_MODE",
                value,
            })?,
            None => ClassifierMode::Keyword,
        };

        let directories = DirectoryConfig {
            logs_dir: lookup("LOGS_DIR").unwrap_or_else(|| "logs".to_string()),
        };

        let logging = LoggingConfig {
            level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        };

        Ok(Self {
            server,
            gemini,
            classifier_mode,
            directories,
            logging,
        })
    }
}

fn parse_positive_millis(key: &'static str, value: String) -> Result<Duration, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => Err(ConfigError::Invalid { key, value }),
    }
}

fn parse_mode(value: &str) -> Option<ClassifierMode> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "keyword" | "keywords" | "rules" => Some(ClassifierMode::Keyword),
        "gemini" | "ai" => Some(ClassifierMode::Gemini),
        _ => None,
    }
}
