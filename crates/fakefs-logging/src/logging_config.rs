// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Logging configuration types

use std::path::PathBuf;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::LogFormat;

/// Logging configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Logging verbosity level
    #[serde(rename = "log-level")]
    pub level: Option<String>,
    #[serde(rename = "log-format")]
    pub format: Option<LogFormat>,
    /// Log to this file instead of stdout
    #[serde(rename = "log-file")]
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    /// Parsed level, `fallback` when none is configured
    pub fn level_or(&self, fallback: Level) -> anyhow::Result<Level> {
        match &self.level {
            Some(level) => level
                .parse::<Level>()
                .with_context(|| format!("invalid log level {level:?}")),
            None => Ok(fallback),
        }
    }

    /// Install the global subscriber described by this configuration
    pub fn init(&self, component: &str, default_level: Level) -> anyhow::Result<()> {
        let level = self.level_or(default_level)?;
        let format = self.format.unwrap_or_default();
        match &self.file {
            Some(path) => crate::init_to_file(component, level, format, path),
            None => crate::init(component, level, format),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_from_json() {
        let config: LoggingConfig =
            serde_json::from_str(r#"{"log-level": "debug", "log-format": "json"}"#).unwrap();
        assert_eq!(config.level_or(Level::INFO).unwrap(), Level::DEBUG);
        assert_eq!(config.format, Some(LogFormat::Json));
        assert!(config.file.is_none());
    }

    #[test]
    fn test_level_fallback_and_errors() {
        let config = LoggingConfig::default();
        assert_eq!(config.level_or(Level::WARN).unwrap(), Level::WARN);

        let config = LoggingConfig {
            level: Some("loud".to_string()),
            ..Default::default()
        };
        let err = config.level_or(Level::INFO).unwrap_err();
        assert!(err.to_string().contains("loud"));
    }
}
