// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration: TOML file with `WORKFLOWER_*` env overrides.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub worker_io: WorkerIoConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub address: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:8080".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WorkerIoConfig {
    pub address: String,
}

impl Default for WorkerIoConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:8081".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub address: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:8082".into(),
        }
    }
}

impl Config {
    /// Load from a TOML file (defaults when `path` is `None`), then apply
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => toml::from_str(&std::fs::read_to_string(path)?)?,
            None => Config::default(),
        };
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(address) = var("WORKFLOWER_API_ADDRESS") {
            self.api.address = address;
        }
        if let Some(address) = var("WORKFLOWER_WORKER_IO_ADDRESS") {
            self.worker_io.address = address;
        }
        if let Some(address) = var("WORKFLOWER_UI_ADDRESS") {
            self.ui.address = address;
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
