// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Config loading and override tests.

use super::*;
use std::io::Write;

#[test]
fn defaults_without_a_file() {
    let config = Config::load(None).unwrap();
    assert_eq!(config.api.address, "127.0.0.1:8080");
    assert_eq!(config.worker_io.address, "127.0.0.1:8081");
    assert_eq!(config.ui.address, "127.0.0.1:8082");
}

#[test]
fn partial_file_keeps_other_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[api]\naddress = \"0.0.0.0:9000\"").unwrap();

    let config = Config::load(Some(file.path())).unwrap();
    assert_eq!(config.api.address, "0.0.0.0:9000");
    assert_eq!(config.worker_io.address, "127.0.0.1:8081");
}

#[test]
fn malformed_file_is_a_parse_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "api = \"not a table\"\n[api]").unwrap();

    assert!(matches!(
        Config::load(Some(file.path())),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn missing_file_is_an_io_error() {
    assert!(matches!(
        Config::load(Some(std::path::Path::new("/nonexistent/workflower.toml"))),
        Err(ConfigError::Io(_))
    ));
}

#[test]
fn env_overrides_win_over_file_values() {
    let mut config = Config::default();
    config.apply_env(|name| match name {
        "WORKFLOWER_WORKER_IO_ADDRESS" => Some("0.0.0.0:7000".into()),
        _ => None,
    });

    assert_eq!(config.worker_io.address, "0.0.0.0:7000");
    assert_eq!(config.api.address, "127.0.0.1:8080");
}
