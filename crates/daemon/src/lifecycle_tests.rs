// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon start/stop smoke tests on ephemeral ports.

use super::*;
use crate::config::Config;

fn ephemeral_config() -> Config {
    let mut config = Config::default();
    config.api.address = "127.0.0.1:0".into();
    config.worker_io.address = "127.0.0.1:0".into();
    config.ui.address = "127.0.0.1:0".into();
    config
}

#[tokio::test]
async fn starts_serves_and_stops() {
    let daemon = Daemon::start(ephemeral_config()).await.unwrap();

    let url = format!("http://{}/api/workflows", daemon.api_addr());
    let response = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        async_get(&url),
    )
    .await
    .expect("api did not answer");
    assert!(response.contains("[]"), "unexpected body: {response}");

    daemon.stop().await;
}

#[tokio::test]
async fn stop_closes_the_bus() {
    let daemon = Daemon::start(ephemeral_config()).await.unwrap();
    let bus = daemon.bus().clone();

    daemon.stop().await;

    use wf_core::Publisher;
    let result = bus.publish(wf_core::Event::TaskAbort {
        origin: wf_core::EventOrigin::at(wf_core::TaskId::new(), chrono::Utc::now()),
    });
    assert!(result.is_err());
}

/// Minimal HTTP GET over a raw socket; enough for a smoke test without an
/// http client dependency.
async fn async_get(url: &str) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let address = url
        .strip_prefix("http://")
        .and_then(|rest| rest.split_once('/'))
        .map(|(addr, _)| addr.to_string())
        .unwrap();
    let path = url.splitn(4, '/').nth(3).map(|p| format!("/{p}")).unwrap();

    let mut stream = tokio::net::TcpStream::connect(&address).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: {address}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
        .split_once("\r\n\r\n")
        .map(|(_, body)| body.to_string())
        .unwrap_or_default()
}
