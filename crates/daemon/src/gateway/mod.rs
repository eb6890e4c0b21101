// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket gateways: the bidirectional worker transport and the one-way UI
//! status stream.

mod ui;
mod worker;

pub use ui::UiGateway;
pub use worker::WorkerGateway;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("failed to bind gateway socket: {0}")]
    Bind(#[from] std::io::Error),
}
