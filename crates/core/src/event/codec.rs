// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Envelope codec for the worker wire protocol.
//!
//! Frames are JSON objects `{"event": "<tag>", "payload": {...}}`. The tag
//! is checked against the known-kind table before the payload is touched, so
//! an unknown tag surfaces as a typed error rather than a serde failure.

use super::{Event, EventKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("unknown event type: {tag}")]
    UnknownEvent { tag: String },

    #[error("event envelope is missing its type tag")]
    MissingTag,

    #[error("malformed event envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    #[error("malformed payload for {tag}: {source}")]
    Payload {
        tag: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode event: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Serialize an event into its wire envelope.
pub fn encode(event: &Event) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(event).map_err(CodecError::Encode)
}

/// Parse a wire envelope into an event.
pub fn decode(bytes: &[u8]) -> Result<Event, CodecError> {
    let value: serde_json::Value = serde_json::from_slice(bytes).map_err(CodecError::Envelope)?;

    let tag = value
        .get("event")
        .and_then(|tag| tag.as_str())
        .ok_or(CodecError::MissingTag)?;

    if EventKind::from_tag(tag).is_none() {
        return Err(CodecError::UnknownEvent {
            tag: tag.to_string(),
        });
    }

    let tag = tag.to_string();
    serde_json::from_value(value).map_err(|source| CodecError::Payload { tag, source })
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
