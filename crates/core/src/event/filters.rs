// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subscription filters. A subscriber receives an event only when every
//! filter of its subscription accepts it.

use super::{Event, EventKind};
use crate::id::OriginId;

pub type EventFilter = Box<dyn Fn(&Event) -> bool + Send + Sync>;

/// Accept events whose kind is in `kinds`.
pub fn by_type(kinds: impl IntoIterator<Item = EventKind>) -> EventFilter {
    let kinds: Vec<EventKind> = kinds.into_iter().collect();
    Box::new(move |event| kinds.contains(&event.kind()))
}

/// Accept events whose kind is NOT in `kinds`.
pub fn exclude_types(kinds: impl IntoIterator<Item = EventKind>) -> EventFilter {
    let kinds: Vec<EventKind> = kinds.into_iter().collect();
    Box::new(move |event| !kinds.contains(&event.kind()))
}

/// Accept events originating from the given entity.
pub fn by_origin_id(id: impl Into<OriginId>) -> EventFilter {
    let id = id.into();
    Box::new(move |event| event.origin().id == id)
}

#[cfg(test)]
#[path = "filters_tests.rs"]
mod tests;
