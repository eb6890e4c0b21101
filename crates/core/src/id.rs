// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Entity identifiers.
//!
//! All ids are v4 uuids. `OriginId` is the untyped id carried in event
//! headers; it converts freely to and from the typed entity ids because an
//! event origin may refer to a build, a job, or a task.

crate::define_id! {
    /// Unique identifier for a workflow.
    pub struct WorkflowId;
}

crate::define_id! {
    /// Unique identifier for a build (one execution of a workflow).
    pub struct BuildId;
}

crate::define_id! {
    /// Unique identifier for a job within a build.
    pub struct JobId;
}

crate::define_id! {
    /// Unique identifier for a task within a job.
    pub struct TaskId;
}

crate::define_id! {
    /// Id carried in an event header, naming the entity the event pertains to.
    pub struct OriginId;
}

macro_rules! origin_conversions {
    ($($id:ident),+ $(,)?) => {
        $(
            impl From<$id> for OriginId {
                fn from(id: $id) -> Self {
                    OriginId::from_uuid(*id.as_uuid())
                }
            }

            impl From<OriginId> for $id {
                fn from(id: OriginId) -> Self {
                    $id::from_uuid(*id.as_uuid())
                }
            }
        )+
    };
}

origin_conversions!(WorkflowId, BuildId, JobId, TaskId);

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
