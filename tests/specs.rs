// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end scenarios: API → processors → (scripted) worker → terminal
//! states, over the real bus with sync watchers.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tower::ServiceExt;
use wf_core::{
    by_type, Event, EventKind, EventOrigin, Publisher, Status, SystemClock, TaskId,
};
use wf_daemon::api::{router, AppState};
use wf_engine::{Bus, BuildProcessor, JobProcessor, Subscription, TaskProcessor, Watcher};
use wf_storage::Store;

const OUTBOUND: [EventKind; 4] = [
    EventKind::InitContainerStart,
    EventKind::ScriptStart,
    EventKind::ScriptAbort,
    EventKind::CleanupContainer,
];

struct Harness {
    store: Store,
    bus: Bus,
    router: axum::Router,
    watchers: Vec<Watcher>,
    worker: Subscription,
}

impl Harness {
    fn new() -> Self {
        let store = Store::new();
        let bus = Bus::new();
        let clock = SystemClock;

        let watchers = vec![
            Watcher::spawn(
                &bus,
                Arc::new(BuildProcessor::new(store.clone(), bus.clone(), clock)),
            ),
            Watcher::spawn(
                &bus,
                Arc::new(JobProcessor::new(store.clone(), bus.clone(), clock)),
            ),
            Watcher::spawn(
                &bus,
                Arc::new(TaskProcessor::new(store.clone(), bus.clone(), clock)),
            ),
        ];

        let worker = bus.subscribe(vec![by_type(OUTBOUND)]);
        let router = router(AppState::new(store.clone(), Arc::new(bus.clone())));

        Self {
            store,
            bus,
            router,
            watchers,
            worker,
        }
    }

    async fn stop(self) {
        for watcher in self.watchers {
            watcher.stop().await;
        }
        self.bus.close();
    }

    async fn request(&self, method: &str, uri: &str, body: Option<serde_json::Value>) -> (StatusCode, serde_json::Value) {
        let request = match body {
            Some(body) => Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => Request::builder().method(method).uri(uri).body(Body::empty()).unwrap(),
        };
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, value)
    }

    async fn create_workflow(&self, jobs: &[usize]) -> String {
        let config = serde_json::json!({
            "jobs": jobs.iter().enumerate().map(|(j, scripts)| serde_json::json!({
                "name": format!("job-{j}"),
                "run": {
                    "image": "alpine",
                    "scripts": (0..*scripts).map(|s| serde_json::json!({
                        "name": format!("script-{s}"),
                        "command": ["echo", "hi"],
                    })).collect::<Vec<_>>(),
                }
            })).collect::<Vec<_>>(),
        });
        let (status, body) = self
            .request(
                "POST",
                "/api/workflows",
                Some(serde_json::json!({"name": "wf", "config": config})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["id"].as_str().unwrap().to_string()
    }

    async fn start_build(&self, workflow_id: &str) -> wf_core::BuildId {
        let (status, body) = self
            .request("POST", &format!("/api/workflows/{workflow_id}/builds"), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        body["id"].as_str().unwrap().parse().unwrap()
    }

    /// Next worker-bound command, skipping nothing.
    async fn next_outbound(&mut self) -> Event {
        timeout(Duration::from_secs(5), self.worker.events.recv())
            .await
            .expect("timed out waiting for worker command")
            .expect("bus closed")
    }

    fn reply(&self, event: Event) {
        self.bus.publish(event).unwrap();
    }

    async fn await_build_status(&self, id: wf_core::BuildId, expected: Status) {
        for _ in 0..500 {
            if self.store.builds().get(id).unwrap().model().status == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "build never reached {expected}, still {}",
            self.store.builds().get(id).unwrap().model().status
        );
    }

    fn job_ids(&self, build: wf_core::BuildId) -> Vec<wf_core::JobId> {
        self.store.jobs().by_build(build).iter().map(|j| j.id()).collect()
    }

    fn task_statuses(&self, job: wf_core::JobId) -> Vec<Status> {
        self.store
            .tasks()
            .by_job(job)
            .iter()
            .map(|t| t.model().status)
            .collect()
    }
}

fn origin_task(event: &Event) -> TaskId {
    TaskId::from(event.origin().id)
}

fn now_origin(task: TaskId) -> EventOrigin {
    EventOrigin::new(task, &SystemClock)
}

// S1: one job, one script, worker succeeds end to end.
#[tokio::test]
async fn successful_single_job_build() {
    let mut harness = Harness::new();
    let workflow = harness.create_workflow(&[1]).await;
    let build = harness.start_build(&workflow).await;

    let init = harness.next_outbound().await;
    assert_eq!(init.kind(), EventKind::InitContainerStart);
    harness.reply(Event::InitContainerFinish {
        origin: now_origin(origin_task(&init)),
        container_id: "c1".into(),
    });

    let script = harness.next_outbound().await;
    match &script {
        Event::ScriptStart { config, .. } => assert_eq!(config.container_id, "c1"),
        other => panic!("expected script:start, got {other:?}"),
    }
    harness.reply(Event::ScriptFinish {
        origin: now_origin(origin_task(&script)),
        exit_status: 0,
        succeeded: true,
    });

    let cleanup = harness.next_outbound().await;
    match &cleanup {
        Event::CleanupContainer { container_id, .. } => assert_eq!(container_id, "c1"),
        other => panic!("expected cleanup:container, got {other:?}"),
    }

    harness.await_build_status(build, Status::Succeeded).await;

    let job = harness.job_ids(build)[0];
    assert_eq!(
        harness.task_statuses(job),
        vec![Status::Succeeded, Status::Succeeded, Status::Succeeded]
    );

    harness.stop().await;
}

// S2: script fails; cleanup is not scheduled and the failure propagates.
#[tokio::test]
async fn failed_script_fails_the_build_and_skips_cleanup() {
    let mut harness = Harness::new();
    let workflow = harness.create_workflow(&[1]).await;
    let build = harness.start_build(&workflow).await;

    let init = harness.next_outbound().await;
    harness.reply(Event::InitContainerFinish {
        origin: now_origin(origin_task(&init)),
        container_id: "c1".into(),
    });

    let script = harness.next_outbound().await;
    harness.reply(Event::ScriptFinish {
        origin: now_origin(origin_task(&script)),
        exit_status: 2,
        succeeded: false,
    });

    harness.await_build_status(build, Status::Failed).await;

    let job = harness.job_ids(build)[0];
    assert_eq!(
        harness.task_statuses(job),
        vec![Status::Succeeded, Status::Failed, Status::Created]
    );

    harness.stop().await;
}

// S3: first job succeeds, second job's init errors; the build errors.
#[tokio::test]
async fn errored_init_in_second_job_errors_the_build() {
    let mut harness = Harness::new();
    let workflow = harness.create_workflow(&[1, 1]).await;
    let build = harness.start_build(&workflow).await;

    // drive the first job to success
    let init = harness.next_outbound().await;
    harness.reply(Event::InitContainerFinish {
        origin: now_origin(origin_task(&init)),
        container_id: "c1".into(),
    });
    let script = harness.next_outbound().await;
    harness.reply(Event::ScriptFinish {
        origin: now_origin(origin_task(&script)),
        exit_status: 0,
        succeeded: true,
    });
    let cleanup = harness.next_outbound().await;
    assert_eq!(cleanup.kind(), EventKind::CleanupContainer);

    // second job's init fails to pull
    let second_init = harness.next_outbound().await;
    assert_eq!(second_init.kind(), EventKind::InitContainerStart);
    harness.reply(Event::Error {
        origin: now_origin(origin_task(&second_init)),
        message: "pull failed".into(),
    });

    harness.await_build_status(build, Status::Errored).await;

    let jobs = harness.job_ids(build);
    assert_eq!(
        harness.store.jobs().get(jobs[0]).unwrap().model().status,
        Status::Succeeded
    );
    assert_eq!(
        harness.store.jobs().get(jobs[1]).unwrap().model().status,
        Status::Errored
    );
    assert_eq!(
        harness.task_statuses(jobs[1])[0],
        Status::Errored
    );

    harness.stop().await;
}

// S4: abort while the script runs; the worker sees script:abort and the
// whole chain lands in aborted.
#[tokio::test]
async fn abort_mid_script_cascades() {
    let mut harness = Harness::new();
    let workflow = harness.create_workflow(&[1]).await;
    let build = harness.start_build(&workflow).await;

    let init = harness.next_outbound().await;
    harness.reply(Event::InitContainerFinish {
        origin: now_origin(origin_task(&init)),
        container_id: "c1".into(),
    });

    let script = harness.next_outbound().await;
    assert_eq!(script.kind(), EventKind::ScriptStart);
    let script_task = origin_task(&script);

    let (status, _) = harness
        .request("POST", &format!("/api/builds/{build}/abort"), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    // the worker is told to stop the running script
    let abort = harness.next_outbound().await;
    assert_eq!(abort.kind(), EventKind::ScriptAbort);
    assert_eq!(origin_task(&abort), script_task);

    harness.await_build_status(build, Status::Aborted).await;

    let job = harness.job_ids(build)[0];
    assert_eq!(
        harness.store.jobs().get(job).unwrap().model().status,
        Status::Aborted
    );
    assert_eq!(
        harness.task_statuses(job),
        vec![Status::Succeeded, Status::Aborted, Status::Created]
    );

    harness.stop().await;
}

// S5: duplicate terminal delivery is an observable no-op.
#[tokio::test]
async fn duplicate_script_finish_leaves_the_same_final_row() {
    let mut harness = Harness::new();
    let workflow = harness.create_workflow(&[1]).await;
    let build = harness.start_build(&workflow).await;

    let init = harness.next_outbound().await;
    harness.reply(Event::InitContainerFinish {
        origin: now_origin(origin_task(&init)),
        container_id: "c1".into(),
    });

    let script = harness.next_outbound().await;
    let script_task = origin_task(&script);
    let finish = Event::ScriptFinish {
        origin: now_origin(script_task),
        exit_status: 0,
        succeeded: true,
    };
    harness.reply(finish.clone());
    harness.await_build_status(build, Status::Succeeded).await;
    let first = harness.store.tasks().get(script_task).unwrap().model();

    harness.reply(finish);
    tokio::time::sleep(Duration::from_millis(100)).await;
    let second = harness.store.tasks().get(script_task).unwrap().model();

    assert_eq!(first, second);
    harness.stop().await;
}

// S6: starting a build while the previous one runs is refused.
#[tokio::test]
async fn concurrent_build_start_is_refused() {
    let harness = Harness::new();
    let workflow = harness.create_workflow(&[1]).await;
    let build = harness.start_build(&workflow).await;

    // the first build is now running
    for _ in 0..500 {
        if harness.store.builds().get(build).unwrap().model().status == Status::Started {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let (status, _) = harness
        .request("POST", &format!("/api/workflows/{workflow}/builds"), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let workflow_id: wf_core::WorkflowId = workflow.parse().unwrap();
    assert_eq!(harness.store.builds().by_workflow(workflow_id).len(), 1);

    harness.stop().await;
}

// The persisted status history respects the transition graph.
#[tokio::test]
async fn status_history_is_monotonic() {
    let mut harness = Harness::new();

    // record every task:status for later inspection
    let mut history = harness.bus.subscribe(vec![by_type([EventKind::TaskStatus])]);

    let workflow = harness.create_workflow(&[1]).await;
    let build = harness.start_build(&workflow).await;

    let init = harness.next_outbound().await;
    let init_task = origin_task(&init);
    harness.reply(Event::InitContainerFinish {
        origin: now_origin(init_task),
        container_id: "c1".into(),
    });
    let script = harness.next_outbound().await;
    harness.reply(Event::ScriptFinish {
        origin: now_origin(origin_task(&script)),
        exit_status: 0,
        succeeded: true,
    });

    harness.await_build_status(build, Status::Succeeded).await;

    let mut init_statuses = Vec::new();
    while let Ok(event) = history.events.try_recv() {
        if event.origin().id == init_task.into() {
            if let Some(status) = event.status() {
                init_statuses.push(status);
            }
        }
    }
    assert_eq!(
        init_statuses,
        vec![Status::Pending, Status::Started, Status::Succeeded]
    );

    harness.stop().await;
}
