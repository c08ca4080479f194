#![allow(dead_code)]

use std::collections::BTreeMap;

use axum::Router;
use grade_ledger::api::middleware::AuthConfig;
use grade_ledger::api::{create_router, GradingStore, StoredSubmission, BASE_PATH};
use grade_ledger::client::GradingClient;
use grade_ledger::grading::{CellBinding, WidgetHost, WidgetId};
use grade_ledger::models::*;
use grade_ledger::sync::LedgerSync;
use serde_json::{json, Value};

pub const LECTURE: u64 = 1;
pub const ASSIGNMENT: u64 = 2;
pub const SUBMISSION: u64 = 7;

pub fn key() -> SubmissionKey {
    SubmissionKey::new(LECTURE, ASSIGNMENT, SUBMISSION)
}

pub fn properties() -> Value {
    json!({
        "hw1": {
            "grades_dict": {
                "cell-abc123": {
                    "manual_score": null,
                    "auto_score": null,
                    "extra_credit": 0,
                    "needs_manual_grade": true,
                    "max_score": 10
                },
                "tests-1": {
                    "manual_score": null,
                    "auto_score": 3,
                    "extra_credit": 0,
                    "needs_manual_grade": false,
                    "max_score": 3,
                    "failed_tests": []
                }
            },
            "comments_dict": {
                "cell-abc123": { "manual_comment": null },
                "tests-1": { "manual_comment": null, "auto_comment": "All tests passed" }
            }
        }
    })
}

pub fn submission() -> Submission {
    serde_json::from_value(json!({
        "id": SUBMISSION,
        "manual_status": "not_graded",
        "auto_status": "automatically_graded",
        "username": "student1",
        "score": 3.0
    }))
    .expect("valid submission fixture")
}

pub fn seeded_store() -> GradingStore {
    let store = GradingStore::new();
    store.insert(StoredSubmission {
        lecture_id: LECTURE,
        assignment_id: ASSIGNMENT,
        submission: submission(),
        properties: properties(),
    });
    store
}

/// Serve a router on an ephemeral local port; returns the service base URL.
pub async fn spawn_router(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read local address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Test server failed");
    });
    format!("http://{}{}", addr, BASE_PATH)
}

pub async fn spawn_service(store: GradingStore) -> String {
    spawn_router(create_router(store, AuthConfig::disabled())).await
}

pub fn grader_context() -> SessionContext {
    SessionContext::new("tutor1").with_role(LECTURE, Role::Tutor)
}

pub fn ledger_sync(base_url: &str) -> LedgerSync {
    LedgerSync::new(GradingClient::new(base_url, None), grader_context())
}

/// Notebook `hw1`: one cell of every kind.
pub fn notebook() -> Notebook {
    Notebook::from_json(
        &json!({
            "cells": [
                { "cell_type": "markdown", "metadata": {}, "source": "# Homework 1" },
                { "cell_type": "code", "metadata": { "nbgrader": {
                    "grade_id": "cell-abc123", "grade": true, "solution": false,
                    "locked": false, "task": false, "points": 10, "schema_version": 3
                }}, "source": "" },
                { "cell_type": "code", "metadata": { "nbgrader": {
                    "grade_id": "tests-1", "grade": true, "solution": true,
                    "locked": true, "task": false, "points": 3, "schema_version": 3
                }}, "source": "assert add(1, 2) == 3" },
                { "cell_type": "code", "metadata": { "nbgrader": {
                    "grade_id": "answer-2", "grade": false, "solution": true,
                    "locked": false, "task": false, "schema_version": 3
                }}, "source": "def add(a, b):\n    return a + b" },
                { "cell_type": "markdown", "metadata": { "nbgrader": {
                    "grade_id": "header", "locked": true, "schema_version": 3
                }}, "source": "Do not edit" },
                { "cell_type": "markdown", "metadata": { "nbgrader": {
                    "grade_id": "task-1", "grade": true, "task": true,
                    "points": 5, "schema_version": 3
                }}, "source": "Explain your approach." }
            ],
            "metadata": {},
            "nbformat": 4,
            "nbformat_minor": 5
        })
        .to_string(),
    )
    .expect("valid notebook fixture")
}

/// Widget host that records what the controller asked for.
#[derive(Debug, Default)]
pub struct RecordingHost {
    next_id: u64,
    /// Attached widgets: id → (cell index, enabled)
    pub attached: BTreeMap<WidgetId, (usize, bool)>,
    pub detached: Vec<WidgetId>,
}

impl RecordingHost {
    pub fn attached_cells(&self) -> Vec<usize> {
        self.attached.values().map(|(cell, _)| *cell).collect()
    }

    pub fn all_enabled(&self) -> bool {
        self.attached.values().all(|(_, enabled)| *enabled)
    }

    pub fn none_enabled(&self) -> bool {
        self.attached.values().all(|(_, enabled)| !*enabled)
    }
}

impl WidgetHost for RecordingHost {
    fn attach(&mut self, binding: &CellBinding) -> WidgetId {
        let id = WidgetId(self.next_id);
        self.next_id += 1;
        self.attached.insert(id, (binding.cell_index, true));
        id
    }

    fn detach(&mut self, widget: WidgetId) {
        self.attached.remove(&widget);
        self.detached.push(widget);
    }

    fn set_enabled(&mut self, widget: WidgetId, enabled: bool) {
        if let Some(entry) = self.attached.get_mut(&widget) {
            entry.1 = enabled;
        }
    }
}
