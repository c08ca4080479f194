mod common;

use axum::http::{header, HeaderValue, StatusCode};
use axum_test::TestServer;
use grade_ledger::api::create_router;
use grade_ledger::api::middleware::AuthConfig;
use grade_ledger::models::*;
use serde_json::{json, Value};

use common::*;

fn setup() -> TestServer {
    let app = create_router(seeded_store(), AuthConfig::disabled());
    TestServer::new(app).expect("Failed to create test server")
}

fn submission_path() -> String {
    format!("/services/grader{}", key().submission_path())
}

fn properties_path() -> String {
    format!("/services/grader{}", key().properties_path())
}

mod health {
    use super::*;

    #[tokio::test]
    async fn reports_ok_without_a_token() {
        let app = create_router(seeded_store(), AuthConfig::with_token("secret"));
        let server = TestServer::new(app).expect("Failed to create test server");

        let response = server.get("/services/grader/health").await;

        response.assert_status_ok();
        response.assert_json(&json!({ "status": "ok" }));
    }
}

mod properties {
    use super::*;

    #[tokio::test]
    async fn returns_the_stored_payload() {
        let server = setup();

        let response = server.get(&properties_path()).await;

        response.assert_status_ok();
        response.assert_json(&common::properties());
    }

    #[tokio::test]
    async fn returns_404_for_unknown_submission() {
        let server = setup();

        let response = server
            .get("/services/grader/lectures/1/assignments/2/submissions/99/properties")
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn replaces_the_payload() {
        let server = setup();
        let mut updated = common::properties();
        updated["hw1"]["grades_dict"]["cell-abc123"]["manual_score"] = json!(8);

        server
            .put(&properties_path())
            .json(&updated)
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let stored: Value = server.get(&properties_path()).await.json();
        assert_eq!(stored, updated);
    }

    #[tokio::test]
    async fn rejects_payloads_of_the_wrong_shape() {
        let server = setup();

        let response = server
            .put(&properties_path())
            .json(&json!({ "hw1": { "comments_dict": {} } }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let stored: Value = server.get(&properties_path()).await.json();
        assert_eq!(stored, common::properties());
    }
}

mod submissions {
    use super::*;

    #[tokio::test]
    async fn returns_the_submission_record() {
        let server = setup();

        let response = server.get(&submission_path()).await;

        response.assert_status_ok();
        let record: Submission = response.json();
        assert_eq!(record, submission());
    }

    #[tokio::test]
    async fn updates_the_manual_status() {
        let server = setup();
        let mut record = submission();
        record.manual_status = ManualStatus::ManuallyGraded;

        server
            .put(&submission_path())
            .json(&record)
            .await
            .assert_status_ok();

        let stored: Submission = server.get(&submission_path()).await.json();
        assert_eq!(stored.manual_status, ManualStatus::ManuallyGraded);
        assert_eq!(stored.extra["username"], json!("student1"));
    }

    #[tokio::test]
    async fn rejects_mismatched_ids() {
        let server = setup();
        let mut record = submission();
        record.id = 8;

        let response = server.put(&submission_path()).json(&record).await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rejects_unknown_statuses() {
        let server = setup();
        let mut body = serde_json::to_value(submission()).unwrap();
        body["manual_status"] = json!("graded_by_magic");

        let response = server.put(&submission_path()).json(&body).await;

        assert!(response.status_code().is_client_error());
    }
}

mod authentication {
    use super::*;

    #[tokio::test]
    async fn requires_the_configured_token() {
        let app = create_router(seeded_store(), AuthConfig::with_token("secret"));
        let server = TestServer::new(app).expect("Failed to create test server");

        server
            .get(&submission_path())
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        server
            .get(&submission_path())
            .add_header(
                header::AUTHORIZATION,
                HeaderValue::from_static("Bearer secret"),
            )
            .await
            .assert_status_ok();
    }
}

mod seeding {
    use super::*;
    use grade_ledger::api::GradingStore;

    #[tokio::test]
    async fn demo_seed_serves_the_fixture_submission() {
        let store = GradingStore::from_seed(include_str!("../demos/seed.json"))
            .expect("Failed to parse seed");
        assert_eq!(store.len(), 1);

        let server = TestServer::new(create_router(store, AuthConfig::disabled()))
            .expect("Failed to create test server");
        let response = server.get(&properties_path()).await;

        response.assert_status_ok();
        response.assert_json(&common::properties());
    }
}
