use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use predicates::prelude::*;
use serde_json::json;
use tempfile::{TempDir, tempdir};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// COURSEHUB_HOME holding a stored session.
fn home_with_session(access: &str, refresh: &str) -> TempDir {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("session.json"),
        json!({ "token": access, "refreshToken": refresh }).to_string(),
    )
    .unwrap();
    dir
}

async fn mount_courses(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/courses/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "results": [{
                "id": 7,
                "title": "Rust for Beginners",
                "description": "Ownership and borrowing",
                "instructor": 12,
                "category": { "id": 1, "title": "Programming" },
                "price": "49.99"
            }]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_courses_list_renders_table() {
    let server = MockServer::start().await;
    mount_courses(&server).await;

    let dir = tempdir().unwrap();
    cargo_bin_cmd!("coursehub")
        .env("COURSEHUB_HOME", dir.path())
        .env("COURSEHUB_API_URL", server.uri())
        .args(["courses", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rust for Beginners"))
        .stdout(predicate::str::contains("Programming"))
        .stdout(predicate::str::contains("49.99"));
}

#[tokio::test]
async fn test_courses_show_missing_course() {
    let server = MockServer::start().await;
    mount_courses(&server).await;

    let dir = tempdir().unwrap();
    cargo_bin_cmd!("coursehub")
        .env("COURSEHUB_HOME", dir.path())
        .env("COURSEHUB_API_URL", server.uri())
        .args(["courses", "show", "99"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Course not found"));
}

#[tokio::test]
async fn test_expired_session_is_refreshed_transparently() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/enrollments/"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "detail": "Given token not valid for any token type"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/enrollments/"))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{
                "id": 1,
                "course": { "id": 7, "title": "Rust for Beginners" },
                "progress": 50,
                "completed_lessons": 2,
                "total_lessons": 4
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token/refresh/"))
        .and(body_json(json!({ "refresh": "R1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access": "A2" })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = home_with_session("A1", "R1");
    cargo_bin_cmd!("coursehub")
        .env("COURSEHUB_HOME", dir.path())
        .env("COURSEHUB_API_URL", server.uri())
        .arg("enrollments")
        .assert()
        .success()
        .stdout(predicate::str::contains("Rust for Beginners"))
        .stdout(predicate::str::contains("50%"))
        .stdout(predicate::str::contains("2/4"));

    let stored: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("session.json")).unwrap())
            .unwrap();
    assert_eq!(stored["token"], "A2");
    assert_eq!(stored["refreshToken"], "R1");
}

#[tokio::test]
async fn test_failed_refresh_reports_expired_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/profile/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "detail": "Given token not valid for any token type"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token/refresh/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "detail": "Token is invalid or expired"
        })))
        .mount(&server)
        .await;

    let dir = home_with_session("A1", "R-expired");
    cargo_bin_cmd!("coursehub")
        .env("COURSEHUB_HOME", dir.path())
        .env("COURSEHUB_API_URL", server.uri())
        .args(["profile", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Your session has expired. Please log in again.",
        ));

    cargo_bin_cmd!("coursehub")
        .env("COURSEHUB_HOME", dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in"));
}

#[tokio::test]
async fn test_enroll_requires_login() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    cargo_bin_cmd!("coursehub")
        .env("COURSEHUB_HOME", dir.path())
        .env("COURSEHUB_API_URL", server.uri())
        .args(["enroll", "7"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not logged in"));
}

#[tokio::test]
async fn test_enroll_creates_enrollment() {
    let server = MockServer::start().await;
    mount_courses(&server).await;
    Mock::given(method("GET"))
        .and(path("/enrollments/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/enrollments/"))
        .and(body_json(json!({ "user": 42, "course_id": 7, "price": "49.99" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 3, "course": 7 })))
        .expect(1)
        .mount(&server)
        .await;

    let access = format!(
        "eyJhbGciOiJIUzI1NiJ9.{}.sig",
        URL_SAFE_NO_PAD.encode(r#"{"user_id":42}"#)
    );
    let dir = home_with_session(&access, "R1");
    cargo_bin_cmd!("coursehub")
        .env("COURSEHUB_HOME", dir.path())
        .env("COURSEHUB_API_URL", server.uri())
        .args(["enroll", "7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Enrolled in Rust for Beginners"));
}

#[tokio::test]
async fn test_complete_lesson_reports_progress() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/lessons/2/complete/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "completed" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/lessons/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                { "id": 1, "title": "Intro", "completed": true },
                { "id": 2, "title": "Borrowing", "completed": true },
                { "id": 3, "title": "Lifetimes", "completed": false }
            ]
        })))
        .mount(&server)
        .await;

    let dir = home_with_session("A1", "R1");
    cargo_bin_cmd!("coursehub")
        .env("COURSEHUB_HOME", dir.path())
        .env("COURSEHUB_API_URL", server.uri())
        .args(["complete", "2", "--course", "7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Lesson 2 marked complete"))
        .stdout(predicate::str::contains("Progress: 2/3 lessons complete"));
}

#[tokio::test]
async fn test_enrollments_list_shows_stats() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/enrollments/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {
                    "id": 1,
                    "course": { "id": 7, "title": "Rust for Beginners" },
                    "completed_lessons": 1,
                    "total_lessons": 4
                },
                {
                    "id": 2,
                    "course": { "id": 8, "title": "Go Basics" },
                    "completed_lessons": 3,
                    "total_lessons": 3
                }
            ]
        })))
        .mount(&server)
        .await;

    let home = home_with_session("A1", "R1");
    cargo_bin_cmd!("coursehub")
        .env("COURSEHUB_HOME", home.path())
        .env("COURSEHUB_API_URL", server.uri())
        .arg("enrollments")
        .assert()
        .success()
        .stdout(predicate::str::contains("25%"))
        .stdout(predicate::str::contains("100%"))
        .stdout(predicate::str::contains("Enrolled: 2, Completed: 1"));
}
