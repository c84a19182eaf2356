// tests/exam_tests.rs

mod common;

use chrono::{Duration, Utc};
use common::spawn_app;

fn exam_payload(
    reg_start_mins: i64,
    reg_end_mins: i64,
    start_mins: i64,
    end_mins: i64,
) -> serde_json::Value {
    let now = Utc::now();
    serde_json::json!({
        "name": "Selection Round",
        "description": "Qualifier for the national olympiad team",
        "reg_start_time": (now + Duration::minutes(reg_start_mins)).to_rfc3339(),
        "reg_end_time": (now + Duration::minutes(reg_end_mins)).to_rfc3339(),
        "start_time": (now + Duration::minutes(start_mins)).to_rfc3339(),
        "end_time": (now + Duration::minutes(end_mins)).to_rfc3339(),
        "duration_minutes": 60,
        "max_score": 100,
        "question_file_url": "https://files.test.local/papers/selection.pdf"
    })
}

async fn create_exam(
    app: &common::TestApp,
    admin_token: &str,
    payload: &serde_json::Value,
) -> i64 {
    let resp = app
        .client
        .post(format!("{}/api/admin/exams", app.address))
        .bearer_auth(admin_token)
        .json(payload)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    resp.json::<serde_json::Value>().await.unwrap()["id"]
        .as_i64()
        .unwrap()
}

#[tokio::test]
async fn exam_creation_rejects_inverted_windows() {
    let Some(app) = spawn_app().await else { return };
    let admin_token = common::seed_admin(&app).await;

    // reg_end before reg_start
    let resp = app
        .client
        .post(format!("{}/api/admin/exams", app.address))
        .bearer_auth(&admin_token)
        .json(&exam_payload(30, 10, 60, 120))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    // start before reg_end
    let resp = app
        .client
        .post(format!("{}/api/admin/exams", app.address))
        .bearer_auth(&admin_token)
        .json(&exam_payload(0, 60, 30, 120))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn exam_creation_requires_admin() {
    let Some(app) = spawn_app().await else { return };
    let (student_token, _, _) = common::register_verified_student(&app).await;

    let resp = app
        .client
        .post(format!("{}/api/admin/exams", app.address))
        .bearer_auth(&student_token)
        .json(&exam_payload(0, 60, 90, 180))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn registration_respects_the_window() {
    let Some(app) = spawn_app().await else { return };
    let admin_token = common::seed_admin(&app).await;
    let (student_token, _, _) = common::register_verified_student(&app).await;

    // Registration not open yet
    let upcoming = create_exam(&app, &admin_token, &exam_payload(30, 60, 90, 180)).await;
    let resp = app
        .client
        .post(format!("{}/api/exams/{}/register", app.address, upcoming))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);

    // Registration already closed
    let closed = create_exam(&app, &admin_token, &exam_payload(-120, -60, 90, 180)).await;
    let resp = app
        .client
        .post(format!("{}/api/exams/{}/register", app.address, closed))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);

    // Open window succeeds, duplicate conflicts
    let open = create_exam(&app, &admin_token, &exam_payload(-10, 30, 60, 180)).await;
    let resp = app
        .client
        .post(format!("{}/api/exams/{}/register", app.address, open))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);

    let resp = app
        .client
        .post(format!("{}/api/exams/{}/register", app.address, open))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);
    let body = resp.json::<serde_json::Value>().await.unwrap();
    assert_eq!(body["error"], "Already registered for this exam");
}

#[tokio::test]
async fn simultaneous_duplicate_registrations_keep_one_row() {
    let Some(app) = spawn_app().await else { return };
    let admin_token = common::seed_admin(&app).await;
    let (student_token, student_id, _) = common::register_verified_student(&app).await;
    let exam_id = create_exam(&app, &admin_token, &exam_payload(-10, 30, 60, 180)).await;

    let url = format!("{}/api/exams/{}/register", app.address, exam_id);
    let first = app.client.post(&url).bearer_auth(&student_token).send();
    let second = app.client.post(&url).bearer_auth(&student_token).send();

    // Both requests race; the unique index decides the winner.
    let (first, second) = tokio::join!(first, second);
    let mut statuses = [
        first.unwrap().status().as_u16(),
        second.unwrap().status().as_u16(),
    ];
    statuses.sort();
    assert_eq!(statuses, [201, 409]);

    let rows: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM exam_registrations WHERE user_id = $1 AND exam_id = $2",
    )
    .bind(student_id)
    .bind(exam_id)
    .fetch_one(&app.pool)
    .await
    .unwrap();
    assert_eq!(rows.0, 1);
}

#[tokio::test]
async fn unverified_users_cannot_register() {
    let Some(app) = spawn_app().await else { return };
    let admin_token = common::seed_admin(&app).await;
    let exam_id = create_exam(&app, &admin_token, &exam_payload(-10, 30, 60, 180)).await;

    // Register but skip email verification
    let suffix = &uuid::Uuid::new_v4().to_string()[..8];
    let email = format!("unverified_{}@test.local", suffix);
    let resp = app
        .client
        .post(format!("{}/api/auth/register", app.address))
        .json(&serde_json::json!({
            "email": email,
            "username": format!("unverified_{}", suffix),
            "password": "student_password_123",
            "full_name": "Unverified Student"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let token = common::login(&app, &email, "student_password_123").await;

    let resp = app
        .client
        .post(format!("{}/api/exams/{}/register", app.address, exam_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn question_paper_is_hidden_until_the_exam_starts() {
    let Some(app) = spawn_app().await else { return };
    let admin_token = common::seed_admin(&app).await;

    let pending = create_exam(&app, &admin_token, &exam_payload(-10, 30, 60, 180)).await;
    let resp = app
        .client
        .get(format!("{}/api/exams/{}", app.address, pending))
        .send()
        .await
        .unwrap();
    let body = resp.json::<serde_json::Value>().await.unwrap();
    assert_eq!(body["window"], "registration_open");
    assert!(body["question_file_url"].is_null());

    let ongoing = create_exam(&app, &admin_token, &exam_payload(-120, -60, -10, 60)).await;
    let resp = app
        .client
        .get(format!("{}/api/exams/{}", app.address, ongoing))
        .send()
        .await
        .unwrap();
    let body = resp.json::<serde_json::Value>().await.unwrap();
    assert_eq!(body["window"], "ongoing");
    assert_eq!(
        body["question_file_url"],
        "https://files.test.local/papers/selection.pdf"
    );
}

#[tokio::test]
async fn submission_lifecycle_and_grading() {
    let Some(app) = spawn_app().await else { return };
    let admin_token = common::seed_admin(&app).await;
    let (student_token, student_id, _) = common::register_verified_student(&app).await;

    // Register while the window is open
    let exam_id = create_exam(&app, &admin_token, &exam_payload(-10, 30, 60, 180)).await;
    let resp = app
        .client
        .post(format!("{}/api/exams/{}/register", app.address, exam_id))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);

    // Too early to submit
    let answer = serde_json::json!({
        "submission_file_url": "https://files.test.local/answers/a1.pdf"
    });
    let resp = app
        .client
        .post(format!("{}/api/exams/{}/submit", app.address, exam_id))
        .bearer_auth(&student_token)
        .json(&answer)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);

    // Shift the windows so the exam is now ongoing
    let now = Utc::now();
    let resp = app
        .client
        .put(format!("{}/api/admin/exams/{}", app.address, exam_id))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({
            "reg_start_time": (now - Duration::minutes(120)).to_rfc3339(),
            "reg_end_time": (now - Duration::minutes(60)).to_rfc3339(),
            "start_time": (now - Duration::minutes(10)).to_rfc3339(),
            "end_time": (now + Duration::minutes(60)).to_rfc3339(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    // Empty submit is rejected when ACCEPT_EMPTY_SUBMISSIONS is off
    let resp = app
        .client
        .post(format!("{}/api/exams/{}/submit", app.address, exam_id))
        .bearer_auth(&student_token)
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    // Proper submission succeeds once
    let resp = app
        .client
        .post(format!("{}/api/exams/{}/submit", app.address, exam_id))
        .bearer_auth(&student_token)
        .json(&answer)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let submission_id = resp.json::<serde_json::Value>().await.unwrap()["id"]
        .as_i64()
        .unwrap();

    let resp = app
        .client
        .post(format!("{}/api/exams/{}/submit", app.address, exam_id))
        .bearer_auth(&student_token)
        .json(&answer)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);

    // A second verified student who never registered cannot submit
    let (other_token, _, _) = common::register_verified_student(&app).await;
    let resp = app
        .client
        .post(format!("{}/api/exams/{}/submit", app.address, exam_id))
        .bearer_auth(&other_token)
        .json(&answer)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);

    // Score above the exam maximum is refused
    let resp = app
        .client
        .patch(format!(
            "{}/api/admin/exams/{}/submissions",
            app.address, exam_id
        ))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({ "submission_id": submission_id, "score": 150 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    // Grade, then check the points aggregate
    let resp = app
        .client
        .patch(format!(
            "{}/api/admin/exams/{}/submissions",
            app.address, exam_id
        ))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({
            "submission_id": submission_id,
            "score": 80,
            "feedback": "Strong geometry, weak combinatorics"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let body = resp.json::<serde_json::Value>().await.unwrap();
    assert_eq!(body["score"], 80);

    let points: (i64,) = sqlx::query_as("SELECT total_points FROM users WHERE id = $1")
        .bind(student_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(points.0, 80);

    // Re-grading overwrites rather than accumulates
    let resp = app
        .client
        .patch(format!(
            "{}/api/admin/exams/{}/submissions",
            app.address, exam_id
        ))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({ "submission_id": submission_id, "score": 90 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let points: (i64,) = sqlx::query_as("SELECT total_points FROM users WHERE id = $1")
        .bind(student_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(points.0, 90);

    // The graded score shows up in the student's own submission history
    let resp = app
        .client
        .get(format!("{}/api/profile/submissions", app.address))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap();
    let body = resp.json::<serde_json::Value>().await.unwrap();
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["score"], 90);
}

#[tokio::test]
async fn achievements_feed_the_points_aggregate() {
    let Some(app) = spawn_app().await else { return };
    let admin_token = common::seed_admin(&app).await;
    let (_, student_id, _) = common::register_verified_student(&app).await;

    let resp = app
        .client
        .post(format!("{}/api/admin/achievements", app.address))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({
            "user_id": student_id,
            "title": "Divisional Champion",
            "points": 50
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let achievement_id = resp.json::<serde_json::Value>().await.unwrap()["id"]
        .as_i64()
        .unwrap();

    let points: (i64,) = sqlx::query_as("SELECT total_points FROM users WHERE id = $1")
        .bind(student_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(points.0, 50);

    // Revoking the achievement rolls the aggregate back
    let resp = app
        .client
        .delete(format!(
            "{}/api/admin/achievements/{}",
            app.address, achievement_id
        ))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);

    let points: (i64,) = sqlx::query_as("SELECT total_points FROM users WHERE id = $1")
        .bind(student_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(points.0, 0);
}

#[tokio::test]
async fn leaderboard_ranks_students_by_points() {
    let Some(app) = spawn_app().await else { return };
    let admin_token = common::seed_admin(&app).await;
    let (_, student_id, _) = common::register_verified_student(&app).await;

    let resp = app
        .client
        .post(format!("{}/api/admin/achievements", app.address))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({
            "user_id": student_id,
            "title": "Perfect Score",
            "points": 1000000
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);

    let resp = app
        .client
        .get(format!("{}/api/exams/leaderboard", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let body = resp.json::<serde_json::Value>().await.unwrap();
    let entries = body.as_array().unwrap();
    assert!(!entries.is_empty());
    assert_eq!(entries[0]["rank"], 1);
    assert_eq!(entries[0]["total_points"], 1000000);
    // Only students appear; the seeded admin is filtered out
    assert!(
        entries
            .iter()
            .all(|e| !e["username"].as_str().unwrap().starts_with("admin_"))
    );
}
