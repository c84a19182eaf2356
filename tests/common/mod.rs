// tests/common/mod.rs

#![allow(dead_code)]

use mathclub_backend::{
    config::Config,
    routes,
    state::AppState,
    utils::{hash::hash_password, mailer::Mailer, upload::UploadClient},
};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;

pub struct TestApp {
    pub address: String,
    pub pool: PgPool,
    pub client: reqwest::Client,
}

/// Spawns the app on a random port against DATABASE_URL.
///
/// Returns None (skipping the test) when no database is configured, so the
/// suite stays green on machines without Postgres.
pub async fn spawn_app() -> Option<TestApp> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("Skipping integration test: DATABASE_URL not set");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: database_url.clone(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        admin_email: None,
        admin_password: None,
        accept_empty_submissions: false,
        smtp_host: None,
        smtp_username: None,
        smtp_password: None,
        smtp_from: None,
        blob_store_url: None,
    };

    let mailer = Mailer::from_config(&config).expect("mailer");
    let uploader = UploadClient::from_config(&config).expect("uploader");

    let state = AppState {
        pool: pool.clone(),
        config,
        mailer,
        uploader,
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    Some(TestApp {
        address,
        pool,
        client: reqwest::Client::new(),
    })
}

/// Seeds an admin account directly and returns a bearer token for it.
pub async fn seed_admin(app: &TestApp) -> String {
    let suffix = &uuid::Uuid::new_v4().to_string()[..8];
    let email = format!("admin_{}@test.local", suffix);
    let password = "admin_password_123";
    let hashed = hash_password(password).unwrap();

    sqlx::query(
        r#"
        INSERT INTO users (email, username, password, role, full_name, is_verified)
        VALUES ($1, $2, $3, 'admin', 'Test Admin', TRUE)
        "#,
    )
    .bind(&email)
    .bind(format!("admin_{}", suffix))
    .bind(&hashed)
    .execute(&app.pool)
    .await
    .unwrap();

    login(app, &email, password).await
}

/// Seeds a moderator account directly and returns a bearer token.
pub async fn seed_moderator(app: &TestApp) -> String {
    let suffix = &uuid::Uuid::new_v4().to_string()[..8];
    let email = format!("mod_{}@test.local", suffix);
    let password = "mod_password_123";
    let hashed = hash_password(password).unwrap();

    sqlx::query(
        r#"
        INSERT INTO users (email, username, password, role, full_name, is_verified)
        VALUES ($1, $2, $3, 'moderator', 'Test Moderator', TRUE)
        "#,
    )
    .bind(&email)
    .bind(format!("mod_{}", suffix))
    .bind(&hashed)
    .execute(&app.pool)
    .await
    .unwrap();

    login(app, &email, password).await
}

/// Logs in and returns the bearer token.
pub async fn login(app: &TestApp, email: &str, password: &str) -> String {
    let resp = app
        .client
        .post(format!("{}/api/auth/login", app.address))
        .json(&serde_json::json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Login failed")
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse login json");

    resp["token"].as_str().expect("Token not found").to_string()
}

/// Registers a student via the API, verifies the email using the code stored
/// in the database, and returns (token, user_id, email).
pub async fn register_verified_student(app: &TestApp) -> (String, i64, String) {
    let suffix = &uuid::Uuid::new_v4().to_string()[..8];
    let email = format!("student_{}@test.local", suffix);
    let password = "student_password_123";

    let resp = app
        .client
        .post(format!("{}/api/auth/register", app.address))
        .json(&serde_json::json!({
            "email": email,
            "username": format!("student_{}", suffix),
            "password": password,
            "full_name": "Test Student"
        }))
        .send()
        .await
        .expect("Register failed");
    assert_eq!(resp.status().as_u16(), 201);

    let (user_id, code): (i64, String) = sqlx::query_as(
        r#"
        SELECT u.id, v.code
        FROM users u
        JOIN email_verifications v ON v.user_id = u.id
        WHERE u.email = $1
        "#,
    )
    .bind(&email)
    .fetch_one(&app.pool)
    .await
    .expect("Verification code not found");

    let resp = app
        .client
        .post(format!("{}/api/auth/verify-email", app.address))
        .json(&serde_json::json!({ "email": email, "code": code }))
        .send()
        .await
        .expect("Verify failed");
    assert_eq!(resp.status().as_u16(), 200);

    let token = login(app, &email, password).await;
    (token, user_id, email)
}
