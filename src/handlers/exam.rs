// src/handlers/exam.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sqlx::PgPool;

use crate::{
    config::{Config, LEADERBOARD_LIMIT},
    error::{AppError, is_unique_violation},
    models::{
        exam::{Exam, ExamRegistration, ExamSubmission, ExamWindow, ExamWithWindow,
               SubmitExamRequest},
        user::{LeaderboardEntry, User},
    },
    utils::jwt::Claims,
};

async fn fetch_exam(pool: &PgPool, id: i64) -> Result<Exam, AppError> {
    sqlx::query_as::<_, Exam>(
        r#"
        SELECT id, name, description, reg_start_time, reg_end_time, start_time, end_time,
               duration_minutes, max_score, question_file_url, announcement, created_at
        FROM exams
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Exam not found".to_string()))
}

/// Loads the caller and enforces email verification.
/// Exam actions and payments are reserved for verified accounts.
pub(crate) async fn require_verified_user(pool: &PgPool, user_id: i64) -> Result<User, AppError> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, email, username, password, role, full_name, institution, grade_level,
               total_points, is_verified, created_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))?;

    if !user.is_verified && user.role != "admin" {
        return Err(AppError::Forbidden(
            "Please verify your email address first".to_string(),
        ));
    }

    Ok(user)
}

/// The question paper stays hidden until the exam starts; past papers
/// remain visible after conclusion.
fn redact_question_paper(exam: &mut Exam, window: ExamWindow) {
    if !matches!(window, ExamWindow::Ongoing | ExamWindow::Concluded) {
        exam.question_file_url = None;
    }
}

/// Lists all exams with their computed window state, newest first.
pub async fn list_exams(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let exams = sqlx::query_as::<_, Exam>(
        r#"
        SELECT id, name, description, reg_start_time, reg_end_time, start_time, end_time,
               duration_minutes, max_score, question_file_url, announcement, created_at
        FROM exams
        ORDER BY start_time DESC
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list exams: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let now = Utc::now();
    let response: Vec<ExamWithWindow> = exams
        .into_iter()
        .map(|mut exam| {
            let window = ExamWindow::at(&exam, now);
            redact_question_paper(&mut exam, window);
            ExamWithWindow { exam, window }
        })
        .collect();

    Ok(Json(response))
}

/// Retrieves a single exam with its computed window state.
pub async fn get_exam(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let mut exam = fetch_exam(&pool, id).await?;
    let window = ExamWindow::at(&exam, Utc::now());
    redact_question_paper(&mut exam, window);

    Ok(Json(ExamWithWindow { exam, window }))
}

/// Registers the current user for an exam.
///
/// Allowed only while the registration window is open. The unique index on
/// (user_id, exam_id) serializes concurrent duplicates.
pub async fn register_for_exam(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(exam_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = require_verified_user(&pool, claims.user_id()).await?;
    let exam = fetch_exam(&pool, exam_id).await?;

    match ExamWindow::at(&exam, Utc::now()) {
        ExamWindow::RegistrationOpen => {}
        ExamWindow::Upcoming => {
            return Err(AppError::Conflict(
                "Registration has not opened yet".to_string(),
            ));
        }
        _ => {
            return Err(AppError::Conflict("Registration is closed".to_string()));
        }
    }

    let registration = sqlx::query_as::<_, ExamRegistration>(
        r#"
        INSERT INTO exam_registrations (user_id, exam_id)
        VALUES ($1, $2)
        RETURNING id, user_id, exam_id, created_at
        "#,
    )
    .bind(user.id)
    .bind(exam.id)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("Already registered for this exam".to_string())
        } else {
            tracing::error!("Failed to register for exam: {:?}", e);
            AppError::from(e)
        }
    })?;

    Ok((StatusCode::CREATED, Json(registration)))
}

/// Submits the answer artifact for an ongoing exam.
///
/// Requires a prior registration and at most one submission per (user, exam).
/// An artifact-less submit (timer-expiry auto-submit with nothing uploaded)
/// is rejected unless `ACCEPT_EMPTY_SUBMISSIONS` is enabled, in which case an
/// empty submission row is recorded.
pub async fn submit_exam(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
    Path(exam_id): Path<i64>,
    Json(payload): Json<SubmitExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = require_verified_user(&pool, claims.user_id()).await?;
    let exam = fetch_exam(&pool, exam_id).await?;

    match ExamWindow::at(&exam, Utc::now()) {
        ExamWindow::Ongoing => {}
        ExamWindow::Concluded => {
            return Err(AppError::Conflict(
                "Submission window has closed".to_string(),
            ));
        }
        _ => {
            return Err(AppError::Conflict("Exam has not started yet".to_string()));
        }
    }

    let registered = sqlx::query_as::<_, (i64,)>(
        "SELECT id FROM exam_registrations WHERE user_id = $1 AND exam_id = $2",
    )
    .bind(user.id)
    .bind(exam.id)
    .fetch_optional(&pool)
    .await?;

    if registered.is_none() {
        return Err(AppError::Conflict(
            "Not registered for this exam".to_string(),
        ));
    }

    let file_url = payload
        .submission_file_url
        .as_deref()
        .filter(|u| !u.is_empty());

    match file_url {
        Some(raw) => {
            url::Url::parse(raw)
                .map_err(|_| AppError::BadRequest("Invalid answer file URL".to_string()))?;
        }
        None => {
            if !config.accept_empty_submissions {
                return Err(AppError::BadRequest("Missing answer file".to_string()));
            }
        }
    }

    let submission = sqlx::query_as::<_, ExamSubmission>(
        r#"
        INSERT INTO exam_submissions (user_id, exam_id, submission_file_url, answers)
        VALUES ($1, $2, $3, $4)
        RETURNING id, user_id, exam_id, submission_file_url, answers, submitted_at,
                  score, feedback, graded_at
        "#,
    )
    .bind(user.id)
    .bind(exam.id)
    .bind(file_url)
    .bind(&payload.answers)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("Already submitted for this exam".to_string())
        } else {
            tracing::error!("Failed to record submission: {:?}", e);
            AppError::from(e)
        }
    })?;

    Ok((StatusCode::CREATED, Json(submission)))
}

/// Public leaderboard: top users by total points.
pub async fn leaderboard(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let mut entries = sqlx::query_as::<_, LeaderboardEntry>(
        r#"
        SELECT username, full_name, total_points, 0::BIGINT AS rank
        FROM users
        WHERE role = 'student'
        ORDER BY total_points DESC, username ASC
        LIMIT $1
        "#,
    )
    .bind(LEADERBOARD_LIMIT)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch leaderboard: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    for (i, entry) in entries.iter_mut().enumerate() {
        entry.rank = (i + 1) as i64;
    }

    Ok(Json(entries))
}
