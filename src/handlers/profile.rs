// src/handlers/profile.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        achievement::Achievement,
        exam::SubmissionWithExam,
        user::{MeResponse, UpdateProfileRequest, User},
    },
    utils::jwt::Claims,
};

#[derive(FromRow)]
struct MeRow {
    id: i64,
    email: String,
    username: String,
    role: String,
    full_name: String,
    institution: Option<String>,
    grade_level: Option<String>,
    total_points: i64,
    is_verified: bool,
    created_at: Option<DateTime<Utc>>,
    registrations_count: i64,
    submissions_count: i64,
    achievements_count: i64,
    rank: i64,
}

/// Get current user's profile, counters and leaderboard rank.
pub async fn get_me(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let me = sqlx::query_as::<_, MeRow>(
        r#"
        SELECT
            u.id, u.email, u.username, u.role, u.full_name, u.institution, u.grade_level,
            u.total_points, u.is_verified, u.created_at,
            (SELECT COUNT(*) FROM exam_registrations WHERE user_id = u.id) AS registrations_count,
            (SELECT COUNT(*) FROM exam_submissions WHERE user_id = u.id) AS submissions_count,
            (SELECT COUNT(*) FROM achievements WHERE user_id = u.id) AS achievements_count,
            (SELECT COUNT(*) + 1 FROM users r
             WHERE r.role = 'student' AND r.total_points > u.total_points) AS rank
        FROM users u
        WHERE u.id = $1
        "#,
    )
    .bind(claims.user_id())
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(MeResponse {
        id: me.id,
        email: me.email,
        username: me.username,
        role: me.role,
        full_name: me.full_name,
        institution: me.institution,
        grade_level: me.grade_level,
        total_points: me.total_points,
        is_verified: me.is_verified,
        created_at: me.created_at,
        registrations_count: me.registrations_count,
        submissions_count: me.submissions_count,
        achievements_count: me.achievements_count,
        rank: me.rank,
    }))
}

/// Edit the academic fields of the current user's profile.
pub async fn update_me(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET full_name = COALESCE($1, full_name),
            institution = COALESCE($2, institution),
            grade_level = COALESCE($3, grade_level)
        WHERE id = $4
        RETURNING id, email, username, password, role, full_name, institution, grade_level,
                  total_points, is_verified, created_at
        "#,
    )
    .bind(&payload.full_name)
    .bind(&payload.institution)
    .bind(&payload.grade_level)
    .bind(claims.user_id())
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

#[derive(Debug, FromRow, serde::Serialize)]
pub struct RegistrationWithExam {
    pub id: i64,
    pub exam_id: i64,
    pub exam_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Exams the current user has opted into.
pub async fn list_my_registrations(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let registrations = sqlx::query_as::<_, RegistrationWithExam>(
        r#"
        SELECT r.id, r.exam_id, e.name AS exam_name, e.start_time, e.end_time, r.created_at
        FROM exam_registrations r
        JOIN exams e ON r.exam_id = e.id
        WHERE r.user_id = $1
        ORDER BY e.start_time DESC
        "#,
    )
    .bind(claims.user_id())
    .fetch_all(&pool)
    .await?;

    Ok(Json(registrations))
}

/// The current user's submissions with scores and feedback.
pub async fn list_my_submissions(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let submissions = sqlx::query_as::<_, SubmissionWithExam>(
        r#"
        SELECT s.id, s.exam_id, e.name AS exam_name, s.submission_file_url, s.submitted_at,
               s.score, s.feedback
        FROM exam_submissions s
        JOIN exams e ON s.exam_id = e.id
        WHERE s.user_id = $1
        ORDER BY s.submitted_at DESC
        "#,
    )
    .bind(claims.user_id())
    .fetch_all(&pool)
    .await?;

    Ok(Json(submissions))
}

/// Achievements awarded to the current user.
pub async fn list_my_achievements(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let achievements = sqlx::query_as::<_, Achievement>(
        r#"
        SELECT id, user_id, title, description, points, awarded_at
        FROM achievements
        WHERE user_id = $1
        ORDER BY awarded_at DESC
        "#,
    )
    .bind(claims.user_id())
    .fetch_all(&pool)
    .await?;

    Ok(Json(achievements))
}
