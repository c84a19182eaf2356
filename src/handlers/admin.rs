// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{FromRow, PgConnection, PgPool};
use validator::Validate;

use crate::{
    config::DEFAULT_MAX_SCORE,
    error::{AppError, is_unique_violation},
    models::{
        achievement::{Achievement, CreateAchievementRequest},
        exam::{
            CreateExamRequest, Exam, GradeSubmissionRequest, UpdateExamRequest,
            window_ordering_ok,
        },
        user::User,
    },
    utils::{hash::hash_password, html::clean_html, jwt::Claims},
};

const SELECT_EXAM: &str = r#"
    SELECT id, name, description, reg_start_time, reg_end_time, start_time, end_time,
           duration_minutes, max_score, question_file_url, announcement, created_at
    FROM exams
"#;

/// Recomputes the denormalized points aggregate for one user:
/// achievement points plus graded exam scores. Runs inside the same
/// transaction as the write that invalidated it.
async fn recompute_total_points(conn: &mut PgConnection, user_id: i64) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE users
        SET total_points =
              COALESCE((SELECT SUM(points) FROM achievements WHERE user_id = $1), 0)
            + COALESCE((SELECT SUM(score) FROM exam_submissions
                        WHERE user_id = $1 AND score IS NOT NULL), 0)
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

// ---------------------------------------------------------------------------
// User management
// ---------------------------------------------------------------------------

/// Lists all users in the system. Admin only.
pub async fn list_users(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT id, email, username, password, role, full_name, institution, grade_level,
               total_points, is_verified, created_at
        FROM users
        ORDER BY id DESC
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list users: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(users))
}

fn validate_role(role: &str) -> Result<(), AppError> {
    match role {
        "student" | "moderator" | "admin" => Ok(()),
        _ => Err(AppError::BadRequest(
            "Role must be 'student', 'moderator' or 'admin'".to_string(),
        )),
    }
}

/// DTO for Admin creating a user (can specify role).
#[derive(Debug, Deserialize, Validate)]
pub struct AdminCreateUserRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    pub role: String,
    #[validate(length(min = 1, max = 100))]
    pub full_name: String,
}

/// Creates a new user with a specific role. Admin-created accounts are
/// considered verified. Admin only.
pub async fn create_user(
    State(pool): State<PgPool>,
    Json(payload): Json<AdminCreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    validate_role(&payload.role)?;

    let hashed_password = hash_password(&payload.password)?;

    let row = sqlx::query_as::<_, (i64,)>(
        r#"
        INSERT INTO users (email, username, password, role, full_name, is_verified)
        VALUES ($1, $2, $3, $4, $5, TRUE)
        RETURNING id
        "#,
    )
    .bind(&payload.email)
    .bind(&payload.username)
    .bind(&hashed_password)
    .bind(&payload.role)
    .bind(&payload.full_name)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("Email or username already in use".to_string())
        } else {
            tracing::error!("Failed to create user: {:?}", e);
            AppError::InternalServerError(e.to_string())
        }
    })?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": row.0 }))))
}

/// DTO for updating a user. Fields are optional.
#[derive(Debug, Deserialize)]
pub struct AdminUpdateUserRequest {
    pub username: Option<String>,
    pub role: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub is_verified: Option<bool>,
}

/// Updates user information and returns the updated account. Admin only.
pub async fn update_user(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<AdminUpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    // Check existence
    sqlx::query_as::<_, (i64,)>("SELECT id FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    if let Some(role) = &payload.role {
        validate_role(role)?;
    }

    // Perform updates sequentially if fields are present
    if let Some(new_username) = payload.username {
        sqlx::query("UPDATE users SET username = $1 WHERE id = $2")
            .bind(new_username)
            .bind(id)
            .execute(&pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict("Username already in use".to_string())
                } else {
                    AppError::InternalServerError(e.to_string())
                }
            })?;
    }

    if let Some(new_role) = payload.role {
        sqlx::query("UPDATE users SET role = $1 WHERE id = $2")
            .bind(new_role)
            .bind(id)
            .execute(&pool)
            .await?;
    }

    if let Some(new_password) = payload.password {
        let hashed = hash_password(&new_password)?;
        sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
            .bind(hashed)
            .bind(id)
            .execute(&pool)
            .await?;
    }

    if let Some(new_full_name) = payload.full_name {
        sqlx::query("UPDATE users SET full_name = $1 WHERE id = $2")
            .bind(new_full_name)
            .bind(id)
            .execute(&pool)
            .await?;
    }

    if let Some(verified) = payload.is_verified {
        sqlx::query("UPDATE users SET is_verified = $1 WHERE id = $2")
            .bind(verified)
            .bind(id)
            .execute(&pool)
            .await?;
    }

    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, email, username, password, role, full_name, institution, grade_level,
               total_points, is_verified, created_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(user))
}

/// Deletes a user by ID. Admin only. Prevents deleting self.
pub async fn delete_user(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    // Prevent self-deletion
    if id == claims.user_id() {
        return Err(AppError::BadRequest("Cannot delete yourself".to_string()));
    }

    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete user: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Exam management
// ---------------------------------------------------------------------------

/// Creates a new exam. Admin only.
/// The four window timestamps must be consistently ordered.
pub async fn create_exam(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    if !window_ordering_ok(
        payload.reg_start_time,
        payload.reg_end_time,
        payload.start_time,
        payload.end_time,
    ) {
        return Err(AppError::BadRequest(
            "Exam windows must satisfy reg_start <= reg_end <= start <= end".to_string(),
        ));
    }

    let announcement = payload.announcement.as_deref().map(clean_html);

    let exam = sqlx::query_as::<_, Exam>(
        r#"
        INSERT INTO exams (name, description, reg_start_time, reg_end_time, start_time, end_time,
                           duration_minutes, max_score, question_file_url, announcement)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING id, name, description, reg_start_time, reg_end_time, start_time, end_time,
                  duration_minutes, max_score, question_file_url, announcement, created_at
        "#,
    )
    .bind(&payload.name)
    .bind(payload.description.as_deref().unwrap_or(""))
    .bind(payload.reg_start_time)
    .bind(payload.reg_end_time)
    .bind(payload.start_time)
    .bind(payload.end_time)
    .bind(payload.duration_minutes)
    .bind(payload.max_score.unwrap_or(DEFAULT_MAX_SCORE))
    .bind(&payload.question_file_url)
    .bind(&announcement)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create exam: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(exam)))
}

/// Updates an exam. Admin only.
///
/// Merges the partial payload onto the stored row first so the window
/// ordering invariant can be checked across old and new values together.
pub async fn update_exam(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    let current = sqlx::query_as::<_, Exam>(&format!("{} WHERE id = $1", SELECT_EXAM))
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Exam not found".to_string()))?;

    let reg_start = payload.reg_start_time.unwrap_or(current.reg_start_time);
    let reg_end = payload.reg_end_time.unwrap_or(current.reg_end_time);
    let start = payload.start_time.unwrap_or(current.start_time);
    let end = payload.end_time.unwrap_or(current.end_time);

    if !window_ordering_ok(reg_start, reg_end, start, end) {
        return Err(AppError::BadRequest(
            "Exam windows must satisfy reg_start <= reg_end <= start <= end".to_string(),
        ));
    }

    let duration = payload.duration_minutes.unwrap_or(current.duration_minutes);
    let max_score = payload.max_score.unwrap_or(current.max_score);
    if duration < 1 || max_score < 1 {
        return Err(AppError::BadRequest(
            "Duration and max score must be positive".to_string(),
        ));
    }

    let announcement = match payload.announcement {
        Some(a) => Some(clean_html(&a)),
        None => current.announcement,
    };

    let exam = sqlx::query_as::<_, Exam>(
        r#"
        UPDATE exams
        SET name = $1, description = $2, reg_start_time = $3, reg_end_time = $4,
            start_time = $5, end_time = $6, duration_minutes = $7, max_score = $8,
            question_file_url = $9, announcement = $10
        WHERE id = $11
        RETURNING id, name, description, reg_start_time, reg_end_time, start_time, end_time,
                  duration_minutes, max_score, question_file_url, announcement, created_at
        "#,
    )
    .bind(payload.name.unwrap_or(current.name))
    .bind(payload.description.unwrap_or(current.description))
    .bind(reg_start)
    .bind(reg_end)
    .bind(start)
    .bind(end)
    .bind(duration)
    .bind(max_score)
    .bind(payload.question_file_url.or(current.question_file_url))
    .bind(announcement)
    .bind(id)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to update exam: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(exam))
}

/// Deletes an exam (registrations and submissions cascade). Admin only.
pub async fn delete_exam(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM exams WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete exam: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Exam not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Grading
// ---------------------------------------------------------------------------

#[derive(Debug, FromRow, serde::Serialize)]
pub struct SubmissionWithStudent {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub full_name: String,
    pub submission_file_url: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub score: Option<i64>,
    pub feedback: Option<String>,
    pub graded_at: Option<DateTime<Utc>>,
}

/// Lists all submissions of one exam with student identity. Admin only.
pub async fn list_exam_submissions(
    State(pool): State<PgPool>,
    Path(exam_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    sqlx::query_as::<_, (i64,)>("SELECT id FROM exams WHERE id = $1")
        .bind(exam_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Exam not found".to_string()))?;

    let submissions = sqlx::query_as::<_, SubmissionWithStudent>(
        r#"
        SELECT s.id, s.user_id, u.username, u.full_name, s.submission_file_url,
               s.submitted_at, s.score, s.feedback, s.graded_at
        FROM exam_submissions s
        JOIN users u ON s.user_id = u.id
        WHERE s.exam_id = $1
        ORDER BY s.submitted_at ASC
        "#,
    )
    .bind(exam_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(submissions))
}

#[derive(FromRow)]
struct GradeTarget {
    user_id: i64,
    max_score: i64,
}

/// Grades a submission: persists score and feedback, then recomputes the
/// student's points aggregate in the same transaction. Re-grading overwrites
/// (update semantics). Admin only.
pub async fn grade_submission(
    State(pool): State<PgPool>,
    Path(exam_id): Path<i64>,
    Json(payload): Json<GradeSubmissionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let target = sqlx::query_as::<_, GradeTarget>(
        r#"
        SELECT s.user_id, e.max_score
        FROM exam_submissions s
        JOIN exams e ON s.exam_id = e.id
        WHERE s.id = $1 AND s.exam_id = $2
        "#,
    )
    .bind(payload.submission_id)
    .bind(exam_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound(
        "Submission not found for this exam".to_string(),
    ))?;

    if payload.score > target.max_score {
        return Err(AppError::BadRequest(format!(
            "Score exceeds the exam maximum of {}",
            target.max_score
        )));
    }

    let mut tx = pool.begin().await?;

    let submission = sqlx::query_as::<_, crate::models::exam::ExamSubmission>(
        r#"
        UPDATE exam_submissions
        SET score = $1, feedback = $2, graded_at = NOW()
        WHERE id = $3
        RETURNING id, user_id, exam_id, submission_file_url, answers, submitted_at,
                  score, feedback, graded_at
        "#,
    )
    .bind(payload.score)
    .bind(&payload.feedback)
    .bind(payload.submission_id)
    .fetch_one(&mut *tx)
    .await?;

    recompute_total_points(&mut *tx, target.user_id).await?;

    tx.commit().await?;

    Ok(Json(submission))
}

// ---------------------------------------------------------------------------
// Achievements
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ListAchievementsParams {
    pub user_id: Option<i64>,
}

/// Lists achievements, optionally filtered by user. Admin only.
pub async fn list_achievements(
    State(pool): State<PgPool>,
    Query(params): Query<ListAchievementsParams>,
) -> Result<impl IntoResponse, AppError> {
    let achievements = sqlx::query_as::<_, Achievement>(
        r#"
        SELECT id, user_id, title, description, points, awarded_at
        FROM achievements
        WHERE ($1::BIGINT IS NULL OR user_id = $1)
        ORDER BY awarded_at DESC
        "#,
    )
    .bind(params.user_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(achievements))
}

/// Awards an achievement and folds its points into the user's aggregate.
/// Admin only.
pub async fn create_achievement(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateAchievementRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    sqlx::query_as::<_, (i64,)>("SELECT id FROM users WHERE id = $1")
        .bind(payload.user_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    let mut tx = pool.begin().await?;

    let achievement = sqlx::query_as::<_, Achievement>(
        r#"
        INSERT INTO achievements (user_id, title, description, points)
        VALUES ($1, $2, $3, $4)
        RETURNING id, user_id, title, description, points, awarded_at
        "#,
    )
    .bind(payload.user_id)
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(payload.points)
    .fetch_one(&mut *tx)
    .await?;

    recompute_total_points(&mut *tx, payload.user_id).await?;

    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(achievement)))
}

/// Revokes an achievement and recomputes the affected aggregate. Admin only.
pub async fn delete_achievement(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = pool.begin().await?;

    let deleted = sqlx::query_as::<_, (i64,)>(
        "DELETE FROM achievements WHERE id = $1 RETURNING user_id",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some((user_id,)) = deleted else {
        return Err(AppError::NotFound("Achievement not found".to_string()));
    };

    recompute_total_points(&mut *tx, user_id).await?;

    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}
