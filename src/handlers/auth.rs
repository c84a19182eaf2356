// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{Duration, Utc};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    config::{Config, OTP_TTL_MINUTES},
    error::{AppError, is_unique_violation},
    models::user::{
        CreateUserRequest, LoginRequest, ResendOtpRequest, User, VerifyEmailRequest,
    },
    utils::{
        hash::{hash_password, verify_password},
        jwt::sign_jwt,
        mailer::Mailer,
        otp::generate_code,
    },
};

/// Registers a new student account.
///
/// Hashes the password using Argon2, stores a 6-digit verification code and
/// emails it. The account stays unverified until the code is consumed.
pub async fn register(
    State(pool): State<PgPool>,
    State(mailer): State<Mailer>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let hashed_password = hash_password(&payload.password)?;

    let mut tx = pool.begin().await?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (email, username, password, full_name, institution, grade_level)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, email, username, password, role, full_name, institution, grade_level,
                  total_points, is_verified, created_at
        "#,
    )
    .bind(&payload.email)
    .bind(&payload.username)
    .bind(&hashed_password)
    .bind(&payload.full_name)
    .bind(&payload.institution)
    .bind(&payload.grade_level)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("Email or username already in use".to_string())
        } else {
            tracing::error!("Failed to register user: {:?}", e);
            AppError::from(e)
        }
    })?;

    let code = generate_code();
    let expires_at = Utc::now() + Duration::minutes(OTP_TTL_MINUTES);

    sqlx::query(
        r#"
        INSERT INTO email_verifications (user_id, code, expires_at)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id) DO UPDATE SET code = EXCLUDED.code, expires_at = EXCLUDED.expires_at
        "#,
    )
    .bind(user.id)
    .bind(&code)
    .bind(expires_at)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    // The account is committed either way; a failed send is recoverable via
    // the resend endpoint.
    if let Err(e) = mailer
        .send_verification_code(&user.email, &user.full_name, &code)
        .await
    {
        tracing::warn!("Failed to send verification code to {}: {}", user.email, e);
    }

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "requires_verification": true,
            "email": user.email,
        })),
    ))
}

/// Consumes a 6-digit verification code and activates the account.
pub async fn verify_email(
    State(pool): State<PgPool>,
    Json(payload): Json<VerifyEmailRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let row = sqlx::query_as::<_, (i64, String, chrono::DateTime<Utc>)>(
        r#"
        SELECT u.id, v.code, v.expires_at
        FROM users u
        JOIN email_verifications v ON v.user_id = u.id
        WHERE u.email = $1
        "#,
    )
    .bind(&payload.email)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound(
        "No pending verification for this email".to_string(),
    ))?;

    let (user_id, code, expires_at) = row;

    if expires_at < Utc::now() {
        return Err(AppError::BadRequest(
            "Verification code expired. Request a new one.".to_string(),
        ));
    }

    if code != payload.code {
        return Err(AppError::BadRequest("Invalid verification code".to_string()));
    }

    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE users SET is_verified = TRUE WHERE id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM email_verifications WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(Json(json!({ "verified": true })))
}

/// Regenerates the verification code for an unverified account.
pub async fn resend_otp(
    State(pool): State<PgPool>,
    State(mailer): State<Mailer>,
    Json(payload): Json<ResendOtpRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, email, username, password, role, full_name, institution, grade_level,
               total_points, is_verified, created_at
        FROM users
        WHERE email = $1
        "#,
    )
    .bind(&payload.email)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))?;

    if user.is_verified {
        return Err(AppError::Conflict("Account is already verified".to_string()));
    }

    let code = generate_code();
    let expires_at = Utc::now() + Duration::minutes(OTP_TTL_MINUTES);

    sqlx::query(
        r#"
        INSERT INTO email_verifications (user_id, code, expires_at)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id) DO UPDATE SET code = EXCLUDED.code, expires_at = EXCLUDED.expires_at
        "#,
    )
    .bind(user.id)
    .bind(&code)
    .bind(expires_at)
    .execute(&pool)
    .await?;

    mailer
        .send_verification_code(&user.email, &user.full_name, &code)
        .await?;

    Ok(Json(json!({ "sent": true })))
}

/// Authenticates a user and returns a JWT token.
///
/// Unverified users may log in; verified-only actions are gated per handler.
pub async fn login(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, email, username, password, role, full_name, institution, grade_level,
               total_points, is_verified, created_at
        FROM users
        WHERE email = $1
        "#,
    )
    .bind(&payload.email)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Login DB error: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let user = user.ok_or(AppError::AuthError("Invalid credentials".to_string()))?;

    let is_valid = verify_password(&payload.password, &user.password)?;

    if !is_valid {
        return Err(AppError::AuthError("Invalid credentials".to_string()));
    }

    let token = sign_jwt(
        user.id,
        &user.role,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "role": user.role,
        "is_verified": user.is_verified
    })))
}
